use anyhow::Result;
use chrono::Utc;
use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::alert::{AlertLevel, AlertManager};
use crate::event::{self, DecodeError, InboundEvent};
use crate::link::{Link, LinkEvent};
use crate::state::{EntityStore, MetricsMirror, RequestBoard};

/// Per-connection dashboard context.
///
/// Owns the entity store, the active-request projection, the alert queue,
/// and the metrics mirror for exactly one dashboard connection; no
/// ambient globals. All mutation goes through `apply`, one event at a
/// time, in delivery order, run-to-completion.
pub struct DashboardSession {
    store: EntityStore,
    board: RequestBoard,
    alerts: AlertManager,
    metrics: MetricsMirror,
}

impl DashboardSession {
    pub fn new(alerts: AlertManager) -> Self {
        Self {
            store: EntityStore::new(),
            board: RequestBoard::new(),
            alerts,
            metrics: MetricsMirror::new(),
        }
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn board(&self) -> &RequestBoard {
        &self.board
    }

    pub fn alerts(&self) -> &AlertManager {
        &self.alerts
    }

    pub fn metrics(&self) -> &MetricsMirror {
        &self.metrics
    }

    /// Decode one raw frame and apply it.
    ///
    /// Malformed payloads and unrecognized event types are logged and
    /// dropped without touching any store; ingestion failures never
    /// propagate.
    pub fn apply_raw(&self, raw: &[u8]) {
        match event::decode(raw) {
            Ok(event) => self.apply(event),
            Err(DecodeError::UnrecognizedType(kind)) => {
                warn!(event_type = %kind, "unrecognized event type, ignoring");
            }
            Err(err) => {
                warn!(error = %err, "malformed event dropped");
            }
        }
    }

    /// Apply one typed inbound event.
    pub fn apply(&self, event: InboundEvent) {
        match event {
            InboundEvent::VehicleUpdate(update) => {
                let now = Utc::now();
                if let Err(err) = self.store.apply_vehicle_update(&update, now) {
                    warn!(error = %err, vehicle_id = %update.id, "vehicle update rejected");
                }
                // The projection derives from the same partial record,
                // independent of whether the store merge succeeded.
                self.board.derive(&update, now);
            }
            InboundEvent::PriorityGranted(grant) => {
                info!(
                    vehicle_id = %grant.vehicle_id,
                    corridor_id = %grant.corridor.id,
                    "priority corridor granted"
                );
                self.store.append_corridor(grant.corridor);
                self.alerts.raise(
                    AlertLevel::Info,
                    format!("Green corridor granted for {}", grant.vehicle_id),
                );
            }
            InboundEvent::TrafficLightState(update) => {
                self.store.apply_traffic_light_update(&update, Utc::now());
            }
            InboundEvent::MetricsUpdate(snapshot) => {
                self.metrics.replace(snapshot);
            }
        }
    }

    /// Surface a connection lifecycle transition to the operator.
    pub fn apply_link_event(&self, event: LinkEvent) {
        match event {
            LinkEvent::Open => {
                self.alerts
                    .raise(AlertLevel::Info, "Connection established with V2I server");
            }
            LinkEvent::Closed => {
                self.alerts
                    .raise(AlertLevel::Warning, "Connection to V2I server lost");
            }
            LinkEvent::Error(err) => {
                self.alerts
                    .raise(AlertLevel::Critical, format!("V2I connection error: {}", err));
            }
        }
    }

    /// Tear down the session: cancel pending alert-expiry timers.
    pub fn shutdown(&self) {
        self.alerts.shutdown();
    }
}

/// Drive a session from a connected link until the event stream ends.
///
/// Frames are applied strictly in delivery order; each handler runs to
/// completion before the next frame is taken. Lifecycle transitions
/// arrive interleaved on their own channel and become operator alerts.
pub async fn run(
    session: &DashboardSession,
    link: &Link,
    lifecycle: &mut mpsc::UnboundedReceiver<LinkEvent>,
) -> Result<()> {
    let mut events = link.events().await?;
    info!("Dashboard session live, processing events");

    loop {
        tokio::select! {
            message = events.next() => {
                match message {
                    Some(message) => session.apply_raw(&message.payload),
                    // Subscription ended with the connection
                    None => break,
                }
            }
            Some(event) = lifecycle.recv() => {
                session.apply_link_event(event);
            }
        }
    }

    session.shutdown();
    warn!("Event stream ended, session stopped");
    Ok(())
}
