use chrono::Utc;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::alert::{AlertLevel, AlertManager};
use crate::link::{LinkError, LinkState, Wire};

/// Operator override actions for a priority request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlAction {
    Force,
    Suspend,
    Cancel,
}

impl fmt::Display for ControlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlAction::Force => write!(f, "force"),
            ControlAction::Suspend => write!(f, "suspend"),
            ControlAction::Cancel => write!(f, "cancel"),
        }
    }
}

/// Outbound `manual_control` command as serialized onto the wire
#[derive(Debug, Clone, Serialize)]
pub struct ManualControl {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub vehicle_id: String,
    pub action: ControlAction,
    pub operator_id: String,
    /// Unix epoch milliseconds
    pub timestamp: i64,
}

/// Receipt for a command handed to the link.
///
/// Dispatch is fire-and-forget; delivery confirmation, if any, arrives
/// later as an independent inbound event.
#[derive(Debug, Clone, PartialEq)]
pub struct Ack {
    pub vehicle_id: String,
    pub action: ControlAction,
    pub timestamp: i64,
}

/// Dispatch failures. Every variant has already been surfaced to the
/// operator as a CRITICAL alert by the time the caller sees it.
#[derive(Debug)]
pub enum DispatchError {
    /// The link is not OPEN; the command was dropped, not queued
    NotConnected,
    /// Command serialization failed
    Encode(serde_json::Error),
    /// The link accepted the command but the publish failed
    Transport(LinkError),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::NotConnected => write!(f, "link is not connected"),
            DispatchError::Encode(err) => write!(f, "failed to encode command: {}", err),
            DispatchError::Transport(err) => write!(f, "failed to send command: {}", err),
        }
    }
}

impl std::error::Error for DispatchError {}

/// Validates link readiness, serializes operator commands, and surfaces
/// the outcome as an operator alert.
pub struct CommandDispatcher {
    wire: Arc<dyn Wire>,
    alerts: AlertManager,
    operator_id: String,
}

impl CommandDispatcher {
    pub fn new(wire: Arc<dyn Wire>, alerts: AlertManager, operator_id: impl Into<String>) -> Self {
        Self {
            wire,
            alerts,
            operator_id: operator_id.into(),
        }
    }

    /// Dispatch one operator override.
    ///
    /// `confirmed` is the answer from the external confirmation dialog; an
    /// unconfirmed call sends nothing, changes nothing, and returns
    /// `Ok(None)`. A confirmed call while the link is not OPEN raises one
    /// CRITICAL alert and fails with `NotConnected`; the command is
    /// dropped, never queued or retried. A sent command raises one INFO
    /// alert describing the executed action.
    pub async fn dispatch(
        &self,
        vehicle_id: &str,
        action: ControlAction,
        confirmed: bool,
    ) -> Result<Option<Ack>, DispatchError> {
        if !confirmed {
            debug!(vehicle_id = %vehicle_id, action = %action, "command not confirmed, ignoring");
            return Ok(None);
        }

        if self.wire.state() != LinkState::Open {
            warn!(vehicle_id = %vehicle_id, action = %action, "command dropped, link not connected");
            self.alerts.raise(
                AlertLevel::Critical,
                "Cannot send command - V2I link disconnected",
            );
            return Err(DispatchError::NotConnected);
        }

        let command = ManualControl {
            msg_type: "manual_control".to_string(),
            vehicle_id: vehicle_id.to_string(),
            action,
            operator_id: self.operator_id.clone(),
            timestamp: Utc::now().timestamp_millis(),
        };
        let payload = serde_json::to_vec(&command).map_err(DispatchError::Encode)?;

        match self.wire.send(payload).await {
            Ok(()) => {
                debug!(vehicle_id = %vehicle_id, action = %action, "manual control dispatched");
                self.alerts.raise(
                    AlertLevel::Info,
                    format!("Action \"{}\" executed for {}", action, vehicle_id),
                );
                Ok(Some(Ack {
                    vehicle_id: command.vehicle_id,
                    action,
                    timestamp: command.timestamp,
                }))
            }
            Err(LinkError::NotConnected) => {
                // Connection dropped between the readiness check and the send
                self.alerts.raise(
                    AlertLevel::Critical,
                    "Cannot send command - V2I link disconnected",
                );
                Err(DispatchError::NotConnected)
            }
            Err(err) => {
                self.alerts.raise(
                    AlertLevel::Critical,
                    format!("Failed to send command for {}", vehicle_id),
                );
                Err(DispatchError::Transport(err))
            }
        }
    }
}
