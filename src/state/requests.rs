use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, warn};

use crate::event::VehicleUpdate;
use crate::state::entity::{Priority, RequestStatus, VehicleType};

/// One row of the operator's active-requests panel.
///
/// A derived, independent copy of the vehicle data that created it, never
/// a reference into the entity store, so sorting and filtering cannot
/// mutate vehicle state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveRequest {
    pub id: String,
    pub kind: Option<VehicleType>,
    pub priority: Priority,
    /// Seconds
    pub eta: f64,
    /// Meters
    pub distance: f64,
    pub status: RequestStatus,
    /// Receipt instant; preserved across updates unless the server sends
    /// its own timestamp
    pub timestamp: DateTime<Utc>,
}

/// Sort key for the active-requests view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Priority,
    Eta,
    ReceiptTime,
}

/// Priority-tier filter for the active-requests view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierFilter {
    All,
    Only(Priority),
}

/// Projection of active priority requests, keyed by vehicle id.
///
/// At most one request exists per vehicle at any time. Derivation is
/// independent of the entity-store merge: it consumes the same partial
/// update record and neither side suppresses the other.
pub struct RequestBoard {
    requests: DashMap<String, ActiveRequest>,
}

impl RequestBoard {
    pub fn new() -> Self {
        Self {
            requests: DashMap::new(),
        }
    }

    /// Derive the projection change for one vehicle update.
    ///
    /// A `completed` status removes the request for that id. Otherwise an
    /// update flagged `requestActive` upserts: present fields overwrite,
    /// absent fields are untouched, and the receipt timestamp is preserved
    /// unless the update carries a server timestamp. An update for an
    /// unseen id must carry at least `priority` and `eta` (the sort and
    /// filter keys) or the derivation is skipped.
    pub fn derive(&self, update: &VehicleUpdate, now: DateTime<Utc>) {
        if update.status == Some(RequestStatus::Completed) {
            if self.requests.remove(&update.id).is_some() {
                debug!(vehicle_id = %update.id, "request completed, removed from board");
            }
            return;
        }

        if update.request_active != Some(true) {
            return;
        }

        match self.requests.entry(update.id.clone()) {
            Entry::Occupied(mut entry) => {
                let request = entry.get_mut();
                if let Some(kind) = update.kind {
                    request.kind = Some(kind);
                }
                if let Some(priority) = update.priority {
                    request.priority = priority;
                }
                if let Some(eta) = update.eta {
                    request.eta = eta;
                }
                if let Some(distance) = update.distance {
                    request.distance = distance;
                }
                if let Some(status) = update.status {
                    request.status = status;
                }
                if let Some(timestamp) = update.timestamp.and_then(DateTime::from_timestamp_millis)
                {
                    request.timestamp = timestamp;
                }
            }
            Entry::Vacant(entry) => {
                let (priority, eta) = match (update.priority, update.eta) {
                    (Some(priority), Some(eta)) => (priority, eta),
                    _ => {
                        warn!(
                            vehicle_id = %update.id,
                            "active request without priority or eta, skipping"
                        );
                        return;
                    }
                };

                entry.insert(ActiveRequest {
                    id: update.id.clone(),
                    kind: update.kind,
                    priority,
                    eta,
                    distance: update.distance.unwrap_or(0.0),
                    status: update.status.unwrap_or(RequestStatus::Pending),
                    timestamp: update
                        .timestamp
                        .and_then(DateTime::from_timestamp_millis)
                        .unwrap_or(now),
                });
            }
        }
    }

    /// Remove a request explicitly (cancel acknowledgment path). Absent
    /// ids are a no-op.
    pub fn remove(&self, id: &str) -> Option<ActiveRequest> {
        self.requests.remove(id).map(|(_, request)| request)
    }

    pub fn get(&self, id: &str) -> Option<ActiveRequest> {
        self.requests.get(id).map(|r| r.clone())
    }

    pub fn snapshot(&self) -> Vec<ActiveRequest> {
        self.requests.iter().map(|r| r.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Filtered, sorted view for presentation: filter then sort in one
    /// pass over an owned snapshot.
    pub fn view(&self, tier: TierFilter, key: SortKey) -> Vec<ActiveRequest> {
        sort(filter(self.snapshot(), tier), key)
    }
}

impl Default for RequestBoard {
    fn default() -> Self {
        Self::new()
    }
}

/// Stable ascending sort on the chosen key. Pure: consumes and returns an
/// owned list, entity state is never touched.
pub fn sort(mut list: Vec<ActiveRequest>, key: SortKey) -> Vec<ActiveRequest> {
    match key {
        SortKey::Priority => list.sort_by_key(|r| r.priority),
        SortKey::Eta => list.sort_by(|a, b| a.eta.total_cmp(&b.eta)),
        SortKey::ReceiptTime => list.sort_by_key(|r| r.timestamp),
    }
    list
}

/// Exact-match tier filter. Pure and composable with `sort` in either
/// order.
pub fn filter(list: Vec<ActiveRequest>, tier: TierFilter) -> Vec<ActiveRequest> {
    match tier {
        TierFilter::All => list,
        TierFilter::Only(priority) => list
            .into_iter()
            .filter(|r| r.priority == priority)
            .collect(),
    }
}
