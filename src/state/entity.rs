use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::event::{TrafficLightUpdate, VehicleUpdate};

/// Geographic coordinate pair as carried on the wire
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
}

/// Emergency vehicle class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    Ambulance,
    Fire,
    Police,
}

/// Priority tier. Declaration order gives P1 < P2 < P3, so the derived
/// `Ord` puts critical requests first in an ascending sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    P1,
    P2,
    P3,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::P1 => write!(f, "P1"),
            Priority::P2 => write!(f, "P2"),
            Priority::P3 => write!(f, "P3"),
        }
    }
}

/// Lifecycle of a priority request as reported by the control system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Granted,
    Active,
    Completed,
}

/// Traffic signal head state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightState {
    Green,
    Yellow,
    Red,
}

/// Emergency vehicle record, exclusively owned by the `EntityStore`
#[derive(Debug, Clone, Serialize)]
pub struct Vehicle {
    pub id: String,
    pub kind: VehicleType,
    pub priority: Priority,
    pub position: Position,
    /// Meters per second
    pub speed: f64,
    /// Seconds
    pub eta: f64,
    pub status: RequestStatus,
    pub predicted_path: Option<Vec<Position>>,
    pub request_active: bool,
    pub last_updated: DateTime<Utc>,
}

/// Merge failures for partial vehicle updates
#[derive(Debug, Clone, PartialEq)]
pub enum MergeError {
    /// First update for an id must carry a complete record
    Incomplete { id: String, missing: &'static str },
}

impl fmt::Display for MergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeError::Incomplete { id, missing } => {
                write!(f, "first update for '{}' is missing required field '{}'", id, missing)
            }
        }
    }
}

impl std::error::Error for MergeError {}

impl Vehicle {
    /// Build a full record from the first update seen for an id.
    ///
    /// Required on first sight: type, priority, position, speed, eta,
    /// status. A partial first update is rejected without creating a
    /// record.
    pub fn from_update(update: &VehicleUpdate, now: DateTime<Utc>) -> Result<Self, MergeError> {
        let incomplete = |missing| MergeError::Incomplete {
            id: update.id.clone(),
            missing,
        };

        Ok(Self {
            id: update.id.clone(),
            kind: update.kind.ok_or_else(|| incomplete("type"))?,
            priority: update.priority.ok_or_else(|| incomplete("priority"))?,
            position: update.position.ok_or_else(|| incomplete("position"))?,
            speed: update.speed.ok_or_else(|| incomplete("speed"))?,
            eta: update.eta.ok_or_else(|| incomplete("eta"))?,
            status: update.status.ok_or_else(|| incomplete("status"))?,
            predicted_path: update.predicted_path.clone(),
            request_active: update.request_active.unwrap_or(false),
            last_updated: now,
        })
    }

    /// Shallow-merge fields present in the partial over this record,
    /// leaving absent fields untouched (last-write-wins per field).
    pub fn merge(&mut self, update: &VehicleUpdate, now: DateTime<Utc>) {
        if let Some(kind) = update.kind {
            self.kind = kind;
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
        if let Some(position) = update.position {
            self.position = position;
        }
        if let Some(speed) = update.speed {
            self.speed = speed;
        }
        if let Some(eta) = update.eta {
            self.eta = eta;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(path) = &update.predicted_path {
            self.predicted_path = Some(path.clone());
        }
        if let Some(request_active) = update.request_active {
            self.request_active = request_active;
        }
        self.last_updated = now;
    }
}

/// Traffic signal record. Inventory is pre-seeded; only `state`,
/// `time_remaining` and the update instant change at runtime.
#[derive(Debug, Clone, Serialize)]
pub struct TrafficLight {
    pub id: String,
    pub position: Position,
    pub state: LightState,
    pub priority_mode: bool,
    /// Seconds until the next state change, when reported
    pub time_remaining: Option<f64>,
    pub last_updated: DateTime<Utc>,
}

impl TrafficLight {
    pub fn apply(&mut self, update: &TrafficLightUpdate, now: DateTime<Utc>) {
        self.state = update.state;
        self.time_remaining = update.time_remaining;
        self.last_updated = now;
    }
}

/// Granted priority corridor: an ordered path of successive signal
/// pre-emptions. Append-only; never updated or removed by this core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corridor {
    pub id: String,
    pub path: Vec<Position>,
}
