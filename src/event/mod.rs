use serde::Deserialize;
use serde_json::Value;
use std::fmt;

use crate::state::entity::{Corridor, LightState, Position, Priority, RequestStatus, VehicleType};
use crate::state::metrics::MetricsSnapshot;

mod validation;
#[cfg(test)]
mod tests;

pub use validation::ValidationError;

/// Raw inbound envelope: `{ "type": ..., "data": ... }`.
///
/// The `type` discriminant is matched before the payload is looked at, so
/// an unrecognized event type is reported as such even when its `data`
/// would not deserialize.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: Value,
}

/// Typed inbound event, dispatched through `DashboardSession::apply`.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    VehicleUpdate(VehicleUpdate),
    PriorityGranted(PriorityGrant),
    TrafficLightState(TrafficLightUpdate),
    MetricsUpdate(MetricsSnapshot),
}

/// Partial vehicle record carried by a `vehicle_update` event.
///
/// Every field except `id` may be absent. The entity store merges present
/// fields over the existing record (last-write-wins per field); the
/// active-request projection derives from the same partial independently.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleUpdate {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: Option<VehicleType>,
    pub priority: Option<Priority>,
    pub position: Option<Position>,
    /// Meters per second
    pub speed: Option<f64>,
    /// Seconds to the referenced intersection/destination
    pub eta: Option<f64>,
    /// Meters
    pub distance: Option<f64>,
    pub status: Option<RequestStatus>,
    pub request_active: Option<bool>,
    pub predicted_path: Option<Vec<Position>>,
    /// Server receipt instant, Unix epoch milliseconds
    pub timestamp: Option<i64>,
}

/// `priority_granted` payload: a corridor of successive signal
/// pre-emptions granted to one vehicle.
#[derive(Debug, Clone, Deserialize)]
pub struct PriorityGrant {
    pub vehicle_id: String,
    pub corridor: Corridor,
}

/// `traffic_light_state` payload. Only pre-seeded intersections are
/// mutated; unknown ids are ignored at the store.
#[derive(Debug, Clone, Deserialize)]
pub struct TrafficLightUpdate {
    pub intersection_id: String,
    pub state: LightState,
    /// Seconds until the next state change, when the controller reports it
    pub time_remaining: Option<f64>,
}

/// Decode failures at the event-ingestion boundary.
///
/// `UnrecognizedType` is logged and ignored; the other variants mean the
/// payload failed shape validation and the whole event is dropped. Neither
/// is fatal and neither mutates any store.
#[derive(Debug)]
pub enum DecodeError {
    UnrecognizedType(String),
    Malformed(serde_json::Error),
    Invalid(ValidationError),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::UnrecognizedType(kind) => {
                write!(f, "unrecognized event type '{}'", kind)
            }
            DecodeError::Malformed(err) => write!(f, "malformed event payload: {}", err),
            DecodeError::Invalid(err) => write!(f, "invalid event payload: {}", err),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Decode one raw frame into a typed, validated inbound event.
pub fn decode(raw: &[u8]) -> Result<InboundEvent, DecodeError> {
    let envelope: Envelope = serde_json::from_slice(raw).map_err(DecodeError::Malformed)?;
    decode_envelope(envelope)
}

/// Decode an already-parsed envelope.
pub fn decode_envelope(envelope: Envelope) -> Result<InboundEvent, DecodeError> {
    let event = match envelope.event_type.as_str() {
        "vehicle_update" => InboundEvent::VehicleUpdate(
            serde_json::from_value(envelope.data).map_err(DecodeError::Malformed)?,
        ),
        "priority_granted" => InboundEvent::PriorityGranted(
            serde_json::from_value(envelope.data).map_err(DecodeError::Malformed)?,
        ),
        "traffic_light_state" => InboundEvent::TrafficLightState(
            serde_json::from_value(envelope.data).map_err(DecodeError::Malformed)?,
        ),
        "metrics_update" => InboundEvent::MetricsUpdate(
            serde_json::from_value(envelope.data).map_err(DecodeError::Malformed)?,
        ),
        other => return Err(DecodeError::UnrecognizedType(other.to_string())),
    };

    validation::validate(&event).map_err(DecodeError::Invalid)?;
    Ok(event)
}
