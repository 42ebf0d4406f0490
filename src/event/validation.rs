use super::{InboundEvent, PriorityGrant, TrafficLightUpdate, VehicleUpdate};
use crate::state::entity::Position;
use std::fmt;

/// Shape-validation errors for inbound events
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyId(&'static str),
    NegativeField(&'static str, f64),
    OutOfRangePosition { lat: f64, lng: f64 },
    InvalidTimestamp(i64),
    ShortCorridor(usize),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyId(field) => write!(f, "{} must not be empty", field),
            ValidationError::NegativeField(field, value) => {
                write!(f, "{} must be a finite non-negative number, got {}", field, value)
            }
            ValidationError::OutOfRangePosition { lat, lng } => {
                write!(f, "position ({}, {}) outside valid coordinate ranges", lat, lng)
            }
            ValidationError::InvalidTimestamp(ts) => {
                write!(f, "timestamp must be positive, got {}", ts)
            }
            ValidationError::ShortCorridor(len) => {
                write!(f, "corridor path must have at least 2 points, got {}", len)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validates a decoded inbound event.
///
/// Validation rules:
/// - Identities (`id`, `vehicle_id`, `intersection_id`, corridor id) are
///   non-empty
/// - Numeric measures (speed, eta, distance, time_remaining) are finite
///   and non-negative
/// - Positions are within latitude [-90, 90] and longitude [-180, 180]
/// - Wire timestamps are positive Unix epoch milliseconds
/// - Corridor paths carry at least 2 points
///
/// Metrics snapshots are accepted as-is beyond their type shape; threshold
/// evaluation is a consumer concern.
pub fn validate(event: &InboundEvent) -> Result<(), ValidationError> {
    match event {
        InboundEvent::VehicleUpdate(update) => validate_vehicle_update(update),
        InboundEvent::PriorityGranted(grant) => validate_priority_grant(grant),
        InboundEvent::TrafficLightState(update) => validate_traffic_light_update(update),
        InboundEvent::MetricsUpdate(_) => Ok(()),
    }
}

fn validate_vehicle_update(update: &VehicleUpdate) -> Result<(), ValidationError> {
    if update.id.is_empty() {
        return Err(ValidationError::EmptyId("vehicle_update.id"));
    }

    if let Some(speed) = update.speed {
        check_non_negative("vehicle_update.speed", speed)?;
    }
    if let Some(eta) = update.eta {
        check_non_negative("vehicle_update.eta", eta)?;
    }
    if let Some(distance) = update.distance {
        check_non_negative("vehicle_update.distance", distance)?;
    }

    if let Some(position) = update.position {
        check_position(position)?;
    }
    if let Some(path) = &update.predicted_path {
        for position in path {
            check_position(*position)?;
        }
    }

    if let Some(timestamp) = update.timestamp {
        if timestamp <= 0 {
            return Err(ValidationError::InvalidTimestamp(timestamp));
        }
    }

    Ok(())
}

fn validate_priority_grant(grant: &PriorityGrant) -> Result<(), ValidationError> {
    if grant.vehicle_id.is_empty() {
        return Err(ValidationError::EmptyId("priority_granted.vehicle_id"));
    }
    if grant.corridor.id.is_empty() {
        return Err(ValidationError::EmptyId("priority_granted.corridor.id"));
    }
    if grant.corridor.path.len() < 2 {
        return Err(ValidationError::ShortCorridor(grant.corridor.path.len()));
    }
    for position in &grant.corridor.path {
        check_position(*position)?;
    }
    Ok(())
}

fn validate_traffic_light_update(update: &TrafficLightUpdate) -> Result<(), ValidationError> {
    if update.intersection_id.is_empty() {
        return Err(ValidationError::EmptyId("traffic_light_state.intersection_id"));
    }
    if let Some(time_remaining) = update.time_remaining {
        check_non_negative("traffic_light_state.time_remaining", time_remaining)?;
    }
    Ok(())
}

fn check_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::NegativeField(field, value));
    }
    Ok(())
}

fn check_position(position: Position) -> Result<(), ValidationError> {
    let Position { lat, lng } = position;
    let valid = lat.is_finite()
        && lng.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lng);
    if !valid {
        return Err(ValidationError::OutOfRangePosition { lat, lng });
    }
    Ok(())
}
