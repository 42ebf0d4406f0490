use super::*;
use crate::state::entity::{LightState, Priority, RequestStatus, VehicleType};

fn decode_str(raw: &str) -> Result<InboundEvent, DecodeError> {
    decode(raw.as_bytes())
}

#[test]
fn test_decode_full_vehicle_update() {
    let raw = r#"{
        "type": "vehicle_update",
        "data": {
            "id": "AMB-12",
            "type": "ambulance",
            "priority": "P1",
            "position": {"lat": 33.9716, "lng": -6.8498},
            "speed": 14.2,
            "eta": 45,
            "distance": 620,
            "status": "granted",
            "requestActive": true,
            "predictedPath": [
                {"lat": 33.9716, "lng": -6.8498},
                {"lat": 33.9730, "lng": -6.8460}
            ],
            "timestamp": 1707668400000
        }
    }"#;

    let event = decode_str(raw).unwrap();
    let update = match event {
        InboundEvent::VehicleUpdate(update) => update,
        other => panic!("expected vehicle update, got {:?}", other),
    };

    assert_eq!(update.id, "AMB-12");
    assert_eq!(update.kind, Some(VehicleType::Ambulance));
    assert_eq!(update.priority, Some(Priority::P1));
    assert_eq!(update.speed, Some(14.2));
    assert_eq!(update.eta, Some(45.0));
    assert_eq!(update.status, Some(RequestStatus::Granted));
    assert_eq!(update.request_active, Some(true));
    assert_eq!(update.predicted_path.unwrap().len(), 2);
    assert_eq!(update.timestamp, Some(1707668400000));
}

#[test]
fn test_decode_partial_vehicle_update() {
    let raw = r#"{"type": "vehicle_update", "data": {"id": "AMB-12", "eta": 30}}"#;

    let event = decode_str(raw).unwrap();
    let update = match event {
        InboundEvent::VehicleUpdate(update) => update,
        other => panic!("expected vehicle update, got {:?}", other),
    };

    assert_eq!(update.id, "AMB-12");
    assert_eq!(update.eta, Some(30.0));
    assert!(update.kind.is_none());
    assert!(update.priority.is_none());
    assert!(update.request_active.is_none());
}

#[test]
fn test_decode_priority_granted() {
    let raw = r#"{
        "type": "priority_granted",
        "data": {
            "vehicle_id": "AMB-12",
            "corridor": {
                "id": "COR-7",
                "path": [
                    {"lat": 33.9716, "lng": -6.8498},
                    {"lat": 33.9730, "lng": -6.8460}
                ]
            }
        }
    }"#;

    let event = decode_str(raw).unwrap();
    match event {
        InboundEvent::PriorityGranted(grant) => {
            assert_eq!(grant.vehicle_id, "AMB-12");
            assert_eq!(grant.corridor.id, "COR-7");
            assert_eq!(grant.corridor.path.len(), 2);
        }
        other => panic!("expected priority grant, got {:?}", other),
    }
}

#[test]
fn test_decode_traffic_light_state() {
    let raw = r#"{
        "type": "traffic_light_state",
        "data": {"intersection_id": "TL-001", "state": "green", "time_remaining": 12.5}
    }"#;

    let event = decode_str(raw).unwrap();
    match event {
        InboundEvent::TrafficLightState(update) => {
            assert_eq!(update.intersection_id, "TL-001");
            assert_eq!(update.state, LightState::Green);
            assert_eq!(update.time_remaining, Some(12.5));
        }
        other => panic!("expected traffic light state, got {:?}", other),
    }
}

#[test]
fn test_decode_metrics_update() {
    let raw = r#"{
        "type": "metrics_update",
        "data": {"activeRequests": 3, "avgTime": 42.5, "successRate": 97.2, "latency": 120}
    }"#;

    let event = decode_str(raw).unwrap();
    match event {
        InboundEvent::MetricsUpdate(snapshot) => {
            assert_eq!(snapshot.active_requests, 3);
            assert_eq!(snapshot.avg_time, 42.5);
            assert_eq!(snapshot.success_rate, 97.2);
            assert_eq!(snapshot.latency, 120.0);
        }
        other => panic!("expected metrics update, got {:?}", other),
    }
}

#[test]
fn test_unrecognized_type_even_with_garbage_data() {
    let raw = r#"{"type": "heartbeat", "data": "whatever"}"#;
    match decode_str(raw).unwrap_err() {
        DecodeError::UnrecognizedType(kind) => assert_eq!(kind, "heartbeat"),
        other => panic!("expected unrecognized type, got {:?}", other),
    }
}

#[test]
fn test_unrecognized_type_without_data() {
    let raw = r#"{"type": "ping"}"#;
    assert!(matches!(
        decode_str(raw).unwrap_err(),
        DecodeError::UnrecognizedType(_)
    ));
}

#[test]
fn test_non_json_frame_is_malformed() {
    assert!(matches!(
        decode(b"not json at all").unwrap_err(),
        DecodeError::Malformed(_)
    ));
}

#[test]
fn test_known_type_with_wrong_shape_is_malformed() {
    let raw = r#"{"type": "vehicle_update", "data": {"speed": 10}}"#; // no id
    assert!(matches!(
        decode_str(raw).unwrap_err(),
        DecodeError::Malformed(_)
    ));
}

#[test]
fn test_empty_vehicle_id_invalid() {
    let raw = r#"{"type": "vehicle_update", "data": {"id": ""}}"#;
    match decode_str(raw).unwrap_err() {
        DecodeError::Invalid(ValidationError::EmptyId(field)) => {
            assert_eq!(field, "vehicle_update.id")
        }
        other => panic!("expected empty-id error, got {:?}", other),
    }
}

#[test]
fn test_negative_speed_invalid() {
    let raw = r#"{"type": "vehicle_update", "data": {"id": "AMB-12", "speed": -3.0}}"#;
    match decode_str(raw).unwrap_err() {
        DecodeError::Invalid(ValidationError::NegativeField(field, value)) => {
            assert_eq!(field, "vehicle_update.speed");
            assert_eq!(value, -3.0);
        }
        other => panic!("expected negative-field error, got {:?}", other),
    }
}

#[test]
fn test_out_of_range_position_invalid() {
    let raw = r#"{
        "type": "vehicle_update",
        "data": {"id": "AMB-12", "position": {"lat": 123.0, "lng": 0.0}}
    }"#;
    assert!(matches!(
        decode_str(raw).unwrap_err(),
        DecodeError::Invalid(ValidationError::OutOfRangePosition { .. })
    ));
}

#[test]
fn test_zero_timestamp_invalid() {
    let raw = r#"{"type": "vehicle_update", "data": {"id": "AMB-12", "timestamp": 0}}"#;
    assert_eq!(
        match decode_str(raw).unwrap_err() {
            DecodeError::Invalid(err) => err,
            other => panic!("expected validation error, got {:?}", other),
        },
        ValidationError::InvalidTimestamp(0)
    );
}

#[test]
fn test_single_point_corridor_invalid() {
    let raw = r#"{
        "type": "priority_granted",
        "data": {
            "vehicle_id": "AMB-12",
            "corridor": {"id": "COR-7", "path": [{"lat": 33.97, "lng": -6.85}]}
        }
    }"#;
    assert_eq!(
        match decode_str(raw).unwrap_err() {
            DecodeError::Invalid(err) => err,
            other => panic!("expected validation error, got {:?}", other),
        },
        ValidationError::ShortCorridor(1)
    );
}

#[test]
fn test_negative_time_remaining_invalid() {
    let raw = r#"{
        "type": "traffic_light_state",
        "data": {"intersection_id": "TL-001", "state": "red", "time_remaining": -1.0}
    }"#;
    assert!(matches!(
        decode_str(raw).unwrap_err(),
        DecodeError::Invalid(ValidationError::NegativeField(_, _))
    ));
}
