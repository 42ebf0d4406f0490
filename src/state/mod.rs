// Entity records, stores, and derived projections

pub mod entity;
pub mod metrics;
pub mod requests;
mod store;

pub use entity::{
    Corridor, LightState, MergeError, Position, Priority, RequestStatus, TrafficLight, Vehicle,
    VehicleType,
};
pub use metrics::{MetricsMirror, MetricsSnapshot};
pub use requests::{ActiveRequest, RequestBoard, SortKey, TierFilter};
pub use store::EntityStore;
