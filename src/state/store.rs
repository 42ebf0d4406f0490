use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use crate::event::{TrafficLightUpdate, VehicleUpdate};
use crate::state::entity::{Corridor, MergeError, TrafficLight, Vehicle};

/// Single source of truth for vehicle, traffic-light, and corridor state.
///
/// Updates are applied with partial-merge semantics; reads hand out owned
/// clones. Projections pull from the store, nothing is pushed out of it.
pub struct EntityStore {
    vehicles: DashMap<String, Vehicle>,
    lights: DashMap<String, TrafficLight>,
    corridors: DashMap<String, Corridor>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self {
            vehicles: DashMap::new(),
            lights: DashMap::new(),
            corridors: DashMap::new(),
        }
    }

    /// Load the traffic-light inventory. State events for intersections
    /// that were never seeded are ignored.
    pub fn seed_traffic_lights(&self, lights: impl IntoIterator<Item = TrafficLight>) {
        for light in lights {
            self.lights.insert(light.id.clone(), light);
        }
    }

    /// Insert-or-merge a partial vehicle update.
    ///
    /// An unknown id requires a complete record (see
    /// `Vehicle::from_update`); rejection leaves the store untouched. A
    /// known id gets the present fields merged over its record.
    pub fn apply_vehicle_update(
        &self,
        update: &VehicleUpdate,
        now: DateTime<Utc>,
    ) -> Result<(), MergeError> {
        match self.vehicles.entry(update.id.clone()) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().merge(update, now);
                Ok(())
            }
            Entry::Vacant(entry) => {
                entry.insert(Vehicle::from_update(update, now)?);
                Ok(())
            }
        }
    }

    /// Apply a signal state change to a seeded intersection. Unknown ids
    /// are ignored without creating a record.
    pub fn apply_traffic_light_update(&self, update: &TrafficLightUpdate, now: DateTime<Utc>) {
        match self.lights.get_mut(&update.intersection_id) {
            Some(mut light) => light.apply(update, now),
            None => {
                debug!(
                    intersection_id = %update.intersection_id,
                    "state for unseeded intersection, ignoring"
                );
            }
        }
    }

    /// Record a granted corridor. Corridors are append-only and keyed by
    /// id; a re-announced id keeps the original record.
    pub fn append_corridor(&self, corridor: Corridor) {
        self.corridors.entry(corridor.id.clone()).or_insert(corridor);
    }

    pub fn vehicle(&self, id: &str) -> Option<Vehicle> {
        self.vehicles.get(id).map(|v| v.clone())
    }

    pub fn vehicles(&self) -> Vec<Vehicle> {
        self.vehicles.iter().map(|v| v.value().clone()).collect()
    }

    pub fn traffic_light(&self, id: &str) -> Option<TrafficLight> {
        self.lights.get(id).map(|l| l.clone())
    }

    pub fn traffic_lights(&self) -> Vec<TrafficLight> {
        self.lights.iter().map(|l| l.value().clone()).collect()
    }

    pub fn corridors(&self) -> Vec<Corridor> {
        self.corridors.iter().map(|c| c.value().clone()).collect()
    }

    pub fn corridor_count(&self) -> usize {
        self.corridors.len()
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}
