use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

/// Operational metrics pushed by the control system.
///
/// Replaced wholesale on every `metrics_update` event; this core never
/// merges or recomputes them. Threshold evaluation (alert-worthy vs
/// nominal) belongs to the consuming view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub active_requests: u32,
    /// Seconds
    pub avg_time: f64,
    /// Percent, 0-100
    pub success_rate: f64,
    /// Milliseconds
    pub latency: f64,
}

impl Default for MetricsSnapshot {
    fn default() -> Self {
        Self {
            active_requests: 0,
            avg_time: 0.0,
            success_rate: 100.0,
            latency: 0.0,
        }
    }
}

/// Pass-through holder for the latest server-pushed metrics snapshot.
/// Cloning yields another handle to the same mirror.
#[derive(Clone, Default)]
pub struct MetricsMirror {
    inner: Arc<RwLock<MetricsSnapshot>>,
}

impl MetricsMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unconditional overwrite, no merge.
    pub fn replace(&self, snapshot: MetricsSnapshot) {
        *self.inner.write().unwrap() = snapshot;
    }

    pub fn latest(&self) -> MetricsSnapshot {
        self.inner.read().unwrap().clone()
    }
}
