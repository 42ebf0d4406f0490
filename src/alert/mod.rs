use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, RwLock, Weak};
use std::time::Duration;
use tokio::task::AbortHandle;
use tracing::debug;
use uuid::Uuid;

/// Auto-dismiss delay for non-critical alerts
pub const DEFAULT_AUTO_DISMISS: Duration = Duration::from_millis(10_000);

/// Severity of an operator notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertLevel {
    Critical,
    Warning,
    Info,
}

impl AlertLevel {
    /// Critical alerts trigger the sound cue
    pub fn audible(self) -> bool {
        matches!(self, AlertLevel::Critical)
    }

    /// Critical alerts persist until explicitly dismissed
    pub fn auto_expires(self) -> bool {
        !matches!(self, AlertLevel::Critical)
    }
}

/// Operator notification. UUIDv7 ids are time-ordered, so id order
/// matches generation order.
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub id: Uuid,
    pub level: AlertLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Hook invoked when an audible alert is raised. Playback itself is an
/// external collaborator.
pub type SoundHook = Box<dyn Fn(&Alert) + Send + Sync>;

struct AlertEntry {
    alert: Alert,
    timer: Option<AbortHandle>,
}

struct AlertQueue {
    entries: RwLock<Vec<AlertEntry>>,
    sound: Option<SoundHook>,
}

/// Ordered queue of transient operator notifications.
///
/// Insertion order is display order. Warning/info alerts auto-expire after
/// the configured delay unless dismissed earlier; critical alerts persist
/// until explicit dismissal. Cloning yields another handle to the same
/// queue.
#[derive(Clone)]
pub struct AlertManager {
    queue: Arc<AlertQueue>,
    auto_dismiss: Duration,
}

impl AlertManager {
    pub fn new() -> Self {
        Self::build(DEFAULT_AUTO_DISMISS, None)
    }

    pub fn with_auto_dismiss(auto_dismiss: Duration) -> Self {
        Self::build(auto_dismiss, None)
    }

    pub fn with_sound_hook(auto_dismiss: Duration, sound: SoundHook) -> Self {
        Self::build(auto_dismiss, Some(sound))
    }

    fn build(auto_dismiss: Duration, sound: Option<SoundHook>) -> Self {
        Self {
            queue: Arc::new(AlertQueue {
                entries: RwLock::new(Vec::new()),
                sound,
            }),
            auto_dismiss,
        }
    }

    /// Append an alert to the tail of the queue.
    ///
    /// Fires the sound hook for audible levels and, for auto-expiring
    /// levels, schedules a dismissal after the configured delay. The timer
    /// and a racing manual dismiss are both safe: whichever runs second
    /// finds the id gone and does nothing.
    pub fn raise(&self, level: AlertLevel, message: impl Into<String>) -> Alert {
        let alert = Alert {
            id: Uuid::now_v7(),
            level,
            message: message.into(),
            timestamp: Utc::now(),
        };

        if level.audible() {
            if let Some(sound) = &self.queue.sound {
                sound(&alert);
            }
        }

        let timer = level.auto_expires().then(|| {
            Self::schedule_dismiss(Arc::downgrade(&self.queue), alert.id, self.auto_dismiss)
        });

        self.queue.entries.write().unwrap().push(AlertEntry {
            alert: alert.clone(),
            timer,
        });

        debug!(alert_id = %alert.id, level = ?level, message = %alert.message, "alert raised");
        alert
    }

    /// Remove the alert with this id if present. Absent ids are a no-op,
    /// never an error.
    pub fn dismiss(&self, id: Uuid) -> bool {
        remove(&self.queue, id)
    }

    /// Current queue in insertion order
    pub fn active(&self) -> Vec<Alert> {
        self.queue
            .entries
            .read()
            .unwrap()
            .iter()
            .map(|entry| entry.alert.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.queue.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.entries.read().unwrap().is_empty()
    }

    /// Abort every pending expiry timer. Call on session teardown so
    /// closing a dashboard does not leak timer tasks.
    pub fn shutdown(&self) {
        let entries = self.queue.entries.read().unwrap();
        for entry in entries.iter() {
            if let Some(timer) = &entry.timer {
                timer.abort();
            }
        }
    }

    fn schedule_dismiss(queue: Weak<AlertQueue>, id: Uuid, delay: Duration) -> AbortHandle {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The queue may already be gone or the alert dismissed; both
            // end here as a no-op.
            if let Some(queue) = queue.upgrade() {
                remove(&queue, id);
            }
        });
        handle.abort_handle()
    }
}

impl Default for AlertManager {
    fn default() -> Self {
        Self::new()
    }
}

fn remove(queue: &AlertQueue, id: Uuid) -> bool {
    let mut entries = queue.entries.write().unwrap();
    match entries.iter().position(|entry| entry.alert.id == id) {
        Some(index) => {
            let entry = entries.remove(index);
            if let Some(timer) = entry.timer {
                timer.abort();
            }
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn info_alert_auto_expires() {
        let alerts = AlertManager::new();
        let alert = alerts.raise(AlertLevel::Info, "connection established");
        assert_eq!(alerts.len(), 1);

        tokio::time::sleep(Duration::from_millis(10_001)).await;

        assert!(alerts.is_empty());
        assert!(!alerts.dismiss(alert.id));
    }

    #[tokio::test(start_paused = true)]
    async fn critical_alert_never_auto_expires() {
        let alerts = AlertManager::new();
        let alert = alerts.raise(AlertLevel::Critical, "link down");

        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(alerts.len(), 1);
        assert!(alerts.dismiss(alert.id));
        assert!(alerts.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn manual_dismiss_before_expiry() {
        let alerts = AlertManager::new();
        let alert = alerts.raise(AlertLevel::Warning, "connection lost");

        assert!(alerts.dismiss(alert.id));
        assert!(alerts.is_empty());

        // Expiry instant passes without incident
        tokio::time::sleep(Duration::from_millis(10_001)).await;
        assert!(alerts.is_empty());
    }

    #[tokio::test]
    async fn dismiss_absent_id_is_noop() {
        let alerts = AlertManager::new();
        alerts.raise(AlertLevel::Critical, "still here");

        assert!(!alerts.dismiss(Uuid::now_v7()));
        assert_eq!(alerts.len(), 1);
    }

    #[tokio::test]
    async fn queue_preserves_insertion_order() {
        let alerts = AlertManager::new();
        alerts.raise(AlertLevel::Info, "first");
        alerts.raise(AlertLevel::Critical, "second");
        alerts.raise(AlertLevel::Warning, "third");

        let messages: Vec<String> = alerts.active().into_iter().map(|a| a.message).collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
    }

    #[tokio::test(start_paused = true)]
    async fn custom_auto_dismiss_delay() {
        let alerts = AlertManager::with_auto_dismiss(Duration::from_millis(500));
        alerts.raise(AlertLevel::Info, "short lived");

        tokio::time::sleep(Duration::from_millis(499)).await;
        assert_eq!(alerts.len(), 1);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(alerts.is_empty());
    }

    #[tokio::test]
    async fn sound_hook_fires_for_critical_only() {
        let rings = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&rings);
        let alerts = AlertManager::with_sound_hook(
            DEFAULT_AUTO_DISMISS,
            Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        alerts.raise(AlertLevel::Info, "quiet");
        alerts.raise(AlertLevel::Warning, "quiet");
        assert_eq!(rings.load(Ordering::SeqCst), 0);

        alerts.raise(AlertLevel::Critical, "loud");
        assert_eq!(rings.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_pending_timers() {
        let alerts = AlertManager::new();
        alerts.raise(AlertLevel::Info, "pending");
        alerts.shutdown();

        tokio::time::sleep(Duration::from_millis(10_001)).await;

        // Timer was aborted; the alert is still queued
        assert_eq!(alerts.len(), 1);
    }
}
