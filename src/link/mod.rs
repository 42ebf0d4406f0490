use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use tokio::sync::mpsc;
use tracing::info;

/// Event-stream link configuration
#[derive(Clone, Debug, Deserialize)]
pub struct LinkConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_event_subject")]
    pub event_subject: String,
    #[serde(default = "default_command_subject")]
    pub command_subject: String,
}

fn default_url() -> String {
    std::env::var("NATS_URL").unwrap_or_else(|_| "nats://localhost:4222".to_string())
}

fn default_event_subject() -> String {
    "v2i.events".to_string()
}

fn default_command_subject() -> String {
    "v2i.commands".to_string()
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            event_subject: default_event_subject(),
            command_subject: default_command_subject(),
        }
    }
}

/// Connection lifecycle state: `Connecting → Open → Closed`, with
/// transport failures landing in `Closed` after an error event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Connecting,
    Open,
    Closed,
}

/// Lifecycle transition reported by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    Open,
    Closed,
    Error(String),
}

/// Errors from the outbound half of the link
#[derive(Debug)]
pub enum LinkError {
    /// The connection is not OPEN; nothing was sent
    NotConnected,
    /// The transport rejected the send
    Transport(String),
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::NotConnected => write!(f, "link is not connected"),
            LinkError::Transport(err) => write!(f, "transport error: {}", err),
        }
    }
}

impl std::error::Error for LinkError {}

/// Outbound half of the event-stream connection.
///
/// The command dispatcher talks to this seam, so dispatch behavior is
/// testable without a running broker.
#[async_trait]
pub trait Wire: Send + Sync {
    /// Current connection state
    fn state(&self) -> LinkState;

    /// Fire-and-forget send. Fails fast with `NotConnected` when the link
    /// is not OPEN; the failure is reported, never retried here.
    async fn send(&self, payload: Vec<u8>) -> Result<(), LinkError>;
}

/// One persistent bidirectional event-stream connection to the V2I
/// control system. Inbound events arrive on the event subject; operator
/// commands publish to the command subject.
pub struct Link {
    client: async_nats::Client,
    config: LinkConfig,
}

impl Link {
    /// Connect to the event-stream endpoint.
    ///
    /// Reconnection is disabled: a dropped connection stays closed until
    /// the controlling session opens a new link. Retry/backoff policy
    /// belongs in a deployment wrapper, not in event handling.
    pub async fn connect(config: LinkConfig) -> Result<(Self, mpsc::UnboundedReceiver<LinkEvent>)> {
        info!(url = %config.url, "Connecting to V2I event stream");

        let (lifecycle_tx, lifecycle_rx) = mpsc::unbounded_channel();
        let client = async_nats::ConnectOptions::new()
            .max_reconnects(0)
            .event_callback(move |event| {
                let tx = lifecycle_tx.clone();
                async move {
                    let _ = tx.send(LinkEvent::from(event));
                }
            })
            .connect(&config.url)
            .await
            .context("Failed to connect to V2I event stream")?;

        Ok((Self { client, config }, lifecycle_rx))
    }

    /// Subscribe to the inbound event subject
    pub async fn events(&self) -> Result<async_nats::Subscriber> {
        self.client
            .subscribe(self.config.event_subject.clone())
            .await
            .context("Failed to subscribe to event subject")
    }

    /// Flush pending publishes and tear down the channel. Scheduled alert
    /// timers are a session concern, torn down separately.
    pub async fn close(self) -> Result<()> {
        self.client
            .flush()
            .await
            .context("Failed to flush link before close")?;
        Ok(())
    }
}

#[async_trait]
impl Wire for Link {
    fn state(&self) -> LinkState {
        match self.client.connection_state() {
            async_nats::connection::State::Connected => LinkState::Open,
            async_nats::connection::State::Pending => LinkState::Connecting,
            _ => LinkState::Closed,
        }
    }

    async fn send(&self, payload: Vec<u8>) -> Result<(), LinkError> {
        if self.state() != LinkState::Open {
            return Err(LinkError::NotConnected);
        }

        self.client
            .publish(self.config.command_subject.clone(), payload.into())
            .await
            .map_err(|err| LinkError::Transport(err.to_string()))
    }
}

impl From<async_nats::Event> for LinkEvent {
    fn from(event: async_nats::Event) -> Self {
        match event {
            async_nats::Event::Connected => LinkEvent::Open,
            async_nats::Event::Disconnected => LinkEvent::Closed,
            other => LinkEvent::Error(other.to_string()),
        }
    }
}
