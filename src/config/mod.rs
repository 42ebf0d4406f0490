use chrono::Utc;
use serde::Deserialize;

pub use crate::link::LinkConfig;
use crate::state::{LightState, Position, TrafficLight};

/// Complete dashboard configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub link: LinkConfig,
    #[serde(default)]
    pub alerts: AlertConfig,
    #[serde(default)]
    pub operator: OperatorConfig,
    /// Pre-seeded traffic-light inventory; state events for intersections
    /// not listed here are ignored
    #[serde(default)]
    pub lights: Vec<LightSeed>,
}

/// Alert queue configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AlertConfig {
    /// Auto-dismiss delay for non-critical alerts (milliseconds)
    #[serde(default = "default_auto_dismiss_ms")]
    pub auto_dismiss_ms: u64,
}

fn default_auto_dismiss_ms() -> u64 {
    10_000
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            auto_dismiss_ms: default_auto_dismiss_ms(),
        }
    }
}

/// Operator identity attached to outbound commands
#[derive(Debug, Clone, Deserialize)]
pub struct OperatorConfig {
    #[serde(default = "default_operator_id")]
    pub id: String,
}

fn default_operator_id() -> String {
    "operator_001".to_string()
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            id: default_operator_id(),
        }
    }
}

/// One traffic light in the seeded inventory
#[derive(Debug, Clone, Deserialize)]
pub struct LightSeed {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default = "default_light_state")]
    pub state: LightState,
    #[serde(default)]
    pub priority_mode: bool,
}

fn default_light_state() -> LightState {
    LightState::Red
}

impl LightSeed {
    pub fn into_light(self) -> TrafficLight {
        TrafficLight {
            id: self.id,
            position: Position {
                lat: self.lat,
                lng: self.lng,
            },
            state: self.state,
            priority_mode: self.priority_mode,
            time_remaining: None,
            last_updated: Utc::now(),
        }
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &str) -> Result<DashboardConfig, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    let config: DashboardConfig = toml::from_str(&contents)?;
    Ok(config)
}
