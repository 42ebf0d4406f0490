use anyhow::Result;
use std::time::Duration;
use tracing::info;

use urbanflow::alert::AlertManager;
use urbanflow::config::{self, DashboardConfig, LightSeed};
use urbanflow::link::Link;
use urbanflow::session::{self, DashboardSession};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "urbanflow=info".into()),
        )
        .init();

    info!("Urban Flow V2I console core starting...");

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "urbanflow.toml".to_string());
    let config = match config::load_config(&config_path) {
        Ok(config) => config,
        Err(err) => {
            info!(path = %config_path, error = %err, "No config file loaded, using defaults");
            DashboardConfig::default()
        }
    };

    let alerts = AlertManager::with_auto_dismiss(Duration::from_millis(config.alerts.auto_dismiss_ms));
    let session = DashboardSession::new(alerts);
    session
        .store()
        .seed_traffic_lights(config.lights.into_iter().map(LightSeed::into_light));

    let (link, mut lifecycle) = Link::connect(config.link).await?;

    session::run(&session, &link, &mut lifecycle).await?;

    link.close().await
}
