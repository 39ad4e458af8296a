mod auth;
mod error;
mod handlers;
mod metrics;
mod routes;

use anyhow::Context;
use campus_common::config::{Config, JudgeConfig};
use campus_common::redis::RedisStore;
use campus_common::store::Store;
use campus_judge::{Judge, Judge0Client};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub judge: Arc<dyn Judge>,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Campus judge API booting...");

    let config = Config::from_env().context("Invalid server configuration")?;
    let judge_config = JudgeConfig::from_env().context("Invalid judge configuration")?;

    metrics::register().context("Failed to register metrics")?;

    let store = RedisStore::connect(&config.redis_url)
        .await
        .context("Failed to connect to Redis")?;
    info!("Connected to Redis: {}", config.redis_url);

    info!(
        judge_url = %judge_config.base_url,
        poll_attempts = judge_config.poll_attempts,
        poll_delay_ms = judge_config.poll_delay.as_millis() as u64,
        "Judge client configured"
    );
    let judge = Judge0Client::new(judge_config).context("Failed to build judge HTTP client")?;

    let state = Arc::new(AppState {
        store: Arc::new(store),
        judge: Arc::new(judge),
    });

    let app = routes::routes().with_state(state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    info!("HTTP server listening on {}", config.bind_addr);
    info!("Ready to accept submissions");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
