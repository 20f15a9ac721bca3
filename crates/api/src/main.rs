use anyhow::Context;

use fairway_api::app::{build_app, build_services};
use fairway_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    fairway_observability::init(config.log_format);

    let services = build_services(&config)
        .await
        .context("failed to initialise booking store")?;
    let app = build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr().context("listener has no local address")?,
        default_capacity = config.default_capacity,
        "listening"
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
