use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cauca_org_api::config;
use cauca_org_api::server::{app, bootstrap_root, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let config = config::config();
    info!("Starting Cauca Org API in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET must be set outside development");
    }

    let state = AppState::from_config(config).await?;

    if let Some(root) = bootstrap_root(&state, &config.bootstrap).await? {
        warn!(
            "Bootstrapped department root {} <{}>; temporary credential printed to stdout",
            root.member.id, root.member.email
        );
        // Kept out of the log pipeline
        println!("Temporary credential for {} (shown once): {}", root.member.email, root.temporary_credential);
    }

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Cauca Org API listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await.context("server error")?;
    Ok(())
}
