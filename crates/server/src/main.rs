use std::net::SocketAddr;

use tracing::info;

use bugtrack_server::{ApiAuth, ApiServer, ApiServerConfig, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Base configuration comes from an optional TOML file; individual
    // settings can be overridden via BUGTRACK_* environment variables.
    let mut cfg = match std::env::var("BUGTRACK_CONFIG") {
        Ok(path) => ServerConfig::load(std::path::Path::new(&path))?,
        Err(_) => ServerConfig::default(),
    };

    if let Ok(addr) = std::env::var("BUGTRACK_ADDR") {
        if !addr.trim().is_empty() {
            cfg.http_listen = addr;
        }
    }
    if let Ok(store) = std::env::var("BUGTRACK_STORE") {
        if !store.trim().is_empty() {
            cfg.store_path = std::path::PathBuf::from(store);
        }
    }
    if let Ok(token) = std::env::var("BUGTRACK_AUTH_TOKEN") {
        if !token.trim().is_empty() {
            cfg.auth_token = Some(token);
        }
    }
    if std::env::var("BUGTRACK_AUTH_DISABLED").ok().as_deref() == Some("1") {
        cfg.auth_disabled = true;
    }
    if std::env::var("BUGTRACK_SEED_DEMO").ok().as_deref() == Some("1") {
        cfg.seed_demo = true;
    }

    let addr: SocketAddr = cfg.http_listen.parse()?;

    let auth = if cfg.auth_disabled {
        ApiAuth::None
    } else {
        match &cfg.auth_token {
            Some(token) => ApiAuth::Token(token.clone()),
            None => ApiAuth::DevRandom,
        }
    };

    info!(
        "Starting BugTrack API on http://{} (store: {})",
        addr,
        cfg.store_path.display()
    );

    let server = ApiServer::new(ApiServerConfig {
        db_path: cfg.db_path(),
        auth,
        seed_demo: cfg.seed_demo,
    })?;

    server.serve(addr).await
}
