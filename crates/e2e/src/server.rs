//! Test server bootstrap

use bugtrack_server::{ApiAuth, ApiServer, ApiServerConfig};
use std::time::Duration;

/// A running API server over a throwaway store.
///
/// The store directory lives as long as the handle; the server task is
/// detached and dies with the test runtime.
pub struct TestServer {
    pub base_url: String,
    _store: tempfile::TempDir,
}

impl TestServer {
    /// Start with auth disabled (the common case for API tests).
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_with_auth(ApiAuth::None).await
    }

    /// Start with an explicit auth policy.
    pub async fn start_with_auth(auth: ApiAuth) -> anyhow::Result<Self> {
        let store = tempfile::tempdir()?;

        let server = ApiServer::new(ApiServerConfig {
            db_path: store.path().join("state.db"),
            auth,
            seed_demo: false,
        })?;

        // Bind first so we know the port before the server task starts.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        tokio::spawn(async move {
            let _ = server.serve_with_listener(listener).await;
        });

        let base_url = format!("http://{}", addr);
        wait_until_healthy(&base_url).await?;

        Ok(Self {
            base_url,
            _store: store,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn wait_until_healthy(base_url: &str) -> anyhow::Result<()> {
    let client = reqwest::Client::new();
    for _ in 0..50 {
        if let Ok(resp) = client.get(format!("{base_url}/api/health")).send().await {
            if resp.status().is_success() {
                return Ok(());
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    anyhow::bail!("server did not become healthy at {base_url}")
}
