//! HTTP client for the BugTrack API

use anyhow::{anyhow, Result};
use bugtrack_common::{BugPatch, BugState, Priority, Severity};
use serde::Deserialize;
use tracing::debug;

/// Flattened bug record as returned by the server
#[derive(Debug, Clone, Deserialize)]
pub struct BugRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub severity: Severity,
    pub assignee: Option<String>,
    pub environment: Option<String>,
    pub steps: Option<String>,
    pub expected: Option<String>,
    pub actual: Option<String>,
    pub status: BugState,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub handle: String,
    pub display_name: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StatsRecord {
    pub total: u64,
    pub open: u64,
    pub in_progress: u64,
    pub resolved: u64,
}

/// Client for the BugTrack HTTP API
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            http: reqwest::Client::new(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        debug!("{} {}{}", method, self.base_url, path);
        let mut builder = self.http.request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// Surface the server's error body as a readable failure.
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body: serde_json::Value = resp.json().await.unwrap_or_default();
        let message = body
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or("request failed")
            .to_string();
        Err(anyhow!("{} ({})", message, status))
    }

    /// Probe server health. Never fails, just reports.
    pub async fn health_check(&self) -> bool {
        match self
            .http
            .get(format!("{}/api/health", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    pub async fn list_bugs(&self, query: &[(&str, String)]) -> Result<Vec<BugRecord>> {
        let resp = self
            .request(reqwest::Method::GET, "/api/bugs")
            .query(query)
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn get_bug(&self, id: &str) -> Result<BugRecord> {
        let resp = self
            .request(reqwest::Method::GET, &format!("/api/bugs/{}", id))
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn create_bug(&self, payload: &serde_json::Value) -> Result<BugRecord> {
        let resp = self
            .request(reqwest::Method::POST, "/api/bugs")
            .json(payload)
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn update_bug(&self, id: &str, patch: &BugPatch) -> Result<BugRecord> {
        let resp = self
            .request(reqwest::Method::PUT, &format!("/api/bugs/{}", id))
            .json(patch)
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    /// Commit a delete. The confirmation gesture happens before this call;
    /// the client only ever sends `confirm=true`.
    pub async fn delete_bug(&self, id: &str) -> Result<()> {
        let resp = self
            .request(reqwest::Method::DELETE, &format!("/api/bugs/{}", id))
            .query(&[("confirm", "true")])
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    pub async fn stats(&self) -> Result<StatsRecord> {
        let resp = self.request(reqwest::Method::GET, "/api/stats").send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn list_users(&self) -> Result<Vec<UserRecord>> {
        let resp = self.request(reqwest::Method::GET, "/api/users").send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn create_user(&self, handle: &str, display_name: &str) -> Result<UserRecord> {
        let resp = self
            .request(reqwest::Method::POST, "/api/users")
            .json(&serde_json::json!({
                "handle": handle,
                "display_name": display_name,
            }))
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }
}
