//! Internal privilege API used by operator tooling.
//!
//! These endpoints are authenticated by a shared secret instead of an
//! admin session, and the server broadcasts an `adminToggled` update to
//! connected admin panels after each change.

use serde_json::{Value, json};
use trackadmin_core::error::{Result, TrackAdminError};
use trackadmin_core::types::PrivilegeChange;

pub struct InternalApi {
    base_url: String,
    secret: String,
    client: reqwest::Client,
}

impl InternalApi {
    pub fn new(base_url: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret: secret.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Give `username` admin rights.
    pub async fn grant(&self, username: &str) -> Result<PrivilegeChange> {
        self.post("/api/internal/admin/grant", username).await
    }

    /// Take admin rights away from `username`.
    pub async fn revoke(&self, username: &str) -> Result<PrivilegeChange> {
        self.post("/api/internal/admin/revoke", username).await
    }

    async fn post(&self, path: &str, username: &str) -> Result<PrivilegeChange> {
        let resp = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(&json!({ "username": username, "secret": self.secret }))
            .send()
            .await
            .map_err(|e| TrackAdminError::http(format!("{path}: {e}")))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| TrackAdminError::http(format!("Read {path}: {e}")))?;

        let parse_failed = || TrackAdminError::api(status.as_u16(), "failed to parse response");
        let body: Value = serde_json::from_str(&text).map_err(|_| parse_failed())?;

        if !status.is_success() {
            let message = body["error"]
                .as_str()
                .map(String::from)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(TrackAdminError::api(status.as_u16(), message));
        }

        let change: PrivilegeChange = serde_json::from_value(body).map_err(|_| parse_failed())?;
        tracing::info!("Privilege change for '{}' (id={}): {}", change.username, change.user_id, change.message);
        Ok(change)
    }
}
