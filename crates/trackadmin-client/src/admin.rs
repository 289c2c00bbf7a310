//! Admin API client (`/api/admin/...`, `/api/me`, `/api/logout`).

use reqwest::header::{CONTENT_TYPE, COOKIE, HeaderMap, HeaderValue};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use trackadmin_core::error::{Result, TrackAdminError};
use trackadmin_core::types::{
    ActionResult, AdminCheck, Me, Stats, Ticket, TicketMessage, TicketStatus, UserDetail,
    UserSummary,
};

use crate::MIN_PASSWORD_LEN;

/// Client for the admin endpoints of the tracking server.
///
/// Holds a cookie store, so a session obtained by any request is reused;
/// a preconfigured session cookie is sent with every request.
#[derive(Clone)]
pub struct AdminApi {
    base_url: String,
    client: reqwest::Client,
}

impl AdminApi {
    pub fn new(base_url: impl Into<String>, session_cookie: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(cookie) = session_cookie {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| TrackAdminError::Config(format!("Invalid session cookie: {e}")))?;
            headers.insert(COOKIE, value);
        }

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .build()
            .map_err(|e| TrackAdminError::http(format!("Client build failed: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T> {
        let url = format!("{}{path}", self.base_url);
        tracing::debug!("{method} {url}");

        let mut req = self.client.request(method, &url);
        if let Some(body) = body {
            req = req.json(&body);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| TrackAdminError::http(format!("{path}: {e}")))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| TrackAdminError::http(format!("Read {path}: {e}")))?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v["error"].as_str().map(String::from))
                .unwrap_or_else(|| "request failed".into());
            tracing::warn!("API {path} failed with {status}: {message}");
            return Err(TrackAdminError::api(status.as_u16(), message));
        }

        serde_json::from_str(&text)
            .map_err(|e| TrackAdminError::http(format!("Unexpected response from {path}: {e}")))
    }

    // ── Session ────────────────────────────────────

    pub async fn check_admin(&self) -> Result<bool> {
        let check: AdminCheck = self.call(Method::GET, "/api/admin/check", None).await?;
        Ok(check.is_admin)
    }

    pub async fn me(&self) -> Result<Me> {
        self.call(Method::GET, "/api/me", None).await
    }

    pub async fn logout(&self) -> Result<ActionResult> {
        self.call(Method::POST, "/api/logout", None).await
    }

    // ── Users ────────────────────────────────────

    pub async fn stats(&self) -> Result<Stats> {
        self.call(Method::GET, "/api/admin/stats", None).await
    }

    pub async fn users(&self) -> Result<Vec<UserSummary>> {
        self.call(Method::GET, "/api/admin/users", None).await
    }

    pub async fn user(&self, id: i64) -> Result<UserDetail> {
        self.call(Method::GET, &format!("/api/admin/users/{id}"), None).await
    }

    /// Flip the user's admin flag; the server decides the new value.
    pub async fn toggle_admin(&self, id: i64) -> Result<ActionResult> {
        self.call(Method::POST, &format!("/api/admin/users/{id}/toggle-admin"), None)
            .await
    }

    /// Delete the user and all of their logs.
    pub async fn delete_user(&self, id: i64) -> Result<ActionResult> {
        self.call(Method::DELETE, &format!("/api/admin/users/{id}"), None).await
    }

    pub async fn reset_password(&self, id: i64, new_password: &str) -> Result<ActionResult> {
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(TrackAdminError::validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        self.call(
            Method::POST,
            &format!("/api/admin/users/{id}/reset-password"),
            Some(json!({ "newPassword": new_password })),
        )
        .await
    }

    // ── Support tickets ────────────────────────────────────

    pub async fn tickets(&self, archived: bool) -> Result<Vec<Ticket>> {
        self.call(
            Method::GET,
            &format!("/api/admin/support/tickets?archived={archived}"),
            None,
        )
        .await
    }

    pub async fn ticket_messages(&self, ticket_id: i64) -> Result<Vec<TicketMessage>> {
        self.call(
            Method::GET,
            &format!("/api/admin/support/tickets/{ticket_id}/messages"),
            None,
        )
        .await
    }

    pub async fn set_ticket_status(&self, ticket_id: i64, status: &TicketStatus) -> Result<ActionResult> {
        self.call(
            Method::POST,
            &format!("/api/admin/support/tickets/{ticket_id}/status"),
            Some(json!({ "status": status.as_str() })),
        )
        .await
    }

    pub async fn set_ticket_archived(&self, ticket_id: i64, archived: bool) -> Result<ActionResult> {
        self.call(
            Method::POST,
            &format!("/api/admin/support/tickets/{ticket_id}/archive"),
            Some(json!({ "archived": archived })),
        )
        .await
    }

    pub async fn reply_ticket(&self, ticket_id: i64, message: &str) -> Result<ActionResult> {
        let message = message.trim();
        if message.is_empty() {
            return Err(TrackAdminError::validation("reply is empty"));
        }
        self.call(
            Method::POST,
            &format!("/api/admin/support/tickets/{ticket_id}/messages"),
            Some(json!({ "message": message })),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query};
    use axum::http::{HeaderMap as AxumHeaders, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use std::collections::HashMap;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_check_admin_sends_session_cookie() {
        let router = Router::new().route(
            "/api/admin/check",
            get(|headers: AxumHeaders| async move {
                let cookie = headers.get("cookie").and_then(|v| v.to_str().ok()).unwrap_or("");
                Json(json!({ "isAdmin": cookie == "token=abc" }))
            }),
        );
        let base = serve(router).await;

        let api = AdminApi::new(&base, Some("token=abc")).unwrap();
        assert!(api.check_admin().await.unwrap());

        let anon = AdminApi::new(&base, None).unwrap();
        assert!(!anon.check_admin().await.unwrap());
    }

    #[tokio::test]
    async fn test_error_body_becomes_api_error() {
        let router = Router::new()
            .route(
                "/api/admin/users",
                get(|| async { (StatusCode::FORBIDDEN, Json(json!({"error": "Admins only"}))) }),
            )
            .route(
                "/api/admin/stats",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
            );
        let api = AdminApi::new(serve(router).await, None).unwrap();

        match api.users().await {
            Err(TrackAdminError::Api { status, message }) => {
                assert_eq!(status, 403);
                assert_eq!(message, "Admins only");
            }
            other => panic!("unexpected: {other:?}"),
        }
        match api.stats().await {
            Err(TrackAdminError::Api { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "request failed");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_tickets_archived_query() {
        let router = Router::new().route(
            "/api/admin/support/tickets",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                let archived = q.get("archived").map(String::as_str) == Some("true");
                Json(json!([{
                    "id": if archived { 2 } else { 1 },
                    "subject": "Sync issue",
                    "status": "open",
                    "archived": archived
                }]))
            }),
        );
        let api = AdminApi::new(serve(router).await, None).unwrap();

        let active = api.tickets(false).await.unwrap();
        assert_eq!(active[0].id, 1);
        let archived = api.tickets(true).await.unwrap();
        assert_eq!(archived[0].id, 2);
        assert!(archived[0].archived);
    }

    #[tokio::test]
    async fn test_mutation_bodies() {
        let router = Router::new()
            .route(
                "/api/admin/users/{id}/reset-password",
                post(|Path(id): Path<i64>, Json(body): Json<Value>| async move {
                    Json(json!({"message": format!("reset {id} to {}", body["newPassword"].as_str().unwrap_or(""))}))
                }),
            )
            .route(
                "/api/admin/support/tickets/{id}/status",
                post(|Path(id): Path<i64>, Json(body): Json<Value>| async move {
                    Json(json!({"message": format!("{id}:{}", body["status"].as_str().unwrap_or(""))}))
                }),
            )
            .route(
                "/api/admin/support/tickets/{id}/messages",
                post(|Json(body): Json<Value>| async move {
                    Json(json!({"message": body["message"].clone()}))
                }),
            );
        let api = AdminApi::new(serve(router).await, None).unwrap();

        let r = api.reset_password(4, "hunter22").await.unwrap();
        assert_eq!(r.message, "reset 4 to hunter22");

        let r = api.set_ticket_status(9, &TicketStatus::Resolved).await.unwrap();
        assert_eq!(r.message, "9:resolved");

        let r = api.reply_ticket(9, "  on it  ").await.unwrap();
        assert_eq!(r.message, "on it");
    }

    #[tokio::test]
    async fn test_local_validation_skips_request() {
        // Nothing listens here; validation must fail before any connect.
        let api = AdminApi::new("http://127.0.0.1:9", None).unwrap();
        assert!(matches!(
            api.reset_password(1, "abc").await,
            Err(TrackAdminError::Validation(_))
        ));
        assert!(matches!(
            api.reply_ticket(1, "   ").await,
            Err(TrackAdminError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_and_toggle() {
        let router = Router::new()
            .route(
                "/api/admin/users/{id}",
                axum::routing::delete(|Path(id): Path<i64>| async move {
                    Json(json!({"message": format!("deleted {id}")}))
                }),
            )
            .route(
                "/api/admin/users/{id}/toggle-admin",
                post(|Path(id): Path<i64>| async move {
                    Json(json!({"message": format!("toggled {id}"), "isAdmin": true}))
                }),
            );
        let api = AdminApi::new(serve(router).await, None).unwrap();
        assert_eq!(api.delete_user(3).await.unwrap().message, "deleted 3");
        assert_eq!(api.toggle_admin(3).await.unwrap().message, "toggled 3");
    }
}
