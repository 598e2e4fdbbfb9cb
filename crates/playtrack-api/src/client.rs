//! HTTP client for the remote playtime service.
//!
//! Two endpoints, both JSON over POST, both without retry:
//!
//! - `POST {base_url}/api/external-games` resolves a URL + page metadata to
//!   a game slug. Errors here matter and are surfaced to the caller.
//! - `POST {base_url}/api/playtime` accumulates seconds for a user+game.
//!   This send is best-effort: callers log the error and discard it.
//!
//! No timeout is imposed; a hung request delays only the flush that issued
//! it.

use std::future::Future;

use serde::Serialize;
use thiserror::Error;

use playtrack_core::PageMeta;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-success status. Carries the
    /// server-provided `message` when the body had one.
    #[error("{message}")]
    Rejected { message: String },

    /// The request never completed (connection refused, DNS, aborted).
    #[error("request failed: {0}")]
    Transport(String),
}

/// Raw response: status code plus body text (parsed leniently later,
/// since the playtime endpoint's body is ignored entirely).
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Minimal POST-JSON transport seam.
pub trait HttpPost: Send + Sync {
    fn post_json(
        &self,
        url: &str,
        body: serde_json::Value,
    ) -> impl Future<Output = Result<HttpResponse, ApiError>> + Send;
}

/// Production transport over a shared reqwest client.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HttpPost for ReqwestTransport {
    async fn post_json(
        &self,
        url: &str,
        body: serde_json::Value,
    ) -> Result<HttpResponse, ApiError> {
        let resp = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(HttpResponse { status, body })
    }
}

// ─── Request bodies ───────────────────────────────────────────────

/// Body for the resolve endpoint: the page URL, the registering user, and
/// whatever metadata the host page harvested.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    pub url: String,
    pub user_id: i64,
    #[serde(flatten)]
    pub meta: PageMeta,
}

/// Body for the playtime endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaytimeReport {
    pub user_id: i64,
    pub game_slug: String,
    pub seconds: i64,
}

// ─── Client ───────────────────────────────────────────────────────

pub struct ApiClient<T> {
    transport: T,
}

impl<T: HttpPost> ApiClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Resolve a URL to a game slug via the external-games endpoint.
    ///
    /// Non-2xx surfaces the server's `message` field when present, a
    /// generic fallback otherwise.
    pub async fn resolve_game(
        &self,
        base_url: &str,
        request: &ResolveRequest,
    ) -> Result<String, ApiError> {
        let url = format!("{base_url}/api/external-games");
        let body = serde_json::to_value(request)
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let resp = self.transport.post_json(&url, body).await?;

        let parsed: serde_json::Value =
            serde_json::from_str(&resp.body).unwrap_or(serde_json::Value::Null);

        if !resp.is_success() {
            let message = parsed
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("Failed to add game");
            return Err(ApiError::Rejected {
                message: message.to_string(),
            });
        }

        match parsed.get("slug").and_then(|s| s.as_str()) {
            Some(slug) => Ok(slug.to_string()),
            None => Err(ApiError::Rejected {
                message: "resolve response missing slug".to_string(),
            }),
        }
    }

    /// Report accumulated seconds. Best-effort by contract: callers log
    /// a failure and move on; nothing is queued or retried, and the
    /// response body is ignored.
    pub async fn send_playtime(
        &self,
        base_url: &str,
        report: &PlaytimeReport,
    ) -> Result<(), ApiError> {
        let url = format!("{base_url}/api/playtime");
        let body = serde_json::to_value(report)
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let resp = self.transport.post_json(&url, body).await?;

        if !resp.is_success() {
            return Err(ApiError::Rejected {
                message: format!("playtime endpoint returned {}", resp.status),
            });
        }
        Ok(())
    }
}

// ─── Tests ────────────────────────────────────────────────────────
