//! Dwell Reporter: per-page visible-time measurement.
//!
//! One instance per tracked page, alive only while the page is open. The
//! page's own measurement can beat tab-focus heuristics (a visible but
//! unfocused window still counts), so reports bypass the active session
//! and go through `record_external_time`, where the coordinator
//! re-validates before touching the network.
//!
//! The host drives [`DwellReporter::flush`] on three triggers: the page
//! becoming hidden, page unload (best-effort; delivery at unload time is
//! not guaranteed), and a 15 s interval for pages left open and visible
//! indefinitely.

use std::future::Future;

use chrono::{DateTime, Utc};

use playtrack_core::{FlushDecision, GameMapping, TrackTimeResponse};

use crate::coordinator::CoordinatorHandle;

/// The coordinator as seen from a page context. Implemented by the
/// in-process handle and by the runtime's socket client, so a reporter
/// works the same on either side of the process boundary.
pub trait CoordinatorApi: Send + Sync {
    fn resolve_mapping(
        &self,
        url: &str,
    ) -> impl Future<Output = Option<GameMapping>> + Send;

    fn record_time(
        &self,
        game_slug: &str,
        seconds: i64,
    ) -> impl Future<Output = TrackTimeResponse> + Send;
}

impl CoordinatorApi for CoordinatorHandle {
    async fn resolve_mapping(&self, url: &str) -> Option<GameMapping> {
        match CoordinatorHandle::resolve_mapping(self, url).await {
            Ok(mapping) => mapping,
            Err(e) => {
                tracing::warn!("mapping lookup failed: {e}");
                None
            }
        }
    }

    async fn record_time(&self, game_slug: &str, seconds: i64) -> TrackTimeResponse {
        match self.record_external_time(game_slug, seconds).await {
            Ok(resp) => resp,
            Err(e) => TrackTimeResponse::rejected(&e.to_string()),
        }
    }
}

pub struct DwellReporter<A> {
    api: A,
    game_slug: String,
    started_at: DateTime<Utc>,
}

impl<A: CoordinatorApi> DwellReporter<A> {
    /// Attach a reporter to a page. Returns `None` when the URL has no
    /// mapping; an unmapped page gets no timer and no listeners.
    pub async fn attach(api: A, url: &str, now: DateTime<Utc>) -> Option<Self> {
        let mapping = api.resolve_mapping(url).await?;
        tracing::debug!(slug = %mapping.game_slug, "dwell reporter attached");
        Some(Self {
            api,
            game_slug: mapping.game_slug,
            started_at: now,
        })
    }

    pub fn game_slug(&self) -> &str {
        &self.game_slug
    }

    /// Report time elapsed since the last checkpoint.
    ///
    /// Under one second: nothing happens, the checkpoint stays. Otherwise
    /// the rounded seconds are reported and the checkpoint resets to
    /// `now` whatever the coordinator answered; the page should never
    /// re-report an interval.
    pub async fn flush(&mut self, now: DateTime<Utc>) -> Option<TrackTimeResponse> {
        match FlushDecision::for_dwell(self.started_at, now) {
            FlushDecision::Skip => None,
            FlushDecision::Send { seconds } => {
                let resp = self.api.record_time(&self.game_slug, seconds).await;
                if !resp.ok {
                    tracing::warn!(
                        slug = %self.game_slug,
                        reason = resp.reason.as_deref().unwrap_or("unknown"),
                        "dwell report rejected"
                    );
                }
                self.started_at = now;
                Some(resp)
            }
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────
