//! `playtrack report <url>`: a page-host stand-in.
//!
//! Runs a dwell reporter for a page over the daemon socket: useful for
//! kiosk setups and for exercising the tracking path without a browser.
//! Flushes on the configured interval and once more on ctrl-c (the
//! unload analog, fire-and-forget).

use chrono::Utc;
use tokio::time::{Duration, interval};

use playtrack_core::{GameMapping, TrackTimeResponse};
use playtrack_session::{CoordinatorApi, DwellReporter};

use crate::client::rpc_call;

/// The coordinator seam, reached over the daemon's UDS socket.
pub(crate) struct DaemonClient {
    socket_path: String,
}

impl DaemonClient {
    pub(crate) fn new(socket_path: &str) -> Self {
        Self {
            socket_path: socket_path.to_string(),
        }
    }
}

impl CoordinatorApi for DaemonClient {
    async fn resolve_mapping(&self, url: &str) -> Option<GameMapping> {
        let result = rpc_call(
            &self.socket_path,
            "get_mapping",
            serde_json::json!({"url": url}),
        )
        .await
        .ok()?;
        // An unmapped URL answers `{}`, which simply fails to parse.
        serde_json::from_value(result).ok()
    }

    async fn record_time(&self, game_slug: &str, seconds: i64) -> TrackTimeResponse {
        let params = serde_json::json!({"gameSlug": game_slug, "seconds": seconds});
        match rpc_call(&self.socket_path, "track_time", params).await {
            Ok(result) => serde_json::from_value(result)
                .unwrap_or_else(|_| TrackTimeResponse::rejected("malformed daemon response")),
            Err(e) => TrackTimeResponse::rejected(&e.to_string()),
        }
    }
}

pub async fn cmd_report(socket_path: &str, url: &str, interval_secs: u64) -> anyhow::Result<()> {
    let client = DaemonClient::new(socket_path);
    let Some(mut reporter) = DwellReporter::attach(client, url, Utc::now()).await else {
        println!("{url} is not a tracked page (no mapping); nothing to report");
        return Ok(());
    };

    println!(
        "reporting dwell time for {} as '{}' every {interval_secs}s, ctrl-c to stop",
        url,
        reporter.game_slug()
    );

    let mut ticker = interval(Duration::from_secs(interval_secs));
    ticker.tick().await; // first tick fires immediately, skip it

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Some(resp) = reporter.flush(Utc::now()).await
                    && !resp.ok
                {
                    tracing::warn!(
                        reason = resp.reason.as_deref().unwrap_or("unknown"),
                        "daemon rejected dwell report"
                    );
                }
            }
            _ = tokio::signal::ctrl_c() => {
                // Unload analog: one last best-effort flush, result ignored.
                let _ = reporter.flush(Utc::now()).await;
                println!();
                break;
            }
        }
    }

    Ok(())
}
