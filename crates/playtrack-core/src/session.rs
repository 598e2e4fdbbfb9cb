//! Active-session record and pure flush decisions.
//!
//! The coordinator owns at most one `ActiveSession` at a time
//! (`Option<ActiveSession>`); every field is mandatory, so the
//! all-present-or-idle invariant holds by construction. Flush decisions are
//! pure functions over an explicit `now` so they are deterministic in tests.

use chrono::{DateTime, Utc};

/// Minimum elapsed time before a coordinator flush is sent.
/// Debounce against rapid tab-flicker; below this the flush is a no-op
/// and the checkpoint is left untouched.
pub const FLUSH_MIN_ELAPSED_MS: i64 = 2000;

/// Minimum elapsed time before a dwell reporter sends a report.
pub const DWELL_MIN_ELAPSED_MS: i64 = 1000;

/// Coordinator safety-net flush interval (seconds).
pub const PERIODIC_FLUSH_INTERVAL_SECS: u64 = 10;

/// Dwell reporter safety-net flush interval (seconds).
pub const REPORTER_FLUSH_INTERVAL_SECS: u64 = 15;

/// The tab currently believed to be displaying a tracked game, and when
/// that belief began. `user_id` and `base_url` are snapshotted from the
/// settings at session start; flushes for this session use the snapshot
/// even if settings change while it is live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    pub tab_id: i64,
    pub started_at: DateTime<Utc>,
    pub url: String,
    pub game_slug: String,
    pub user_id: i64,
    pub base_url: String,
}

/// Outcome of evaluating a checkpoint against `now`.
///
/// `Skip` means nothing happens: no network call, no checkpoint mutation.
/// `Send` carries whole seconds (rounded to nearest); the caller reports
/// them and resets the checkpoint to `now` whether or not the send
/// succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushDecision {
    Skip,
    Send { seconds: i64 },
}

impl FlushDecision {
    /// Coordinator flush decision for an active session (2 s debounce).
    pub fn for_session(session: &ActiveSession, now: DateTime<Utc>) -> Self {
        Self::evaluate(session.started_at, now, FLUSH_MIN_ELAPSED_MS)
    }

    /// Dwell reporter decision for a page checkpoint (1 s minimum).
    pub fn for_dwell(started_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self::evaluate(started_at, now, DWELL_MIN_ELAPSED_MS)
    }

    fn evaluate(started_at: DateTime<Utc>, now: DateTime<Utc>, min_ms: i64) -> Self {
        let elapsed_ms = now.signed_duration_since(started_at).num_milliseconds();
        if elapsed_ms < min_ms {
            return Self::Skip;
        }
        // Round to nearest whole second.
        Self::Send {
            seconds: (elapsed_ms + 500) / 1000,
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────
