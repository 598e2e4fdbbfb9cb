//! Session Coordinator: owns the single "currently active session" record.
//!
//! Runs as one actor task per process. Callers hold a cloneable
//! [`CoordinatorHandle`] and exchange typed requests for single responses
//! over an mpsc/oneshot pair; the task alone mutates session state, so no
//! lock guards it.
//!
//! Ordering invariant: when focus or navigation replaces the active
//! session, the outgoing session is flushed to completion (with its own
//! settings snapshot) before the record is overwritten or cleared.

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use playtrack_api::{ApiClient, ApiError, HttpPost, PlaytimeReport, ResolveRequest};
use playtrack_core::matcher::{match_mapping, normalize};
use playtrack_core::{ActiveSession, FlushDecision, GameMapping, PageMeta, TrackTimeResponse};
use playtrack_store::{MappingRepository, SettingsStore, StorageBackend, StoreError};

use crate::clock::{Clock, SystemClock};

/// Errors a game registration can surface to the initiating UI.
/// This is the one path where failures bubble all the way up.
#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("URL required")]
    UrlRequired,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("mapping store error: {0}")]
    Store(#[from] StoreError),
}

/// The coordinator task is gone (process shutting down).
#[derive(Debug, Error)]
#[error("session coordinator is gone")]
pub struct CoordinatorClosed;

/// What prompted a flush; diagnostic only.
#[derive(Debug, Clone, Copy)]
pub enum FlushTrigger {
    TabSwitch,
    WindowBlur,
    PeriodicTick,
}

impl FlushTrigger {
    fn as_str(self) -> &'static str {
        match self {
            Self::TabSwitch => "tab_switch",
            Self::WindowBlur => "window_blur",
            Self::PeriodicTick => "periodic_tick",
        }
    }
}

enum Request {
    TabFocusChanged {
        tab_id: i64,
        url: String,
        reply: oneshot::Sender<()>,
    },
    Flush {
        trigger: FlushTrigger,
        reply: oneshot::Sender<()>,
    },
    ResolveMapping {
        url: String,
        reply: oneshot::Sender<Option<GameMapping>>,
    },
    RecordExternalTime {
        game_slug: String,
        seconds: i64,
        reply: oneshot::Sender<TrackTimeResponse>,
    },
    RegisterGame {
        url: String,
        meta: PageMeta,
        reply: oneshot::Sender<Result<String, RegisterError>>,
    },
    CurrentSession {
        reply: oneshot::Sender<Option<ActiveSession>>,
    },
    ListMappings {
        reply: oneshot::Sender<Vec<GameMapping>>,
    },
}

// ─── Handle ───────────────────────────────────────────────────────

/// Cloneable client side of the coordinator channel.
#[derive(Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::Sender<Request>,
}

impl CoordinatorHandle {
    async fn request<R>(
        &self,
        build: impl FnOnce(oneshot::Sender<R>) -> Request,
    ) -> Result<R, CoordinatorClosed> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| CoordinatorClosed)?;
        rx.await.map_err(|_| CoordinatorClosed)
    }

    /// The host focused a tab (or a tab finished navigating) showing `url`.
    pub async fn tab_focus_changed(
        &self,
        tab_id: i64,
        url: &str,
    ) -> Result<(), CoordinatorClosed> {
        let url = url.to_string();
        self.request(|reply| Request::TabFocusChanged { tab_id, url, reply })
            .await
    }

    /// The browser window lost focus: flush without clearing, since the
    /// user may come straight back to the same tab.
    pub async fn window_blurred(&self) -> Result<(), CoordinatorClosed> {
        self.request(|reply| Request::Flush {
            trigger: FlushTrigger::WindowBlur,
            reply,
        })
        .await
    }

    /// Safety-net flush so a long-lived session is not lost entirely when
    /// focus never changes. Same effect as a window blur.
    pub async fn periodic_flush(&self) -> Result<(), CoordinatorClosed> {
        self.request(|reply| Request::Flush {
            trigger: FlushTrigger::PeriodicTick,
            reply,
        })
        .await
    }

    /// Read-only mapping lookup so reporters never duplicate matching
    /// logic.
    pub async fn resolve_mapping(
        &self,
        url: &str,
    ) -> Result<Option<GameMapping>, CoordinatorClosed> {
        let url = url.to_string();
        self.request(|reply| Request::ResolveMapping { url, reply })
            .await
    }

    /// A page-local measurement of visible seconds, reported directly and
    /// bypassing the active session.
    pub async fn record_external_time(
        &self,
        game_slug: &str,
        seconds: i64,
    ) -> Result<TrackTimeResponse, CoordinatorClosed> {
        let game_slug = game_slug.to_string();
        self.request(|reply| Request::RecordExternalTime {
            game_slug,
            seconds,
            reply,
        })
        .await
    }

    /// Register a game for `url` via the remote resolve endpoint and
    /// persist the mapping on success.
    pub async fn register_game(
        &self,
        url: &str,
        meta: PageMeta,
    ) -> Result<Result<String, RegisterError>, CoordinatorClosed> {
        let url = url.to_string();
        self.request(|reply| Request::RegisterGame { url, meta, reply })
            .await
    }

    /// Snapshot of the current active session, for status output.
    pub async fn current_session(&self) -> Result<Option<ActiveSession>, CoordinatorClosed> {
        self.request(|reply| Request::CurrentSession { reply }).await
    }

    /// The full persisted mapping list, for status/listing surfaces.
    pub async fn list_mappings(&self) -> Result<Vec<GameMapping>, CoordinatorClosed> {
        self.request(|reply| Request::ListMappings { reply }).await
    }
}

// ─── Coordinator ──────────────────────────────────────────────────

pub struct Coordinator<B, T, C = SystemClock> {
    mappings: MappingRepository<B>,
    settings: SettingsStore<B>,
    api: ApiClient<T>,
    clock: C,
    active: Option<ActiveSession>,
}

impl<B, T> Coordinator<B, T, SystemClock>
where
    B: StorageBackend + 'static,
    T: HttpPost + 'static,
{
    /// Spawn the coordinator task with the system clock.
    pub fn spawn(
        mappings: MappingRepository<B>,
        settings: SettingsStore<B>,
        api: ApiClient<T>,
    ) -> (CoordinatorHandle, tokio::task::JoinHandle<()>) {
        Self::spawn_with_clock(mappings, settings, api, SystemClock)
    }
}

impl<B, T, C> Coordinator<B, T, C>
where
    B: StorageBackend + 'static,
    T: HttpPost + 'static,
    C: Clock,
{
    pub fn spawn_with_clock(
        mappings: MappingRepository<B>,
        settings: SettingsStore<B>,
        api: ApiClient<T>,
        clock: C,
    ) -> (CoordinatorHandle, tokio::task::JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(32);
        let coordinator = Self {
            mappings,
            settings,
            api,
            clock,
            active: None,
        };
        let join = tokio::spawn(coordinator.run(rx));
        (CoordinatorHandle { tx }, join)
    }

    async fn run(mut self, mut rx: mpsc::Receiver<Request>) {
        while let Some(request) = rx.recv().await {
            self.handle(request).await;
        }
        tracing::debug!("coordinator channel closed, exiting");
    }

    async fn handle(&mut self, request: Request) {
        match request {
            Request::TabFocusChanged { tab_id, url, reply } => {
                self.on_tab_focus(tab_id, url).await;
                let _ = reply.send(());
            }
            Request::Flush { trigger, reply } => {
                self.flush_active(trigger).await;
                let _ = reply.send(());
            }
            Request::ResolveMapping { url, reply } => {
                let _ = reply.send(self.resolve_mapping(&url).await);
            }
            Request::RecordExternalTime {
                game_slug,
                seconds,
                reply,
            } => {
                let _ = reply.send(self.record_external_time(&game_slug, seconds).await);
            }
            Request::RegisterGame { url, meta, reply } => {
                let _ = reply.send(self.register_game(&url, meta).await);
            }
            Request::CurrentSession { reply } => {
                let _ = reply.send(self.active.clone());
            }
            Request::ListMappings { reply } => {
                let mappings = self.load_mappings().await.unwrap_or_else(|e| {
                    tracing::warn!("mapping store unavailable: {e}");
                    Vec::new()
                });
                let _ = reply.send(mappings);
            }
        }
    }

    // ── Store access (sync backends, driven off the actor thread) ──

    async fn load_mappings(&self) -> Result<Vec<GameMapping>, StoreError> {
        let repo = self.mappings.clone();
        tokio::task::spawn_blocking(move || repo.list())
            .await
            .map_err(|e| StoreError::Io(std::io::Error::other(e)))?
    }

    async fn load_settings(&self) -> Result<playtrack_core::Settings, StoreError> {
        let settings = self.settings.clone();
        tokio::task::spawn_blocking(move || settings.load())
            .await
            .map_err(|e| StoreError::Io(std::io::Error::other(e)))?
    }

    async fn upsert_mapping(&self, mapping: GameMapping) -> Result<(), StoreError> {
        let repo = self.mappings.clone();
        tokio::task::spawn_blocking(move || repo.upsert(mapping))
            .await
            .map_err(|e| StoreError::Io(std::io::Error::other(e)))?
    }

    // ── Operations ─────────────────────────────────────────────

    async fn on_tab_focus(&mut self, tab_id: i64, url: String) {
        let settings = match self.load_settings().await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("settings unavailable, keeping current session: {e}");
                return;
            }
        };
        let mappings = match self.load_mappings().await {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("mapping store unavailable, keeping current session: {e}");
                return;
            }
        };

        // Flush the outgoing session under its own snapshot before the
        // record is replaced or cleared.
        self.flush_active(FlushTrigger::TabSwitch).await;

        match match_mapping(&url, &mappings) {
            None => {
                if self.active.take().is_some() {
                    tracing::debug!(tab_id, "focused untracked page, session idle");
                }
            }
            Some(mapping) => {
                tracing::debug!(tab_id, slug = %mapping.game_slug, "session started");
                self.active = Some(ActiveSession {
                    tab_id,
                    started_at: self.clock.now(),
                    url,
                    game_slug: mapping.game_slug.clone(),
                    user_id: settings.user_id,
                    base_url: settings.base_url,
                });
            }
        }
    }

    /// Flush the active session if one exists and it is old enough.
    ///
    /// Below the debounce threshold nothing happens at all. Otherwise the
    /// elapsed seconds are sent best-effort: the result is logged and
    /// discarded by design (losing one interval beats blocking or
    /// unbounded retry queues). The checkpoint is reset to now either
    /// way, so the next flush measures only new time.
    async fn flush_active(&mut self, trigger: FlushTrigger) {
        let Some(session) = self.active.as_mut() else {
            return;
        };
        let now = self.clock.now();
        match FlushDecision::for_session(session, now) {
            FlushDecision::Skip => {}
            FlushDecision::Send { seconds } => {
                let report = PlaytimeReport {
                    user_id: session.user_id,
                    game_slug: session.game_slug.clone(),
                    seconds,
                };
                if let Err(e) = self.api.send_playtime(&session.base_url, &report).await {
                    tracing::warn!(
                        trigger = trigger.as_str(),
                        slug = %report.game_slug,
                        "playtime flush failed: {e}"
                    );
                }
                session.started_at = now;
            }
        }
    }

    async fn resolve_mapping(&self, url: &str) -> Option<GameMapping> {
        match self.load_mappings().await {
            Ok(mappings) => match_mapping(url, &mappings).cloned(),
            Err(e) => {
                tracing::warn!("mapping store unavailable: {e}");
                None
            }
        }
    }

    async fn record_external_time(&self, game_slug: &str, seconds: i64) -> TrackTimeResponse {
        let mappings = match self.load_mappings().await {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("mapping store unavailable: {e}");
                return TrackTimeResponse::rejected("store unavailable");
            }
        };
        if !mappings.iter().any(|m| m.game_slug == game_slug) {
            return TrackTimeResponse::rejected("no mapping");
        }
        if seconds <= 0 {
            return TrackTimeResponse::rejected("no time");
        }

        let settings = match self.load_settings().await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("settings unavailable: {e}");
                return TrackTimeResponse::rejected("store unavailable");
            }
        };

        let report = PlaytimeReport {
            user_id: settings.user_id,
            game_slug: game_slug.to_string(),
            seconds,
        };
        // Best-effort like every playtime send: the page already measured
        // the time; a delivery failure is not the reporter's problem.
        if let Err(e) = self.api.send_playtime(&settings.base_url, &report).await {
            tracing::warn!(slug = game_slug, "external playtime report failed: {e}");
        }
        TrackTimeResponse::accepted()
    }

    async fn register_game(&self, url: &str, meta: PageMeta) -> Result<String, RegisterError> {
        if url.trim().is_empty() {
            return Err(RegisterError::UrlRequired);
        }

        let settings = self.load_settings().await?;
        let request = ResolveRequest {
            url: url.to_string(),
            user_id: settings.user_id,
            meta,
        };
        let slug = self.api.resolve_game(&settings.base_url, &request).await?;

        let mapping = GameMapping {
            url_prefix: normalize(url),
            game_slug: slug.clone(),
            user_id: settings.user_id,
            base_url: settings.base_url,
        };
        self.upsert_mapping(mapping).await?;
        tracing::info!(slug = %slug, "game registered");
        Ok(slug)
    }
}

// ─── Tests ────────────────────────────────────────────────────────
