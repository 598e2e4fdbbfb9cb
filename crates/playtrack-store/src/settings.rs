//! Settings store: the `{baseUrl, userId}` blob.
//!
//! Read on demand before each matching or network operation rather than
//! cached for the process lifetime, so edits apply from the next operation
//! onward. Missing or malformed fields fall back to the defaults
//! individually.

use std::sync::Arc;

use serde::Deserialize;

use playtrack_core::Settings;
use playtrack_core::types::{DEFAULT_BASE_URL, DEFAULT_USER_ID};

use crate::backend::{StorageBackend, StoreError};

/// Storage key holding the settings blob.
pub const SETTINGS_KEY: &str = "playtrack.settings";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSettings {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    user_id: Option<i64>,
}

pub struct SettingsStore<B> {
    backend: Arc<B>,
}

impl<B> Clone for SettingsStore<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: StorageBackend> SettingsStore<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Current settings, with per-field defaults for anything absent.
    /// A blob that fails to parse entirely is treated as absent.
    pub fn load(&self) -> Result<Settings, StoreError> {
        let stored = match self.backend.get(SETTINGS_KEY)? {
            Some(value) => serde_json::from_value::<StoredSettings>(value).unwrap_or_else(|e| {
                tracing::warn!("ignoring malformed settings blob: {e}");
                StoredSettings::default()
            }),
            None => StoredSettings::default(),
        };

        Ok(Settings {
            base_url: stored
                .base_url
                .filter(|u| !u.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            user_id: stored.user_id.unwrap_or(DEFAULT_USER_ID),
        })
    }

    pub fn save(&self, settings: &Settings) -> Result<(), StoreError> {
        self.backend
            .set(SETTINGS_KEY, serde_json::to_value(settings)?)
    }
}

// ─── Tests ────────────────────────────────────────────────────────
