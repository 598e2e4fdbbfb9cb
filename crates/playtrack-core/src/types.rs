use serde::{Deserialize, Serialize};

// ─── Settings ─────────────────────────────────────────────────────

/// Base URL used when the settings store has no saved value.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// User id used when the settings store has no saved value.
pub const DEFAULT_USER_ID: i64 = 1;

/// User-editable configuration, re-read before each matching or network
/// operation. A running session keeps the snapshot taken at its start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub base_url: String,
    pub user_id: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_id: DEFAULT_USER_ID,
        }
    }
}

// ─── Game Mapping ─────────────────────────────────────────────────

/// Association between a normalized URL prefix and a game slug.
///
/// `url_prefix` is the natural key: at most one mapping per prefix.
/// Field names serialize in camelCase for wire and storage compatibility
/// with the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameMapping {
    pub url_prefix: String,
    pub game_slug: String,
    pub user_id: i64,
    pub base_url: String,
}

// ─── Page Metadata ────────────────────────────────────────────────

/// Optional page metadata harvested by the host page (og:title, icon,
/// description) and forwarded with a game registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ─── Tests ────────────────────────────────────────────────────────
