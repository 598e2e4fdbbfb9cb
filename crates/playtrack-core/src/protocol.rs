//! Wire protocol between page/host contexts and the coordinator.
//!
//! Every exchange is a request with exactly one response. Payload fields
//! serialize in camelCase to match the original host-message shapes.

use serde::{Deserialize, Serialize};

use crate::types::PageMeta;

// ─── Host events ──────────────────────────────────────────────────

/// `tab_focus_changed`: the host focused a tab (or finished navigating
/// one) showing `url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabFocusParams {
    pub tab_id: i64,
    pub url: String,
}

// ─── ADD_GAME ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddGameRequest {
    pub url: String,
    #[serde(default)]
    pub meta: PageMeta,
}

/// `{slug}` on success or `{error}` on failure; registration errors are
/// the one class that bubbles back to the initiating UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AddGameResponse {
    Registered { slug: String },
    Failed { error: String },
}

// ─── GET_MAPPING ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetMappingRequest {
    pub url: String,
}

// ─── TRACK_TIME ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackTimeRequest {
    pub game_slug: String,
    pub seconds: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackTimeResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl TrackTimeResponse {
    pub fn accepted() -> Self {
        Self {
            ok: true,
            reason: None,
        }
    }

    pub fn rejected(reason: &str) -> Self {
        Self {
            ok: false,
            reason: Some(reason.to_string()),
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_focus_params_camel_case() {
        let p = TabFocusParams {
            tab_id: 3,
            url: "https://x.com/game".into(),
        };
        let json = serde_json::to_value(&p).expect("serialize");
        assert_eq!(json["tabId"], 3);
        assert_eq!(json["url"], "https://x.com/game");
    }

    #[test]
    fn add_game_request_meta_defaults_when_absent() {
        let req: AddGameRequest =
            serde_json::from_str(r#"{"url":"https://y.com"}"#).expect("deserialize");
        assert_eq!(req.url, "https://y.com");
        assert_eq!(req.meta, PageMeta::default());
    }

    #[test]
    fn add_game_response_shapes() {
        let ok = AddGameResponse::Registered { slug: "y-game".into() };
        assert_eq!(
            serde_json::to_value(&ok).expect("serialize"),
            serde_json::json!({"slug": "y-game"})
        );

        let err = AddGameResponse::Failed { error: "URL required".into() };
        assert_eq!(
            serde_json::to_value(&err).expect("serialize"),
            serde_json::json!({"error": "URL required"})
        );
    }

    #[test]
    fn add_game_response_untagged_roundtrip() {
        let back: AddGameResponse =
            serde_json::from_str(r#"{"slug":"abc"}"#).expect("deserialize");
        assert_eq!(back, AddGameResponse::Registered { slug: "abc".into() });

        let back: AddGameResponse =
            serde_json::from_str(r#"{"error":"nope"}"#).expect("deserialize");
        assert_eq!(back, AddGameResponse::Failed { error: "nope".into() });
    }

    #[test]
    fn track_time_request_camel_case() {
        let req = TrackTimeRequest {
            game_slug: "abc".into(),
            seconds: 12,
        };
        let json = serde_json::to_value(&req).expect("serialize");
        assert_eq!(json["gameSlug"], "abc");
        assert_eq!(json["seconds"], 12);
    }

    #[test]
    fn track_time_response_omits_reason_when_ok() {
        let json = serde_json::to_value(TrackTimeResponse::accepted()).expect("serialize");
        assert_eq!(json, serde_json::json!({"ok": true}));

        let json = serde_json::to_value(TrackTimeResponse::rejected("no mapping"))
            .expect("serialize");
        assert_eq!(json, serde_json::json!({"ok": false, "reason": "no mapping"}));
    }
}
