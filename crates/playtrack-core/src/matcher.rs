//! URL normalization and prefix matching against the stored mapping list.

use url::Url;

use crate::types::GameMapping;

/// Normalize a URL to `origin + path`, stripping query string and fragment.
///
/// Fail-soft: input that does not parse as an absolute URL is returned
/// unchanged. Normalizing twice is idempotent.
pub fn normalize(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(u) => format!("{}{}", u.origin().ascii_serialization(), u.path()),
        Err(_) => raw.to_string(),
    }
}

/// Find the mapping for a URL: the **first** mapping in stored order whose
/// `url_prefix` is a string prefix of the normalized URL.
///
/// Known limitation, preserved deliberately: no longest-prefix tie-break.
/// When two prefixes both match, stored order decides, so a broad prefix
/// inserted early shadows a more specific one inserted later.
pub fn match_mapping<'a>(raw: &str, mappings: &'a [GameMapping]) -> Option<&'a GameMapping> {
    let normalized = normalize(raw);
    mappings.iter().find(|m| normalized.starts_with(&m.url_prefix))
}

// ─── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(prefix: &str, slug: &str) -> GameMapping {
        GameMapping {
            url_prefix: prefix.to_string(),
            game_slug: slug.to_string(),
            user_id: 1,
            base_url: "http://localhost:3000".to_string(),
        }
    }

    // ── normalize ───────────────────────────────────────────────

    #[test]
    fn normalize_strips_query_and_fragment() {
        assert_eq!(
            normalize("https://x.com/game?level=3#boss"),
            "https://x.com/game"
        );
    }

    #[test]
    fn normalize_keeps_path() {
        assert_eq!(
            normalize("https://play.example.org/arcade/snake"),
            "https://play.example.org/arcade/snake"
        );
    }

    #[test]
    fn normalize_bare_host_gets_root_path() {
        assert_eq!(normalize("https://y.com"), "https://y.com/");
    }

    #[test]
    fn normalize_unparseable_returned_unchanged() {
        assert_eq!(normalize("not a url"), "not a url");
        assert_eq!(normalize("/relative/path"), "/relative/path");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn normalize_is_idempotent() {
        for raw in [
            "https://x.com/game?level=3",
            "https://y.com",
            "not a url",
            "http://a.b/c/d?e#f",
        ] {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "normalize(normalize({raw}))");
        }
    }

    #[test]
    fn normalize_drops_userinfo_but_keeps_port() {
        assert_eq!(
            normalize("http://user:pw@host.example:8080/p?q=1"),
            "http://host.example:8080/p"
        );
    }

    // ── match_mapping ───────────────────────────────────────────

    #[test]
    fn match_returns_none_on_empty_list() {
        assert!(match_mapping("https://x.com/game", &[]).is_none());
    }

    #[test]
    fn match_finds_prefix_of_normalized_url() {
        let mappings = vec![mapping("https://x.com/game", "abc")];
        let m = match_mapping("https://x.com/game?level=3", &mappings).expect("match");
        assert_eq!(m.game_slug, "abc");
    }

    #[test]
    fn match_result_is_true_prefix_of_normalized() {
        let mappings = vec![
            mapping("https://a.com/one", "one"),
            mapping("https://b.com/two", "two"),
        ];
        for raw in ["https://a.com/one/level?x=1", "https://b.com/two#frag"] {
            if let Some(m) = match_mapping(raw, &mappings) {
                assert!(normalize(raw).starts_with(&m.url_prefix));
            }
        }
    }

    #[test]
    fn match_requires_prefix_not_substring() {
        let mappings = vec![mapping("https://x.com/game", "abc")];
        assert!(match_mapping("https://evil.com/https://x.com/game", &mappings).is_none());
        assert!(match_mapping("https://x.com/other", &mappings).is_none());
    }

    #[test]
    fn first_match_in_stored_order_wins() {
        let mappings = vec![
            mapping("https://x.com/", "site-wide"),
            mapping("https://x.com/game", "game-specific"),
        ];
        let m = match_mapping("https://x.com/game/level/2", &mappings).expect("match");
        assert_eq!(m.game_slug, "site-wide");
    }

    #[test]
    fn earlier_mapping_wins_even_when_later_is_longer() {
        // Ordering hazard on purpose: matching is first-match-wins, not
        // longest-prefix. A broad prefix stored first shadows every
        // narrower prefix stored after it.
        let mappings = vec![
            mapping("https://hub.io/", "hub"),
            mapping("https://hub.io/games/chess", "chess"),
        ];
        let m = match_mapping("https://hub.io/games/chess", &mappings).expect("match");
        assert_eq!(m.game_slug, "hub", "stored order decides, not specificity");

        // With the order reversed, the specific mapping is reachable.
        let reversed: Vec<GameMapping> = mappings.into_iter().rev().collect();
        let m = match_mapping("https://hub.io/games/chess", &reversed).expect("match");
        assert_eq!(m.game_slug, "chess");
    }

    #[test]
    fn match_unparseable_url_uses_raw_string() {
        // Fail-soft normalize means raw strings still match raw prefixes.
        let mappings = vec![mapping("kiosk-local/games", "kiosk")];
        assert!(match_mapping("kiosk-local/games/snake", &mappings).is_some());
    }
}
