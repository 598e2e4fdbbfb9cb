//! Mapping repository: the persisted, ordered list of game mappings.

use std::sync::Arc;

use playtrack_core::GameMapping;

use crate::backend::{StorageBackend, StoreError};

/// Storage key holding the ordered mapping array.
pub const MAPPINGS_KEY: &str = "playtrack.trackedGames";

/// Load/upsert access to the mapping list. Insertion order is preserved:
/// matching walks the list front to back, so order is part of the data.
///
/// Not guarded by any lock. Concurrent upserts race and the later write
/// wins; additions are user-initiated and infrequent.
pub struct MappingRepository<B> {
    backend: Arc<B>,
}

impl<B> Clone for MappingRepository<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: StorageBackend> MappingRepository<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Full persisted list in insertion order; empty when nothing is stored.
    pub fn list(&self) -> Result<Vec<GameMapping>, StoreError> {
        match self.backend.get(MAPPINGS_KEY)? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }

    /// Replace the mapping with the same `url_prefix` in place (position
    /// preserved), or append when the prefix is new.
    pub fn upsert(&self, mapping: GameMapping) -> Result<(), StoreError> {
        let mut entries = self.list()?;
        match entries.iter_mut().find(|e| e.url_prefix == mapping.url_prefix) {
            Some(existing) => *existing = mapping,
            None => entries.push(mapping),
        }
        self.backend
            .set(MAPPINGS_KEY, serde_json::to_value(&entries)?)
    }
}

// ─── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryStore;

    fn mapping(prefix: &str, slug: &str) -> GameMapping {
        GameMapping {
            url_prefix: prefix.to_string(),
            game_slug: slug.to_string(),
            user_id: 1,
            base_url: "http://localhost:3000".to_string(),
        }
    }

    fn repo() -> MappingRepository<MemoryStore> {
        MappingRepository::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn list_empty_when_nothing_stored() {
        assert!(repo().list().expect("list").is_empty());
    }

    #[test]
    fn upsert_new_prefix_appends() {
        let repo = repo();
        repo.upsert(mapping("https://a.com/", "a")).expect("upsert");
        repo.upsert(mapping("https://b.com/", "b")).expect("upsert");

        let entries = repo.list().expect("list");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].game_slug, "a");
        assert_eq!(entries[1].game_slug, "b");
    }

    #[test]
    fn upsert_existing_prefix_replaces_in_place() {
        let repo = repo();
        repo.upsert(mapping("https://a.com/", "a")).expect("upsert");
        repo.upsert(mapping("https://b.com/", "b")).expect("upsert");

        let mut updated = mapping("https://a.com/", "a-renamed");
        updated.user_id = 9;
        repo.upsert(updated).expect("upsert");

        let entries = repo.list().expect("list");
        assert_eq!(entries.len(), 2, "count unchanged on replace");
        assert_eq!(entries[0].url_prefix, "https://a.com/", "position preserved");
        assert_eq!(entries[0].game_slug, "a-renamed");
        assert_eq!(entries[0].user_id, 9);
        assert_eq!(entries[1].game_slug, "b");
    }

    #[test]
    fn insertion_order_survives_storage_roundtrip() {
        let repo = repo();
        for (i, host) in ["z", "m", "a"].iter().enumerate() {
            repo.upsert(mapping(&format!("https://{host}.com/"), &format!("g{i}")))
                .expect("upsert");
        }
        let slugs: Vec<String> = repo
            .list()
            .expect("list")
            .into_iter()
            .map(|m| m.game_slug)
            .collect();
        assert_eq!(slugs, ["g0", "g1", "g2"], "stored order, not key order");
    }
}
