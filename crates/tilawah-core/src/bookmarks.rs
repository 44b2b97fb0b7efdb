use crate::store::{BOOKMARKS_KEY, KeyValueStore, load_json, save_json};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// A saved verse. Older records may lack `createdAt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: String,
    pub surah_id: u32,
    pub verse_id: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Bookmark {
    pub fn new(surah_id: u32, verse_id: u32) -> Self {
        Self {
            id: bookmark_id(surah_id, verse_id),
            surah_id,
            verse_id,
            created_at: Some(Utc::now()),
        }
    }
}

pub fn bookmark_id(surah_id: u32, verse_id: u32) -> String {
    format!("{surah_id}:{verse_id}")
}

pub async fn load_bookmarks<S: KeyValueStore + ?Sized>(store: &S) -> Result<Vec<Bookmark>> {
    Ok(load_json(store, BOOKMARKS_KEY).await?.unwrap_or_default())
}

/// Appends a bookmark unless the same verse is already saved. Returns the
/// stored entry either way.
pub async fn add_bookmark<S: KeyValueStore + ?Sized>(
    store: &S,
    surah_id: u32,
    verse_id: u32,
) -> Result<Bookmark> {
    let mut bookmarks = load_bookmarks(store).await?;
    if let Some(existing) = bookmarks
        .iter()
        .find(|b| b.surah_id == surah_id && b.verse_id == verse_id)
    {
        return Ok(existing.clone());
    }
    let bookmark = Bookmark::new(surah_id, verse_id);
    bookmarks.push(bookmark.clone());
    save_json(store, BOOKMARKS_KEY, &bookmarks).await?;
    info!(surah_id, verse_id, total = bookmarks.len(), "Added bookmark");
    Ok(bookmark)
}

/// Returns whether a bookmark with `id` existed.
pub async fn remove_bookmark<S: KeyValueStore + ?Sized>(store: &S, id: &str) -> Result<bool> {
    let mut bookmarks = load_bookmarks(store).await?;
    let before = bookmarks.len();
    bookmarks.retain(|b| b.id != id);
    if bookmarks.len() == before {
        return Ok(false);
    }
    save_json(store, BOOKMARKS_KEY, &bookmarks).await?;
    info!(id, total = bookmarks.len(), "Removed bookmark");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn adding_same_verse_twice_keeps_one_entry() {
        let store = MemoryStore::new();
        let first = add_bookmark(&store, 2, 255).await.expect("add");
        let second = add_bookmark(&store, 2, 255).await.expect("add again");
        assert_eq!(first, second);
        assert_eq!(first.id, "2:255");

        let bookmarks = load_bookmarks(&store).await.expect("load");
        assert_eq!(bookmarks.len(), 1);
    }

    #[tokio::test]
    async fn remove_reports_whether_anything_changed() {
        let store = MemoryStore::new();
        add_bookmark(&store, 1, 1).await.expect("add");
        add_bookmark(&store, 36, 58).await.expect("add");

        assert!(remove_bookmark(&store, "1:1").await.expect("remove"));
        assert!(!remove_bookmark(&store, "1:1").await.expect("remove again"));

        let ids: Vec<String> = load_bookmarks(&store)
            .await
            .expect("load")
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(ids, vec!["36:58".to_string()]);
    }

    #[tokio::test]
    async fn reads_records_without_timestamps() {
        let store = MemoryStore::new();
        store
            .set(BOOKMARKS_KEY, r#"[{"id":"112:1","surahId":112,"verseId":1}]"#)
            .await
            .expect("set");
        let bookmarks = load_bookmarks(&store).await.expect("load");
        assert_eq!(bookmarks[0].surah_id, 112);
        assert_eq!(bookmarks[0].created_at, None);
    }
}
