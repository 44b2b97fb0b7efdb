//! "Continue listening" record.
//!
//! A single record lives under `LAST_PLAYED_KEY`; the most recent write wins
//! regardless of which chapter it belongs to.

use crate::store::{KeyValueStore, LAST_PLAYED_KEY, load_json, save_json};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRecord {
    pub chapter_id: u32,
    pub position_ms: u64,
    #[serde(default)]
    pub verse_number: Option<u32>,
    pub saved_at: DateTime<Utc>,
}

impl ResumeRecord {
    pub fn new(chapter_id: u32, position_ms: u64, verse_number: Option<u32>) -> Self {
        Self {
            chapter_id,
            position_ms,
            verse_number,
            saved_at: Utc::now(),
        }
    }
}

/// Stored record, or `None` when missing or unreadable.
pub async fn load_resume<S: KeyValueStore + ?Sized>(store: &S) -> Option<ResumeRecord> {
    match load_json::<ResumeRecord, _>(store, LAST_PLAYED_KEY).await {
        Ok(record) => record,
        Err(err) => {
            warn!(error = %format!("{err:#}"), "Ignoring unreadable resume record");
            None
        }
    }
}

pub async fn save_resume<S: KeyValueStore + ?Sized>(store: &S, record: &ResumeRecord) -> Result<()> {
    save_json(store, LAST_PLAYED_KEY, record).await?;
    debug!(
        chapter_id = record.chapter_id,
        position_ms = record.position_ms,
        verse_number = ?record.verse_number,
        "Saved resume record"
    );
    Ok(())
}

/// Saved position for `chapter_id`, or 0 when the record belongs elsewhere.
pub async fn resume_offset_for<S: KeyValueStore + ?Sized>(store: &S, chapter_id: u32) -> u64 {
    load_resume(store)
        .await
        .filter(|record| record.chapter_id == chapter_id)
        .map(|record| record.position_ms)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn offset_only_applies_to_matching_chapter() {
        let store = MemoryStore::new();
        save_resume(&store, &ResumeRecord::new(18, 42_000, Some(7)))
            .await
            .expect("save");

        assert_eq!(resume_offset_for(&store, 18).await, 42_000);
        assert_eq!(resume_offset_for(&store, 19).await, 0);
    }

    #[tokio::test]
    async fn later_writes_replace_earlier_ones() {
        let store = MemoryStore::new();
        save_resume(&store, &ResumeRecord::new(2, 5_000, None))
            .await
            .expect("save");
        save_resume(&store, &ResumeRecord::new(3, 9_000, Some(1)))
            .await
            .expect("save");

        let record = load_resume(&store).await.expect("record");
        assert_eq!(record.chapter_id, 3);
        assert_eq!(resume_offset_for(&store, 2).await, 0);
    }

    #[tokio::test]
    async fn corrupt_records_degrade_to_zero() {
        let store = MemoryStore::new();
        store.set(LAST_PLAYED_KEY, "not json").await.expect("set");
        assert_eq!(load_resume(&store).await, None);
        assert_eq!(resume_offset_for(&store, 1).await, 0);
    }

    #[test]
    fn serializes_camel_case_with_rfc3339_timestamp() {
        let record = ResumeRecord {
            chapter_id: 36,
            position_ms: 61_500,
            verse_number: Some(12),
            saved_at: DateTime::parse_from_rfc3339("2024-05-01T08:30:00Z")
                .expect("timestamp")
                .with_timezone(&Utc),
        };
        let json = serde_json::to_string(&record).expect("encode");
        assert!(json.contains("\"chapterId\":36"));
        assert!(json.contains("\"positionMs\":61500"));
        assert!(json.contains("\"savedAt\":\"2024-05-01T08:30:00Z\""));
    }
}
