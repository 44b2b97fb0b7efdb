//! Chapter data and the per-chapter timing table.
//!
//! The library is loaded once from a JSON array (one object per chapter) and
//! is never mutated afterwards. Timing invariants are checked only so that a
//! warning can be logged; lookups over a malformed table simply find nothing.

use crate::engine::Track;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Anything with a half-open `[start_ms, end_ms)` range on the recitation
/// timeline.
pub trait TimeRange {
    fn start_ms(&self) -> u64;
    fn end_ms(&self) -> u64;

    fn contains(&self, position_ms: u64) -> bool {
        self.start_ms() <= position_ms && position_ms < self.end_ms()
    }
}

/// Index of the first range containing `position_ms`.
///
/// Linear on purpose: tables are small and may be unsorted or overlapping
/// when the source data is bad, and the first match is still well defined.
pub fn find_range<T: TimeRange>(ranges: &[T], position_ms: u64) -> Option<usize> {
    ranges.iter().position(|range| range.contains(position_ms))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerseTiming {
    #[serde(alias = "verse_id", alias = "id")]
    pub verse_id: u32,
    #[serde(alias = "start_ms", alias = "start")]
    pub start_ms: u64,
    #[serde(alias = "end_ms", alias = "end")]
    pub end_ms: u64,
}

impl TimeRange for VerseTiming {
    fn start_ms(&self) -> u64 {
        self.start_ms
    }

    fn end_ms(&self) -> u64 {
        self.end_ms
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentTiming {
    #[serde(alias = "start_ms", alias = "start")]
    pub start_ms: u64,
    #[serde(alias = "end_ms", alias = "end")]
    pub end_ms: u64,
}

impl TimeRange for SegmentTiming {
    fn start_ms(&self) -> u64 {
        self.start_ms
    }

    fn end_ms(&self) -> u64 {
        self.end_ms
    }
}

/// One numbered verse ("ayah").
///
/// `segment_timings` live on the same preamble-adjusted timeline as the
/// chapter's verse timings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verse {
    pub id: u32,
    #[serde(default, alias = "segement")]
    pub segments: Vec<String>,
    #[serde(default, alias = "segment_timings")]
    pub segment_timings: Option<Vec<SegmentTiming>>,
    #[serde(default)]
    pub translation_en: Option<String>,
    #[serde(default)]
    pub translation_ur: Option<String>,
    #[serde(default, alias = "transilerationEn")]
    pub transliteration_en: Option<String>,
}

impl Verse {
    pub fn text(&self) -> String {
        self.segments.join(" ")
    }
}

/// One recitable chapter ("surah").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub transliteration: String,
    #[serde(default)]
    pub translation: String,
    #[serde(default, rename = "bismillah_pre")]
    pub has_preamble: bool,
    #[serde(default)]
    pub verses: Vec<Verse>,
    #[serde(default)]
    pub verse_timings: Vec<VerseTiming>,
}

impl Chapter {
    pub fn verse(&self, verse_id: u32) -> Option<&Verse> {
        let idx = usize::try_from(verse_id.checked_sub(1)?).ok()?;
        match self.verses.get(idx) {
            Some(verse) if verse.id == verse_id => Some(verse),
            _ => self.verses.iter().find(|verse| verse.id == verse_id),
        }
    }

    pub fn verse_timing(&self, verse_id: u32) -> Option<&VerseTiming> {
        self.verse_timings
            .iter()
            .find(|timing| timing.verse_id == verse_id)
    }

    pub fn verse_count(&self) -> usize {
        self.verses.len()
    }

    /// End of the last timed verse, on the adjusted timeline.
    pub fn recitation_end_ms(&self) -> u64 {
        self.verse_timings
            .iter()
            .map(|timing| timing.end_ms)
            .max()
            .unwrap_or(0)
    }

    pub fn timing_issues(&self) -> Vec<TimingIssue> {
        let mut issues = Vec::new();
        if self.verse_timings.len() != self.verses.len() {
            issues.push(TimingIssue::CountMismatch {
                verses: self.verses.len(),
                timings: self.verse_timings.len(),
            });
        }
        for timing in &self.verse_timings {
            if timing.start_ms >= timing.end_ms {
                issues.push(TimingIssue::EmptyRange {
                    verse_id: timing.verse_id,
                });
            }
        }
        for pair in self.verse_timings.windows(2) {
            if pair[0].end_ms > pair[1].start_ms {
                issues.push(TimingIssue::Overlap {
                    verse_id: pair[1].verse_id,
                });
            }
        }
        issues
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingIssue {
    CountMismatch { verses: usize, timings: usize },
    EmptyRange { verse_id: u32 },
    Overlap { verse_id: u32 },
}

impl fmt::Display for TimingIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimingIssue::CountMismatch { verses, timings } => {
                write!(f, "{verses} verses but {timings} timing ranges")
            }
            TimingIssue::EmptyRange { verse_id } => {
                write!(f, "verse {verse_id} has an empty or inverted range")
            }
            TimingIssue::Overlap { verse_id } => {
                write!(f, "verse {verse_id} starts before the previous range ends")
            }
        }
    }
}

/// All chapters, ordered by id.
#[derive(Debug, Clone, Default)]
pub struct Library {
    chapters: Vec<Chapter>,
}

impl Library {
    pub fn new(mut chapters: Vec<Chapter>) -> Self {
        chapters.sort_by_key(|chapter| chapter.id);
        for chapter in &chapters {
            for issue in chapter.timing_issues() {
                warn!(chapter_id = chapter.id, %issue, "Inconsistent timing table");
            }
        }
        Self { chapters }
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    pub fn chapter(&self, chapter_id: u32) -> Option<&Chapter> {
        self.index_of(chapter_id).map(|idx| &self.chapters[idx])
    }

    pub fn index_of(&self, chapter_id: u32) -> Option<usize> {
        self.chapters
            .binary_search_by_key(&chapter_id, |chapter| chapter.id)
            .ok()
    }

    pub fn chapter_at(&self, index: usize) -> Option<&Chapter> {
        self.chapters.get(index)
    }

    /// Playback queue with one track per chapter, in library order.
    pub fn tracks(&self, audio_base_url: &str) -> Vec<Track> {
        self.chapters
            .iter()
            .map(|chapter| Track::for_chapter(chapter, audio_base_url))
            .collect()
    }
}

pub fn parse_library(json: &str) -> Result<Library> {
    let chapters: Vec<Chapter> =
        serde_json::from_str(json).context("Invalid chapter data JSON")?;
    debug!(chapters = chapters.len(), "Parsed chapter data");
    Ok(Library::new(chapters))
}

pub fn load_library(path: &Path) -> Result<Library> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read chapter data from {}", path.display()))?;
    let library = parse_library(&contents)
        .with_context(|| format!("Failed to load chapter data from {}", path.display()))?;
    info!(
        path = %path.display(),
        chapters = library.len(),
        "Loaded chapter library"
    );
    Ok(library)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {
            "id": 2,
            "name": "البقرة",
            "transliteration": "Al-Baqarah",
            "translation": "The Cow",
            "total_verses": 2,
            "bismillah_pre": true,
            "verse_timings": [
                { "verseId": 1, "startMs": 0, "endMs": 1500 },
                { "verse_id": 2, "start": 1500, "end": 4000 }
            ],
            "verses": [
                { "id": 1, "segement": ["الم"], "translationEn": "Alif, Lam, Meem." },
                {
                    "id": 2,
                    "segments": ["ذَٰلِكَ", "ٱلْكِتَٰبُ"],
                    "segmentTimings": [{ "startMs": 1500, "endMs": 2500 }, { "startMs": 2500, "endMs": 4000 }],
                    "transilerationEn": "Dhalika alkitabu"
                }
            ]
        },
        { "id": 1, "transliteration": "Al-Fatihah", "verses": [], "verse_timings": [] }
    ]"#;

    #[test]
    fn parses_original_field_names_and_sorts_by_id() {
        let library = parse_library(SAMPLE).expect("sample should parse");
        assert_eq!(library.len(), 2);
        assert_eq!(library.chapter_at(0).map(|c| c.id), Some(1));

        let chapter = library.chapter(2).expect("chapter 2");
        assert!(chapter.has_preamble);
        assert_eq!(chapter.verse_timings[1].start_ms, 1500);
        assert_eq!(chapter.verses[0].segments, vec!["الم".to_string()]);
        assert_eq!(
            chapter.verses[1].transliteration_en.as_deref(),
            Some("Dhalika alkitabu")
        );
        assert_eq!(
            chapter.verses[1].segment_timings.as_ref().map(Vec::len),
            Some(2)
        );
    }

    #[test]
    fn index_lookup_follows_chapter_order() {
        let library = parse_library(SAMPLE).expect("sample should parse");
        assert_eq!(library.index_of(1), Some(0));
        assert_eq!(library.index_of(2), Some(1));
        assert_eq!(library.index_of(114), None);
    }

    #[test]
    fn find_range_uses_half_open_ranges() {
        let ranges = [
            VerseTiming {
                verse_id: 1,
                start_ms: 0,
                end_ms: 1000,
            },
            VerseTiming {
                verse_id: 2,
                start_ms: 1000,
                end_ms: 2500,
            },
        ];
        assert_eq!(find_range(&ranges, 999), Some(0));
        assert_eq!(find_range(&ranges, 1000), Some(1));
        assert_eq!(find_range(&ranges, 2500), None);
    }

    #[test]
    fn reports_timing_issues_without_rejecting() {
        let chapter = Chapter {
            id: 9,
            name: String::new(),
            transliteration: String::new(),
            translation: String::new(),
            has_preamble: false,
            verses: vec![],
            verse_timings: vec![
                VerseTiming {
                    verse_id: 1,
                    start_ms: 0,
                    end_ms: 1200,
                },
                VerseTiming {
                    verse_id: 2,
                    start_ms: 1000,
                    end_ms: 1000,
                },
            ],
        };
        let issues = chapter.timing_issues();
        assert!(issues.contains(&TimingIssue::CountMismatch {
            verses: 0,
            timings: 2
        }));
        assert!(issues.contains(&TimingIssue::EmptyRange { verse_id: 2 }));
        assert!(issues.contains(&TimingIssue::Overlap { verse_id: 2 }));

        let library = Library::new(vec![chapter]);
        assert!(library.chapter(9).is_some());
    }

    #[test]
    fn verse_lookup_tolerates_gaps_in_numbering() {
        let library = parse_library(SAMPLE).expect("sample should parse");
        let chapter = library.chapter(2).expect("chapter 2");
        assert_eq!(chapter.verse(2).map(|v| v.id), Some(2));
        assert!(chapter.verse(0).is_none());
        assert!(chapter.verse(3).is_none());
        assert_eq!(chapter.recitation_end_ms(), 4000);
    }

    #[test]
    fn rejects_malformed_json_with_context() {
        let err = parse_library("{ not json").expect_err("should fail");
        assert!(format!("{err:#}").contains("Invalid chapter data JSON"));
    }
}
