//! Playback position to verse/segment mapping.
//!
//! Every chapter except the first one can start with a fixed preamble
//! recitation before verse 1. Its length is not measured from the audio: a
//! constant `DEFAULT_PREAMBLE_MS` is subtracted from the playback position
//! before the timing table is consulted. This is an approximation of the
//! real recordings and is kept as such.

use crate::quran::{Chapter, Verse, find_range};

pub const DEFAULT_PREAMBLE_MS: u64 = 6_000;

/// The opening chapter's preamble is its own first verse, so no offset
/// applies to it.
pub const FIRST_CHAPTER_ID: u32 = 1;

/// Active verse and word for one playback position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Mapping {
    pub verse_id: Option<u32>,
    pub segment_idx: Option<usize>,
}

impl Mapping {
    pub const NONE: Mapping = Mapping {
        verse_id: None,
        segment_idx: None,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionMapper {
    preamble_ms: u64,
}

impl Default for PositionMapper {
    fn default() -> Self {
        Self::new(DEFAULT_PREAMBLE_MS)
    }
}

impl PositionMapper {
    pub fn new(preamble_ms: u64) -> Self {
        Self { preamble_ms }
    }

    pub fn preamble_ms(&self) -> u64 {
        self.preamble_ms
    }

    /// Offset between the audio timeline and the chapter's timing table.
    pub fn preamble_offset_ms(&self, chapter: &Chapter) -> u64 {
        if chapter.has_preamble && chapter.id != FIRST_CHAPTER_ID {
            self.preamble_ms
        } else {
            0
        }
    }

    /// Position on the timing table's timeline, or `None` while the preamble
    /// is still playing.
    pub fn adjusted_position(&self, position_ms: u64, chapter: &Chapter) -> Option<u64> {
        position_ms.checked_sub(self.preamble_offset_ms(chapter))
    }

    pub fn map_verse(&self, position_ms: u64, chapter: &Chapter) -> Option<u32> {
        let adjusted = self.adjusted_position(position_ms, chapter)?;
        find_range(&chapter.verse_timings, adjusted).map(|idx| chapter.verse_timings[idx].verse_id)
    }

    /// Index into `verse.segments` for an already adjusted position.
    pub fn map_segment(&self, adjusted_position_ms: u64, verse: &Verse) -> Option<usize> {
        let timings = verse.segment_timings.as_deref()?;
        find_range(timings, adjusted_position_ms).filter(|idx| *idx < verse.segments.len())
    }

    pub fn map_position(
        &self,
        position_ms: u64,
        chapter: &Chapter,
        with_segments: bool,
    ) -> Mapping {
        let Some(adjusted) = self.adjusted_position(position_ms, chapter) else {
            return Mapping::NONE;
        };
        let Some(idx) = find_range(&chapter.verse_timings, adjusted) else {
            return Mapping::NONE;
        };
        let verse_id = chapter.verse_timings[idx].verse_id;
        let segment_idx = if with_segments {
            chapter
                .verse(verse_id)
                .and_then(|verse| self.map_segment(adjusted, verse))
        } else {
            None
        };
        Mapping {
            verse_id: Some(verse_id),
            segment_idx,
        }
    }

    /// Audio position at which `verse_id` starts, preamble included.
    pub fn seek_position_ms(&self, chapter: &Chapter, verse_id: u32) -> Option<u64> {
        let timing = chapter.verse_timing(verse_id)?;
        Some(timing.start_ms + self.preamble_offset_ms(chapter))
    }
}

pub fn ms_to_seconds(position_ms: u64) -> f64 {
    position_ms as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quran::{SegmentTiming, VerseTiming};

    fn verse(id: u32, words: &[&str], segment_timings: Option<Vec<(u64, u64)>>) -> Verse {
        Verse {
            id,
            segments: words.iter().map(|w| w.to_string()).collect(),
            segment_timings: segment_timings.map(|timings| {
                timings
                    .into_iter()
                    .map(|(start_ms, end_ms)| SegmentTiming { start_ms, end_ms })
                    .collect()
            }),
            translation_en: None,
            translation_ur: None,
            transliteration_en: None,
        }
    }

    fn chapter(id: u32, has_preamble: bool, ranges: &[(u64, u64)]) -> Chapter {
        Chapter {
            id,
            name: String::new(),
            transliteration: String::new(),
            translation: String::new(),
            has_preamble,
            verses: (1..=ranges.len() as u32)
                .map(|id| verse(id, &["w"], None))
                .collect(),
            verse_timings: ranges
                .iter()
                .enumerate()
                .map(|(idx, (start_ms, end_ms))| VerseTiming {
                    verse_id: idx as u32 + 1,
                    start_ms: *start_ms,
                    end_ms: *end_ms,
                })
                .collect(),
        }
    }

    #[test]
    fn maps_positions_without_preamble() {
        let chapter = chapter(3, false, &[(0, 1000), (1000, 2500)]);
        let mapper = PositionMapper::default();
        assert_eq!(mapper.map_verse(500, &chapter), Some(1));
        assert_eq!(mapper.map_verse(1000, &chapter), Some(2));
        assert_eq!(mapper.map_verse(2500, &chapter), None);
    }

    #[test]
    fn preamble_gates_every_position_before_offset() {
        let chapter = chapter(2, true, &[(0, 1000), (1000, 2500)]);
        let mapper = PositionMapper::default();
        for position_ms in (0..DEFAULT_PREAMBLE_MS).step_by(50) {
            assert_eq!(mapper.map_verse(position_ms, &chapter), None);
        }
        assert_eq!(mapper.map_verse(3000, &chapter), None);
        assert_eq!(mapper.map_verse(6200, &chapter), Some(1));
    }

    #[test]
    fn first_chapter_never_applies_preamble() {
        let chapter = chapter(FIRST_CHAPTER_ID, true, &[(0, 1000)]);
        let mapper = PositionMapper::default();
        assert_eq!(mapper.preamble_offset_ms(&chapter), 0);
        assert_eq!(mapper.map_verse(10, &chapter), Some(1));
    }

    #[test]
    fn every_position_matches_at_most_one_range() {
        let chapter = chapter(4, false, &[(0, 700), (700, 1900), (1900, 2000), (2000, 5000)]);
        let mapper = PositionMapper::default();
        for position_ms in 0..5000 {
            let matches = chapter
                .verse_timings
                .iter()
                .filter(|timing| timing.start_ms <= position_ms && position_ms < timing.end_ms)
                .count();
            assert_eq!(matches, 1, "position {position_ms}");
            assert!(mapper.map_verse(position_ms, &chapter).is_some());
        }
    }

    #[test]
    fn gaps_in_malformed_tables_map_to_none() {
        let chapter = chapter(5, false, &[(0, 1000), (1500, 2000)]);
        let mapper = PositionMapper::default();
        assert_eq!(mapper.map_verse(1200, &chapter), None);
        assert_eq!(mapper.map_position(1200, &chapter, true), Mapping::NONE);
    }

    #[test]
    fn maps_segments_on_adjusted_timeline() {
        let mut chapter = chapter(6, true, &[(0, 3000)]);
        chapter.verses[0] = verse(
            1,
            &["a", "b", "c"],
            Some(vec![(0, 1000), (1000, 2000), (2000, 3000)]),
        );
        let mapper = PositionMapper::default();

        let mapping = mapper.map_position(DEFAULT_PREAMBLE_MS + 1500, &chapter, true);
        assert_eq!(
            mapping,
            Mapping {
                verse_id: Some(1),
                segment_idx: Some(1)
            }
        );

        let without_segments = mapper.map_position(DEFAULT_PREAMBLE_MS + 1500, &chapter, false);
        assert_eq!(without_segments.segment_idx, None);

        let in_preamble = mapper.map_position(100, &chapter, true);
        assert_eq!(in_preamble, Mapping::NONE);
    }

    #[test]
    fn segment_lookup_without_timings_is_none() {
        let mapper = PositionMapper::default();
        assert_eq!(mapper.map_segment(10, &verse(1, &["a"], None)), None);
        // Timing entries beyond the word list are ignored.
        let verse = verse(1, &["a"], Some(vec![(0, 10), (10, 20)]));
        assert_eq!(mapper.map_segment(15, &verse), None);
    }

    #[test]
    fn seek_position_adds_preamble_back() {
        let mut chapter = chapter(2, true, &[(0, 2000), (2000, 4000), (4000, 7000), (7000, 10000), (10000, 12000)]);
        chapter.verses.truncate(5);
        let mapper = PositionMapper::default();
        let target = mapper.seek_position_ms(&chapter, 5).expect("verse 5 timing");
        assert_eq!(target, 16_000);
        assert_eq!(ms_to_seconds(target), 16.0);
        assert_eq!(mapper.seek_position_ms(&chapter, 42), None);
    }
}
