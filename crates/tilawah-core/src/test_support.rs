//! Recording doubles shared by the controller tests.

use crate::engine::{AudioEngine, PlaybackPosition, Track};
use crate::list_host::{ListHost, ScrollTarget};
use crate::quran::{Chapter, Library, SegmentTiming, Verse, VerseTiming};
use anyhow::{Result, bail};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Attach { chapter_ids: Vec<u32>, start_index: usize },
    Play,
    Pause,
    Seek(f64),
    SkipNext,
    SkipPrevious,
    Position,
    Reset,
}

/// Engine double; clones share the call log, failure switches and the
/// position it reports.
#[derive(Debug, Clone, Default)]
pub struct RecordingEngine {
    calls: Arc<Mutex<Vec<EngineCall>>>,
    position: Arc<Mutex<PlaybackPosition>>,
    pub fail_attach: Arc<AtomicBool>,
    pub fail_seek: Arc<AtomicBool>,
    pub fail_skip: Arc<AtomicBool>,
}

impl RecordingEngine {
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().expect("engine log").clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().expect("engine log").clear();
    }

    pub fn set_position(&self, position_ms: u64) {
        let mut position = self.position.lock().expect("engine position");
        position.position_ms = position_ms;
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().expect("engine log").push(call);
    }
}

#[async_trait]
impl AudioEngine for RecordingEngine {
    async fn attach_queue(&mut self, tracks: Vec<Track>, start_index: usize) -> Result<()> {
        self.record(EngineCall::Attach {
            chapter_ids: tracks.iter().map(|track| track.chapter_id).collect(),
            start_index,
        });
        if self.fail_attach.load(Ordering::SeqCst) {
            bail!("player not initialised");
        }
        Ok(())
    }

    async fn play(&mut self) -> Result<()> {
        self.record(EngineCall::Play);
        Ok(())
    }

    async fn pause(&mut self) -> Result<()> {
        self.record(EngineCall::Pause);
        Ok(())
    }

    async fn seek_to(&mut self, seconds: f64) -> Result<()> {
        self.record(EngineCall::Seek(seconds));
        if self.fail_seek.load(Ordering::SeqCst) {
            bail!("seek rejected");
        }
        Ok(())
    }

    async fn skip_next(&mut self) -> Result<()> {
        self.record(EngineCall::SkipNext);
        if self.fail_skip.load(Ordering::SeqCst) {
            bail!("no next track");
        }
        Ok(())
    }

    async fn skip_previous(&mut self) -> Result<()> {
        self.record(EngineCall::SkipPrevious);
        if self.fail_skip.load(Ordering::SeqCst) {
            bail!("no previous track");
        }
        Ok(())
    }

    async fn position(&mut self) -> Result<PlaybackPosition> {
        self.record(EngineCall::Position);
        Ok(*self.position.lock().expect("engine position"))
    }

    async fn reset(&mut self) -> Result<()> {
        self.record(EngineCall::Reset);
        Ok(())
    }
}

/// List double that fails the next `failures` scroll calls.
#[derive(Debug, Clone, Default)]
pub struct RecordingList {
    scrolls: Arc<Mutex<Vec<ScrollTarget>>>,
    failures: Arc<AtomicUsize>,
    attempts: Arc<AtomicUsize>,
}

impl RecordingList {
    pub fn fail_next(&self, failures: usize) {
        self.failures.store(failures, Ordering::SeqCst);
    }

    pub fn scrolls(&self) -> Vec<ScrollTarget> {
        self.scrolls.lock().expect("scroll log").clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn record(&mut self, target: ScrollTarget) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            bail!("row not laid out yet");
        }
        self.scrolls.lock().expect("scroll log").push(target);
        Ok(())
    }
}

impl ListHost for RecordingList {
    fn scroll_to_index(&mut self, index: usize) -> Result<()> {
        self.record(ScrollTarget::Row(index))
    }

    fn scroll_to_offset(&mut self, offset: f32) -> Result<()> {
        assert_eq!(offset, 0.0);
        self.record(ScrollTarget::Top)
    }
}

fn verse(id: u32, words: &[&str]) -> Verse {
    Verse {
        id,
        segments: words.iter().map(|word| word.to_string()).collect(),
        segment_timings: None,
        translation_en: Some(format!("Verse {id}")),
        translation_ur: None,
        transliteration_en: None,
    }
}

fn chapter(id: u32, has_preamble: bool, ranges: &[(u64, u64)]) -> Chapter {
    Chapter {
        id,
        name: String::new(),
        transliteration: format!("Chapter {id}"),
        translation: String::new(),
        has_preamble,
        verses: (1..=ranges.len() as u32)
            .map(|id| verse(id, &["kalima"]))
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

/// Chapters 1 (preamble flag set but never offset), 2 (preamble, five
/// verses) and 3 (no preamble, word timings on verse 2).
pub fn sample_library() -> Arc<Library> {
    let first = chapter(1, true, &[(0, 3000), (3000, 6000), (6000, 9000)]);
    let second = chapter(
        2,
        true,
        &[
            (0, 2000),
            (2000, 4000),
            (4000, 7000),
            (7000, 10_000),
            (10_000, 12_000),
        ],
    );
    let mut third = chapter(3, false, &[(0, 1000), (1000, 2500), (2500, 4000)]);
    third.verses[1] = Verse {
        segments: vec!["a".into(), "b".into(), "c".into()],
        segment_timings: Some(vec![
            SegmentTiming {
                start_ms: 1000,
                end_ms: 1500,
            },
            SegmentTiming {
                start_ms: 1500,
                end_ms: 2000,
            },
            SegmentTiming {
                start_ms: 2000,
                end_ms: 2500,
            },
        ]),
        ..verse(2, &[])
    };
    Arc::new(Library::new(vec![first, second, third]))
}
