//! Audio engine boundary.
//!
//! The engine owns decoding and output. The sync core only drives it through
//! `AudioEngine` and learns about progress through `EngineEvent`s delivered to
//! the controller's inbox.

use crate::quran::Chapter;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One queue entry; the queue holds one track per chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub chapter_id: u32,
    pub url: String,
    pub title: String,
}

impl Track {
    pub fn for_chapter(chapter: &Chapter, audio_base_url: &str) -> Self {
        let base = audio_base_url.trim_end_matches('/');
        let title = if chapter.transliteration.is_empty() {
            format!("Chapter {}", chapter.id)
        } else {
            chapter.transliteration.clone()
        };
        Self {
            chapter_id: chapter.id,
            url: format!("{base}/{:03}.mp3", chapter.id),
            title,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackPosition {
    pub position_ms: u64,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Stopped,
    Paused,
    Playing,
}

impl PlaybackStatus {
    pub fn is_playing(self) -> bool {
        matches!(self, PlaybackStatus::Playing)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Tick(PlaybackPosition),
    /// The engine moved to another queue entry on its own (end of track,
    /// lock-screen controls).
    TrackChanged { index: usize },
    QueueEnded,
    StatusChanged(PlaybackStatus),
}

#[async_trait]
pub trait AudioEngine: Send {
    async fn attach_queue(&mut self, tracks: Vec<Track>, start_index: usize) -> Result<()>;
    async fn play(&mut self) -> Result<()>;
    async fn pause(&mut self) -> Result<()>;
    async fn seek_to(&mut self, seconds: f64) -> Result<()>;
    async fn skip_next(&mut self) -> Result<()>;
    async fn skip_previous(&mut self) -> Result<()>;
    async fn position(&mut self) -> Result<PlaybackPosition>;
    /// Drops the queue and stops output.
    async fn reset(&mut self) -> Result<()>;
}
