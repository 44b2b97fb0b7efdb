//! Clock-driven stand-ins for the audio player and the verse list.
//!
//! Each track lasts as long as its chapter's timing table plus the preamble,
//! so the controller sees the same timeline a real recording would give it.

use anyhow::{Result, bail};
use async_trait::async_trait;
use std::sync::Arc;
use tilawah_core::{
    AudioEngine, EngineEvent, Library, ListHost, PlaybackPosition, PlaybackStatus,
    PositionMapper, Track,
};
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;
use tracing::{debug, info, trace};

pub struct SimulatedEngine {
    library: Arc<Library>,
    mapper: PositionMapper,
    queue: Vec<Track>,
    index: Option<usize>,
    status: PlaybackStatus,
    offset_ms: u64,
    resumed_at: Option<Instant>,
    events: UnboundedSender<EngineEvent>,
}

impl SimulatedEngine {
    pub fn new(
        library: Arc<Library>,
        mapper: PositionMapper,
        events: UnboundedSender<EngineEvent>,
    ) -> Self {
        Self {
            library,
            mapper,
            queue: Vec::new(),
            index: None,
            status: PlaybackStatus::Stopped,
            offset_ms: 0,
            resumed_at: None,
            events,
        }
    }

    fn duration_ms(&self, index: usize) -> u64 {
        self.queue
            .get(index)
            .and_then(|track| self.library.chapter(track.chapter_id))
            .map(|chapter| chapter.recitation_end_ms() + self.mapper.preamble_offset_ms(chapter))
            .unwrap_or(0)
    }

    fn elapsed_ms(&self) -> u64 {
        let running = self
            .resumed_at
            .map(|started| started.elapsed().as_millis() as u64)
            .unwrap_or(0);
        self.offset_ms + running
    }

    fn emit(&self, event: EngineEvent) {
        if self.events.send(event).is_err() {
            trace!("No listener for engine event");
        }
    }

    fn current_index(&self) -> Result<usize> {
        match self.index {
            Some(index) => Ok(index),
            None => bail!("no queue attached"),
        }
    }

    fn start_track(&mut self, index: usize) {
        self.index = Some(index);
        self.offset_ms = 0;
        self.resumed_at = self.status.is_playing().then(Instant::now);
        info!(
            index,
            chapter_id = self.queue[index].chapter_id,
            url = %self.queue[index].url,
            "Simulated track started"
        );
        self.emit(EngineEvent::TrackChanged { index });
    }

    /// Rolls over to the next track, or ends the queue, once the current
    /// track's duration has elapsed.
    fn advance_if_finished(&mut self) {
        let Some(index) = self.index else {
            return;
        };
        if !self.status.is_playing() || self.elapsed_ms() < self.duration_ms(index) {
            return;
        }
        if index + 1 < self.queue.len() {
            self.start_track(index + 1);
        } else {
            self.offset_ms = self.duration_ms(index);
            self.resumed_at = None;
            self.status = PlaybackStatus::Stopped;
            self.emit(EngineEvent::QueueEnded);
            self.emit(EngineEvent::StatusChanged(PlaybackStatus::Stopped));
        }
    }
}

#[async_trait]
impl AudioEngine for SimulatedEngine {
    async fn attach_queue(&mut self, tracks: Vec<Track>, start_index: usize) -> Result<()> {
        if start_index >= tracks.len() {
            bail!(
                "start index {start_index} outside queue of {} tracks",
                tracks.len()
            );
        }
        debug!(tracks = tracks.len(), start_index, "Simulated queue attached");
        self.queue = tracks;
        self.index = Some(start_index);
        self.offset_ms = 0;
        self.resumed_at = None;
        self.status = PlaybackStatus::Paused;
        Ok(())
    }

    async fn play(&mut self) -> Result<()> {
        self.current_index()?;
        if !self.status.is_playing() {
            self.resumed_at = Some(Instant::now());
            self.status = PlaybackStatus::Playing;
            self.emit(EngineEvent::StatusChanged(PlaybackStatus::Playing));
        }
        Ok(())
    }

    async fn pause(&mut self) -> Result<()> {
        if self.status.is_playing() {
            self.offset_ms = self.elapsed_ms();
            self.resumed_at = None;
            self.status = PlaybackStatus::Paused;
            self.emit(EngineEvent::StatusChanged(PlaybackStatus::Paused));
        }
        Ok(())
    }

    async fn seek_to(&mut self, seconds: f64) -> Result<()> {
        let index = self.current_index()?;
        if !seconds.is_finite() || seconds < 0.0 {
            bail!("invalid seek target {seconds}");
        }
        let target_ms = (seconds * 1000.0).round() as u64;
        self.offset_ms = target_ms.min(self.duration_ms(index));
        if self.status.is_playing() {
            self.resumed_at = Some(Instant::now());
        }
        debug!(position_ms = self.offset_ms, "Simulated seek");
        Ok(())
    }

    async fn skip_next(&mut self) -> Result<()> {
        let index = self.current_index()?;
        if index + 1 >= self.queue.len() {
            bail!("already at the last track");
        }
        self.start_track(index + 1);
        Ok(())
    }

    async fn skip_previous(&mut self) -> Result<()> {
        let index = self.current_index()?;
        let Some(previous) = index.checked_sub(1) else {
            bail!("already at the first track");
        };
        self.start_track(previous);
        Ok(())
    }

    async fn position(&mut self) -> Result<PlaybackPosition> {
        self.advance_if_finished();
        let Some(index) = self.index else {
            return Ok(PlaybackPosition::default());
        };
        let duration_ms = self.duration_ms(index);
        Ok(PlaybackPosition {
            position_ms: self.elapsed_ms().min(duration_ms),
            duration_ms,
        })
    }

    async fn reset(&mut self) -> Result<()> {
        self.queue.clear();
        self.index = None;
        self.offset_ms = 0;
        self.resumed_at = None;
        self.status = PlaybackStatus::Stopped;
        Ok(())
    }
}

/// Verse list that only logs where it would scroll.
#[derive(Debug, Default)]
pub struct LoggingList;

impl ListHost for LoggingList {
    fn scroll_to_index(&mut self, index: usize) -> Result<()> {
        debug!(row = index, "Scrolled verse list");
        Ok(())
    }

    fn scroll_to_offset(&mut self, offset: f32) -> Result<()> {
        debug!(offset, "Scrolled verse list to offset");
        Ok(())
    }
}
