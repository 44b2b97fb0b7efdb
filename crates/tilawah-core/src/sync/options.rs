use crate::mapper::DEFAULT_PREAMBLE_MS;
use std::time::Duration;

/// Display toggles the controller reads; the rest are rendering concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayOptions {
    pub show_segments: bool,
    pub auto_scroll: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            show_segments: true,
            auto_scroll: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncOptions {
    pub preamble_ms: u64,
    /// Resume records are only written past this position.
    pub resume_threshold_ms: u64,
    /// `None` disables the position poller; ticks then come only from the
    /// engine's own events.
    pub tick_interval: Option<Duration>,
    /// Zero disables periodic checkpoints.
    pub checkpoint_interval_ms: u64,
    pub scroll_retry_delay: Duration,
    pub autoplay_on_open: bool,
    pub audio_base_url: String,
    pub display: DisplayOptions,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            preamble_ms: DEFAULT_PREAMBLE_MS,
            resume_threshold_ms: 2_000,
            tick_interval: Some(Duration::from_millis(50)),
            checkpoint_interval_ms: 10_000,
            scroll_retry_delay: Duration::from_millis(250),
            autoplay_on_open: false,
            audio_base_url: "audio".to_string(),
            display: DisplayOptions::default(),
        }
    }
}
