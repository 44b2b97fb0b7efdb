use super::options::DisplayOptions;
use crate::engine::{PlaybackPosition, PlaybackStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncLifecycle {
    #[default]
    Idle,
    /// Queue attach (and resume seek) in flight. `failed` keeps the session
    /// parked here with playback disabled until the next open.
    Loading {
        chapter_id: u32,
        request_id: u64,
        failed: bool,
    },
    Active,
    Transitioning {
        from_index: usize,
        to_index: usize,
    },
}

impl SyncLifecycle {
    pub fn is_active(&self) -> bool {
        matches!(self, SyncLifecycle::Active)
    }
}

/// Highlight state. Both fields are cleared together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncState {
    pub active_verse_id: Option<u32>,
    pub active_segment_idx: Option<usize>,
}

impl SyncState {
    pub fn clear(&mut self) {
        *self = SyncState::default();
    }
}

/// What observers see after each processed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncSnapshot {
    pub lifecycle: SyncLifecycle,
    pub chapter_id: Option<u32>,
    pub chapter_index: Option<usize>,
    pub status: PlaybackStatus,
    pub position: PlaybackPosition,
    pub state: SyncState,
    pub display: DisplayOptions,
}
