use super::options::DisplayOptions;
use crate::engine::EngineEvent;
use crate::list_host::ScrollTarget;

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// The chapter screen gained focus.
    Open {
        chapter_id: u32,
        target_verse: Option<u32>,
    },
    /// The chapter screen lost focus.
    Close,
    /// Close, then stop the run loop.
    Shutdown,
    Engine(EngineEvent),
    /// Host tick: sample the engine position.
    Poll,
    VersePressed {
        verse_id: u32,
    },
    Play,
    Pause,
    TogglePlayPause,
    Next,
    Previous,
    AppBackgrounded,
    SetDisplayOptions(DisplayOptions),
    SessionReady {
        request_id: u64,
        index: usize,
        offset_ms: u64,
    },
    SessionFailed {
        request_id: u64,
        error: String,
    },
    SkipFailed {
        from_index: usize,
    },
    RetryScroll {
        target: ScrollTarget,
        generation: u64,
    },
}

impl From<EngineEvent> for Message {
    fn from(event: EngineEvent) -> Self {
        Message::Engine(event)
    }
}
