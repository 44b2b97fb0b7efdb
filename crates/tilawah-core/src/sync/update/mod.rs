use super::SyncController;
use super::messages::Message;
use crate::engine::AudioEngine;
use crate::list_host::{ListHost, ScrollTarget};
use crate::resume::ResumeRecord;
use crate::store::KeyValueStore;
use std::collections::VecDeque;

mod playback;
mod reducer;
mod resume;
mod runtime;
mod scroll;

pub use resume::resolve_resume_offset;

/// Work the reducer hands to the runtime; everything that touches the
/// engine, the store, the list or the clock.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Effect {
    PrepareSession {
        request_id: u64,
        index: usize,
        target_verse: Option<u32>,
    },
    Play,
    Pause,
    Seek {
        position_ms: u64,
    },
    SkipNext {
        from_index: usize,
        to_index: usize,
    },
    SkipPrevious {
        from_index: usize,
        to_index: usize,
    },
    Scroll {
        target: ScrollTarget,
        generation: u64,
        attempt: u8,
    },
    PersistResume {
        record: ResumeRecord,
        deferred: bool,
    },
    StartPolling,
    QueryPosition,
    /// Cancels the poller, a pending scroll retry and deferred writes.
    StopBackgroundTasks,
    /// Pause and drop the engine's queue.
    Release,
}

impl<E, S, L> SyncController<E, S, L>
where
    E: AudioEngine + 'static,
    S: KeyValueStore + 'static,
    L: ListHost,
{
    /// Reduces one message and runs its effects, then does the same for any
    /// follow-up messages. Never fails; problems are logged.
    pub async fn update(&mut self, message: Message) {
        let mut queue = VecDeque::from([message]);
        while let Some(message) = queue.pop_front() {
            let effects = self.reduce(message);
            for effect in effects {
                if let Some(follow_up) = self.run_effect(effect).await {
                    queue.push_back(follow_up);
                }
            }
        }
        self.publish();
    }
}
