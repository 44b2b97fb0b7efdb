use super::super::SyncController;
use super::Effect;
use crate::engine::AudioEngine;
use crate::list_host::{ListHost, ScrollTarget};
use crate::store::KeyValueStore;
use tracing::debug;

impl<E, S, L> SyncController<E, S, L>
where
    E: AudioEngine + 'static,
    S: KeyValueStore + 'static,
    L: ListHost,
{
    /// Queues a scroll unless auto-scroll is off. Each new scroll supersedes
    /// any retry still pending for an older one.
    pub(super) fn push_scroll(&mut self, target: ScrollTarget, effects: &mut Vec<Effect>) {
        if !self.options.display.auto_scroll {
            return;
        }
        self.scroll_generation += 1;
        effects.push(Effect::Scroll {
            target,
            generation: self.scroll_generation,
            attempt: 0,
        });
    }

    pub(super) fn scroll_to_active_verse(&mut self, effects: &mut Vec<Effect>) {
        let target = self
            .current_chapter()
            .zip(self.state.active_verse_id)
            .map(|(chapter, verse_id)| ScrollTarget::for_verse(chapter, verse_id));
        if let Some(target) = target {
            self.push_scroll(target, effects);
        }
    }

    pub(super) fn handle_retry_scroll(
        &mut self,
        target: ScrollTarget,
        generation: u64,
        effects: &mut Vec<Effect>,
    ) {
        if generation != self.scroll_generation {
            debug!(generation, current = self.scroll_generation, "Dropping superseded scroll retry");
            return;
        }
        effects.push(Effect::Scroll {
            target,
            generation,
            attempt: 1,
        });
    }
}
