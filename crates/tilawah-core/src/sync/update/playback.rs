use super::super::SyncController;
use super::super::state::SyncLifecycle;
use super::Effect;
use crate::engine::{AudioEngine, PlaybackPosition, PlaybackStatus};
use crate::list_host::{ListHost, ScrollTarget};
use crate::mapper::ms_to_seconds;
use crate::store::KeyValueStore;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

impl<E, S, L> SyncController<E, S, L>
where
    E: AudioEngine + 'static,
    S: KeyValueStore + 'static,
    L: ListHost,
{
    pub(super) fn handle_tick(&mut self, position: PlaybackPosition, effects: &mut Vec<Effect>) {
        if !self.lifecycle.is_active() {
            trace!(lifecycle = ?self.lifecycle, "Ignoring tick outside an active session");
            return;
        }
        self.position = position;
        if !self.status.is_playing() || position.position_ms == 0 {
            return;
        }
        self.apply_position(position.position_ms, effects);
        self.maybe_checkpoint(position.position_ms, effects);
    }

    /// Maps `position_ms` and updates highlight state in one step, scrolling
    /// once per verse entry.
    pub(super) fn apply_position(&mut self, position_ms: u64, effects: &mut Vec<Effect>) {
        let library = Arc::clone(&self.library);
        let Some(chapter) = self.chapter_index.and_then(|idx| library.chapter_at(idx)) else {
            return;
        };
        let mapping =
            self.mapper
                .map_position(position_ms, chapter, self.options.display.show_segments);
        self.state.active_verse_id = mapping.verse_id;
        self.state.active_segment_idx = mapping.segment_idx;

        match mapping.verse_id {
            None => self.last_emitted_verse = None,
            Some(verse_id) if self.last_emitted_verse != Some(verse_id) => {
                debug!(
                    chapter_id = chapter.id,
                    verse_id,
                    position_ms,
                    "Active verse changed"
                );
                self.last_emitted_verse = Some(verse_id);
                self.push_scroll(ScrollTarget::for_verse(chapter, verse_id), effects);
            }
            Some(_) => {}
        }
    }

    pub(super) fn handle_track_changed(&mut self, new_index: usize, effects: &mut Vec<Effect>) {
        let Some(current) = self.chapter_index else {
            debug!(new_index, "Ignoring track change before session is ready");
            return;
        };
        if !matches!(
            self.lifecycle,
            SyncLifecycle::Active | SyncLifecycle::Transitioning { .. }
        ) {
            debug!(new_index, "Ignoring track change outside an active session");
            return;
        }
        if new_index == current {
            debug!(new_index, "Skipping duplicate track change");
            if matches!(self.lifecycle, SyncLifecycle::Transitioning { .. }) {
                self.lifecycle = SyncLifecycle::Active;
            }
            return;
        }
        let library = Arc::clone(&self.library);
        let Some(chapter) = library.chapter_at(new_index) else {
            warn!(new_index, "Track index outside the chapter library");
            return;
        };

        // A skip already saved the outgoing chapter before leaving Active.
        if self.lifecycle.is_active() {
            self.push_resume_write(false, effects);
        }

        self.chapter_index = Some(new_index);
        self.reset_sync_state();
        self.lifecycle = SyncLifecycle::Active;
        info!(
            from_index = current,
            to_index = new_index,
            chapter_id = chapter.id,
            "Switched chapter"
        );
        self.push_scroll(ScrollTarget::Top, effects);
    }

    pub(super) fn handle_verse_pressed(&mut self, verse_id: u32, effects: &mut Vec<Effect>) {
        if !self.lifecycle.is_active() {
            debug!(verse_id, "Ignoring verse press without an active session");
            return;
        }
        let library = Arc::clone(&self.library);
        let Some(chapter) = self.chapter_index.and_then(|idx| library.chapter_at(idx)) else {
            return;
        };
        let Some(position_ms) = self.mapper.seek_position_ms(chapter, verse_id) else {
            warn!(chapter_id = chapter.id, verse_id, "No timing for pressed verse");
            return;
        };
        info!(
            chapter_id = chapter.id,
            verse_id,
            seconds = ms_to_seconds(position_ms),
            "Seeking to pressed verse"
        );
        self.last_checkpoint_ms = position_ms;
        effects.push(Effect::Seek { position_ms });
        if !self.status.is_playing() {
            effects.push(Effect::Play);
        }
    }

    pub(super) fn handle_play(&mut self, effects: &mut Vec<Effect>) {
        if !self.lifecycle.is_active() {
            debug!(lifecycle = ?self.lifecycle, "Play unavailable outside an active session");
            return;
        }
        if self.status.is_playing() {
            return;
        }
        info!("Resuming recitation playback");
        effects.push(Effect::Play);
    }

    pub(super) fn handle_pause(&mut self, effects: &mut Vec<Effect>) {
        if !self.lifecycle.is_active() || !self.status.is_playing() {
            return;
        }
        info!("Pausing recitation playback");
        self.push_resume_write(false, effects);
        effects.push(Effect::Pause);
    }

    /// Next/previous chapter, bounded by the ends of the library.
    pub(super) fn handle_skip(&mut self, forward: bool, effects: &mut Vec<Effect>) {
        if !self.lifecycle.is_active() {
            debug!(forward, "Skip unavailable outside an active session");
            return;
        }
        let Some(from_index) = self.chapter_index else {
            return;
        };
        let to_index = if forward {
            from_index + 1
        } else {
            match from_index.checked_sub(1) {
                Some(idx) => idx,
                None => {
                    info!("Already at first chapter");
                    return;
                }
            }
        };
        if to_index >= self.library.len() {
            info!("Already at last chapter");
            return;
        }

        self.push_resume_write(false, effects);
        self.lifecycle = SyncLifecycle::Transitioning {
            from_index,
            to_index,
        };
        if forward {
            effects.push(Effect::SkipNext {
                from_index,
                to_index,
            });
        } else {
            effects.push(Effect::SkipPrevious {
                from_index,
                to_index,
            });
        }
    }

    pub(super) fn handle_skip_failed(&mut self, from_index: usize) {
        if matches!(
            self.lifecycle,
            SyncLifecycle::Transitioning { from_index: pending, .. } if pending == from_index
        ) {
            warn!(from_index, "Chapter skip failed; staying on current chapter");
            self.lifecycle = SyncLifecycle::Active;
        }
    }

    /// The engine stopped at the end of the queue. Nothing is saved: a
    /// finished chapter has no position worth resuming.
    pub(super) fn handle_queue_ended(&mut self, effects: &mut Vec<Effect>) {
        info!(
            chapter_id = ?self.current_chapter().map(|chapter| chapter.id),
            "Playback queue ended"
        );
        effects.push(Effect::StopBackgroundTasks);
        self.status = PlaybackStatus::Stopped;
        self.state.clear();
        self.last_emitted_verse = None;
    }
}
