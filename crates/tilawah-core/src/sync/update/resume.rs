use super::super::SyncController;
use super::Effect;
use crate::engine::AudioEngine;
use crate::list_host::ListHost;
use crate::mapper::PositionMapper;
use crate::quran::Chapter;
use crate::resume::{ResumeRecord, resume_offset_for};
use crate::store::KeyValueStore;
use tracing::{debug, trace};

impl<E, S, L> SyncController<E, S, L>
where
    E: AudioEngine + 'static,
    S: KeyValueStore + 'static,
    L: ListHost,
{
    /// Record for the current position, if one may be written: the engine
    /// must be playing and past the resume threshold.
    pub(super) fn resume_candidate(&self) -> Option<ResumeRecord> {
        let chapter = self.current_chapter()?;
        if !self.status.is_playing() {
            trace!(chapter_id = chapter.id, "Not saving resume record while not playing");
            return None;
        }
        let position_ms = self.position.position_ms;
        if position_ms <= self.options.resume_threshold_ms {
            trace!(chapter_id = chapter.id, position_ms, "Position below resume threshold");
            return None;
        }
        Some(ResumeRecord::new(
            chapter.id,
            position_ms,
            self.state.active_verse_id,
        ))
    }

    pub(super) fn push_resume_write(&mut self, deferred: bool, effects: &mut Vec<Effect>) {
        if let Some(record) = self.resume_candidate() {
            effects.push(Effect::PersistResume { record, deferred });
        }
    }

    pub(super) fn maybe_checkpoint(&mut self, position_ms: u64, effects: &mut Vec<Effect>) {
        let interval = self.options.checkpoint_interval_ms;
        if interval == 0 || position_ms.abs_diff(self.last_checkpoint_ms) < interval {
            return;
        }
        self.last_checkpoint_ms = position_ms;
        debug!(position_ms, "Checkpointing playback position");
        self.push_resume_write(true, effects);
    }
}

/// Start offset for a chapter session: an explicit verse wins, then a saved
/// record for the same chapter, then the beginning.
pub async fn resolve_resume_offset<S: KeyValueStore + ?Sized>(
    store: &S,
    mapper: &PositionMapper,
    chapter: &Chapter,
    target_verse: Option<u32>,
) -> u64 {
    if let Some(verse_id) = target_verse {
        match mapper.seek_position_ms(chapter, verse_id) {
            Some(position_ms) => return position_ms,
            None => debug!(chapter_id = chapter.id, verse_id, "Target verse has no timing"),
        }
    }
    resume_offset_for(store, chapter.id).await
}
