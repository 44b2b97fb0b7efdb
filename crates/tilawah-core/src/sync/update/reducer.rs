use super::super::{DisplayOptions, SyncController};
use super::super::messages::Message;
use super::super::state::SyncLifecycle;
use super::Effect;
use crate::engine::{AudioEngine, EngineEvent, PlaybackPosition, PlaybackStatus};
use crate::list_host::ListHost;
use crate::store::KeyValueStore;
use tracing::{debug, info, warn};

impl<E, S, L> SyncController<E, S, L>
where
    E: AudioEngine + 'static,
    S: KeyValueStore + 'static,
    L: ListHost,
{
    pub(super) fn reduce(&mut self, message: Message) -> Vec<Effect> {
        let mut effects = Vec::new();

        match message {
            Message::Open {
                chapter_id,
                target_verse,
            } => self.handle_open(chapter_id, target_verse, &mut effects),
            Message::Close => self.handle_close(&mut effects),
            Message::Shutdown => {
                self.handle_close(&mut effects);
                self.shutdown = true;
            }
            Message::Engine(event) => self.handle_engine_event(event, &mut effects),
            Message::Poll => {
                if self.lifecycle.is_active() {
                    effects.push(Effect::QueryPosition);
                }
            }
            Message::VersePressed { verse_id } => {
                self.handle_verse_pressed(verse_id, &mut effects)
            }
            Message::Play => self.handle_play(&mut effects),
            Message::Pause => self.handle_pause(&mut effects),
            Message::TogglePlayPause => {
                if self.status.is_playing() {
                    self.handle_pause(&mut effects);
                } else {
                    self.handle_play(&mut effects);
                }
            }
            Message::Next => self.handle_skip(true, &mut effects),
            Message::Previous => self.handle_skip(false, &mut effects),
            Message::AppBackgrounded => {
                debug!("App moved to background");
                self.push_resume_write(false, &mut effects);
            }
            Message::SetDisplayOptions(display) => {
                self.handle_display_options(display, &mut effects)
            }
            Message::SessionReady {
                request_id,
                index,
                offset_ms,
            } => self.handle_session_ready(request_id, index, offset_ms, &mut effects),
            Message::SessionFailed { request_id, error } => {
                self.handle_session_failed(request_id, error)
            }
            Message::SkipFailed { from_index } => self.handle_skip_failed(from_index),
            Message::RetryScroll { target, generation } => {
                self.handle_retry_scroll(target, generation, &mut effects)
            }
        }

        effects
    }

    fn handle_engine_event(&mut self, event: EngineEvent, effects: &mut Vec<Effect>) {
        match event {
            EngineEvent::Tick(position) => self.handle_tick(position, effects),
            EngineEvent::TrackChanged { index } => self.handle_track_changed(index, effects),
            EngineEvent::QueueEnded => self.handle_queue_ended(effects),
            EngineEvent::StatusChanged(status) => self.handle_status_changed(status, effects),
        }
    }

    fn handle_open(&mut self, chapter_id: u32, target_verse: Option<u32>, effects: &mut Vec<Effect>) {
        if matches!(
            self.lifecycle,
            SyncLifecycle::Loading { chapter_id: loading, failed: false, .. } if loading == chapter_id
        ) {
            debug!(chapter_id, "Skipping duplicate open request");
            return;
        }
        let Some(index) = self.library.index_of(chapter_id) else {
            warn!(chapter_id, "Cannot open unknown chapter");
            return;
        };

        if !matches!(self.lifecycle, SyncLifecycle::Idle) {
            debug!(chapter_id, "Replacing current session");
            effects.push(Effect::StopBackgroundTasks);
            self.push_resume_write(false, effects);
        }

        self.next_request_id += 1;
        let request_id = self.next_request_id;
        self.lifecycle = SyncLifecycle::Loading {
            chapter_id,
            request_id,
            failed: false,
        };
        self.chapter_index = None;
        self.reset_sync_state();
        info!(chapter_id, ?target_verse, request_id, "Opening chapter");
        effects.push(Effect::PrepareSession {
            request_id,
            index,
            target_verse,
        });
    }

    fn handle_session_ready(
        &mut self,
        request_id: u64,
        index: usize,
        offset_ms: u64,
        effects: &mut Vec<Effect>,
    ) {
        if !self.is_current_request(request_id) {
            debug!(request_id, "Ignoring stale session result");
            return;
        }
        self.lifecycle = SyncLifecycle::Active;
        self.chapter_index = Some(index);
        self.position = PlaybackPosition {
            position_ms: offset_ms,
            duration_ms: 0,
        };
        self.last_checkpoint_ms = offset_ms;
        info!(
            chapter_id = ?self.current_chapter().map(|chapter| chapter.id),
            offset_ms,
            "Chapter session ready"
        );
        if offset_ms > 0 {
            self.apply_position(offset_ms, effects);
        }
        if self.options.tick_interval.is_some() {
            effects.push(Effect::StartPolling);
        }
        if self.options.autoplay_on_open {
            effects.push(Effect::Play);
        }
    }

    fn handle_session_failed(&mut self, request_id: u64, error: String) {
        let SyncLifecycle::Loading { chapter_id, .. } = self.lifecycle else {
            debug!(request_id, "Ignoring stale session failure");
            return;
        };
        if !self.is_current_request(request_id) {
            debug!(request_id, "Ignoring stale session failure");
            return;
        }
        warn!(chapter_id, request_id, %error, "Failed to prepare chapter session; playback disabled");
        self.lifecycle = SyncLifecycle::Loading {
            chapter_id,
            request_id,
            failed: true,
        };
    }

    fn is_current_request(&self, request_id: u64) -> bool {
        matches!(
            self.lifecycle,
            SyncLifecycle::Loading { request_id: current, failed: false, .. } if current == request_id
        )
    }

    fn handle_close(&mut self, effects: &mut Vec<Effect>) {
        effects.push(Effect::StopBackgroundTasks);
        self.push_resume_write(false, effects);
        effects.push(Effect::Release);
        if !matches!(self.lifecycle, SyncLifecycle::Idle) {
            info!(
                chapter_id = ?self.current_chapter().map(|chapter| chapter.id),
                "Closing chapter session"
            );
        }
        self.lifecycle = SyncLifecycle::Idle;
        self.chapter_index = None;
        self.status = PlaybackStatus::Stopped;
        self.reset_sync_state();
    }

    fn handle_status_changed(&mut self, status: PlaybackStatus, effects: &mut Vec<Effect>) {
        if self.status == status {
            return;
        }
        debug!(?status, "Engine status changed");
        if self.status.is_playing() && !status.is_playing() && self.lifecycle.is_active() {
            self.push_resume_write(false, effects);
        }
        self.status = status;
        if status.is_playing()
            && self.lifecycle.is_active()
            && self.options.tick_interval.is_some()
        {
            effects.push(Effect::StartPolling);
        }
    }

    fn handle_display_options(&mut self, next: DisplayOptions, effects: &mut Vec<Effect>) {
        if self.options.display == next {
            return;
        }
        let enabled_scroll = next.auto_scroll && !self.options.display.auto_scroll;
        self.options.display = next;
        let DisplayOptions {
            show_segments,
            auto_scroll,
        } = next;
        info!(show_segments, auto_scroll, "Updated display options");
        if !show_segments {
            self.state.active_segment_idx = None;
        }
        if enabled_scroll {
            self.scroll_to_active_verse(effects);
        }
    }

    /// Clears highlight, position and dedupe guards for a fresh chapter.
    pub(super) fn reset_sync_state(&mut self) {
        self.state.clear();
        self.last_emitted_verse = None;
        self.position = PlaybackPosition::default();
        self.last_checkpoint_ms = 0;
        self.scroll_generation += 1;
    }
}
