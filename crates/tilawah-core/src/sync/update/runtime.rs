use super::super::SyncController;
use super::super::messages::Message;
use super::Effect;
use super::resolve_resume_offset;
use crate::cancellation::CancellationToken;
use crate::engine::{AudioEngine, EngineEvent, PlaybackStatus};
use crate::list_host::{ListHost, ScrollTarget};
use crate::mapper::ms_to_seconds;
use crate::resume::{ResumeRecord, save_resume};
use crate::store::KeyValueStore;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

impl<E, S, L> SyncController<E, S, L>
where
    E: AudioEngine + 'static,
    S: KeyValueStore + 'static,
    L: ListHost,
{
    pub(super) async fn run_effect(&mut self, effect: Effect) -> Option<Message> {
        match effect {
            Effect::PrepareSession {
                request_id,
                index,
                target_verse,
            } => Some(self.prepare_session(request_id, index, target_verse).await),
            Effect::Play => match self.engine.play().await {
                Ok(()) => Some(Message::Engine(EngineEvent::StatusChanged(
                    PlaybackStatus::Playing,
                ))),
                Err(err) => {
                    warn!(error = %format!("{err:#}"), "Engine failed to start playback");
                    None
                }
            },
            Effect::Pause => match self.engine.pause().await {
                Ok(()) => Some(Message::Engine(EngineEvent::StatusChanged(
                    PlaybackStatus::Paused,
                ))),
                Err(err) => {
                    warn!(error = %format!("{err:#}"), "Engine failed to pause");
                    None
                }
            },
            Effect::Seek { position_ms } => {
                if let Err(err) = self.engine.seek_to(ms_to_seconds(position_ms)).await {
                    warn!(position_ms, error = %format!("{err:#}"), "Engine seek failed");
                }
                None
            }
            Effect::SkipNext {
                from_index,
                to_index,
            } => match self.engine.skip_next().await {
                Ok(()) => Some(Message::Engine(EngineEvent::TrackChanged { index: to_index })),
                Err(err) => {
                    warn!(from_index, error = %format!("{err:#}"), "Engine failed to skip forward");
                    Some(Message::SkipFailed { from_index })
                }
            },
            Effect::SkipPrevious {
                from_index,
                to_index,
            } => match self.engine.skip_previous().await {
                Ok(()) => Some(Message::Engine(EngineEvent::TrackChanged { index: to_index })),
                Err(err) => {
                    warn!(from_index, error = %format!("{err:#}"), "Engine failed to skip back");
                    Some(Message::SkipFailed { from_index })
                }
            },
            Effect::Scroll {
                target,
                generation,
                attempt,
            } => {
                self.run_scroll(target, generation, attempt);
                None
            }
            Effect::PersistResume { record, deferred } => {
                self.resume_seq += 1;
                let seq = self.resume_seq;
                if deferred {
                    self.spawn_deferred_write(record, seq);
                } else if let Err(err) =
                    write_in_order(self.store.as_ref(), &self.resume_written, seq, &record).await
                {
                    warn!(
                        chapter_id = record.chapter_id,
                        error = %format!("{err:#}"),
                        "Failed to save resume record"
                    );
                }
                None
            }
            Effect::StartPolling => {
                self.start_poller();
                None
            }
            Effect::QueryPosition => match self.engine.position().await {
                Ok(position) => Some(Message::Engine(EngineEvent::Tick(position))),
                Err(err) => {
                    debug!(error = %format!("{err:#}"), "Engine position unavailable");
                    None
                }
            },
            Effect::StopBackgroundTasks => {
                self.token.cancel();
                self.token = CancellationToken::new();
                self.poller_running = false;
                trace!("Cancelled background tasks");
                None
            }
            Effect::Release => {
                if let Err(err) = self.engine.pause().await {
                    debug!(error = %format!("{err:#}"), "Engine pause on release failed");
                }
                if let Err(err) = self.engine.reset().await {
                    warn!(error = %format!("{err:#}"), "Engine reset failed");
                }
                None
            }
        }
    }

    async fn prepare_session(
        &mut self,
        request_id: u64,
        index: usize,
        target_verse: Option<u32>,
    ) -> Message {
        let library = Arc::clone(&self.library);
        let Some(chapter) = library.chapter_at(index) else {
            return Message::SessionFailed {
                request_id,
                error: format!("no chapter at index {index}"),
            };
        };
        let offset_ms =
            resolve_resume_offset(self.store.as_ref(), &self.mapper, chapter, target_verse).await;
        let tracks = library.tracks(&self.options.audio_base_url);
        info!(
            chapter_id = chapter.id,
            request_id,
            tracks = tracks.len(),
            offset_ms,
            "Attaching playback queue"
        );
        if let Err(err) = self.engine.attach_queue(tracks, index).await {
            return Message::SessionFailed {
                request_id,
                error: format!("{err:#}"),
            };
        }
        if offset_ms > 0 {
            if let Err(err) = self.engine.seek_to(ms_to_seconds(offset_ms)).await {
                return Message::SessionFailed {
                    request_id,
                    error: format!("{err:#}"),
                };
            }
        }
        Message::SessionReady {
            request_id,
            index,
            offset_ms,
        }
    }

    fn run_scroll(&mut self, target: ScrollTarget, generation: u64, attempt: u8) {
        match target.apply(&mut self.list) {
            Ok(()) => trace!(?target, "Scrolled verse list"),
            Err(err) if attempt == 0 => {
                debug!(?target, error = %format!("{err:#}"), "List not ready; retrying scroll");
                self.spawn_scroll_retry(target, generation);
            }
            Err(err) => {
                debug!(?target, error = %format!("{err:#}"), "Dropping scroll after retry");
            }
        }
    }

    fn spawn_scroll_retry(&self, target: ScrollTarget, generation: u64) {
        let token = self.token.clone();
        let sender = self.sender.clone();
        let delay = self.options.scroll_retry_delay;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => trace!("Cancelled pending scroll retry"),
                _ = tokio::time::sleep(delay) => {
                    let retry = Message::RetryScroll { target, generation };
                    let sent = sender
                        .upgrade()
                        .is_some_and(|sender| sender.send(retry).is_ok());
                    if !sent {
                        trace!("Controller gone before scroll retry");
                    }
                }
            }
        });
    }

    /// Checkpoint writes run off the inbox; one not yet started when the
    /// session is torn down, or overtaken by a newer write, is dropped.
    fn spawn_deferred_write(&self, record: ResumeRecord, seq: u64) {
        let token = self.token.clone();
        let store = Arc::clone(&self.store);
        let written = Arc::clone(&self.resume_written);
        tokio::spawn(async move {
            if token.is_cancelled() {
                debug!(chapter_id = record.chapter_id, "Dropped pending checkpoint");
                return;
            }
            if let Err(err) = write_in_order(store.as_ref(), &written, seq, &record).await {
                warn!(
                    chapter_id = record.chapter_id,
                    error = %format!("{err:#}"),
                    "Failed to save checkpoint"
                );
            }
        });
    }

    fn start_poller(&mut self) {
        let Some(interval) = self.options.tick_interval else {
            return;
        };
        if self.poller_running {
            return;
        }
        self.poller_running = true;
        let token = self.token.clone();
        let sender = self.sender.clone();
        debug!(interval_ms = interval.as_millis() as u64, "Starting position poller");
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(sender) = sender.upgrade() else {
                            break;
                        };
                        if sender.send(Message::Poll).is_err() {
                            break;
                        }
                    }
                }
            }
            trace!("Position poller stopped");
        });
    }
}

/// Saves `record` unless a write with a later sequence number already
/// landed. Writes hold the lock for the whole save so they never overlap.
async fn write_in_order<S: KeyValueStore + ?Sized>(
    store: &S,
    written: &Mutex<u64>,
    seq: u64,
    record: &ResumeRecord,
) -> anyhow::Result<()> {
    let mut latest = written.lock().await;
    if seq <= *latest {
        trace!(seq, latest = *latest, "Skipping superseded resume write");
        return Ok(());
    }
    save_resume(store, record).await?;
    *latest = seq;
    Ok(())
}
