//! Playback sync controller.
//!
//! One controller owns one attached audio engine. Engine events and user
//! intents arrive as `Message`s on an inbox; each message is reduced to a
//! list of `Effect`s which are then run in order before the next message is
//! taken. Effects may produce follow-up messages (session ready, skip
//! outcome) which are processed before anything else in the inbox.

mod messages;
mod options;
mod state;
mod update;


pub use messages::Message;
pub use options::{DisplayOptions, SyncOptions};
pub use state::{SyncLifecycle, SyncSnapshot, SyncState};
pub use update::resolve_resume_offset;

use crate::cancellation::CancellationToken;
use crate::engine::{AudioEngine, PlaybackPosition, PlaybackStatus};
use crate::list_host::ListHost;
use crate::mapper::PositionMapper;
use crate::quran::{Chapter, Library};
use crate::store::KeyValueStore;
use anyhow::{Result, anyhow};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, WeakUnboundedSender};
use tokio::sync::{Mutex, OwnedMutexGuard, watch};
use tracing::{debug, info};

/// Sending side of a controller's inbox plus its snapshot feed.
#[derive(Debug, Clone)]
pub struct SyncHandle {
    sender: UnboundedSender<Message>,
    snapshots: watch::Receiver<SyncSnapshot>,
}

impl SyncHandle {
    pub fn send(&self, message: Message) -> Result<()> {
        self.sender
            .send(message)
            .map_err(|_| anyhow!("sync controller has stopped"))
    }

    pub fn sender(&self) -> UnboundedSender<Message> {
        self.sender.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncSnapshot> {
        self.snapshots.clone()
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        *self.snapshots.borrow()
    }
}

pub struct SyncController<E, S, L>
where
    E: AudioEngine + 'static,
    S: KeyValueStore + 'static,
    L: ListHost,
{
    library: Arc<Library>,
    mapper: PositionMapper,
    options: SyncOptions,
    engine: OwnedMutexGuard<E>,
    store: Arc<S>,
    list: L,
    lifecycle: SyncLifecycle,
    status: PlaybackStatus,
    chapter_index: Option<usize>,
    position: PlaybackPosition,
    state: SyncState,
    last_emitted_verse: Option<u32>,
    last_checkpoint_ms: u64,
    resume_seq: u64,
    resume_written: Arc<Mutex<u64>>,
    next_request_id: u64,
    scroll_generation: u64,
    poller_running: bool,
    token: CancellationToken,
    inbox: UnboundedReceiver<Message>,
    sender: WeakUnboundedSender<Message>,
    snapshots: watch::Sender<SyncSnapshot>,
    shutdown: bool,
}

impl<E, S, L> SyncController<E, S, L>
where
    E: AudioEngine + 'static,
    S: KeyValueStore + 'static,
    L: ListHost,
{
    /// Takes exclusive hold of `engine` for the controller's lifetime. Fails
    /// if another controller is already attached to it.
    pub fn attach(
        engine: Arc<Mutex<E>>,
        store: Arc<S>,
        list: L,
        library: Arc<Library>,
        options: SyncOptions,
    ) -> Result<(Self, SyncHandle)> {
        let engine = engine
            .try_lock_owned()
            .map_err(|_| anyhow!("audio engine is already attached to another controller"))?;
        let (sender, inbox) = mpsc::unbounded_channel();
        let initial = SyncSnapshot {
            display: options.display,
            ..SyncSnapshot::default()
        };
        let (snapshots, snapshot_rx) = watch::channel(initial);
        let controller = Self {
            mapper: PositionMapper::new(options.preamble_ms),
            library,
            options,
            engine,
            store,
            list,
            lifecycle: SyncLifecycle::Idle,
            status: PlaybackStatus::Stopped,
            chapter_index: None,
            position: PlaybackPosition::default(),
            state: SyncState::default(),
            last_emitted_verse: None,
            last_checkpoint_ms: 0,
            resume_seq: 0,
            resume_written: Arc::new(Mutex::new(0)),
            next_request_id: 0,
            scroll_generation: 0,
            poller_running: false,
            token: CancellationToken::new(),
            inbox,
            sender: sender.downgrade(),
            snapshots,
            shutdown: false,
        };
        info!(chapters = controller.library.len(), "Attached sync controller");
        let handle = SyncHandle {
            sender,
            snapshots: snapshot_rx,
        };
        Ok((controller, handle))
    }

    pub fn lifecycle(&self) -> SyncLifecycle {
        self.lifecycle
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn position(&self) -> PlaybackPosition {
        self.position
    }

    pub fn chapter_index(&self) -> Option<usize> {
        self.chapter_index
    }

    pub fn current_chapter(&self) -> Option<&Chapter> {
        self.chapter_index
            .and_then(|idx| self.library.chapter_at(idx))
    }

    pub fn display_options(&self) -> DisplayOptions {
        self.options.display
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        SyncSnapshot {
            lifecycle: self.lifecycle,
            chapter_id: self.current_chapter().map(|chapter| chapter.id),
            chapter_index: self.chapter_index,
            status: self.status,
            position: self.position,
            state: self.state,
            display: self.options.display,
        }
    }

    /// Processes messages until `Shutdown` arrives or every handle is
    /// dropped, then tears the session down.
    pub async fn run(mut self) {
        while !self.shutdown {
            let Some(message) = self.inbox.recv().await else {
                debug!("Sync inbox closed");
                break;
            };
            self.update(message).await;
        }
        if !self.shutdown {
            self.update(Message::Close).await;
        }
        info!("Sync controller stopped");
    }

    /// Handles whatever is already queued without waiting for more.
    pub async fn process_pending(&mut self) {
        while let Ok(message) = self.inbox.try_recv() {
            self.update(message).await;
        }
    }

    fn publish(&self) {
        let next = self.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}
