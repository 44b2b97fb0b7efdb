//! Verse timing sync for recitation playback.
//!
//! Maps an audio position to the active verse and word of a chapter, keeps a
//! verse list scrolled to it and remembers where listening stopped. Audio
//! output, storage and the list itself sit behind small traits so hosts can
//! plug in their own.

pub mod bookmarks;
pub mod cancellation;
pub mod config;
pub mod engine;
pub mod list_host;
pub mod mapper;
pub mod quran;
pub mod resume;
pub mod store;
pub mod sync;

#[cfg(test)]
mod test_support;

pub use cancellation::CancellationToken;
pub use config::{AppConfig, LogLevel, load_config};
pub use engine::{AudioEngine, EngineEvent, PlaybackPosition, PlaybackStatus, Track};
pub use list_host::{ListHost, ScrollTarget};
pub use mapper::{DEFAULT_PREAMBLE_MS, Mapping, PositionMapper};
pub use quran::{Chapter, Library, Verse, load_library, parse_library};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use sync::{
    DisplayOptions, Message, SyncController, SyncHandle, SyncLifecycle, SyncOptions,
    SyncSnapshot, SyncState,
};
