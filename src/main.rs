//! Command-line host for the recitation sync core.
//!
//! Loads `conf/config.toml` and the chapter data, then either runs a playback
//! session against a simulated engine or manages bookmarks and the
//! "continue listening" record.

mod sim;

use crate::sim::{LoggingList, SimulatedEngine};
use anyhow::{Context, Result, anyhow, bail};
use std::env;
use std::path::Path;
use std::sync::Arc;
use tilawah_core::bookmarks::{add_bookmark, load_bookmarks, remove_bookmark};
use tilawah_core::resume::load_resume;
use tilawah_core::{
    AppConfig, EngineEvent, FileStore, Library, Message, PositionMapper, SyncController,
    SyncHandle, load_config, load_library,
};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

const USAGE: &str = "Usage: tilawah <play <chapter> [verse] | continue | bookmarks | bookmark <chapter> <verse> | unbookmark <id>>";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Play { chapter_id: u32, verse_id: Option<u32> },
    Continue,
    Bookmarks,
    Bookmark { chapter_id: u32, verse_id: u32 },
    Unbookmark { id: String },
}

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let command = parse_args(env::args().skip(1))?;
    let config = load_config(Path::new("conf/config.toml"));
    set_log_level(reload_handle, config.log_level.as_filter_str());
    info!(
        level = %config.log_level,
        library = %config.library_path,
        data_dir = %config.data_dir,
        "Starting recitation player"
    );

    let library = Arc::new(load_library(&config.library_path())?);
    let store = Arc::new(FileStore::new(config.data_dir()));
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(async move {
        match command {
            Command::Play {
                chapter_id,
                verse_id,
            } => play(&config, library, store, chapter_id, verse_id).await,
            Command::Continue => match load_resume(store.as_ref()).await {
                Some(record) => {
                    info!(
                        chapter_id = record.chapter_id,
                        position_ms = record.position_ms,
                        saved_at = %record.saved_at,
                        "Continuing from saved position"
                    );
                    play(&config, library, store, record.chapter_id, None).await
                }
                None => {
                    println!("Nothing to continue yet.");
                    Ok(())
                }
            },
            Command::Bookmarks => {
                let bookmarks = load_bookmarks(store.as_ref()).await?;
                if bookmarks.is_empty() {
                    println!("No bookmarks yet.");
                }
                for bookmark in bookmarks {
                    let title = library
                        .chapter(bookmark.surah_id)
                        .map(|chapter| chapter.transliteration.as_str())
                        .unwrap_or("Unknown");
                    println!("{:<10} {title}, verse {}", bookmark.id, bookmark.verse_id);
                }
                Ok(())
            }
            Command::Bookmark {
                chapter_id,
                verse_id,
            } => {
                ensure_verse_exists(&library, chapter_id, verse_id)?;
                let bookmark = add_bookmark(store.as_ref(), chapter_id, verse_id).await?;
                println!("Bookmarked {}", bookmark.id);
                Ok(())
            }
            Command::Unbookmark { id } => {
                if remove_bookmark(store.as_ref(), &id).await? {
                    println!("Removed {id}");
                } else {
                    println!("No bookmark {id}");
                }
                Ok(())
            }
        }
    })
}

async fn play(
    config: &AppConfig,
    library: Arc<Library>,
    store: Arc<FileStore>,
    chapter_id: u32,
    verse_id: Option<u32>,
) -> Result<()> {
    if let Some(verse_id) = verse_id {
        ensure_verse_exists(&library, chapter_id, verse_id)?;
    } else if library.chapter(chapter_id).is_none() {
        bail!("Unknown chapter {chapter_id}");
    }

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let engine = SimulatedEngine::new(
        Arc::clone(&library),
        PositionMapper::new(config.preamble_ms),
        events_tx,
    );
    let (controller, handle) = SyncController::attach(
        Arc::new(Mutex::new(engine)),
        store,
        LoggingList::default(),
        Arc::clone(&library),
        config.sync_options(),
    )?;

    let sender = handle.sender();
    tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            let ended = matches!(event, EngineEvent::QueueEnded);
            if sender.send(Message::Engine(event)).is_err() {
                break;
            }
            if ended {
                if sender.send(Message::Shutdown).is_err() {
                    debug!("Controller already stopped at queue end");
                }
                break;
            }
        }
    });

    let interrupt = handle.sender();
    if let Err(err) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C; saving position and stopping");
        if interrupt.send(Message::Shutdown).is_err() {
            debug!("Controller already stopped");
        }
    }) {
        warn!("Failed to install Ctrl+C signal handler: {err}");
    }

    spawn_verse_printer(&handle, Arc::clone(&library), config.clone());

    handle.send(Message::Open {
        chapter_id,
        target_verse: verse_id,
    })?;
    handle.send(Message::Play)?;
    controller.run().await;
    Ok(())
}

/// Prints each newly active verse with the translations the display options
/// ask for.
fn spawn_verse_printer(handle: &SyncHandle, library: Arc<Library>, config: AppConfig) {
    let mut snapshots = handle.subscribe();
    tokio::spawn(async move {
        let mut last = None;
        while snapshots.changed().await.is_ok() {
            let snapshot = *snapshots.borrow_and_update();
            let current = snapshot.chapter_id.zip(snapshot.state.active_verse_id);
            if current == last {
                continue;
            }
            last = current;
            let Some((chapter_id, verse_id)) = current else {
                continue;
            };
            let Some(verse) = library
                .chapter(chapter_id)
                .and_then(|chapter| chapter.verse(verse_id))
            else {
                continue;
            };
            println!("[{chapter_id}:{verse_id}] {}", verse.text());
            if config.show_transliteration_en {
                if let Some(text) = &verse.transliteration_en {
                    println!("    {text}");
                }
            }
            if config.show_translation_en {
                if let Some(text) = &verse.translation_en {
                    println!("    {text}");
                }
            }
            if config.show_translation_ur {
                if let Some(text) = &verse.translation_ur {
                    println!("    {text}");
                }
            }
        }
    });
}

fn ensure_verse_exists(library: &Library, chapter_id: u32, verse_id: u32) -> Result<()> {
    let chapter = library
        .chapter(chapter_id)
        .ok_or_else(|| anyhow!("Unknown chapter {chapter_id}"))?;
    if chapter.verse(verse_id).is_none() {
        bail!(
            "Chapter {chapter_id} has {} verses; no verse {verse_id}",
            chapter.verse_count()
        );
    }
    Ok(())
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Command> {
    let name = args.next().ok_or_else(|| anyhow!(USAGE))?;
    let command = match name.as_str() {
        "play" => Command::Play {
            chapter_id: parse_number(args.next(), "chapter")?,
            verse_id: args
                .next()
                .map(|verse| parse_number(Some(verse), "verse"))
                .transpose()?,
        },
        "continue" => Command::Continue,
        "bookmarks" => Command::Bookmarks,
        "bookmark" => Command::Bookmark {
            chapter_id: parse_number(args.next(), "chapter")?,
            verse_id: parse_number(args.next(), "verse")?,
        },
        "unbookmark" => Command::Unbookmark {
            id: args.next().ok_or_else(|| anyhow!(USAGE))?,
        },
        other => bail!("Unknown command `{other}`\n{USAGE}"),
    };
    if let Some(extra) = args.next() {
        bail!("Unexpected argument `{extra}`\n{USAGE}");
    }
    Ok(command)
}

fn parse_number(value: Option<String>, what: &str) -> Result<u32> {
    let value = value.ok_or_else(|| anyhow!("Missing {what} number\n{USAGE}"))?;
    match value.parse::<u32>() {
        Ok(number) if number > 0 => Ok(number),
        _ => Err(anyhow!("Invalid {what} number `{value}`")),
    }
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter_layer),
        )
        .init();
    warn!("Logging initialized; override level with config.log_level or RUST_LOG");
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("debug"));
    if let Err(err) = handle.modify(|filter| *filter = parsed.clone()) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}
