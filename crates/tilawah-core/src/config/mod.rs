//! Configuration loading for the recitation player.
//!
//! Settings are grouped into `[playback]`, `[display]`, `[storage]` and
//! `[logging]` tables in `conf/config.toml`. Missing or invalid entries fall
//! back to defaults so a session can always start.

mod defaults;
mod io;
mod models;
mod tables;

pub use io::{load_config, parse_config, serialize_config};
pub use models::{AppConfig, LogLevel};
