use crate::sync::{DisplayOptions, SyncOptions};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Flat view of every setting; deserializable from TOML.
#[derive(Debug, Clone, PartialEq, Deserialize, serde::Serialize)]
pub struct AppConfig {
    #[serde(default = "crate::config::defaults::default_preamble_ms")]
    pub preamble_ms: u64,
    #[serde(default = "crate::config::defaults::default_resume_threshold_ms")]
    pub resume_threshold_ms: u64,
    #[serde(default = "crate::config::defaults::default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "crate::config::defaults::default_checkpoint_interval_ms")]
    pub checkpoint_interval_ms: u64,
    #[serde(default = "crate::config::defaults::default_autoplay_on_open")]
    pub autoplay_on_open: bool,
    #[serde(default = "crate::config::defaults::default_audio_base_url")]
    pub audio_base_url: String,
    #[serde(default = "crate::config::defaults::default_show_segments")]
    pub show_segments: bool,
    #[serde(default = "crate::config::defaults::default_show_translation_en")]
    pub show_translation_en: bool,
    #[serde(default = "crate::config::defaults::default_show_translation_ur")]
    pub show_translation_ur: bool,
    #[serde(default = "crate::config::defaults::default_show_transliteration_en")]
    pub show_transliteration_en: bool,
    #[serde(default = "crate::config::defaults::default_auto_scroll")]
    pub auto_scroll: bool,
    #[serde(default = "crate::config::defaults::default_scroll_retry_delay_ms")]
    pub scroll_retry_delay_ms: u64,
    #[serde(default = "crate::config::defaults::default_data_dir")]
    pub data_dir: String,
    #[serde(default = "crate::config::defaults::default_library_path")]
    pub library_path: String,
    #[serde(default = "crate::config::defaults::default_log_level")]
    pub log_level: LogLevel,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            preamble_ms: crate::config::defaults::default_preamble_ms(),
            resume_threshold_ms: crate::config::defaults::default_resume_threshold_ms(),
            tick_interval_ms: crate::config::defaults::default_tick_interval_ms(),
            checkpoint_interval_ms: crate::config::defaults::default_checkpoint_interval_ms(),
            autoplay_on_open: crate::config::defaults::default_autoplay_on_open(),
            audio_base_url: crate::config::defaults::default_audio_base_url(),
            show_segments: crate::config::defaults::default_show_segments(),
            show_translation_en: crate::config::defaults::default_show_translation_en(),
            show_translation_ur: crate::config::defaults::default_show_translation_ur(),
            show_transliteration_en: crate::config::defaults::default_show_transliteration_en(),
            auto_scroll: crate::config::defaults::default_auto_scroll(),
            scroll_retry_delay_ms: crate::config::defaults::default_scroll_retry_delay_ms(),
            data_dir: crate::config::defaults::default_data_dir(),
            library_path: crate::config::defaults::default_library_path(),
            log_level: crate::config::defaults::default_log_level(),
        }
    }
}

impl AppConfig {
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn library_path(&self) -> PathBuf {
        PathBuf::from(&self.library_path)
    }

    pub fn display_options(&self) -> DisplayOptions {
        DisplayOptions {
            show_segments: self.show_segments,
            auto_scroll: self.auto_scroll,
        }
    }

    /// Controller settings. A zero tick interval disables position polling.
    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            preamble_ms: self.preamble_ms,
            resume_threshold_ms: self.resume_threshold_ms,
            tick_interval: (self.tick_interval_ms > 0)
                .then(|| Duration::from_millis(self.tick_interval_ms)),
            checkpoint_interval_ms: self.checkpoint_interval_ms,
            scroll_retry_delay: Duration::from_millis(self.scroll_retry_delay_ms),
            autoplay_on_open: self.autoplay_on_open,
            audio_base_url: self.audio_base_url.clone(),
            display: self.display_options(),
        }
    }
}

/// Logging verbosity.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LogLevel {
    Trace,
    #[default]
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
