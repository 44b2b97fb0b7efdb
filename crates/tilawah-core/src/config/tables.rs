use super::defaults;
use super::models::{AppConfig, LogLevel};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize, serde::Serialize)]
pub(super) struct ConfigTables {
    #[serde(default)]
    playback: PlaybackConfig,
    #[serde(default)]
    display: DisplayConfig,
    #[serde(default)]
    storage: StorageConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

impl From<ConfigTables> for AppConfig {
    fn from(tables: ConfigTables) -> Self {
        AppConfig {
            preamble_ms: tables.playback.preamble_ms,
            resume_threshold_ms: tables.playback.resume_threshold_ms,
            tick_interval_ms: tables.playback.tick_interval_ms,
            checkpoint_interval_ms: tables.playback.checkpoint_interval_ms,
            autoplay_on_open: tables.playback.autoplay_on_open,
            audio_base_url: tables.playback.audio_base_url,
            show_segments: tables.display.show_segments,
            show_translation_en: tables.display.show_translation_en,
            show_translation_ur: tables.display.show_translation_ur,
            show_transliteration_en: tables.display.show_transliteration_en,
            auto_scroll: tables.display.auto_scroll,
            scroll_retry_delay_ms: tables.display.scroll_retry_delay_ms,
            data_dir: tables.storage.data_dir,
            library_path: tables.storage.library_path,
            log_level: tables.logging.log_level,
        }
    }
}

impl From<&AppConfig> for ConfigTables {
    fn from(config: &AppConfig) -> Self {
        ConfigTables {
            playback: PlaybackConfig {
                preamble_ms: config.preamble_ms,
                resume_threshold_ms: config.resume_threshold_ms,
                tick_interval_ms: config.tick_interval_ms,
                checkpoint_interval_ms: config.checkpoint_interval_ms,
                autoplay_on_open: config.autoplay_on_open,
                audio_base_url: config.audio_base_url.clone(),
            },
            display: DisplayConfig {
                show_segments: config.show_segments,
                show_translation_en: config.show_translation_en,
                show_translation_ur: config.show_translation_ur,
                show_transliteration_en: config.show_transliteration_en,
                auto_scroll: config.auto_scroll,
                scroll_retry_delay_ms: config.scroll_retry_delay_ms,
            },
            storage: StorageConfig {
                data_dir: config.data_dir.clone(),
                library_path: config.library_path.clone(),
            },
            logging: LoggingConfig {
                log_level: config.log_level,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct PlaybackConfig {
    #[serde(default = "defaults::default_preamble_ms")]
    preamble_ms: u64,
    #[serde(default = "defaults::default_resume_threshold_ms")]
    resume_threshold_ms: u64,
    #[serde(default = "defaults::default_tick_interval_ms")]
    tick_interval_ms: u64,
    #[serde(default = "defaults::default_checkpoint_interval_ms")]
    checkpoint_interval_ms: u64,
    #[serde(default = "defaults::default_autoplay_on_open")]
    autoplay_on_open: bool,
    #[serde(default = "defaults::default_audio_base_url")]
    audio_base_url: String,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        PlaybackConfig {
            preamble_ms: defaults::default_preamble_ms(),
            resume_threshold_ms: defaults::default_resume_threshold_ms(),
            tick_interval_ms: defaults::default_tick_interval_ms(),
            checkpoint_interval_ms: defaults::default_checkpoint_interval_ms(),
            autoplay_on_open: defaults::default_autoplay_on_open(),
            audio_base_url: defaults::default_audio_base_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct DisplayConfig {
    #[serde(default = "defaults::default_show_segments")]
    show_segments: bool,
    #[serde(default = "defaults::default_show_translation_en")]
    show_translation_en: bool,
    #[serde(default = "defaults::default_show_translation_ur")]
    show_translation_ur: bool,
    #[serde(default = "defaults::default_show_transliteration_en")]
    show_transliteration_en: bool,
    #[serde(default = "defaults::default_auto_scroll")]
    auto_scroll: bool,
    #[serde(default = "defaults::default_scroll_retry_delay_ms")]
    scroll_retry_delay_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            show_segments: defaults::default_show_segments(),
            show_translation_en: defaults::default_show_translation_en(),
            show_translation_ur: defaults::default_show_translation_ur(),
            show_transliteration_en: defaults::default_show_transliteration_en(),
            auto_scroll: defaults::default_auto_scroll(),
            scroll_retry_delay_ms: defaults::default_scroll_retry_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct StorageConfig {
    #[serde(default = "defaults::default_data_dir")]
    data_dir: String,
    #[serde(default = "defaults::default_library_path")]
    library_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            data_dir: defaults::default_data_dir(),
            library_path: defaults::default_library_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    log_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_level: defaults::default_log_level(),
        }
    }
}
