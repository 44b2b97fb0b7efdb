use crate::mapper::DEFAULT_PREAMBLE_MS;

pub(crate) fn default_preamble_ms() -> u64 {
    DEFAULT_PREAMBLE_MS
}

pub(crate) fn default_resume_threshold_ms() -> u64 {
    2_000
}

pub(crate) fn default_tick_interval_ms() -> u64 {
    50
}

pub(crate) fn default_checkpoint_interval_ms() -> u64 {
    10_000
}

pub(crate) fn default_autoplay_on_open() -> bool {
    false
}

pub(crate) fn default_audio_base_url() -> String {
    "audio".to_string()
}

pub(crate) fn default_show_segments() -> bool {
    true
}

pub(crate) fn default_show_translation_en() -> bool {
    true
}

pub(crate) fn default_show_translation_ur() -> bool {
    true
}

pub(crate) fn default_show_transliteration_en() -> bool {
    false
}

pub(crate) fn default_auto_scroll() -> bool {
    true
}

pub(crate) fn default_scroll_retry_delay_ms() -> u64 {
    250
}

pub(crate) fn default_data_dir() -> String {
    ".cache".to_string()
}

pub(crate) fn default_library_path() -> String {
    "data/quran.json".to_string()
}

pub(crate) fn default_log_level() -> crate::config::LogLevel {
    crate::config::LogLevel::Debug
}
