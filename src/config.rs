//! Engine configuration, merged once at startup and never mutated.

use std::path::PathBuf;
use std::time::Duration;

/// Errors raised while loading configuration. These abort startup; a quiz
/// engine without a channel has nothing to talk to.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("QUIZ_CHANNEL is not set")]
    MissingChannel,
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

/// Immutable engine settings.
#[derive(Debug, Clone)]
pub struct QuizConfig {
    /// The one channel this engine instance manages.
    pub channel: String,
    /// Display prefix prepended to every outbound line.
    pub prefix: String,
    /// Delay between enough players joining and the first question.
    pub start_delay: Duration,
    /// Delay between rounds.
    pub question_delay: Duration,
    /// Interval between hint reveals within a round.
    pub hint_interval: Duration,
    /// Whether to request voice/moderation privilege changes on join,
    /// leave, game start and game end.
    pub moderated: bool,
    /// Name of the question source to play.
    pub source: String,
    /// How many questions are dealt into a game's batch.
    pub batch_size: usize,
    /// Directory holding `<source>.txt` question files.
    pub question_dir: PathBuf,
    /// Directory holding `<category>.txt` help files.
    pub help_dir: PathBuf,
    /// Whether help texts are cached after the first read.
    pub help_cache: bool,
}

impl QuizConfig {
    /// Defaults for everything but the channel.
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            prefix: "[Qz] ".into(),
            start_delay: Duration::from_millis(10_000),
            question_delay: Duration::from_millis(5_000),
            hint_interval: Duration::from_millis(5_000),
            moderated: true,
            source: "general".into(),
            batch_size: 10,
            question_dir: PathBuf::from("questions"),
            help_dir: PathBuf::from("help"),
            help_cache: false,
        }
    }

    /// Load settings from the environment. `QUIZ_CHANNEL` is required,
    /// everything else falls back to defaults. Durations are milliseconds.
    pub fn from_env() -> Result<Self, ConfigError> {
        let channel = std::env::var("QUIZ_CHANNEL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingChannel)?;

        let mut config = Self::new(channel);

        if let Some(prefix) = read_env("QUIZ_PREFIX") {
            config.prefix = prefix;
        }
        if let Some(ms) = read_duration_ms("QUIZ_START_DELAY_MS")? {
            config.start_delay = ms;
        }
        if let Some(ms) = read_duration_ms("QUIZ_QUESTION_DELAY_MS")? {
            config.question_delay = ms;
        }
        if let Some(ms) = read_duration_ms("QUIZ_HINT_INTERVAL_MS")? {
            config.hint_interval = ms;
        }
        if let Some(value) = read_env("QUIZ_MODERATED") {
            config.moderated = parse_bool("QUIZ_MODERATED", &value)?;
        }
        if let Some(source) = read_env("QUIZ_SOURCE") {
            config.source = source;
        }
        if let Some(value) = read_env("QUIZ_BATCH_SIZE") {
            config.batch_size = value.parse().map_err(|_| ConfigError::Invalid {
                key: "QUIZ_BATCH_SIZE",
                value,
            })?;
        }
        if let Some(dir) = read_env("QUIZ_QUESTION_DIR") {
            config.question_dir = PathBuf::from(dir);
        }
        if let Some(dir) = read_env("QUIZ_HELP_DIR") {
            config.help_dir = PathBuf::from(dir);
        }
        if let Some(value) = read_env("QUIZ_HELP_CACHE") {
            config.help_cache = parse_bool("QUIZ_HELP_CACHE", &value)?;
        }

        Ok(config)
    }
}

fn read_env(key: &'static str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn read_duration_ms(key: &'static str) -> Result<Option<Duration>, ConfigError> {
    match read_env(key) {
        None => Ok(None),
        Some(value) => value
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        }),
    }
}
