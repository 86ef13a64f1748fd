use crate::error::{NarrationError, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_CACHE_DIR: &str = "tts_cache";
pub const DEFAULT_ENDPOINT: &str = "https://uni-ai.fly.dev/api/manim/tts";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_WAIT_SECS: f64 = 1.0;

/// How long a narration is assumed to last when no duration can be read.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum FallbackPolicy {
    /// Report `0`, leaving the caller to substitute its default wait.
    #[default]
    Zero,
    /// Estimate from the character count, never below `floor` seconds.
    TextLength { chars_per_second: f64, floor: f64 },
}

impl FallbackPolicy {
    /// Speaking-rate estimate used by the narrated scene scripts.
    pub fn text_length() -> Self {
        FallbackPolicy::TextLength {
            chars_per_second: 5.0,
            floor: 1.0,
        }
    }

    pub fn duration_for(&self, text: &str) -> f64 {
        match *self {
            FallbackPolicy::Zero => 0.0,
            FallbackPolicy::TextLength {
                chars_per_second,
                floor,
            } => {
                let floor = if floor.is_finite() { floor.max(0.0) } else { 0.0 };
                if !chars_per_second.is_finite() || chars_per_second <= 0.0 {
                    return floor;
                }
                let estimate = text.chars().count() as f64 / chars_per_second;
                estimate.max(floor)
            }
        }
    }
}

impl FromStr for FallbackPolicy {
    type Err = NarrationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zero" | "0" => Ok(FallbackPolicy::Zero),
            "text-length" | "text_length" | "estimate" => Ok(FallbackPolicy::text_length()),
            other => Err(NarrationError::ConfigError(format!(
                "unknown fallback policy '{}', expected 'zero' or 'text-length'",
                other
            ))),
        }
    }
}

/// Settings for a [`crate::cache::NarrationCache`].
#[derive(Debug, Clone)]
pub struct NarrationConfig {
    pub cache_dir: PathBuf,
    pub endpoint: String,
    pub token: String,
    pub timeout: Option<Duration>,
    pub fallback: FallbackPolicy,
    pub default_wait: f64,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token: String::new(),
            timeout: Some(DEFAULT_TIMEOUT),
            fallback: FallbackPolicy::Zero,
            default_wait: DEFAULT_WAIT_SECS,
        }
    }
}

impl NarrationConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Self::default()
        }
    }

    /// Build from `.env` and the process environment.
    ///
    /// Reads `NARRATION_TTS_TOKEN`, `NARRATION_TTS_ENDPOINT`,
    /// `NARRATION_CACHE_DIR`, `NARRATION_TTS_TIMEOUT_SECS` (0 disables the
    /// timeout), `NARRATION_FALLBACK` and `NARRATION_DEFAULT_WAIT_SECS`.
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(token) = lookup("NARRATION_TTS_TOKEN") {
            config.token = token;
        }
        if let Some(endpoint) = lookup("NARRATION_TTS_ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Some(dir) = lookup("NARRATION_CACHE_DIR") {
            config.cache_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup("NARRATION_TTS_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|e| {
                NarrationError::ConfigError(format!(
                    "NARRATION_TTS_TIMEOUT_SECS='{}' is not a whole number: {}",
                    raw, e
                ))
            })?;
            config.timeout = timeout_from_secs(secs);
        }
        if let Some(raw) = lookup("NARRATION_FALLBACK") {
            config.fallback = raw.parse()?;
        }
        if let Some(raw) = lookup("NARRATION_DEFAULT_WAIT_SECS") {
            let secs: f64 = raw.trim().parse().map_err(|e| {
                NarrationError::ConfigError(format!(
                    "NARRATION_DEFAULT_WAIT_SECS='{}' is not a number: {}",
                    raw, e
                ))
            })?;
            config = config.with_default_wait(secs);
        }

        Ok(config)
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_default_wait(mut self, secs: f64) -> Self {
        self.default_wait = secs.max(0.0);
        self
    }
}

pub fn timeout_from_secs(secs: u64) -> Option<Duration> {
    if secs == 0 {
        None
    } else {
        Some(Duration::from_secs(secs))
    }
}
