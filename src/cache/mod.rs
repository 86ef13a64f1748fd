//! Content-addressed narration cache.
//!
//! Narration text is hashed into a file name under the cache directory:
//! `{cache_dir}/{sha256(text)}.mp3`. A file at that path is reused as-is on
//! later requests, across process runs. Nothing in the directory expires.

use crate::api::TtsClient;
use crate::audio::read_duration;
use crate::config::{FallbackPolicy, NarrationConfig, DEFAULT_CACHE_DIR};
use crate::error::{NarrationError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const AUDIO_EXTENSION: &str = "mp3";

/// Where a [`NarrationResult`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrationOrigin {
    Cached,
    Synthesized,
    Fallback,
}

/// A narration clip and its playback length.
///
/// When `audio_path` is set, `duration_seconds` is the decoded length of that
/// file. Without audio it is the configured fallback, which may be `0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrationResult {
    pub audio_path: Option<PathBuf>,
    pub duration_seconds: f64,
    pub origin: NarrationOrigin,
}

impl NarrationResult {
    pub(crate) fn with_audio(path: PathBuf, duration_seconds: f64, origin: NarrationOrigin) -> Self {
        Self {
            audio_path: Some(path),
            duration_seconds: sanitize(duration_seconds),
            origin,
        }
    }

    pub fn fallback(text: &str, policy: FallbackPolicy) -> Self {
        Self {
            audio_path: None,
            duration_seconds: sanitize(policy.duration_for(text)),
            origin: NarrationOrigin::Fallback,
        }
    }

    /// No audio, only a known length, e.g. one measured elsewhere.
    pub fn timed(duration_seconds: f64) -> Self {
        Self {
            audio_path: None,
            duration_seconds: sanitize(duration_seconds),
            origin: NarrationOrigin::Fallback,
        }
    }

    /// No audio and no duration.
    pub fn silent() -> Self {
        Self::fallback("", FallbackPolicy::Zero)
    }

    pub fn has_audio(&self) -> bool {
        self.audio_path.is_some()
    }

    /// The duration, when it is usable for sizing waits.
    pub fn timing(&self) -> Option<f64> {
        if self.duration_seconds > 0.0 {
            Some(self.duration_seconds)
        } else {
            None
        }
    }
}

impl Default for NarrationResult {
    fn default() -> Self {
        Self::silent()
    }
}

fn sanitize(secs: f64) -> f64 {
    if secs.is_finite() && secs > 0.0 {
        secs
    } else {
        0.0
    }
}

/// Lowercase hex SHA-256 of the narration text.
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub struct NarrationCache {
    config: NarrationConfig,
    client: TtsClient,
}

impl NarrationCache {
    /// Create the cache, making its directory if needed.
    pub fn new(config: NarrationConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.cache_dir).map_err(|e| {
            NarrationError::ConfigError(format!(
                "cannot create cache directory {}: {}",
                config.cache_dir.display(),
                e
            ))
        })?;
        let client = TtsClient::new(&config)?;

        info!(
            cache_dir = %config.cache_dir.display(),
            endpoint = %config.endpoint,
            "Narration cache ready"
        );
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &NarrationConfig {
        &self.config
    }

    pub fn cache_dir(&self) -> &Path {
        &self.config.cache_dir
    }

    pub fn cache_path(&self, text: &str) -> PathBuf {
        cache_path_in(&self.config.cache_dir, text)
    }

    /// Narration audio and duration for `text`, never failing.
    ///
    /// Any synthesis or decode failure is logged and degrades to a result
    /// without audio carrying the configured fallback duration.
    pub async fn resolve(&self, text: &str) -> NarrationResult {
        match self.try_resolve(text).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "Narration unavailable, continuing without audio");
                NarrationResult::fallback(text, self.config.fallback)
            }
        }
    }

    /// Like [`resolve`](Self::resolve) but surfaces the failure.
    ///
    /// A cache entry that does not decode is deleted and synthesized again
    /// once. A freshly synthesized entry that does not decode is deleted.
    pub async fn try_resolve(&self, text: &str) -> Result<NarrationResult> {
        let path = self.cache_path(text);

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            match duration_off_runtime(&path).await {
                Ok(secs) => {
                    debug!(path = %path.display(), secs, "Using cached narration");
                    return Ok(NarrationResult::with_audio(path, secs, NarrationOrigin::Cached));
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Cached narration is unreadable, regenerating");
                    purge(&path).await;
                }
            }
        }

        self.client.synthesize_to(text, &path).await?;

        match duration_off_runtime(&path).await {
            Ok(secs) => {
                info!(path = %path.display(), secs, "Cached new narration");
                Ok(NarrationResult::with_audio(path, secs, NarrationOrigin::Synthesized))
            }
            Err(e) => {
                purge(&path).await;
                Err(e)
            }
        }
    }
}

pub fn cache_path_in(cache_dir: &Path, text: &str) -> PathBuf {
    cache_dir.join(format!("{}.{}", fingerprint(text), AUDIO_EXTENSION))
}

async fn purge(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed invalid cache entry"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove invalid cache entry"),
    }
}

/// [`read_duration`] on the blocking pool.
async fn duration_off_runtime(path: &Path) -> Result<f64> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || read_duration(&path))
        .await
        .map_err(|e| NarrationError::DecodeError(format!("duration task failed: {}", e)))?
}

/// One-shot narration with the default cache settings.
pub async fn resolve_narration(text: &str, token: &str, endpoint: &str) -> NarrationResult {
    resolve_narration_in(Path::new(DEFAULT_CACHE_DIR), text, token, endpoint).await
}

/// [`resolve_narration`] against an explicit cache directory.
pub async fn resolve_narration_in(
    cache_dir: &Path,
    text: &str,
    token: &str,
    endpoint: &str,
) -> NarrationResult {
    let config = NarrationConfig::new(token)
        .with_endpoint(endpoint)
        .with_cache_dir(cache_dir);
    let fallback = config.fallback;
    match NarrationCache::new(config) {
        Ok(cache) => cache.resolve(text).await,
        Err(e) => {
            warn!(error = %e, "Narration cache unavailable");
            NarrationResult::fallback(text, fallback)
        }
    }
}
