use crate::config::NarrationConfig;
use crate::error::{NarrationError, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Write buffer size for streamed audio bodies.
pub const CHUNK_SIZE: usize = 8192;

/// Longest slice of an error body kept for diagnostics.
const ERROR_BODY_LIMIT: usize = 500;

/// Client for the remote narration service.
///
/// The service answers `GET {endpoint}?token=..&input=..` with an audio
/// payload (MP3 in practice).
#[derive(Debug, Clone)]
pub struct TtsClient {
    endpoint: String,
    token: String,
    client: Client,
}

impl TtsClient {
    pub fn new(config: &NarrationConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            token: config.token.clone(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Synthesize `text` and stream the audio into `dest`.
    ///
    /// The body lands in a sibling `.tmp` file first and is renamed onto
    /// `dest` once fully written. Returns the number of bytes stored.
    pub async fn synthesize_to(&self, text: &str, dest: &Path) -> Result<u64> {
        info!(chars = text.chars().count(), "Requesting narration from TTS service");

        let mut response = self
            .client
            .get(&self.endpoint)
            .query(&[("token", self.token.as_str()), ("input", text)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body = truncate_chars(&body, ERROR_BODY_LIMIT);
            warn!(%status, body = %body, "TTS service rejected request");
            return Err(NarrationError::SynthesisError(format!(
                "TTS service returned {}: {}",
                status, body
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if let Some(content_type) = content_type {
            if !is_audio_content_type(&content_type) {
                let body = response.text().await.unwrap_or_default();
                let body = truncate_chars(&body, ERROR_BODY_LIMIT);
                warn!(content_type = %content_type, body = %body, "TTS service did not return audio");
                return Err(NarrationError::SynthesisError(format!(
                    "TTS service returned non-audio content type '{}': {}",
                    content_type, body
                )));
            }
        }

        let temp_path = temp_path_for(dest);
        let written = match stream_body(&mut response, &temp_path).await {
            Ok(written) => written,
            Err(e) => {
                tokio::fs::remove_file(&temp_path).await.ok();
                return Err(e);
            }
        };

        if let Err(e) = tokio::fs::rename(&temp_path, dest).await {
            tokio::fs::remove_file(&temp_path).await.ok();
            return Err(e.into());
        }

        debug!(path = %dest.display(), bytes = written, "Narration audio stored");
        Ok(written)
    }
}

async fn stream_body(response: &mut reqwest::Response, path: &Path) -> Result<u64> {
    let file = tokio::fs::File::create(path).await?;
    let mut writer = tokio::io::BufWriter::with_capacity(CHUNK_SIZE, file);
    let mut written = 0u64;

    while let Some(chunk) = response.chunk().await? {
        if chunk.is_empty() {
            continue;
        }
        writer.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    writer.flush().await?;
    writer.into_inner().sync_all().await?;
    Ok(written)
}

fn temp_path_for(dest: &Path) -> PathBuf {
    dest.with_extension("tmp")
}

/// Whether a `Content-Type` value can carry an audio payload.
pub fn is_audio_content_type(value: &str) -> bool {
    let mime = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime.starts_with("audio/") || mime == "application/octet-stream"
}

fn truncate_chars(s: &str, limit: usize) -> String {
    s.chars().take(limit).collect()
}
