//! Reading playback length from synthesized narration clips.

use crate::error::{NarrationError, Result};
use std::path::Path;
use symphonia::core::codecs::CodecParameters;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

/// Playback length of the audio clip at `path`, in seconds.
///
/// The container header is trusted when it declares a frame count. Otherwise
/// packets are walked to the end of the stream and their durations summed.
/// Empty files, unrecognised data and non-positive lengths are errors.
pub fn read_duration(path: &Path) -> Result<f64> {
    let size = std::fs::metadata(path)?.len();
    if size == 0 {
        return Err(NarrationError::DecodeError(format!(
            "audio file is empty: {}",
            path.display()
        )));
    }

    let file = std::fs::File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let detected = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| decode_error(path, e))?;
    let mut format = detected.format;

    let track = format
        .default_track()
        .ok_or_else(|| NarrationError::DecodeError(format!("no audio track in {}", path.display())))?;
    let track_id = track.id;
    let params = track.codec_params.clone();

    let seconds = match params.n_frames {
        Some(frames) => frames_to_seconds(&params, frames),
        None => {
            let mut frames = 0u64;
            loop {
                match format.next_packet() {
                    Ok(packet) => {
                        if packet.track_id() == track_id {
                            frames += packet.dur;
                        }
                    }
                    Err(SymphoniaError::IoError(ref e))
                        if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                    {
                        break
                    }
                    Err(SymphoniaError::ResetRequired) => break,
                    Err(e) => return Err(decode_error(path, e)),
                }
            }
            frames_to_seconds(&params, frames)
        }
    };

    let seconds = seconds.ok_or_else(|| {
        NarrationError::DecodeError(format!(
            "cannot derive a time base for {}",
            path.display()
        ))
    })?;

    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(NarrationError::DecodeError(format!(
            "audio clip has invalid duration {} in {}",
            seconds,
            path.display()
        )));
    }

    debug!(path = %path.display(), seconds, "Read narration duration");
    Ok(seconds)
}

fn frames_to_seconds(params: &CodecParameters, frames: u64) -> Option<f64> {
    if let Some(tb) = params.time_base {
        let time = tb.calc_time(frames);
        return Some(time.seconds as f64 + time.frac);
    }
    params
        .sample_rate
        .filter(|rate| *rate > 0)
        .map(|rate| frames as f64 / f64::from(rate))
}

fn decode_error(path: &Path, err: SymphoniaError) -> NarrationError {
    NarrationError::DecodeError(format!("{}: {}", path.display(), err))
}
