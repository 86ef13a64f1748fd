use crate::cache::NarrationResult;
use crate::config::NarrationConfig;
use serde::{Deserialize, Serialize};

/// Run-time of the subtitle fade-out closing every narrated segment.
pub const SUBTITLE_FADE_OUT: f64 = 1.0;

/// Idle time to insert after the planned animations so that the segment
/// lasts as long as its narration. Never negative.
pub fn trailing_pause(narration_secs: f64, planned_secs: f64, fade_out_secs: f64) -> f64 {
    let remaining = narration_secs - planned_secs - fade_out_secs;
    if remaining > 0.0 {
        remaining
    } else {
        0.0
    }
}

/// One narrated line of a scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub index: usize,
    /// Subtitle shown on screen, also the text that is spoken.
    pub subtitle: String,
    /// Run-times of the planned animations, in seconds.
    pub steps: Vec<f64>,
    pub narration: NarrationResult,
}

impl Segment {
    pub fn new(index: usize, subtitle: String, steps: Vec<f64>) -> Self {
        Self {
            index,
            subtitle,
            steps,
            narration: NarrationResult::silent(),
        }
    }

    pub fn with_narration(mut self, narration: NarrationResult) -> Self {
        self.narration = narration;
        self
    }

    /// Total run-time of the planned animations.
    pub fn planned(&self) -> f64 {
        self.steps.iter().copied().filter(|s| *s > 0.0).sum()
    }
}

/// Where a segment landed on the scene timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentTiming {
    pub index: usize,
    pub start: f64,
    /// Timeline offset at which the narration audio starts, if there is audio.
    pub audio_offset: Option<f64>,
    pub pause: f64,
    pub end: f64,
}

/// Lays narrated segments out back to back.
///
/// Each segment plays its animations, waits out whatever narration is left,
/// then fades its subtitle. Narration running shorter than the animations is
/// left alone; nothing is ever compressed.
#[derive(Debug, Clone)]
pub struct Timeline {
    fade_out: f64,
    default_wait: f64,
    cursor: f64,
    timings: Vec<SegmentTiming>,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::from_config(&NarrationConfig::default())
    }
}

impl Timeline {
    pub fn new(fade_out: f64, default_wait: f64) -> Self {
        Self {
            fade_out: fade_out.max(0.0),
            default_wait: default_wait.max(0.0),
            cursor: 0.0,
            timings: Vec::new(),
        }
    }

    /// Standard subtitle fade-out with the configured default wait.
    pub fn from_config(config: &NarrationConfig) -> Self {
        Self::new(SUBTITLE_FADE_OUT, config.default_wait)
    }

    pub fn schedule(&mut self, segment: &Segment) -> SegmentTiming {
        let start = self.cursor;
        let planned = segment.planned();
        let pause = match segment.narration.timing() {
            Some(secs) => trailing_pause(secs, planned, self.fade_out),
            None => self.default_wait,
        };
        let timing = SegmentTiming {
            index: segment.index,
            start,
            audio_offset: segment.narration.audio_path.as_ref().map(|_| start),
            pause,
            end: start + planned + pause + self.fade_out,
        };

        self.cursor = timing.end;
        self.timings.push(timing);
        timing
    }

    pub fn timings(&self) -> &[SegmentTiming] {
        &self.timings
    }

    pub fn total(&self) -> f64 {
        self.cursor
    }
}
