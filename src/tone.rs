// Copyright (c) Kyutai, all rights reserved.
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::frame::AudioFrame;
use crate::{Error, Result};

/// Peak sample value, well inside the i16 range so nothing clips.
pub const AMPLITUDE: f64 = 10_000.;

#[derive(Debug, Clone, PartialEq)]
pub struct ToneConfig {
    pub frequency: f64,
    pub duration_ms: u32,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self { frequency: 440., duration_ms: 1000 }
    }
}

impl ToneConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.frequency.is_finite() || self.frequency <= 0. {
            crate::bail!("invalid tone frequency {}", self.frequency)
        }
        Ok(())
    }

    fn duration_secs(&self) -> f64 {
        self.duration_ms as f64 / 1000.
    }

    /// Samples per channel needed to cover the duration at `sample_rate`.
    pub fn total_samples(&self, sample_rate: u32) -> u64 {
        (self.duration_ms as u64 * sample_rate as u64).div_ceil(1000)
    }

    /// Samples per channel actually rendered, the duration rounded up to whole
    /// frames of `frame_samples`.
    pub fn rendered_samples(&self, sample_rate: u32, frame_samples: usize) -> u64 {
        let frame_samples = frame_samples as u64;
        self.total_samples(sample_rate).div_ceil(frame_samples) * frame_samples
    }
}

/// Fills frames with a rising chirp starting at the configured frequency.
///
/// The duration is rounded up to a whole number of frames: the last frame is
/// always complete, never padded with silence. The phase keeps running from one
/// frame to the next and the generator cannot be restarted.
#[derive(Debug, Clone)]
pub struct ToneGenerator {
    frequency: f64,
    duration_secs: f64,
    t: f64,
    tincr: f64,
    frame_samples: usize,
    frames_total: u64,
    frames_done: u64,
}

impl ToneGenerator {
    pub fn new(tone: &ToneConfig, sample_rate: u32, frame_samples: usize) -> Result<Self> {
        tone.validate()?;
        if frame_samples == 0 || sample_rate == 0 {
            crate::bail!("invalid frame size {frame_samples} at {sample_rate} Hz")
        }
        let frames_total = tone.total_samples(sample_rate).div_ceil(frame_samples as u64);
        Ok(Self {
            frequency: tone.frequency,
            duration_secs: tone.duration_secs(),
            t: 0.,
            tincr: 2. * std::f64::consts::PI * tone.frequency / sample_rate as f64,
            frame_samples,
            frames_total,
            frames_done: 0,
        })
    }

    pub fn frames_total(&self) -> u64 {
        self.frames_total
    }

    pub fn frames_remaining(&self) -> u64 {
        self.frames_total - self.frames_done
    }

    pub fn phase(&self) -> f64 {
        self.t
    }

    fn sample(&self) -> i16 {
        let t = self.t;
        let chirp = t + t * t / (self.frequency * std::f64::consts::PI * self.duration_secs);
        (chirp.sin() * AMPLITUDE).round() as i16
    }

    /// Fills the next frame in place, returns `false` once every frame has been
    /// produced. The frame buffer is made writable first, copying it if the
    /// encoder still holds on to it.
    pub fn fill_next(&mut self, frame: &mut AudioFrame) -> Result<bool> {
        if self.frames_done >= self.frames_total {
            return Ok(false);
        }
        if frame.nb_samples() != self.frame_samples {
            return Err(Error::FrameMismatch {
                expected: format!("{} samples", self.frame_samples),
                actual: format!("{} samples", frame.nb_samples()),
            });
        }
        frame.make_writable();
        frame.set_pts(self.frames_done * self.frame_samples as u64);
        let mut samples = frame.samples_mut();
        for j in 0..self.frame_samples {
            samples.set_all_channels(j, self.sample());
            self.t += self.tincr;
        }
        self.frames_done += 1;
        Ok(true)
    }
}
