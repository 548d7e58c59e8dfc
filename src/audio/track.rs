use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{VersusError, VersusResult};

/// Sample rate used when handing PCM to the encoder.
pub const MIX_SAMPLE_RATE: u32 = 48_000;

/// An opaque narration-track handle: interleaved `f32` PCM with its own
/// duration.
///
/// The engine never synthesizes or analyzes audio; it only truncates a track
/// to the scene duration before muxing and exports it in the raw format the
/// encoder boundary expects.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioTrack {
    sample_rate: u32,
    channels: u16,
    interleaved_f32: Vec<f32>,
}

impl AudioTrack {
    pub fn new(sample_rate: u32, channels: u16, interleaved_f32: Vec<f32>) -> VersusResult<Self> {
        if sample_rate == 0 {
            return Err(VersusError::invalid_timing("audio sample rate must be > 0"));
        }
        if channels == 0 {
            return Err(VersusError::invalid_timing("audio channel count must be > 0"));
        }
        if !interleaved_f32.len().is_multiple_of(usize::from(channels)) {
            return Err(VersusError::invalid_timing(
                "audio sample count must be a multiple of the channel count",
            ));
        }
        Ok(Self {
            sample_rate,
            channels,
            interleaved_f32,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn samples(&self) -> &[f32] {
        &self.interleaved_f32
    }

    pub fn is_empty(&self) -> bool {
        self.interleaved_f32.is_empty()
    }

    /// Number of per-channel sample frames.
    pub fn sample_frames(&self) -> u64 {
        (self.interleaved_f32.len() / usize::from(self.channels)) as u64
    }

    pub fn duration_sec(&self) -> f64 {
        self.sample_frames() as f64 / f64::from(self.sample_rate)
    }

    /// Copy of this track cut down to at most `secs` seconds. A track that
    /// is already short enough is returned unchanged; shorter tracks are
    /// never looped or padded.
    pub fn truncated_to(&self, secs: f64) -> AudioTrack {
        if secs <= 0.0 {
            return AudioTrack {
                sample_rate: self.sample_rate,
                channels: self.channels,
                interleaved_f32: Vec::new(),
            };
        }
        let max_frames = (secs * f64::from(self.sample_rate)).floor() as u64;
        if max_frames >= self.sample_frames() {
            return self.clone();
        }
        let keep = max_frames as usize * usize::from(self.channels);
        AudioTrack {
            sample_rate: self.sample_rate,
            channels: self.channels,
            interleaved_f32: self.interleaved_f32[..keep].to_vec(),
        }
    }

    /// Write raw little-endian `f32` PCM, the input format the encoder
    /// boundary consumes.
    pub fn write_f32le(&self, path: &Path) -> VersusResult<()> {
        let mut bytes = Vec::with_capacity(self.interleaved_f32.len() * 4);
        for s in &self.interleaved_f32 {
            bytes.extend_from_slice(&s.to_le_bytes());
        }
        std::fs::write(path, bytes)
            .with_context(|| format!("write raw pcm to '{}'", path.display()))
            .map_err(VersusError::from)
    }
}
