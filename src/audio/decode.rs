use std::path::Path;

use crate::audio::track::AudioTrack;
use crate::foundation::error::{VersusError, VersusResult};

/// Decode an audio file to interleaved stereo `f32` PCM at `sample_rate`
/// using the system `ffmpeg` binary.
///
/// This exists for callers (such as the CLI) that receive narration as a
/// file; the engine itself only ever sees the resulting [`AudioTrack`].
pub fn decode_audio_f32_stereo(path: &Path, sample_rate: u32) -> VersusResult<AudioTrack> {
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "2",
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| VersusError::encoding(format!("failed to run ffmpeg for audio decode: {e}")))?;

    if !out.status.success() {
        let msg = String::from_utf8_lossy(&out.stderr);
        return Err(VersusError::encoding(format!(
            "ffmpeg audio decode failed for '{}': {}",
            path.display(),
            msg.trim()
        )));
    }

    let mut samples = Vec::with_capacity(out.stdout.len() / 4);
    for chunk in out.stdout.chunks_exact(4) {
        samples.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    AudioTrack::new(sample_rate, 2, samples)
}
