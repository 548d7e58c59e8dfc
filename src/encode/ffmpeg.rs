use std::{
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
};

use crate::foundation::error::{VersusError, VersusResult};
use crate::raster::buffer::RasterBuffer;
use crate::raster::composite::flatten_premul_to_opaque;
use crate::render::sink::FrameSink;

/// Raw-PCM narration input muxed alongside the frame stream.
#[derive(Clone, Debug)]
pub struct AudioInputConfig {
    /// Path to raw little-endian f32 PCM.
    pub path: PathBuf,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Parameters of one MP4 encode.
#[derive(Clone, Debug)]
pub struct EncodeConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub out_path: PathBuf,
    pub overwrite: bool,
    pub audio: Option<AudioInputConfig>,
}

impl EncodeConfig {
    pub fn validate(&self) -> VersusResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(VersusError::encoding("encode width/height must be non-zero"));
        }
        if self.fps == 0 {
            return Err(VersusError::encoding("encode fps must be non-zero"));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            // The default settings target yuv420p output for maximum compatibility.
            return Err(VersusError::encoding(
                "encode width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if let Some(audio) = &self.audio {
            if audio.sample_rate == 0 || audio.channels == 0 {
                return Err(VersusError::encoding(
                    "audio input sample rate and channels must be non-zero",
                ));
            }
        }
        Ok(())
    }
}

pub fn default_mp4_config(
    out_path: impl Into<PathBuf>,
    width: u32,
    height: u32,
    fps: u32,
) -> EncodeConfig {
    EncodeConfig {
        width,
        height,
        fps,
        out_path: out_path.into(),
        overwrite: true,
        audio: None,
    }
}

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn ensure_parent_dir(path: &Path) -> VersusResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// MP4 encoder implementing the [`FrameSink`] boundary by piping raw RGBA
/// frames to the system `ffmpeg` binary.
///
/// Using the system binary rather than native FFmpeg bindings avoids dev
/// header/lib requirements. Encoder failures (including audio muxing) are
/// surfaced as [`VersusError::Encoding`] from `finish`, never swallowed.
pub struct FfmpegEncoder {
    cfg: EncodeConfig,
    bg_rgba: [u8; 4],
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    scratch: Vec<u8>,
}

impl FfmpegEncoder {
    pub fn new(cfg: EncodeConfig, bg_rgba: [u8; 4]) -> VersusResult<Self> {
        cfg.validate()?;
        ensure_parent_dir(&cfg.out_path)?;

        if !cfg.overwrite && cfg.out_path.exists() {
            return Err(VersusError::encoding(format!(
                "output file '{}' already exists",
                cfg.out_path.display()
            )));
        }

        if !is_ffmpeg_on_path() {
            return Err(VersusError::encoding(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        if cfg.overwrite {
            cmd.arg("-y");
        } else {
            cmd.arg("-n");
        }

        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &cfg.fps.to_string(),
            "-i",
            "pipe:0",
        ]);

        if let Some(audio) = &cfg.audio {
            cmd.args([
                "-f",
                "f32le",
                "-ar",
                &audio.sample_rate.to_string(),
                "-ac",
                &audio.channels.to_string(),
                "-i",
            ])
            .arg(&audio.path)
            .args(["-map", "0:v:0", "-map", "1:a:0", "-c:a", "aac"]);
        } else {
            cmd.arg("-an");
        }

        cmd.args([
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .arg(&cfg.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            VersusError::encoding(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| VersusError::encoding("failed to open ffmpeg stdin (unexpected)"))?;

        Ok(Self {
            scratch: vec![0u8; (cfg.width * cfg.height * 4) as usize],
            cfg,
            bg_rgba,
            child: Some(child),
            stdin: Some(stdin),
        })
    }
}

impl FrameSink for FfmpegEncoder {
    fn write_frame(&mut self, frame: &RasterBuffer) -> VersusResult<()> {
        if frame.width() != self.cfg.width || frame.height() != self.cfg.height {
            return Err(VersusError::encoding(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width(),
                frame.height(),
                self.cfg.width,
                self.cfg.height
            )));
        }

        flatten_premul_to_opaque(&mut self.scratch, frame.as_bytes(), self.bg_rgba)?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(VersusError::encoding("ffmpeg encoder is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&self.scratch).map_err(|e| {
            VersusError::encoding(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;

        Ok(())
    }

    fn finish(&mut self) -> VersusResult<()> {
        drop(self.stdin.take());

        let Some(child) = self.child.take() else {
            return Err(VersusError::encoding("ffmpeg encoder is already finalized"));
        };

        let output = child.wait_with_output().map_err(|e| {
            VersusError::encoding(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VersusError::encoding(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_validation_catches_bad_values() {
        let base = default_mp4_config("assets/out.mp4", 10, 10, 30);

        let mut cfg = base.clone();
        cfg.width = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = base.clone();
        cfg.width = 11;
        assert!(cfg.validate().is_err());

        let mut cfg = base.clone();
        cfg.fps = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = base.clone();
        cfg.audio = Some(AudioInputConfig {
            path: PathBuf::from("a.pcm"),
            sample_rate: 0,
            channels: 2,
        });
        assert!(cfg.validate().is_err());

        assert!(base.validate().is_ok());
    }
}
