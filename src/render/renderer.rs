use std::path::PathBuf;

use rayon::prelude::*;

use crate::audio::track::AudioTrack;
use crate::encode::ffmpeg::{AudioInputConfig, EncodeConfig, FfmpegEncoder};
use crate::foundation::core::{FrameIndex, FrameRange};
use crate::foundation::error::{VersusError, VersusResult};
use crate::raster::buffer::RasterBuffer;
use crate::raster::composite::blit_over;
use crate::render::progress::{MonotonicProgress, NullProgress, ProgressSink};
use crate::render::sink::{CollectSink, FrameSink};
use crate::timeline::model::Timeline;

/// Threading/chunking configuration for the frame loop.
///
/// Frames are independent pure functions of their timestamp, so disjoint
/// ranges may be evaluated concurrently; outputs are always reassembled in
/// frame order before they reach the sink.
#[derive(Clone, Debug)]
pub struct RenderThreading {
    pub parallel: bool,
    pub chunk_size: usize,
    pub threads: Option<usize>,
}

impl Default for RenderThreading {
    fn default() -> Self {
        Self {
            parallel: false,
            chunk_size: 64,
            threads: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub frames_total: u64,
}

// Frame-loop progress is scaled into this window; the edges are reserved
// for setup and finalization milestones.
const PROGRESS_FRAMES_START: u64 = 15;
const PROGRESS_FRAMES_SPAN: u64 = 80;

/// Compose the single frame at `frame`: sample the timeline at the frame's
/// timestamp and blend every active layer back-to-front over a transparent
/// canvas.
///
/// Pure in `(timeline, frame)`; rendering the same frame twice yields
/// pixel-identical buffers.
pub fn compose_frame(timeline: &Timeline, frame: FrameIndex) -> VersusResult<RasterBuffer> {
    let scene = timeline.scene();
    let t = scene.fps.frame_time_secs(frame);
    let width = scene.canvas.width;
    let height = scene.canvas.height;

    let mut scratch = vec![0u8; width as usize * height as usize * 4];
    for layer_frame in timeline.sample_at(t) {
        blit_over(
            &mut scratch,
            width,
            height,
            &layer_frame.raster,
            layer_frame.position.x.round() as i64,
            layer_frame.position.y.round() as i64,
            layer_frame.alpha,
        );
    }
    RasterBuffer::from_premul_parts(width, height, scratch)
}

/// Render the whole scene into memory. Convenience wrapper over
/// [`render_to_sink`] with default threading and no progress reporting.
pub fn render_frames(timeline: &Timeline) -> VersusResult<Vec<RasterBuffer>> {
    let mut sink = CollectSink::new();
    let mut progress = NullProgress;
    render_to_sink(
        timeline,
        &mut sink,
        &RenderThreading::default(),
        &mut progress,
    )?;
    Ok(sink.frames)
}

/// Render every frame of the scene in order into `sink`.
///
/// The frame count is `floor(duration * fps)`; frame `i` is evaluated at
/// `t = i / fps`. The call is stateless and idempotent: invoking it twice
/// for the same timeline produces identical frame sequences. Mid-render
/// sink failures abort the render; there is no partial recovery.
#[tracing::instrument(level = "debug", skip_all, fields(frames = timeline.scene().frame_count()))]
pub fn render_to_sink(
    timeline: &Timeline,
    sink: &mut dyn FrameSink,
    threading: &RenderThreading,
    progress: &mut dyn ProgressSink,
) -> VersusResult<RenderStats> {
    let total = timeline.scene().frame_count();
    if total == 0 {
        return Err(VersusError::invalid_timing(
            "scene is shorter than a single frame",
        ));
    }

    let mut progress = MonotonicProgress::new(progress);
    progress.emit(5, "Preparing render...");

    let emit_frame_progress = |progress: &mut MonotonicProgress<'_>, done: u64| {
        let percent = PROGRESS_FRAMES_START + done * PROGRESS_FRAMES_SPAN / total;
        progress.emit(percent as u8, "Rendering frames...");
    };

    if !threading.parallel {
        for i in 0..total {
            let frame = compose_frame(timeline, FrameIndex(i))?;
            sink.write_frame(&frame)?;
            emit_frame_progress(&mut progress, i + 1);
        }
    } else {
        let pool = build_thread_pool(threading.threads)?;
        let chunk_size = (threading.chunk_size.max(1)) as u64;

        let mut chunk_start = 0u64;
        while chunk_start < total {
            let chunk = FrameRange::new(
                FrameIndex(chunk_start),
                FrameIndex((chunk_start + chunk_size).min(total)),
            )?;
            let rendered = render_chunk_parallel(timeline, chunk, &pool);
            for (offset, frame) in rendered.into_iter().enumerate() {
                sink.write_frame(&frame?)?;
                emit_frame_progress(&mut progress, chunk.start.0 + offset as u64 + 1);
            }
            chunk_start = chunk.end.0;
        }
    }

    progress.emit(98, "Finalizing...");
    sink.finish()?;
    progress.emit(100, "Complete");

    Ok(RenderStats {
        frames_total: total,
    })
}

/// Options for [`render_to_mp4`].
#[derive(Clone, Debug)]
pub struct RenderToMp4Opts {
    /// Background color to flatten alpha over (straight RGBA8).
    pub bg_rgba: [u8; 4],
    /// Whether to overwrite the output file if it already exists.
    pub overwrite: bool,
    pub threading: RenderThreading,
}

impl Default for RenderToMp4Opts {
    fn default() -> Self {
        Self {
            bg_rgba: [0, 0, 0, 255],
            overwrite: true,
            threading: RenderThreading::default(),
        }
    }
}

/// Render the scene to an MP4 via the system `ffmpeg` binary, optionally
/// muxing a narration track.
///
/// A narration longer than the scene is truncated to the scene duration
/// before muxing; a shorter one is played once and never looped or padded.
#[tracing::instrument(level = "debug", skip_all)]
pub fn render_to_mp4(
    timeline: &Timeline,
    out_path: impl Into<PathBuf>,
    opts: RenderToMp4Opts,
    audio: Option<&AudioTrack>,
    progress: &mut dyn ProgressSink,
) -> VersusResult<RenderStats> {
    let scene = *timeline.scene();
    let fps = if scene.fps.den == 1 {
        scene.fps.num
    } else {
        return Err(VersusError::invalid_timing(
            "mp4 output currently requires integer fps (fps.den == 1)",
        ));
    };

    let mut audio_tmp = TempFileGuard(None);
    let audio_cfg = match audio {
        Some(track) if !track.is_empty() => {
            let track = if track.duration_sec() > scene.duration_sec {
                track.truncated_to(scene.duration_sec)
            } else {
                track.clone()
            };
            let path = std::env::temp_dir().join(format!(
                "versus_narration_{}_{}.f32le",
                std::process::id(),
                std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.as_nanos())
                    .unwrap_or(0)
            ));
            track.write_f32le(&path)?;
            audio_tmp.0 = Some(path.clone());
            Some(AudioInputConfig {
                path,
                sample_rate: track.sample_rate(),
                channels: track.channels(),
            })
        }
        _ => None,
    };

    let cfg = EncodeConfig {
        width: scene.canvas.width,
        height: scene.canvas.height,
        fps,
        out_path: out_path.into(),
        overwrite: opts.overwrite,
        audio: audio_cfg,
    };

    let mut encoder = FfmpegEncoder::new(cfg, opts.bg_rgba)?;
    let stats = render_to_sink(timeline, &mut encoder, &opts.threading, progress)?;
    drop(audio_tmp);
    Ok(stats)
}

/// Evaluate a chunk of frames on the worker pool, preserving frame order in
/// the returned vector. Frames share no mutable state, so the fan-out needs
/// no synchronization beyond the final in-order collect.
fn render_chunk_parallel(
    timeline: &Timeline,
    chunk: FrameRange,
    pool: &rayon::ThreadPool,
) -> Vec<VersusResult<RasterBuffer>> {
    pool.install(|| {
        (chunk.start.0..chunk.end.0)
            .into_par_iter()
            .map(|i| compose_frame(timeline, FrameIndex(i)))
            .collect()
    })
}

fn build_thread_pool(threads: Option<usize>) -> VersusResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(VersusError::invalid_timing(
            "render threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| VersusError::Other(anyhow::anyhow!("failed to build rayon thread pool: {e}")))
}

struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::model::{BackgroundClip, Clip};
    use crate::foundation::core::{Canvas, Fps};
    use crate::render::progress::ProgressFn;
    use crate::timeline::model::Scene;

    fn small_timeline() -> Timeline {
        let scene = Scene::new(
            Fps::whole(10).unwrap(),
            Canvas {
                width: 16,
                height: 32,
            },
            1.0,
        )
        .unwrap();
        let mut tl = Timeline::new(scene);
        let bg = RasterBuffer::solid(16, 32, [40, 50, 60, 255]).unwrap();
        tl.add_layer(
            Clip::Background(BackgroundClip::new(&bg, scene.canvas).unwrap()),
            0.0,
            1.0,
        )
        .unwrap();
        tl
    }

    #[test]
    fn frame_count_matches_duration_times_fps() {
        let frames = render_frames(&small_timeline()).unwrap();
        assert_eq!(frames.len(), 10);
        assert_eq!(frames[0].pixel(3, 3), [40, 50, 60, 255]);
    }

    #[test]
    fn sequential_and_parallel_agree() {
        let tl = small_timeline();
        let sequential = render_frames(&tl).unwrap();

        let mut sink = CollectSink::new();
        let threading = RenderThreading {
            parallel: true,
            chunk_size: 3,
            threads: Some(2),
        };
        render_to_sink(&tl, &mut sink, &threading, &mut NullProgress).unwrap();

        assert_eq!(sequential, sink.frames);
    }

    #[test]
    fn progress_is_monotonic_and_terminates_at_100() {
        let tl = small_timeline();
        let mut seen: Vec<u8> = Vec::new();
        let mut progress = ProgressFn(|p, _s: &str| seen.push(p));
        let mut sink = CollectSink::new();
        render_to_sink(&tl, &mut sink, &RenderThreading::default(), &mut progress).unwrap();

        assert!(seen.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(*seen.first().unwrap(), 5);
        assert_eq!(*seen.last().unwrap(), 100);
    }

    #[test]
    fn zero_worker_threads_is_rejected() {
        let tl = small_timeline();
        let threading = RenderThreading {
            parallel: true,
            chunk_size: 8,
            threads: Some(0),
        };
        let mut sink = CollectSink::new();
        let err = render_to_sink(&tl, &mut sink, &threading, &mut NullProgress).unwrap_err();
        assert!(matches!(err, VersusError::InvalidTiming(_)));
    }
}
