//! Versus is an animation and compositing engine for short two-option
//! ("would you rather" style) portrait videos.
//!
//! The engine turns two still images, two caption strings and a set of
//! timing/layout constants into a deterministic sequence of rendered frames:
//!
//! 1. **Assemble**: `VersusConfig + options -> Timeline` (clips placed with
//!    global start offsets)
//! 2. **Sample**: `Timeline + global time -> layer stack` (each clip
//!    evaluated on its own local clock)
//! 3. **Render**: back-to-front premultiplied-alpha compositing at a fixed
//!    frame rate
//! 4. **Encode** (optional): stream frames to the system `ffmpeg` binary for
//!    MP4 output, muxing an optional narration track
//!
//! Design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic-by-default**: clip evaluation is pure; rendering the
//!   same timeline twice yields pixel-identical frames.
//! - **No shared mutable state between frames**: every frame is a function
//!   of its timestamp alone, so disjoint frame ranges may render in
//!   parallel and be reassembled in order.
//! - **Premultiplied RGBA8 end-to-end**.
#![forbid(unsafe_code)]

mod audio;
mod clip;
mod encode;
mod foundation;
mod preset;
mod raster;
mod render;
mod text;
mod timeline;

pub use audio::decode::decode_audio_f32_stereo;
pub use audio::track::{AudioTrack, MIX_SAMPLE_RATE};
pub use clip::model::{
    AnimatedImageClip, BackgroundClip, Clip, LayerFrame, PercentageTextClip, TextClip,
};
pub use clip::position::{EntrySide, SlidePath, SlideTiming};
pub use encode::ffmpeg::{
    AudioInputConfig, EncodeConfig, FfmpegEncoder, default_mp4_config, ensure_parent_dir,
    is_ffmpeg_on_path,
};
pub use foundation::core::{Canvas, Fps, FrameIndex, FrameRange, Vec2};
pub use foundation::error::{VersusError, VersusResult};
pub use preset::versus::{OptionSpec, VersusConfig, build_timeline};
pub use raster::buffer::{RasterBuffer, decode_image};
pub use raster::composite::{blit_over, flatten_premul_to_opaque, over};
pub use raster::resize::{resize_multiplier, resize_to_fit};
pub use raster::rotate::{rotate_with_expand, rotated_bounds, spin_angle_deg};
pub use render::progress::{NullProgress, ProgressFn, ProgressSink};
pub use render::renderer::{
    RenderStats, RenderThreading, RenderToMp4Opts, compose_frame, render_frames, render_to_mp4,
    render_to_sink,
};
pub use render::sink::{CollectSink, FrameSink};
pub use text::format::format_percent;
pub use text::raster::{TextRasterizer, TextStyle};
pub use timeline::model::{Layer, Scene, Timeline};
