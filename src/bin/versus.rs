use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "versus", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a full two-option video as MP4 (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
}

#[derive(Parser, Debug)]
struct SceneArgs {
    /// Caption of the first (upper) option.
    #[arg(long)]
    first: String,

    /// Caption of the second (lower) option.
    #[arg(long)]
    second: String,

    /// Image for the first option.
    #[arg(long)]
    first_image: PathBuf,

    /// Image for the second option.
    #[arg(long)]
    second_image: PathBuf,

    /// Background image (resampled to cover the canvas).
    #[arg(long)]
    background: PathBuf,

    /// Caption font (TTF/OTF).
    #[arg(long)]
    font: PathBuf,

    /// Percentage shown for the first option (requires --second-percent).
    #[arg(long)]
    first_percent: Option<f64>,

    /// Percentage shown for the second option (requires --first-percent).
    #[arg(long)]
    second_percent: Option<f64>,

    /// Timing/layout config JSON; missing fields take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Narration audio file, decoded via ffmpeg and muxed into the output.
    #[arg(long)]
    audio: Option<PathBuf>,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Render frame chunks on a rayon worker pool.
    #[arg(long)]
    parallel: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<versus::VersusConfig> {
    let Some(path) = path else {
        return Ok(versus::VersusConfig::default());
    };
    let bytes =
        std::fs::read(path).with_context(|| format!("read config '{}'", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| "parse config JSON")
}

fn read_raster(path: &Path) -> anyhow::Result<versus::RasterBuffer> {
    let bytes = std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    versus::decode_image(&bytes).with_context(|| format!("decode image '{}'", path.display()))
}

impl SceneArgs {
    fn build(&self) -> anyhow::Result<versus::Timeline> {
        let cfg = load_config(self.config.as_deref())?;
        let background = read_raster(&self.background)?;
        let font_bytes = std::fs::read(&self.font)
            .with_context(|| format!("read font '{}'", self.font.display()))?;

        let first = versus::OptionSpec {
            caption: self.first.clone(),
            image: read_raster(&self.first_image)?,
            percentage: self.first_percent,
        };
        let second = versus::OptionSpec {
            caption: self.second.clone(),
            image: read_raster(&self.second_image)?,
            percentage: self.second_percent,
        };

        Ok(versus::build_timeline(
            &cfg,
            &background,
            &first,
            &second,
            Arc::new(font_bytes),
        )?)
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let timeline = args.scene.build()?;

    let audio = match &args.audio {
        Some(path) => Some(versus::decode_audio_f32_stereo(
            path,
            versus::MIX_SAMPLE_RATE,
        )?),
        None => None,
    };

    let opts = versus::RenderToMp4Opts {
        threading: versus::RenderThreading {
            parallel: args.parallel,
            ..versus::RenderThreading::default()
        },
        ..versus::RenderToMp4Opts::default()
    };

    let mut progress = versus::ProgressFn(|percent: u8, status: &str| {
        eprintln!("{percent:>3}% {status}");
    });

    let stats = versus::render_to_mp4(&timeline, &args.out, opts, audio.as_ref(), &mut progress)?;
    eprintln!("wrote {} ({} frames)", args.out.display(), stats.frames_total);
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let timeline = args.scene.build()?;
    let frame_count = timeline.scene().frame_count();
    if args.frame >= frame_count {
        anyhow::bail!("frame {} out of range (scene has {frame_count} frames)", args.frame);
    }

    let frame = versus::compose_frame(&timeline, versus::FrameIndex(args.frame))?;
    let mut flat = vec![0u8; frame.as_bytes().len()];
    versus::flatten_premul_to_opaque(&mut flat, frame.as_bytes(), [0, 0, 0, 255])?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        &flat,
        frame.width(),
        frame.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
