use std::sync::Arc;

use crate::clip::model::{
    AnimatedImageClip, BackgroundClip, Clip, PercentageTextClip, TextClip,
};
use crate::clip::position::{EntrySide, SlideTiming};
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{VersusError, VersusResult};
use crate::raster::buffer::RasterBuffer;
use crate::text::format::format_percent;
use crate::text::raster::{TextRasterizer, TextStyle};
use crate::timeline::model::{Scene, Timeline};

const PERCENT_SUM_EPS: f64 = 1e-6;

/// Immutable timing and layout constants of a two-option render.
///
/// A config value is passed into scene assembly per call; renders with
/// different settings can run concurrently without interfering.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct VersusConfig {
    /// Total video duration in seconds.
    pub duration_sec: f64,
    pub fps: Fps,
    pub canvas: Canvas,
    /// Maximum dimension option images are resized to fit.
    pub max_image_dimension: u32,
    /// Length of each entrance/exit slide.
    pub slide_duration_sec: f64,
    /// Length of the entrance spin (90 degrees to upright).
    pub spin_duration_sec: f64,
    /// Offset before the scene end at which image exits begin.
    pub exit_lead_sec: f64,
    /// Global time at which captions appear.
    pub text_start_sec: f64,
    /// Caption cross-fade duration.
    pub text_fade_sec: f64,
    /// Global time at which percentages are revealed.
    pub percent_reveal_sec: f64,
    /// Global start offset of the first option's image.
    pub option_one_start_sec: f64,
    /// Global start offset of the second option's image.
    pub option_two_start_sec: f64,
    pub font_size_px: f32,
    pub stroke_width_px: f32,
    /// Caption fill color (straight RGBA8).
    pub fill_rgba8: [u8; 4],
    /// Caption stroke color (straight RGBA8).
    pub stroke_rgba8: [u8; 4],
}

impl Default for VersusConfig {
    fn default() -> Self {
        Self {
            duration_sec: 10.0,
            fps: Fps { num: 30, den: 1 },
            canvas: Canvas {
                width: 1080,
                height: 1920,
            },
            max_image_dimension: 500,
            slide_duration_sec: 0.3,
            spin_duration_sec: 0.3,
            exit_lead_sec: 0.6,
            text_start_sec: 1.0,
            text_fade_sec: 0.3,
            percent_reveal_sec: 6.0,
            option_one_start_sec: 0.0,
            option_two_start_sec: 0.0,
            font_size_px: 100.0,
            stroke_width_px: 4.0,
            fill_rgba8: [255, 255, 255, 255],
            stroke_rgba8: [0, 0, 0, 255],
        }
    }
}

impl VersusConfig {
    pub fn scene(&self) -> VersusResult<Scene> {
        Scene::new(self.fps, self.canvas, self.duration_sec)
    }

    pub fn slide_timing(&self) -> SlideTiming {
        SlideTiming {
            slide_duration_sec: self.slide_duration_sec,
            exit_lead_sec: self.exit_lead_sec,
        }
    }

    /// Vertical offset of the first (upper) option image: centered within
    /// the upper half of the canvas.
    pub fn upper_image_y(&self) -> f64 {
        (f64::from(self.canvas.height) / 2.0 - f64::from(self.max_image_dimension)) / 2.0
    }

    /// Vertical offset of the second (lower) option image, mirroring the
    /// upper slot against the bottom edge.
    pub fn lower_image_y(&self) -> f64 {
        (f64::from(self.canvas.height) - self.upper_image_y())
            - f64::from(self.max_image_dimension)
    }

    pub fn upper_text_y(&self) -> f64 {
        f64::from(self.canvas.height) / 2.0 - 200.0
    }

    pub fn lower_text_y(&self) -> f64 {
        f64::from(self.canvas.height) / 2.0 + 40.0
    }

    /// Percentages are revealed over the vertical center of each option
    /// image.
    pub fn upper_percent_y(&self) -> f64 {
        self.upper_image_y() + f64::from(self.max_image_dimension) / 2.0
            - f64::from(self.font_size_px) / 2.0
    }

    pub fn lower_percent_y(&self) -> f64 {
        self.lower_image_y() + f64::from(self.max_image_dimension) / 2.0
            - f64::from(self.font_size_px) / 2.0
    }

    pub fn text_style(&self, font_bytes: Arc<Vec<u8>>) -> TextStyle {
        TextStyle {
            font_bytes,
            size_px: self.font_size_px,
            fill_rgba8: self.fill_rgba8,
            stroke_rgba8: self.stroke_rgba8,
            stroke_width_px: self.stroke_width_px,
            // Leave a small horizontal margin for wrapped captions.
            max_width_px: Some(self.canvas.width as f32 - 80.0),
        }
    }

    /// Fail fast on configurations no timeline could be assembled from.
    pub fn validate(&self) -> VersusResult<()> {
        self.scene()?;
        self.slide_timing().validate()?;
        if self.max_image_dimension == 0 {
            return Err(VersusError::invalid_timing(
                "max image dimension must be > 0",
            ));
        }
        if !self.spin_duration_sec.is_finite() || self.spin_duration_sec < 0.0 {
            return Err(VersusError::invalid_timing(
                "spin duration must be finite and >= 0",
            ));
        }
        if !self.text_fade_sec.is_finite() || self.text_fade_sec < 0.0 {
            return Err(VersusError::invalid_timing(
                "text fade must be finite and >= 0",
            ));
        }
        for (name, start) in [
            ("text start", self.text_start_sec),
            ("percent reveal", self.percent_reveal_sec),
            ("option one start", self.option_one_start_sec),
            ("option two start", self.option_two_start_sec),
        ] {
            if !start.is_finite() || start < 0.0 || start >= self.duration_sec {
                return Err(VersusError::invalid_timing(format!(
                    "{name} must lie within [0, duration)"
                )));
            }
        }
        Ok(())
    }
}

/// One competing option: caption, validated source image, optional
/// percentage.
#[derive(Clone, Debug)]
pub struct OptionSpec {
    pub caption: String,
    pub image: RasterBuffer,
    pub percentage: Option<f64>,
}

/// Check the percentage pair contract: both present or both absent, each in
/// `[0, 100]`, summing to 100.
fn validate_percentages(first: Option<f64>, second: Option<f64>) -> VersusResult<()> {
    match (first, second) {
        (None, None) => Ok(()),
        (Some(a), Some(b)) => {
            for v in [a, b] {
                if !v.is_finite() || !(0.0..=100.0).contains(&v) {
                    return Err(VersusError::invalid_timing(
                        "percentages must lie within [0, 100]",
                    ));
                }
            }
            if (a + b - 100.0).abs() > PERCENT_SUM_EPS {
                return Err(VersusError::invalid_timing(
                    "percentages must sum to 100",
                ));
            }
            Ok(())
        }
        _ => Err(VersusError::invalid_timing(
            "percentages must be supplied for both options or neither",
        )),
    }
}

/// Assemble the full two-option timeline: background, both option images
/// (staggered entrances from opposite sides), cross-fading captions, and
/// optional percentage reveals.
///
/// All validation happens here, before any frame is rendered.
#[tracing::instrument(skip_all, fields(first = %first.caption, second = %second.caption))]
pub fn build_timeline(
    cfg: &VersusConfig,
    background: &RasterBuffer,
    first: &OptionSpec,
    second: &OptionSpec,
    font_bytes: Arc<Vec<u8>>,
) -> VersusResult<Timeline> {
    cfg.validate()?;
    validate_percentages(first.percentage, second.percentage)?;

    let scene = cfg.scene()?;
    let mut timeline = Timeline::new(scene);

    timeline.add_layer(
        Clip::Background(BackgroundClip::new(background, cfg.canvas)?),
        0.0,
        cfg.duration_sec,
    )?;

    // The first option travels in from the left edge, the second from the
    // right; each exits through the opposite side.
    for (spec, side, y, start) in [
        (
            first,
            EntrySide::Right,
            cfg.upper_image_y(),
            cfg.option_one_start_sec,
        ),
        (
            second,
            EntrySide::Left,
            cfg.lower_image_y(),
            cfg.option_two_start_sec,
        ),
    ] {
        let clip = AnimatedImageClip::new(
            &spec.image,
            side,
            cfg.canvas,
            cfg.max_image_dimension,
            y,
            cfg.spin_duration_sec,
            cfg.slide_timing(),
        )?;
        timeline.add_layer(Clip::AnimatedImage(clip), start, cfg.duration_sec - start)?;
    }

    let mut rasterizer = TextRasterizer::new();
    let style = cfg.text_style(font_bytes);
    let caption_duration = cfg.duration_sec - cfg.text_start_sec;

    for (spec, y) in [(first, cfg.upper_text_y()), (second, cfg.lower_text_y())] {
        let raster = rasterizer.rasterize(&spec.caption, &style)?;
        timeline.add_layer(
            Clip::Text(TextClip::new(raster, y, cfg.text_fade_sec)?),
            cfg.text_start_sec,
            caption_duration,
        )?;
    }

    if first.percentage.is_some() {
        let percent_duration = cfg.duration_sec - cfg.percent_reveal_sec;
        for (spec, y) in [
            (first, cfg.upper_percent_y()),
            (second, cfg.lower_percent_y()),
        ] {
            // Checked non-None for both options by validate_percentages.
            let Some(value) = spec.percentage else {
                continue;
            };
            let raster = rasterizer.rasterize(&format_percent(value), &style)?;
            timeline.add_layer(
                Clip::PercentageText(PercentageTextClip::new(
                    value,
                    raster,
                    y,
                    cfg.text_fade_sec,
                )?),
                cfg.percent_reveal_sec,
                percent_duration,
            )?;
        }
    }

    Ok(timeline)
}
