use crate::clip::position::{EntrySide, SlidePath, SlideTiming};
use crate::foundation::core::{Canvas, Vec2};
use crate::foundation::error::{VersusError, VersusResult};
use crate::foundation::math::clamp01;
use crate::raster::buffer::RasterBuffer;
use crate::raster::resize::{resize_exact, resize_to_fit};
use crate::raster::rotate::{rotate_with_expand, spin_angle_deg};

/// One layer's contribution to a frame: the time-evaluated raster, its
/// canvas placement, and an overall opacity.
#[derive(Clone, Debug)]
pub struct LayerFrame {
    pub raster: RasterBuffer,
    pub position: Vec2,
    pub alpha: f32,
}

/// Static full-canvas backdrop.
#[derive(Clone, Debug)]
pub struct BackgroundClip {
    raster: RasterBuffer,
}

impl BackgroundClip {
    /// Wrap a backdrop, resampling it to cover the canvas exactly.
    pub fn new(source: &RasterBuffer, canvas: Canvas) -> VersusResult<Self> {
        Ok(Self {
            raster: resize_exact(source, canvas.width, canvas.height)?,
        })
    }

    fn sample(&self) -> LayerFrame {
        LayerFrame {
            raster: self.raster.clone(),
            position: Vec2::ZERO,
            alpha: 1.0,
        }
    }
}

/// An option image that spins upright while sliding in, rests centered, and
/// slides out through the opposite side.
#[derive(Clone, Debug)]
pub struct AnimatedImageClip {
    resized: RasterBuffer,
    resize_multiplier: f64,
    spin_duration_sec: f64,
    path: SlidePath,
}

impl AnimatedImageClip {
    /// Resize the source to the configured maximum dimension and set up the
    /// slide path. The resize runs once here; only the rotation pose varies
    /// per frame.
    pub fn new(
        source: &RasterBuffer,
        side: EntrySide,
        canvas: Canvas,
        max_dimension: u32,
        y_offset: f64,
        spin_duration_sec: f64,
        timing: SlideTiming,
    ) -> VersusResult<Self> {
        if !spin_duration_sec.is_finite() || spin_duration_sec < 0.0 {
            return Err(VersusError::invalid_timing(
                "spin duration must be finite and >= 0",
            ));
        }
        let (resized, resize_multiplier) = resize_to_fit(source, max_dimension)?;
        let path = SlidePath::new(
            side,
            canvas,
            f64::from(resized.width()),
            f64::from(max_dimension),
            y_offset,
            timing,
        )?;
        Ok(Self {
            resized,
            resize_multiplier,
            spin_duration_sec,
            path,
        })
    }

    /// Uniform scale factor that was applied to the source image.
    pub fn resize_multiplier(&self) -> f64 {
        self.resize_multiplier
    }

    /// Post-resize reference dimensions used by the position math.
    pub fn reference_size(&self) -> (u32, u32) {
        (self.resized.width(), self.resized.height())
    }

    fn sample(&self, local_t: f64, local_duration: f64) -> LayerFrame {
        let angle = spin_angle_deg(local_t, self.spin_duration_sec);
        LayerFrame {
            raster: rotate_with_expand(&self.resized, angle),
            position: self.path.at(local_t, local_duration),
            alpha: 1.0,
        }
    }
}

/// A pre-rasterized caption, horizontally centered at a fixed vertical
/// offset, optionally cross-fading at both ends of its active window.
///
/// Text rasterization itself is a collaborator concern (see
/// [`crate::text::raster::TextRasterizer`]); this clip owns placement,
/// duration and alpha only.
#[derive(Clone, Debug)]
pub struct TextClip {
    raster: RasterBuffer,
    y_offset: f64,
    fade_sec: f64,
}

impl TextClip {
    pub fn new(raster: RasterBuffer, y_offset: f64, fade_sec: f64) -> VersusResult<Self> {
        if !fade_sec.is_finite() || fade_sec < 0.0 {
            return Err(VersusError::invalid_timing(
                "text fade duration must be finite and >= 0",
            ));
        }
        Ok(Self {
            raster,
            y_offset,
            fade_sec,
        })
    }

    /// Cross-fade alpha: 0→1 over the fade window at clip start, 1→0 over
    /// the same window at clip end, 1 in between. Windows larger than the
    /// clip simply overlap and clamp.
    fn alpha_at(&self, local_t: f64, local_duration: f64) -> f32 {
        if self.fade_sec <= 0.0 {
            return 1.0;
        }
        let fade_in = clamp01(local_t / self.fade_sec);
        let fade_out = clamp01((local_duration - local_t) / self.fade_sec);
        fade_in.min(fade_out) as f32
    }

    fn sample(&self, local_t: f64, local_duration: f64, canvas: Canvas) -> LayerFrame {
        let x = f64::from(canvas.width) / 2.0 - f64::from(self.raster.width()) / 2.0;
        LayerFrame {
            raster: self.raster.clone(),
            position: Vec2::new(x, self.y_offset),
            alpha: self.alpha_at(local_t, local_duration),
        }
    }
}

/// A percentage caption: visually identical to [`TextClip`], built from a
/// numeric value formatted by [`crate::text::format::format_percent`].
#[derive(Clone, Debug)]
pub struct PercentageTextClip {
    value: f64,
    text: TextClip,
}

impl PercentageTextClip {
    pub fn new(value: f64, raster: RasterBuffer, y_offset: f64, fade_sec: f64) -> VersusResult<Self> {
        Ok(Self {
            value,
            text: TextClip::new(raster, y_offset, fade_sec)?,
        })
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

/// A polymorphic unit of visual content over a local time domain.
///
/// One tagged union covers every content kind in the scene; the evaluator
/// dispatches over the tag in a single place.
#[derive(Clone, Debug)]
pub enum Clip {
    Background(BackgroundClip),
    AnimatedImage(AnimatedImageClip),
    Text(TextClip),
    PercentageText(PercentageTextClip),
}

impl Clip {
    /// Evaluate this clip at local time `local_t` within a layer active for
    /// `local_duration` seconds.
    pub(crate) fn sample(
        &self,
        local_t: f64,
        local_duration: f64,
        canvas: Canvas,
    ) -> LayerFrame {
        match self {
            Clip::Background(c) => c.sample(),
            Clip::AnimatedImage(c) => c.sample(local_t, local_duration),
            Clip::Text(c) => c.sample(local_t, local_duration, canvas),
            Clip::PercentageText(c) => c.text.sample(local_t, local_duration, canvas),
        }
    }
}
