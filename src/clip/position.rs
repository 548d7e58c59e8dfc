use crate::foundation::core::{Canvas, Vec2};
use crate::foundation::error::{VersusError, VersusResult};
use crate::foundation::math::{clamp01, lerp};

/// Horizontal travel direction of a sliding clip.
///
/// The side names the direction the clip travels, not the screen edge it
/// first appears at: a `Left` clip starts off-screen at `x = canvas_width`
/// (past the right edge) and travels leftward into its resting position; a
/// `Right` clip starts at `x = -offscreen_margin` and travels rightward.
/// A clip always exits through the opposite side's off-screen coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum EntrySide {
    Left,
    Right,
}

impl EntrySide {
    pub fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Durations shaping the slide animation.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SlideTiming {
    /// Length of each entrance/exit slide.
    pub slide_duration_sec: f64,
    /// Offset before the clip's local end at which the exit slide begins.
    pub exit_lead_sec: f64,
}

impl SlideTiming {
    pub fn validate(&self) -> VersusResult<()> {
        if !self.slide_duration_sec.is_finite() || self.slide_duration_sec <= 0.0 {
            return Err(VersusError::invalid_timing(
                "slide duration must be finite and > 0",
            ));
        }
        if !self.exit_lead_sec.is_finite() || self.exit_lead_sec < 0.0 {
            return Err(VersusError::invalid_timing(
                "exit lead must be finite and >= 0",
            ));
        }
        Ok(())
    }
}

/// Closed-form piecewise-linear placement of a sliding clip over its local
/// time domain: entrance from off-screen, centered rest, exit through the
/// opposite side.
///
/// The path is referentially transparent; evaluating the same local time
/// always yields the same point, which keeps rendering deterministic and
/// frames safe to evaluate out of order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlidePath {
    side: EntrySide,
    canvas_width: f64,
    offscreen_margin: f64,
    resting_x: f64,
    y: f64,
    timing: SlideTiming,
}

impl SlidePath {
    /// Build a path for a clip of `clip_width` pixels resting horizontally
    /// centered at vertical offset `y`. `offscreen_margin` is the width of
    /// the off-screen stride on the negative-x side (the configured maximum
    /// clip dimension).
    pub fn new(
        side: EntrySide,
        canvas: Canvas,
        clip_width: f64,
        offscreen_margin: f64,
        y: f64,
        timing: SlideTiming,
    ) -> VersusResult<Self> {
        timing.validate()?;
        if !clip_width.is_finite() || clip_width <= 0.0 {
            return Err(VersusError::invalid_timing(
                "clip width must be finite and > 0",
            ));
        }
        let canvas_width = f64::from(canvas.width);
        Ok(Self {
            side,
            canvas_width,
            offscreen_margin,
            resting_x: canvas_width / 2.0 - clip_width / 2.0,
            y,
            timing,
        })
    }

    /// Off-screen x-coordinate a clip entering from `side` starts at.
    fn offscreen_x(&self, side: EntrySide) -> f64 {
        match side {
            EntrySide::Left => self.canvas_width,
            EntrySide::Right => -self.offscreen_margin,
        }
    }

    pub fn resting_x(&self) -> f64 {
        self.resting_x
    }

    pub fn entry_x(&self) -> f64 {
        self.offscreen_x(self.side)
    }

    pub fn exit_x(&self) -> f64 {
        self.offscreen_x(self.side.opposite())
    }

    /// Placement at local time `t` for a clip active for `local_duration`
    /// seconds.
    ///
    /// The exit window takes precedence over the entrance window, so
    /// degenerate timings (an exit lead at or beyond the local duration)
    /// still evaluate to a clamped, well-defined point.
    pub fn at(&self, t: f64, local_duration: f64) -> Vec2 {
        let exit_start = local_duration - self.timing.exit_lead_sec;
        let x = if t >= exit_start {
            let p = clamp01((t - exit_start) / self.timing.slide_duration_sec);
            lerp(self.resting_x, self.exit_x(), p)
        } else if t < self.timing.slide_duration_sec {
            let p = clamp01(t / self.timing.slide_duration_sec);
            lerp(self.entry_x(), self.resting_x, p)
        } else {
            self.resting_x
        };
        Vec2::new(x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMING: SlideTiming = SlideTiming {
        slide_duration_sec: 0.3,
        exit_lead_sec: 0.6,
    };

    fn canvas() -> Canvas {
        Canvas {
            width: 1080,
            height: 1920,
        }
    }

    fn path(side: EntrySide) -> SlidePath {
        SlidePath::new(side, canvas(), 500.0, 500.0, 240.0, TIMING).unwrap()
    }

    #[test]
    fn entrance_boundaries_are_exact() {
        let p = path(EntrySide::Right);
        assert_eq!(p.at(0.0, 10.0).x, -500.0);
        assert_eq!(p.at(0.3, 10.0).x, p.resting_x());
        assert_eq!(p.resting_x(), 1080.0 / 2.0 - 250.0);
    }

    #[test]
    fn entrance_is_monotonic_toward_rest() {
        let p = path(EntrySide::Right);
        let mut prev = p.at(0.0, 10.0).x;
        for i in 1..=30 {
            let t = 0.3 * f64::from(i) / 30.0;
            let x = p.at(t, 10.0).x;
            assert!(x >= prev, "x must move rightward during a Right entrance");
            prev = x;
        }
        assert_eq!(prev, p.resting_x());

        let p = path(EntrySide::Left);
        let mut prev = p.at(0.0, 10.0).x;
        assert_eq!(prev, 1080.0);
        for i in 1..=30 {
            let t = 0.3 * f64::from(i) / 30.0;
            let x = p.at(t, 10.0).x;
            assert!(x <= prev, "x must move leftward during a Left entrance");
            prev = x;
        }
    }

    #[test]
    fn steady_phase_is_centered() {
        let p = path(EntrySide::Left);
        for t in [0.3, 1.0, 5.0, 9.0] {
            assert_eq!(p.at(t, 10.0).x, p.resting_x());
        }
    }

    #[test]
    fn exit_side_is_geometric_opposite_of_entry() {
        let local = 10.0;
        // Exit slide completes at (local - lead) + slide duration = 9.7.
        let right = path(EntrySide::Right);
        assert_eq!(right.at(9.7, local).x, 1080.0);
        assert_eq!(right.at(local, local).x, 1080.0);

        let left = path(EntrySide::Left);
        assert_eq!(left.at(9.7, local).x, -500.0);
        assert_eq!(left.at(local, local).x, -500.0);
    }

    #[test]
    fn exit_begins_at_lead_offset() {
        let p = path(EntrySide::Right);
        let local = 10.0;
        assert_eq!(p.at(9.4, local).x, p.resting_x());
        let mid = p.at(9.55, local).x;
        assert!(mid > p.resting_x() && mid < 1080.0);
    }

    #[test]
    fn vertical_offset_is_constant() {
        let p = path(EntrySide::Left);
        for t in [0.0, 0.15, 1.0, 9.5, 10.0] {
            assert_eq!(p.at(t, 10.0).y, 240.0);
        }
    }

    #[test]
    fn oversized_exit_lead_still_clamps() {
        // Exit lead beyond the local duration: the clip is in its exit phase
        // from t = 0 and must produce finite, clamped positions.
        let timing = SlideTiming {
            slide_duration_sec: 0.3,
            exit_lead_sec: 5.0,
        };
        let p = SlidePath::new(EntrySide::Right, canvas(), 500.0, 500.0, 0.0, timing).unwrap();
        let x0 = p.at(0.0, 2.0).x;
        assert!(x0.is_finite());
        // Deep into the (clamped) exit, the clip sits fully off-screen.
        assert_eq!(p.at(2.0, 2.0).x, 1080.0);
    }

    #[test]
    fn non_positive_slide_duration_is_rejected() {
        let timing = SlideTiming {
            slide_duration_sec: 0.0,
            exit_lead_sec: 0.6,
        };
        assert!(SlidePath::new(EntrySide::Left, canvas(), 500.0, 500.0, 0.0, timing).is_err());
    }
}
