use crate::clip::model::{Clip, LayerFrame};
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{VersusError, VersusResult};

// Slack for float round-off when a layer is meant to end exactly at the
// scene end (e.g. `duration - start` computed by callers).
const BOUNDS_EPS: f64 = 1e-9;

/// Fixed global parameters of a render: frame rate, canvas, total duration.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Scene {
    pub fps: Fps,
    pub canvas: Canvas,
    pub duration_sec: f64,
}

impl Scene {
    pub fn new(fps: Fps, canvas: Canvas, duration_sec: f64) -> VersusResult<Self> {
        if !duration_sec.is_finite() || duration_sec <= 0.0 {
            return Err(VersusError::invalid_timing(
                "scene duration must be finite and > 0",
            ));
        }
        Ok(Self {
            fps,
            canvas,
            duration_sec,
        })
    }

    /// Number of frames rendered for this scene: `floor(duration * fps)`.
    pub fn frame_count(&self) -> u64 {
        self.fps.secs_to_frames_floor(self.duration_sec)
    }
}

/// A clip placed on the timeline with a global start offset and duration.
#[derive(Clone, Debug)]
pub struct Layer {
    clip: Clip,
    global_start_sec: f64,
    local_duration_sec: f64,
}

impl Layer {
    pub fn clip(&self) -> &Clip {
        &self.clip
    }

    pub fn global_start_sec(&self) -> f64 {
        self.global_start_sec
    }

    pub fn local_duration_sec(&self) -> f64 {
        self.local_duration_sec
    }

    /// Active window is half-open: `[start, start + duration)`.
    fn is_active_at(&self, global_t: f64) -> bool {
        global_t >= self.global_start_sec
            && global_t < self.global_start_sec + self.local_duration_sec
    }
}

/// An ordered stack of layers over a scene clock. Later layers draw on top.
///
/// Every interval is validated when the layer is added, before any frame is
/// rendered; `sample_at` never fails for an assembled timeline.
#[derive(Clone, Debug)]
pub struct Timeline {
    scene: Scene,
    layers: Vec<Layer>,
}

impl Timeline {
    pub fn new(scene: Scene) -> Self {
        Self {
            scene,
            layers: Vec::new(),
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Append a layer drawing on top of every layer added before it.
    pub fn add_layer(
        &mut self,
        clip: Clip,
        global_start_sec: f64,
        local_duration_sec: f64,
    ) -> VersusResult<()> {
        if !global_start_sec.is_finite() || global_start_sec < 0.0 {
            return Err(VersusError::out_of_bounds(
                "layer global start must be finite and >= 0",
            ));
        }
        if !local_duration_sec.is_finite() || local_duration_sec <= 0.0 {
            return Err(VersusError::invalid_timing(
                "layer duration must be finite and > 0",
            ));
        }
        if global_start_sec + local_duration_sec > self.scene.duration_sec + BOUNDS_EPS {
            return Err(VersusError::out_of_bounds(format!(
                "layer interval [{global_start_sec}, {}) exceeds scene duration {}",
                global_start_sec + local_duration_sec,
                self.scene.duration_sec
            )));
        }
        self.layers.push(Layer {
            clip,
            global_start_sec,
            local_duration_sec,
        });
        Ok(())
    }

    /// Indices and local times of the layers active at `global_t`, in draw
    /// order. Each local clock starts at the layer's own global start.
    pub fn active_at(&self, global_t: f64) -> Vec<(usize, f64)> {
        self.layers
            .iter()
            .enumerate()
            .filter(|(_, layer)| layer.is_active_at(global_t))
            .map(|(i, layer)| (i, global_t - layer.global_start_sec))
            .collect()
    }

    /// Evaluate every active layer at `global_t`, back-to-front.
    ///
    /// Each clip is evaluated at its local time `global_t - global_start`,
    /// never at the raw global time, so the same clip math works wherever
    /// the layer sits on the timeline.
    #[tracing::instrument(level = "trace", skip(self))]
    pub fn sample_at(&self, global_t: f64) -> Vec<LayerFrame> {
        self.layers
            .iter()
            .filter(|layer| layer.is_active_at(global_t))
            .map(|layer| {
                layer.clip.sample(
                    global_t - layer.global_start_sec,
                    layer.local_duration_sec,
                    self.scene.canvas,
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::model::TextClip;
    use crate::raster::buffer::RasterBuffer;

    fn scene() -> Scene {
        Scene::new(
            Fps::whole(30).unwrap(),
            Canvas {
                width: 1080,
                height: 1920,
            },
            6.0,
        )
        .unwrap()
    }

    fn text_clip() -> Clip {
        let raster = RasterBuffer::solid(100, 40, [255, 255, 255, 255]).unwrap();
        Clip::Text(TextClip::new(raster, 100.0, 0.0).unwrap())
    }

    #[test]
    fn scene_frame_count_floors() {
        assert_eq!(scene().frame_count(), 180);
        let s = Scene::new(
            Fps::whole(30).unwrap(),
            Canvas {
                width: 10,
                height: 10,
            },
            6.05,
        )
        .unwrap();
        assert_eq!(s.frame_count(), 181);
    }

    #[test]
    fn scene_rejects_non_positive_duration() {
        let fps = Fps::whole(30).unwrap();
        let canvas = Canvas {
            width: 10,
            height: 10,
        };
        assert!(Scene::new(fps, canvas, 0.0).is_err());
        assert!(Scene::new(fps, canvas, f64::NAN).is_err());
    }

    #[test]
    fn add_layer_rejects_intervals_outside_scene() {
        let mut tl = Timeline::new(scene());
        let err = tl.add_layer(text_clip(), 1.0, 5.5).unwrap_err();
        assert!(matches!(err, VersusError::OutOfBounds(_)));

        let err = tl.add_layer(text_clip(), -0.5, 1.0).unwrap_err();
        assert!(matches!(err, VersusError::OutOfBounds(_)));

        let err = tl.add_layer(text_clip(), 0.0, 0.0).unwrap_err();
        assert!(matches!(err, VersusError::InvalidTiming(_)));
    }

    #[test]
    fn add_layer_accepts_interval_ending_exactly_at_scene_end() {
        let mut tl = Timeline::new(scene());
        tl.add_layer(text_clip(), 2.0, 4.0).unwrap();
        tl.add_layer(text_clip(), 0.0, 6.0).unwrap();
    }

    #[test]
    fn sample_never_returns_inactive_layers() {
        let mut tl = Timeline::new(scene());
        tl.add_layer(text_clip(), 0.0, 6.0).unwrap();
        tl.add_layer(text_clip(), 1.0, 5.0).unwrap();
        tl.add_layer(text_clip(), 2.0, 4.0).unwrap();

        assert_eq!(tl.sample_at(0.5).len(), 1);
        assert_eq!(tl.sample_at(1.0).len(), 2);
        assert_eq!(tl.sample_at(2.0).len(), 3);
        // Half-open window: layers are gone at the scene end.
        assert_eq!(tl.sample_at(6.0).len(), 0);
    }

    #[test]
    fn local_time_is_global_minus_start() {
        let mut tl = Timeline::new(scene());
        tl.add_layer(text_clip(), 0.0, 6.0).unwrap();
        tl.add_layer(text_clip(), 1.0, 5.0).unwrap();
        tl.add_layer(text_clip(), 2.0, 4.0).unwrap();

        let active = tl.active_at(2.0);
        assert_eq!(active, vec![(0, 2.0), (1, 1.0), (2, 0.0)]);

        let active = tl.active_at(1.5);
        assert_eq!(active, vec![(0, 1.5), (1, 0.5)]);
    }

    #[test]
    fn draw_order_matches_insertion_order() {
        let mut tl = Timeline::new(scene());
        let bottom = RasterBuffer::solid(10, 10, [255, 0, 0, 255]).unwrap();
        let top = RasterBuffer::solid(10, 10, [0, 255, 0, 255]).unwrap();
        tl.add_layer(
            Clip::Text(TextClip::new(bottom, 0.0, 0.0).unwrap()),
            0.0,
            6.0,
        )
        .unwrap();
        tl.add_layer(Clip::Text(TextClip::new(top, 0.0, 0.0).unwrap()), 0.0, 6.0)
            .unwrap();

        let frames = tl.sample_at(3.0);
        assert_eq!(frames[0].raster.pixel(0, 0), [255, 0, 0, 255]);
        assert_eq!(frames[1].raster.pixel(0, 0), [0, 255, 0, 255]);
    }
}
