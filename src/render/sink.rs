use crate::foundation::error::VersusResult;
use crate::raster::buffer::RasterBuffer;

/// Consumer of the rendered frame sequence: the boundary to the external
/// encoder.
///
/// Frames arrive strictly in increasing frame order, exactly once each.
/// `finish` is called after the last frame; implementations flush and
/// surface any terminal failure there rather than swallowing it.
pub trait FrameSink {
    fn write_frame(&mut self, frame: &RasterBuffer) -> VersusResult<()>;
    fn finish(&mut self) -> VersusResult<()>;
}

/// Sink that buffers every frame in memory. Useful for tests and for
/// callers that post-process frames themselves.
#[derive(Debug, Default)]
pub struct CollectSink {
    pub frames: Vec<RasterBuffer>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameSink for CollectSink {
    fn write_frame(&mut self, frame: &RasterBuffer) -> VersusResult<()> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn finish(&mut self) -> VersusResult<()> {
        Ok(())
    }
}
