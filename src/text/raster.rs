use std::sync::Arc;

use crate::foundation::error::{VersusError, VersusResult};
use crate::raster::buffer::RasterBuffer;

/// Caption styling: font bytes plus fill and stroke parameters.
#[derive(Clone, Debug)]
pub struct TextStyle {
    /// Raw TTF/OTF bytes of the caption font.
    pub font_bytes: Arc<Vec<u8>>,
    /// Font size in pixels.
    pub size_px: f32,
    /// Fill color as straight-alpha RGBA8.
    pub fill_rgba8: [u8; 4],
    /// Stroke color as straight-alpha RGBA8.
    pub stroke_rgba8: [u8; 4],
    /// Stroke thickness in pixels; 0 disables the stroke pass.
    pub stroke_width_px: f32,
    /// Optional wrap width in pixels.
    pub max_width_px: Option<f32>,
}

impl TextStyle {
    pub fn validate(&self) -> VersusResult<()> {
        if self.font_bytes.is_empty() {
            return Err(VersusError::invalid_timing("text style requires font bytes"));
        }
        if !self.size_px.is_finite() || self.size_px <= 0.0 {
            return Err(VersusError::invalid_timing(
                "text size_px must be finite and > 0",
            ));
        }
        if !self.stroke_width_px.is_finite() || self.stroke_width_px < 0.0 {
            return Err(VersusError::invalid_timing(
                "text stroke_width_px must be finite and >= 0",
            ));
        }
        if let Some(w) = self.max_width_px
            && (!w.is_finite() || w <= 0.0)
        {
            return Err(VersusError::invalid_timing(
                "text max_width_px must be finite and > 0 when set",
            ));
        }
        Ok(())
    }
}

/// RGBA8 brush carried through Parley layouts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct GlyphBrush {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

/// Rasterizes caption strings into premultiplied buffers.
///
/// This is the text collaborator at the engine boundary: clips receive the
/// finished raster and only manage placement, duration and alpha. Shaping
/// and line breaking run through Parley; glyphs are filled with vello_cpu.
/// The stroke is drawn as a ring of eight offset fills underneath the final
/// fill pass.
pub struct TextRasterizer {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<GlyphBrush>,
}

impl Default for TextRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextRasterizer {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
        }
    }

    /// Shape, lay out and rasterize `text` with `style`.
    pub fn rasterize(&mut self, text: &str, style: &TextStyle) -> VersusResult<RasterBuffer> {
        style.validate()?;
        if text.trim().is_empty() {
            return Err(VersusError::invalid_timing("caption text must be non-empty"));
        }

        let layout = self.layout(text, style)?;

        let pad = style.stroke_width_px.ceil() as u32 + 1;
        let width = (layout.width().ceil() as u32).max(1) + pad * 2;
        let height = (layout.height().ceil() as u32).max(1) + pad * 2;

        let width_u16: u16 = width
            .try_into()
            .map_err(|_| VersusError::invalid_timing("caption raster width exceeds u16"))?;
        let height_u16: u16 = height
            .try_into()
            .map_err(|_| VersusError::invalid_timing("caption raster height exceeds u16"))?;

        let font = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(style.font_bytes.as_ref().clone()),
            0,
        );

        let mut ctx = vello_cpu::RenderContext::new(width_u16, height_u16);
        let origin = f64::from(pad);

        if style.stroke_width_px > 0.0 {
            let s = f64::from(style.stroke_width_px);
            let d = s * std::f64::consts::FRAC_1_SQRT_2;
            for (dx, dy) in [
                (-s, 0.0),
                (s, 0.0),
                (0.0, -s),
                (0.0, s),
                (-d, -d),
                (d, -d),
                (-d, d),
                (d, d),
            ] {
                draw_layout_glyphs(
                    &mut ctx,
                    &layout,
                    &font,
                    style.stroke_rgba8,
                    origin + dx,
                    origin + dy,
                );
            }
        }
        draw_layout_glyphs(&mut ctx, &layout, &font, style.fill_rgba8, origin, origin);

        let mut pixmap = vello_cpu::Pixmap::new(width_u16, height_u16);
        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);

        RasterBuffer::from_premul_parts(width, height, pixmap.data_as_u8_slice().to_vec())
    }

    fn layout(
        &mut self,
        text: &str,
        style: &TextStyle,
    ) -> VersusResult<parley::Layout<GlyphBrush>> {
        let families = self.font_ctx.collection.register_fonts(
            parley::fontique::Blob::from(style.font_bytes.as_ref().clone()),
            None,
        );
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            VersusError::invalid_timing("no font families registered from font bytes")
        })?;
        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| VersusError::invalid_timing("registered font family has no name"))?
            .to_string();

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(style.size_px));
        builder.push_default(parley::style::StyleProperty::Brush(GlyphBrush {
            r: style.fill_rgba8[0],
            g: style.fill_rgba8[1],
            b: style.fill_rgba8[2],
            a: style.fill_rgba8[3],
        }));

        let mut layout: parley::Layout<GlyphBrush> = builder.build(text);
        layout.break_all_lines(style.max_width_px);
        // Center wrapped lines within the measured block width; the raster
        // produced from the layout is exactly that wide.
        let block_width = layout.width();
        layout.align(
            Some(block_width),
            parley::Alignment::Center,
            parley::AlignmentOptions::default(),
        );
        Ok(layout)
    }
}

fn draw_layout_glyphs(
    ctx: &mut vello_cpu::RenderContext,
    layout: &parley::Layout<GlyphBrush>,
    font: &vello_cpu::peniko::FontData,
    color_rgba8: [u8; 4],
    x: f64,
    y: f64,
) {
    ctx.set_transform(vello_cpu::kurbo::Affine::translate((x, y)));
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
        color_rgba8[0],
        color_rgba8[1],
        color_rgba8[2],
        color_rgba8[3],
    ));

    for line in layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(font)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(font_bytes: Vec<u8>) -> TextStyle {
        TextStyle {
            font_bytes: Arc::new(font_bytes),
            size_px: 100.0,
            fill_rgba8: [255, 255, 255, 255],
            stroke_rgba8: [0, 0, 0, 255],
            stroke_width_px: 4.0,
            max_width_px: None,
        }
    }

    #[test]
    fn empty_font_bytes_are_rejected() {
        assert!(style(Vec::new()).validate().is_err());
    }

    #[test]
    fn non_positive_size_is_rejected() {
        let mut s = style(vec![0u8; 4]);
        s.size_px = 0.0;
        assert!(s.validate().is_err());
        s.size_px = f32::NAN;
        assert!(s.validate().is_err());
    }

    #[test]
    fn negative_stroke_is_rejected() {
        let mut s = style(vec![0u8; 4]);
        s.stroke_width_px = -1.0;
        assert!(s.validate().is_err());
    }

    #[test]
    fn blank_caption_is_rejected() {
        let mut rast = TextRasterizer::new();
        let err = rast.rasterize("   ", &style(vec![0u8; 4])).unwrap_err();
        assert!(matches!(err, VersusError::InvalidTiming(_)));
    }
}
