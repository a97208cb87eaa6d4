//! Drawing primitive
//!
//! Turns laid out text into textured quads: one list for the glyphs and
//! one for their drop shadow. Coordinates are pixels with y pointing down;
//! each quad is two triangles (top-left, bottom-left, bottom-right and
//! top-left, bottom-right, top-right).

use super::context::{DrawBatch, RenderContext};
use crate::atlas::{AtlasPage, Glyph};
use crate::bitmap::Rect;
use crate::error::{FontError, Result};
use crate::font::Font;
use crate::layout::{Alignment, ProcessedText, RenderOptions, Size, TextLayout};

/// Per-vertex data: position(3) + UV(2) + color(4)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
    pub tex_coord: [f32; 2],
    pub color: [f32; 4],
}

/// Quad corners in pixels and texture space
#[derive(Debug, Clone, Copy, PartialEq)]
struct Quad {
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
    u0: f32,
    v0: f32,
    u1: f32,
    v1: f32,
}

impl Quad {
    fn new(glyph: &Glyph, page: &AtlasPage, x: f32, y: f32) -> Self {
        let (pw, ph) = (page.width().max(1) as f32, page.height().max(1) as f32);
        let r = glyph.rect;
        let y0 = y + glyph.y_offset as f32;
        Self {
            x0: x,
            y0,
            x1: x + r.width as f32,
            y1: y0 + r.height as f32,
            u0: r.x as f32 / pw,
            v0: r.y as f32 / ph,
            u1: (r.x + r.width) as f32 / pw,
            v1: (r.y + r.height) as f32 / ph,
        }
    }

    /// Cut the quad to `clip`, shrinking UVs proportionally; None when
    /// nothing is left
    fn clip(self, clip: Rect) -> Option<Self> {
        let (cl, ct) = (clip.x as f32, clip.y as f32);
        let (cr, cb) = (clip.right() as f32, clip.bottom() as f32);
        if self.x1 <= cl || self.x0 >= cr || self.y1 <= ct || self.y0 >= cb {
            return None;
        }
        let mut q = self;
        let du = (self.u1 - self.u0) / (self.x1 - self.x0);
        let dv = (self.v1 - self.v0) / (self.y1 - self.y0);
        if q.x0 < cl {
            q.u0 += (cl - q.x0) * du;
            q.x0 = cl;
        }
        if q.x1 > cr {
            q.u1 -= (q.x1 - cr) * du;
            q.x1 = cr;
        }
        if q.y0 < ct {
            q.v0 += (ct - q.y0) * dv;
            q.y0 = ct;
        }
        if q.y1 > cb {
            q.v1 -= (q.y1 - cb) * dv;
            q.y1 = cb;
        }
        Some(q)
    }

    fn push(&self, out: &mut Vec<Vertex>, color: [f32; 4]) {
        let v = |x: f32, y: f32, u: f32, v: f32| Vertex {
            position: [x, y, 0.0],
            tex_coord: [u, v],
            color,
        };
        let v1 = v(self.x0, self.y0, self.u0, self.v0);
        let v2 = v(self.x0, self.y1, self.u0, self.v1);
        let v3 = v(self.x1, self.y1, self.u1, self.v1);
        let v4 = v(self.x1, self.y0, self.u1, self.v0);
        out.extend_from_slice(&[v1, v2, v3, v1, v3, v4]);
    }
}

/// Writes quads for glyphs placed by the layout engine
struct QuadWriter<'a> {
    font: &'a Font,
    options: &'a RenderOptions,
    origin: (f32, f32),
    vertices: &'a mut Vec<Vertex>,
    shadow_vertices: &'a mut Vec<Vertex>,
}

impl QuadWriter<'_> {
    fn emit(&mut self, font: &Font, glyph: &Glyph, x: f32, y: f32, color: [f32; 4], shadow: bool) {
        let Some(page) = font.page() else {
            return;
        };
        let x = self.options.lock(x);
        let y = self.options.lock(y);
        let mut quad = Quad::new(glyph, page, x, y);
        if let Some(clip) = self.options.clipping_rectangle {
            match quad.clip(clip) {
                Some(q) => quad = q,
                None => return,
            }
        }
        let out = if shadow {
            &mut *self.shadow_vertices
        } else {
            &mut *self.vertices
        };
        quad.push(out, color);
    }

    /// Glyph at layout position (x, y), shadow first
    fn glyph(&mut self, x: f32, y: f32, c: char) {
        let font = self.font;
        let Some(glyph) = font.glyph(c) else {
            return;
        };
        let x = x + self.origin.0;
        let y = y + self.origin.1;

        if self.options.drop_shadow_active {
            if let Some(shadow) = font.drop_shadow() {
                if let Some(sg) = shadow.glyph(c) {
                    // Centre the shadow glyph under the glyph, then offset
                    let mean = font.mean_glyph_width();
                    let (ox, oy) = self.options.drop_shadow_offset;
                    let cx = x + mean * ox + glyph.rect.width as f32 * 0.5;
                    let cy = y + mean * oy + glyph.rect.height as f32 * 0.5 + glyph.y_offset as f32;
                    let sx = cx - (sg.rect.width as f32 * 0.5) as i32 as f32;
                    let sy = cy - (sg.rect.height as f32 * 0.5 + sg.y_offset as f32) as i32 as f32;
                    let color = self.options.effective_shadow_colour();
                    self.emit(shadow, sg, sx, sy, color, true);
                }
            }
        }

        self.emit(font, glyph, x, y, self.options.colour, false);
    }
}

/// Vertex lists for text printed in one font
pub struct DrawingPrimitive<'f> {
    font: &'f Font,
    pub options: RenderOptions,
    vertices: Vec<Vertex>,
    shadow_vertices: Vec<Vertex>,
}

impl<'f> DrawingPrimitive<'f> {
    pub fn new(font: &'f Font, options: RenderOptions) -> Self {
        Self {
            font,
            options,
            vertices: Vec::new(),
            shadow_vertices: Vec::new(),
        }
    }

    pub fn font(&self) -> &Font {
        self.font
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn shadow_vertices(&self) -> &[Vertex] {
        &self.shadow_vertices
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.shadow_vertices.clear();
    }

    fn to_pixels(&self, position: (f32, f32), max_size: Option<Size>) -> ((f32, f32), Option<Size>) {
        match self.options.transform {
            Some(t) => (
                t.point_to_pixels(position.0, position.1),
                max_size.map(|s| t.size_to_pixels(s)),
            ),
            None => (position, max_size),
        }
    }

    fn to_viewport(&self, size: Size) -> Size {
        match self.options.transform {
            Some(t) => t.size_to_viewport(size),
            None => size,
        }
    }

    /// Print `text` with its layout origin at `position`
    ///
    /// With `max_size` the text wraps within that width; without it only
    /// line breaks start new lines. Returns the printed size.
    pub fn print(&mut self, text: &str, position: (f32, f32), max_size: Option<Size>, alignment: Alignment) -> Size {
        let (origin, max_size) = self.to_pixels(position, max_size);
        let font = self.font;
        let options = &self.options;
        let layout = TextLayout::new(font.data(), options);
        let mut writer = QuadWriter {
            font,
            options,
            origin,
            vertices: &mut self.vertices,
            shadow_vertices: &mut self.shadow_vertices,
        };
        let mut sink = |x: f32, y: f32, c: char| writer.glyph(x, y, c);
        let size = match max_size {
            Some(max_size) => {
                let mut processed = layout.process_text(text, max_size, alignment);
                layout.layout(&mut processed, Some(&mut sink))
            }
            None => layout.layout_unbounded(text, alignment, Some(&mut sink)),
        };
        self.to_viewport(size)
    }

    /// Text processed once and printed many times
    pub fn process_text(&self, text: &str, max_size: Size, alignment: Alignment) -> ProcessedText {
        let (_, max_size) = self.to_pixels((0.0, 0.0), Some(max_size));
        let max_size = max_size.unwrap_or_default();
        TextLayout::new(self.font.data(), &self.options).process_text(text, max_size, alignment)
    }

    pub fn print_processed(&mut self, processed: &mut ProcessedText, position: (f32, f32)) -> Size {
        let (origin, _) = self.to_pixels(position, None);
        let font = self.font;
        let options = &self.options;
        let layout = TextLayout::new(font.data(), options);
        let mut writer = QuadWriter {
            font,
            options,
            origin,
            vertices: &mut self.vertices,
            shadow_vertices: &mut self.shadow_vertices,
        };
        let mut sink = |x: f32, y: f32, c: char| writer.glyph(x, y, c);
        let size = layout.layout(processed, Some(&mut sink));
        self.to_viewport(size)
    }

    /// Size `text` would take without emitting vertices
    pub fn measure(&self, text: &str, max_size: Option<Size>, alignment: Alignment) -> Size {
        let (_, max_size) = self.to_pixels((0.0, 0.0), max_size);
        let size = self.font.measure(text, &self.options, max_size, alignment);
        self.to_viewport(size)
    }

    /// Submit the shadow batch, then the glyph batch
    pub fn draw(&self, ctx: &mut RenderContext) -> Result<()> {
        if !self.shadow_vertices.is_empty() {
            let texture = self
                .font
                .drop_shadow()
                .and_then(Font::texture)
                .ok_or(FontError::TextureNotUploaded)?;
            ctx.submit(DrawBatch {
                texture,
                vertices: self.shadow_vertices.clone(),
            });
        }
        if !self.vertices.is_empty() {
            let texture = self.font.texture().ok_or(FontError::TextureNotUploaded)?;
            ctx.submit(DrawBatch {
                texture,
                vertices: self.vertices.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::GlyphTable;
    use crate::bitmap::{Bitmap, PixelFormat};
    use crate::layout::{Monospacing, ViewportTransform};

    fn font(with_shadow: bool) -> Font {
        let glyphs = [
            Glyph::new(0, Rect::new(0, 0, 10, 10), 2, 'a'),
            Glyph::new(0, Rect::new(20, 0, 10, 10), 2, ' '),
        ];
        let mut table = GlyphTable::new(&glyphs, vec![Bitmap::new(40, 20, PixelFormat::Rgba)]);
        if with_shadow {
            let shadow_glyphs = [
                Glyph::new(0, Rect::new(0, 0, 14, 14), 0, 'a'),
                Glyph::new(0, Rect::new(20, 0, 14, 14), 0, ' '),
            ];
            let mut shadow = GlyphTable::new(&shadow_glyphs, vec![Bitmap::new(40, 20, PixelFormat::Rgba)]);
            shadow.is_drop_shadow = true;
            table.drop_shadow = Some(Box::new(shadow));
        }
        Font::from_table(table).unwrap()
    }

    fn options() -> RenderOptions {
        RenderOptions {
            character_spacing: 0.0,
            word_spacing: 1.0,
            monospacing: Monospacing::No,
            ..Default::default()
        }
    }

    #[test]
    fn test_quad_geometry() {
        let font = font(false);
        let mut prim = DrawingPrimitive::new(&font, options());
        prim.print("a", (5.0, 7.0), None, Alignment::Left);
        let v = prim.vertices();
        assert_eq!(v.len(), 6);
        // top-left, bottom-left, bottom-right, top-left, bottom-right, top-right
        assert_eq!(v[0].position, [5.0, 9.0, 0.0]);
        assert_eq!(v[1].position, [5.0, 19.0, 0.0]);
        assert_eq!(v[2].position, [15.0, 19.0, 0.0]);
        assert_eq!(v[5].position, [15.0, 9.0, 0.0]);
        assert_eq!(v[0].tex_coord, [0.0, 0.0]);
        assert_eq!(v[2].tex_coord, [0.25, 0.5]);
        assert_eq!(v[3], v[0]);
        assert_eq!(v[4], v[2]);
        assert!(prim.shadow_vertices().is_empty());
    }

    #[test]
    fn test_spaces_emit_no_quads() {
        let font = font(false);
        let mut prim = DrawingPrimitive::new(&font, options());
        prim.print("a a", (0.0, 0.0), Some(Size::new(100.0, 0.0)), Alignment::Left);
        assert_eq!(prim.vertices().len(), 12);
        assert_eq!(prim.vertices()[6].position[0], 20.0);
        prim.clear();
        assert!(prim.vertices().is_empty());
    }

    #[test]
    fn test_drop_shadow_is_centred_and_offset() {
        let font = font(true);
        let mut opts = options();
        opts.drop_shadow_active = true;
        opts.drop_shadow_offset = (0.5, 0.0);
        opts.drop_shadow_colour = [0.0, 0.0, 0.0, 1.0];
        opts.drop_shadow_opacity = 0.5;
        let mut prim = DrawingPrimitive::new(&font, opts);
        prim.print("a", (0.0, 0.0), None, Alignment::Left);
        let s = prim.shadow_vertices();
        assert_eq!(s.len(), 6);
        // Centre (0 + 5 + 5, 0 + 5 + 2) minus half the 14px shadow glyph
        assert_eq!(s[0].position, [3.0, 0.0, 0.0]);
        assert_eq!(s[0].color, [0.0, 0.0, 0.0, 0.5]);
    }

    #[test]
    fn test_clipping() {
        let font = font(false);
        let mut opts = options();
        opts.clipping_rectangle = Some(Rect::new(5, 0, 100, 100));
        let mut prim = DrawingPrimitive::new(&font, opts);
        prim.print("a", (0.0, 0.0), None, Alignment::Left);
        let v = prim.vertices();
        assert_eq!(v[0].position[0], 5.0);
        assert!((v[0].tex_coord[0] - 0.125).abs() < 1e-6);

        prim.clear();
        prim.options.clipping_rectangle = Some(Rect::new(50, 50, 10, 10));
        prim.print("a", (0.0, 0.0), None, Alignment::Left);
        assert!(prim.vertices().is_empty());
    }

    #[test]
    fn test_lock_to_pixel() {
        let font = font(false);
        let mut opts = options();
        opts.lock_to_pixel = true;
        let mut prim = DrawingPrimitive::new(&font, opts);
        prim.print("a", (0.4, 0.6), None, Alignment::Left);
        assert_eq!(prim.vertices()[0].position, [0.0, 3.0, 0.0]);
    }

    #[test]
    fn test_viewport_transform() {
        let font = font(false);
        let mut opts = options();
        opts.transform = Some(ViewportTransform {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
            surface_width: 100.0,
            surface_height: 100.0,
        });
        let prim = DrawingPrimitive::new(&font, opts);
        let size = prim.measure("aa", None, Alignment::Left);
        assert_eq!(size, Size::new(0.2, 0.12));
    }

    #[test]
    fn test_draw_requires_upload() {
        let mut font = font(true);
        let mut ctx = RenderContext::new();
        {
            let mut opts = options();
            opts.drop_shadow_active = true;
            let mut prim = DrawingPrimitive::new(&font, opts);
            prim.print("a", (0.0, 0.0), None, Alignment::Left);
            assert!(matches!(prim.draw(&mut ctx), Err(FontError::TextureNotUploaded)));
        }
        font.upload(&mut ctx).unwrap();
        let mut opts = options();
        opts.drop_shadow_active = true;
        let mut prim = DrawingPrimitive::new(&font, opts);
        prim.print("a", (0.0, 0.0), None, Alignment::Left);
        prim.draw(&mut ctx).unwrap();
        let batches = ctx.take_batches();
        assert_eq!(batches.len(), 2);
        assert_eq!(Some(batches[0].texture), font.drop_shadow().unwrap().texture());
        assert_eq!(Some(batches[1].texture), font.texture());
    }

    #[test]
    fn test_processed_text_reuse() {
        let font = font(false);
        let mut prim = DrawingPrimitive::new(&font, options());
        let mut processed = prim.process_text("a a a", Size::new(25.0, 0.0), Alignment::Left);
        let first = prim.print_processed(&mut processed, (0.0, 0.0));
        let second = prim.print_processed(&mut processed, (0.0, 100.0));
        assert_eq!(first, second);
        assert_eq!(prim.vertices().len(), 6 * 6);
    }
}
