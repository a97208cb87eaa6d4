//! Raw bitmap storage and pixel-level operations
//!
//! Bitmaps own a contiguous byte buffer with an explicit stride.
//! All pixel access is bounds-checked; reads outside the bitmap
//! behave like empty pixels so scan loops can step one past an edge.
//!
//! Two formats are used:
//! - `Rgb`: the rasterization strip (white ink on black)
//! - `Rgba`: atlas pages (white ink, coverage in alpha)

pub mod filter;

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use log::debug;

use crate::error::Result;

/// Integer pixel rectangle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// True if the two rectangles share at least one pixel
    pub fn intersects(&self, other: &Rect) -> bool {
        other.x < self.right()
            && self.x < other.right()
            && other.y < self.bottom()
            && self.y < other.bottom()
    }
}

/// Pixel layout of a bitmap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 3 bytes per pixel, no alpha channel
    Rgb,
    /// 4 bytes per pixel, straight alpha
    Rgba,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }
}

/// Owned pixel buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    stride: usize,
    format: PixelFormat,
    data: Vec<u8>,
}

impl Bitmap {
    /// Create a zeroed bitmap (black, fully transparent)
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let stride = width as usize * format.bytes_per_pixel();
        Self {
            width,
            height,
            stride,
            format,
            data: vec![0u8; stride * height as usize],
        }
    }

    /// Wrap existing tightly packed pixel data
    ///
    /// Returns None if the buffer length does not match the dimensions.
    pub fn from_raw(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Option<Self> {
        let stride = width as usize * format.bytes_per_pixel();
        if data.len() != stride * height as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            stride,
            format,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    #[inline]
    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        if self.in_bounds(x, y) {
            Some(y as usize * self.stride + x as usize * self.format.bytes_per_pixel())
        } else {
            None
        }
    }

    /// Read a pixel as RGBA (alpha is 255 for `Rgb` bitmaps)
    pub fn pixel(&self, x: i32, y: i32) -> Option<[u8; 4]> {
        let i = self.offset(x, y)?;
        let d = &self.data;
        Some(match self.format {
            PixelFormat::Rgb => [d[i], d[i + 1], d[i + 2], 255],
            PixelFormat::Rgba => [d[i], d[i + 1], d[i + 2], d[i + 3]],
        })
    }

    /// Write a pixel (alpha is dropped for `Rgb` bitmaps); ignored out of bounds
    pub fn set_pixel(&mut self, x: i32, y: i32, rgba: [u8; 4]) {
        if let Some(i) = self.offset(x, y) {
            let bpp = self.format.bytes_per_pixel();
            self.data[i..i + bpp].copy_from_slice(&rgba[..bpp]);
        }
    }

    /// Read the alpha channel (255 for `Rgb` bitmaps)
    pub fn alpha(&self, x: i32, y: i32) -> Option<u8> {
        let i = self.offset(x, y)?;
        Some(match self.format {
            PixelFormat::Rgb => 255,
            PixelFormat::Rgba => self.data[i + 3],
        })
    }

    /// Write the alpha channel; no-op for `Rgb` bitmaps
    pub fn set_alpha(&mut self, x: i32, y: i32, alpha: u8) {
        if self.format != PixelFormat::Rgba {
            return;
        }
        if let Some(i) = self.offset(x, y) {
            self.data[i + 3] = alpha;
        }
    }

    /// Black pixel test for bitmaps without alpha
    pub fn is_empty_pixel(&self, x: i32, y: i32) -> bool {
        match self.offset(x, y) {
            Some(i) => self.data[i] == 0 && self.data[i + 1] == 0 && self.data[i + 2] == 0,
            None => true,
        }
    }

    /// Transparent pixel test: alpha at or below `tolerance`
    pub fn is_empty_alpha_pixel(&self, x: i32, y: i32, tolerance: u8) -> bool {
        match self.alpha(x, y) {
            Some(a) => a <= tolerance,
            None => true,
        }
    }

    /// Emptiness test picked by pixel format
    #[inline]
    pub fn is_empty(&self, x: i32, y: i32, tolerance: u8) -> bool {
        match self.format {
            PixelFormat::Rgb => self.is_empty_pixel(x, y),
            PixelFormat::Rgba => self.is_empty_alpha_pixel(x, y, tolerance),
        }
    }

    /// Fill every pixel with one color
    pub fn clear(&mut self, rgba: [u8; 4]) {
        let bpp = self.format.bytes_per_pixel();
        for px in self.data.chunks_exact_mut(bpp) {
            px.copy_from_slice(&rgba[..bpp]);
        }
    }

    /// Replace the color of every pixel, keeping alpha
    pub fn colour(&mut self, r: u8, g: u8, b: u8) {
        let bpp = self.format.bytes_per_pixel();
        for px in self.data.chunks_exact_mut(bpp) {
            px[0] = r;
            px[1] = g;
            px[2] = b;
        }
    }

    /// Solid fill of a rectangle, clipped to the bitmap
    pub fn fill_rect(&mut self, rect: Rect, rgba: [u8; 4]) {
        let x0 = rect.x.max(0);
        let y0 = rect.y.max(0);
        let x1 = rect.right().min(self.width as i32);
        let y1 = rect.bottom().min(self.height as i32);
        for y in y0..y1 {
            for x in x0..x1 {
                self.set_pixel(x, y, rgba);
            }
        }
    }

    /// Draw a coverage mask (one byte per pixel) in `color`, keeping the
    /// brighter of the existing and new value per channel
    pub fn draw_coverage(
        &mut self,
        x: i32,
        y: i32,
        width: usize,
        height: usize,
        coverage: &[u8],
        color: [u8; 3],
    ) {
        for row in 0..height {
            for col in 0..width {
                let Some(&c) = coverage.get(row * width + col) else {
                    return;
                };
                if c == 0 {
                    continue;
                }
                let (px, py) = (x + col as i32, y + row as i32);
                let Some(existing) = self.pixel(px, py) else {
                    continue;
                };
                let scale = |channel: u8| ((channel as u32 * c as u32) / 255) as u8;
                let new = [
                    existing[0].max(scale(color[0])),
                    existing[1].max(scale(color[1])),
                    existing[2].max(scale(color[2])),
                    existing[3].max(c),
                ];
                self.set_pixel(px, py, new);
            }
        }
    }

    /// Copy `src_rect` of `source` to (`dest_x`, `dest_y`), clipped to this bitmap
    ///
    /// Both bitmaps must share a pixel format; rows are copied verbatim.
    pub fn blit(&mut self, source: &Bitmap, src_rect: Rect, dest_x: i32, dest_y: i32) {
        if source.format != self.format {
            self.blit_converted(source, src_rect, dest_x, dest_y, |p| p);
            return;
        }
        let Some((sx, sy, tx, ty, w, h)) = self.clip(source, src_rect, dest_x, dest_y) else {
            return;
        };
        let bpp = self.format.bytes_per_pixel();
        for row in 0..h {
            let src = (sy + row) * source.stride + sx * bpp;
            let dst = (ty + row) * self.stride + tx * bpp;
            self.data[dst..dst + w * bpp].copy_from_slice(&source.data[src..src + w * bpp]);
        }
    }

    /// Copy a luminance source into this bitmap's alpha channel, painting white
    pub fn blit_mask(&mut self, source: &Bitmap, src_rect: Rect, dest_x: i32, dest_y: i32) {
        self.blit_converted(source, src_rect, dest_x, dest_y, |[r, g, b, _]| {
            let luminance = ((r as u32 + g as u32 + b as u32) / 3) as u8;
            [255, 255, 255, luminance]
        });
    }

    fn blit_converted(
        &mut self,
        source: &Bitmap,
        src_rect: Rect,
        dest_x: i32,
        dest_y: i32,
        convert: impl Fn([u8; 4]) -> [u8; 4],
    ) {
        let Some((sx, sy, tx, ty, w, h)) = self.clip(source, src_rect, dest_x, dest_y) else {
            return;
        };
        for row in 0..h as i32 {
            for col in 0..w as i32 {
                if let Some(p) = source.pixel(sx as i32 + col, sy as i32 + row) {
                    self.set_pixel(tx as i32 + col, ty as i32 + row, convert(p));
                }
            }
        }
    }

    /// Clip a blit to both bitmaps: (src_x, src_y, dst_x, dst_y, width, height)
    fn clip(
        &self,
        source: &Bitmap,
        src_rect: Rect,
        dest_x: i32,
        dest_y: i32,
    ) -> Option<(usize, usize, usize, usize, usize, usize)> {
        // Shift so the source rectangle starts inside the source bitmap
        let lead_x = (-src_rect.x).max(0);
        let lead_y = (-src_rect.y).max(0);
        let src_w = src_rect.width.min(source.width as i32 - src_rect.x) - lead_x;
        let src_h = src_rect.height.min(source.height as i32 - src_rect.y) - lead_y;

        let start_x = (dest_x + lead_x).max(0);
        let start_y = (dest_y + lead_y).max(0);
        let end_x = (dest_x + lead_x + src_w).min(self.width as i32);
        let end_y = (dest_y + lead_y + src_h).min(self.height as i32);
        let copy_w = end_x - start_x;
        let copy_h = end_y - start_y;
        if copy_w <= 0 || copy_h <= 0 {
            return None;
        }

        let sx = src_rect.x + start_x - dest_x;
        let sy = src_rect.y + start_y - dest_y;
        Some((
            sx as usize,
            sy as usize,
            start_x as usize,
            start_y as usize,
            copy_w as usize,
            copy_h as usize,
        ))
    }

    /// Convert to RGBA, mapping luminance to alpha for `Rgb` bitmaps
    pub fn to_rgba(&self) -> Bitmap {
        if self.format == PixelFormat::Rgba {
            return self.clone();
        }
        let mut out = Bitmap::new(self.width, self.height, PixelFormat::Rgba);
        let full = Rect::new(0, 0, self.width as i32, self.height as i32);
        out.blit_mask(self, full, 0, 0);
        out
    }

    /// Save as PNG
    pub fn save_png(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut encoder = png::Encoder::new(BufWriter::new(file), self.width, self.height);
        encoder.set_color(match self.format {
            PixelFormat::Rgb => png::ColorType::Rgb,
            PixelFormat::Rgba => png::ColorType::Rgba,
        });
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&self.data)?;
        debug!(
            "Bitmap saved: {} ({}x{})",
            path.display(),
            self.width,
            self.height
        );
        Ok(())
    }

    /// Load any image the `image` crate understands, as RGBA
    pub fn load_png(path: &Path) -> Result<Self> {
        let img = image::io::Reader::open(path)?.with_guessed_format()?.decode()?;
        let rgba = img.to_rgba8();
        let (width, height) = (rgba.width(), rgba.height());
        debug!("Bitmap loaded: {} ({}x{})", path.display(), width, height);
        Ok(Self {
            width,
            height,
            stride: width as usize * 4,
            format: PixelFormat::Rgba,
            data: rgba.into_raw(),
        })
    }
}
