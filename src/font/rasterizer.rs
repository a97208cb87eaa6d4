//! Glyph rasterization
//!
//! `GlyphRasterizer` is the seam between the atlas builder and whatever
//! draws characters. The fontdue implementations cover font files
//! (`FileFont`) and installed fonts resolved by family name (`SystemFont`).

use std::path::{Path, PathBuf};

use fontdue::{Font as FontdueFont, FontSettings};
use log::{debug, info};

use super::fontconfig::{find_system_font, load_font_file};
use crate::bitmap::Bitmap;
use crate::config::{FontStyle, RenderHint};
use crate::constants::{GRID_FIT_THRESHOLD, SIZE_DEPENDENT_GRID_FIT_MAX};
use crate::error::{FontError, Result};

/// Draws single characters into a bitmap
pub trait GlyphRasterizer {
    /// Pixel size the rasterizer renders at
    fn size(&self) -> f32;

    /// Padded cell size of `ch`; every glyph drawn at (x, y) stays inside
    /// (x, y, width, height)
    fn measure(&self, ch: char) -> (i32, i32);

    /// Draw `ch` with its cell's top-left at (x, y); returns the offset of
    /// the returned cell relative to (x, y)
    fn draw(
        &self,
        ch: char,
        target: &mut Bitmap,
        color: [u8; 3],
        x: i32,
        y: i32,
        hint: RenderHint,
    ) -> (i32, i32);

    fn has_glyph(&self, ch: char) -> bool;

    fn has_kerning_info(&self) -> bool {
        false
    }

    /// Adjustment in pixels added after `c1` when followed by `c2`
    fn kerning(&self, _c1: char, _c2: char) -> i32 {
        0
    }
}

/// Whether `hint` thresholds coverage for a font of nominal `size`
pub fn uses_grid_fit(hint: RenderHint, size: f32) -> bool {
    match hint {
        RenderHint::GridFit => true,
        RenderHint::SystemDefault | RenderHint::AntiAlias => false,
        RenderHint::SizeDependent => size <= SIZE_DEPENDENT_GRID_FIT_MAX,
    }
}

/// Resolve `SizeDependent` for a font of nominal `size`
pub fn resolve_hint(hint: RenderHint, size: f32) -> RenderHint {
    match hint {
        RenderHint::SizeDependent if uses_grid_fit(hint, size) => RenderHint::GridFit,
        RenderHint::SizeDependent => RenderHint::AntiAlias,
        other => other,
    }
}

/// Extra room around each cell; grows with the font size
fn cell_padding(size: f32) -> i32 {
    ((size * 0.1).ceil() as i32).max(2)
}

/// Kern pairs probed to find out whether a face carries a kern table
const KERN_PROBE: &[(char, char)] = &[
    ('A', 'V'),
    ('A', 'W'),
    ('T', 'o'),
    ('V', 'a'),
    ('W', 'a'),
    ('Y', 'o'),
    ('L', 'T'),
    ('P', '.'),
];

/// A loaded fontdue face at one pixel size
struct Face {
    font: FontdueFont,
    size: f32,
    ascent: f32,
    line_height: i32,
    padding: i32,
    has_kerning: bool,
}

impl Face {
    fn from_bytes(data: &[u8], size: f32, name: &str) -> Result<Self> {
        let font = FontdueFont::from_bytes(data, FontSettings::default())
            .map_err(|e| FontError::FontLoad(format!("{}: {}", name, e)))?;
        let metrics = font
            .horizontal_line_metrics(size)
            .ok_or_else(|| FontError::FontLoad(format!("{}: no horizontal metrics", name)))?;
        let line_height = (metrics.ascent - metrics.descent).ceil() as i32;

        // fontdue has no query for the kern table itself
        let has_kerning = KERN_PROBE
            .iter()
            .any(|&(a, b)| font.horizontal_kern(a, b, size).is_some_and(|k| k != 0.0));

        debug!(
            "Font metrics: size={}, ascent={:.1}, line_height={}, kerning={}",
            size, metrics.ascent, line_height, has_kerning
        );

        Ok(Self {
            font,
            size,
            ascent: metrics.ascent,
            line_height,
            padding: cell_padding(size),
            has_kerning,
        })
    }

    fn measure(&self, ch: char) -> (i32, i32) {
        let m = self.font.metrics(ch, self.size);
        let ink_right = m.xmin.max(0) + m.width as i32;
        let width = (m.advance_width.ceil() as i32).max(ink_right);
        (width + self.padding, self.line_height + self.padding)
    }

    fn draw(&self, ch: char, target: &mut Bitmap, color: [u8; 3], x: i32, y: i32, hint: RenderHint) -> (i32, i32) {
        let (m, coverage) = self.font.rasterize(ch, self.size);
        if m.width == 0 || m.height == 0 {
            return (0, 0);
        }

        let coverage = if uses_grid_fit(hint, self.size) {
            coverage
                .into_iter()
                .map(|c| if c >= GRID_FIT_THRESHOLD { 255 } else { 0 })
                .collect()
        } else {
            coverage
        };

        let baseline = y + self.padding / 2 + self.ascent.ceil() as i32;
        let left = x + self.padding / 2 + m.xmin.max(0);
        let top = baseline - m.ymin - m.height as i32;
        target.draw_coverage(left, top, m.width, m.height, &coverage, color);
        (0, 0)
    }

    fn has_glyph(&self, ch: char) -> bool {
        ch == ' ' || self.font.lookup_glyph_index(ch) != 0
    }

    fn kerning(&self, c1: char, c2: char) -> i32 {
        self.font
            .horizontal_kern(c1, c2, self.size)
            .map(|k| k.round() as i32)
            .unwrap_or(0)
    }
}

/// Font loaded from a file; only the style the file contains is available
pub struct FileFont {
    path: PathBuf,
    face: Face,
}

impl FileFont {
    pub fn open(path: &Path, size: f32, style: FontStyle) -> Result<Self> {
        if style != FontStyle::Regular {
            return Err(FontError::UnsupportedStyle {
                family: path.display().to_string(),
                style: style.to_string(),
            });
        }
        let data = load_font_file(path)?;
        let face = Face::from_bytes(&data, size, &path.display().to_string())?;
        info!("Font loaded: {} at {}px", path.display(), size);
        Ok(Self {
            path: path.to_path_buf(),
            face,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Installed font resolved by family name and style
pub struct SystemFont {
    family: String,
    style: FontStyle,
    path: PathBuf,
    face: Face,
}

impl SystemFont {
    pub fn open(family: &str, size: f32, style: FontStyle) -> Result<Self> {
        let found = find_system_font(family, style)?;
        let data = load_font_file(&found.path)?;
        let face = Face::from_bytes(&data, size, &found.family)?;
        info!(
            "System font loaded: {} {} ({}) at {}px",
            found.family,
            style,
            found.path.display(),
            size
        );
        Ok(Self {
            family: found.family,
            style,
            path: found.path,
            face,
        })
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn style(&self) -> FontStyle {
        self.style
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Either kind of fontdue-backed font
pub enum Rasterizer {
    File(FileFont),
    System(SystemFont),
}

impl Rasterizer {
    fn face(&self) -> &Face {
        match self {
            Rasterizer::File(f) => &f.face,
            Rasterizer::System(f) => &f.face,
        }
    }
}

/// Open `font` as a file if such a file exists, as a family name otherwise
pub fn open_font(font: &str, size: f32, style: FontStyle) -> Result<Rasterizer> {
    let path = Path::new(font);
    if path.is_file() {
        FileFont::open(path, size, style).map(Rasterizer::File)
    } else {
        SystemFont::open(font, size, style).map(Rasterizer::System)
    }
}

impl GlyphRasterizer for Rasterizer {
    fn size(&self) -> f32 {
        self.face().size
    }

    fn measure(&self, ch: char) -> (i32, i32) {
        self.face().measure(ch)
    }

    fn draw(
        &self,
        ch: char,
        target: &mut Bitmap,
        color: [u8; 3],
        x: i32,
        y: i32,
        hint: RenderHint,
    ) -> (i32, i32) {
        self.face().draw(ch, target, color, x, y, hint)
    }

    fn has_glyph(&self, ch: char) -> bool {
        self.face().has_glyph(ch)
    }

    fn has_kerning_info(&self) -> bool {
        self.face().has_kerning
    }

    fn kerning(&self, c1: char, c2: char) -> i32 {
        self.face().kerning(c1, c2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_dependent_hint() {
        assert!(uses_grid_fit(RenderHint::SizeDependent, 12.0));
        assert!(!uses_grid_fit(RenderHint::SizeDependent, 12.5));
        assert!(uses_grid_fit(RenderHint::GridFit, 48.0));
        assert!(!uses_grid_fit(RenderHint::AntiAlias, 8.0));
        assert_eq!(resolve_hint(RenderHint::SizeDependent, 10.0), RenderHint::GridFit);
        assert_eq!(resolve_hint(RenderHint::SizeDependent, 24.0), RenderHint::AntiAlias);
        assert_eq!(resolve_hint(RenderHint::SystemDefault, 8.0), RenderHint::SystemDefault);
    }

    #[test]
    fn test_cell_padding() {
        assert_eq!(cell_padding(8.0), 2);
        assert_eq!(cell_padding(32.0), 4);
    }

    #[test]
    fn test_file_font_rejects_styles() {
        let err = FileFont::open(Path::new("/nonexistent.ttf"), 16.0, FontStyle::Bold)
            .err()
            .unwrap();
        match err {
            FontError::UnsupportedStyle { style, .. } => assert_eq!(style, "Bold"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_file_font_invalid_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"not a font").unwrap();
        let err = open_font(path.to_str().unwrap(), 16.0, FontStyle::Regular)
            .err()
            .unwrap();
        assert!(matches!(err, FontError::FontLoad(_)));
    }

    #[test]
    fn test_unknown_family() {
        let err = open_font("No Such Family 7f3a", 16.0, FontStyle::Regular)
            .err()
            .unwrap();
        assert!(matches!(err, FontError::FontNotFound(_)));
    }
}
