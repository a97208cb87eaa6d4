//! `.qfont` glyph table files
//!
//! ```text
//! <page count>
//! <glyph count>
//! <char> <page> <x> <y> <width> <height> <y offset>
//! ...
//! ```
//!
//! Pages are stored next to the table as `<name>.png` (one page) or
//! `<name>_sheet_<N>.png`, with spaces removed from the file name.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use log::{debug, info};

use super::packer::{pack, scale_sheets, PackSettings, PackedSheets};
use super::retarget::retarget_all_outwards;
use super::shadow::build_drop_shadow;
use super::{check_overlap, is_monospaced, kerning, Glyph, GlyphTable};
use crate::bitmap::{Bitmap, PixelFormat, Rect};
use crate::config::LoaderConfig;
use crate::constants::{FONT_FILE_EXTENSION, SHRINK_PAGE_SLACK, SHRINK_REPACK_MARGIN};
use crate::error::{FontError, ParseError, Result};

/// Render the glyph table as `.qfont` text
pub fn serialize(table: &GlyphTable) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", table.pages.len());
    let _ = writeln!(out, "{}", table.glyphs.len());
    for g in table.glyphs.values() {
        let _ = writeln!(
            out,
            "{} {} {} {} {} {} {}",
            g.character, g.page, g.rect.x, g.rect.y, g.rect.width, g.rect.height, g.y_offset
        );
    }
    out
}

/// Parse `.qfont` text into (page count, glyphs)
pub fn deserialize(content: &str) -> std::result::Result<(usize, Vec<Glyph>), ParseError> {
    let mut lines = content.lines().enumerate().map(|(i, l)| (i + 1, l));

    let mut header = |expected: usize, field: &'static str| -> std::result::Result<usize, ParseError> {
        let (line, text) = lines.next().ok_or(ParseError::MissingLine(expected))?;
        text.trim()
            .parse::<usize>()
            .map_err(|source| ParseError::InvalidNumber {
                line,
                field,
                source,
            })
    };
    let page_count = header(1, "page count")?;
    let glyph_count = header(2, "glyph count")?;

    let mut glyphs: Vec<Glyph> = Vec::with_capacity(glyph_count);
    for n in 0..glyph_count {
        let (line, text) = lines.next().ok_or(ParseError::MissingLine(n + 3))?;
        let glyph = parse_glyph_line(line, text)?;
        if glyphs.iter().any(|g| g.character == glyph.character) {
            return Err(ParseError::DuplicateGlyph {
                line,
                ch: glyph.character,
            });
        }
        if glyph.page >= page_count {
            return Err(ParseError::PageOutOfRange {
                ch: glyph.character,
                page: glyph.page,
                pages: page_count,
            });
        }
        glyphs.push(glyph);
    }
    Ok((page_count, glyphs))
}

fn parse_glyph_line(line: usize, text: &str) -> std::result::Result<Glyph, ParseError> {
    let character = text.chars().next().ok_or(ParseError::MissingField {
        line,
        field: "character",
    })?;
    let mut fields = text[character.len_utf8()..].split_whitespace();
    let mut next = |field: &'static str| -> std::result::Result<i32, ParseError> {
        fields
            .next()
            .ok_or(ParseError::MissingField { line, field })?
            .parse::<i32>()
            .map_err(|source| ParseError::InvalidNumber {
                line,
                field,
                source,
            })
    };
    let page = next("page")?;
    let x = next("x")?;
    let y = next("y")?;
    let width = next("width")?;
    let height = next("height")?;
    let y_offset = next("y offset")?;
    Ok(Glyph::new(
        page.max(0) as usize,
        Rect::new(x, y, width, height),
        y_offset,
        character,
    ))
}

/// `<name>.qfont` for a save name, with or without the extension
pub fn qfont_path(name: &Path) -> PathBuf {
    if name.extension().is_some_and(|e| e == FONT_FILE_EXTENSION) {
        name.to_path_buf()
    } else {
        let mut os = name.as_os_str().to_os_string();
        os.push(".");
        os.push(FONT_FILE_EXTENSION);
        PathBuf::from(os)
    }
}

/// Image path of `page` for a `.qfont` path
pub fn page_image_path(qfont: &Path, page: usize, page_count: usize) -> PathBuf {
    let stem = qfont
        .file_stem()
        .map(|s| s.to_string_lossy().replace(' ', ""))
        .unwrap_or_default();
    let file = if page_count == 1 {
        format!("{}.png", stem)
    } else {
        format!("{}_sheet_{}.png", stem, page)
    };
    qfont.with_file_name(file)
}

/// Write pages and table; returns the `.qfont` path
pub fn save_glyph_table(table: &GlyphTable, name: &Path) -> Result<PathBuf> {
    let path = qfont_path(name);
    let count = table.pages.len();
    for (i, page) in table.pages.iter().enumerate() {
        page.bitmap().save_png(&page_image_path(&path, i, count))?;
    }
    std::fs::write(&path, serialize(table))?;
    info!("Font saved: {} ({} page(s))", path.display(), count);
    Ok(path)
}

/// Load a `.qfont` table and its pages
///
/// Glyph bounds are re-grown from the page pixels. A `down_sample` above 1
/// scales the pages as a whole; below 1 each glyph is shrunk on its own and
/// repacked so shrinking cannot merge neighbours. Kerning, monospace
/// detection and the optional shadow are rebuilt from `config`.
pub fn load_glyph_table(path: &Path, config: &LoaderConfig) -> Result<GlyphTable> {
    let content = std::fs::read_to_string(path)?;
    let (page_count, mut glyphs) =
        deserialize(&content).map_err(|source| FontError::InvalidFormat {
            path: path.to_path_buf(),
            source,
        })?;

    let mut pages = Vec::with_capacity(page_count);
    for i in 0..page_count {
        pages.push(Bitmap::load_png(&page_image_path(path, i, page_count))?);
    }

    let tolerance = config.kerning.alpha_empty_pixel_tolerance;
    retarget_all_outwards(&pages, &mut glyphs, tolerance);
    check_overlap(&glyphs, "after loading")?;

    let factor = config.down_sample;
    if factor > 1.0 {
        let mut sheets = PackedSheets { glyphs, pages };
        scale_sheets(&mut sheets, factor);
        glyphs = sheets.glyphs;
        pages = sheets.pages;
    } else if factor < 1.0 && factor > 0.0 {
        let sheets = shrink_and_repack(&glyphs, &pages, factor, config.max_texture_size.max(1))?;
        glyphs = sheets.glyphs;
        pages = sheets.pages;
    }
    if factor != 1.0 {
        debug!("Font down-sampled by {}", factor);
        retarget_all_outwards(&pages, &mut glyphs, tolerance);
        check_overlap(&glyphs, "after resizing")?;
    }

    let mut table = GlyphTable::new(&glyphs, pages);
    let chars: Vec<char> = table.glyphs.keys().copied().collect();
    table.kerning_pairs = kerning::calculate_kerning(
        &chars,
        &table.glyphs,
        &table.page_bitmaps(),
        &config.kerning,
        None,
    );
    table.naturally_monospaced = is_monospaced(glyphs.iter().map(|g| g.rect.width));

    if let Some(shadow) = &config.shadow {
        let shadow_table = build_drop_shadow(&table.page_bitmaps(), &glyphs, shadow, tolerance)?;
        table.drop_shadow = Some(Box::new(shadow_table));
    }

    info!(
        "Font loaded: {} ({} glyphs, {} page(s))",
        path.display(),
        table.glyphs.len(),
        table.pages.len()
    );
    Ok(table)
}

/// Copy every glyph to its own bitmap, shrink, then repack
fn shrink_and_repack(
    glyphs: &[Glyph],
    pages: &[Bitmap],
    factor: f32,
    max_texture_size: u32,
) -> Result<PackedSheets> {
    let mut bitmaps = Vec::with_capacity(glyphs.len());
    let mut shrunk = Vec::with_capacity(glyphs.len());
    for (i, glyph) in glyphs.iter().enumerate() {
        let rect = glyph.rect;
        let mut own = Bitmap::new(
            rect.width.max(1) as u32,
            rect.height.max(1) as u32,
            PixelFormat::Rgba,
        );
        if let Some(page) = pages.get(glyph.page) {
            own.blit(page, rect, 0, 0);
        }
        let w = ((own.width() as f32 * factor) as u32).max(1);
        let h = ((own.height() as f32 * factor) as u32).max(1);
        let own = own.downscale(w, h);
        shrunk.push(Glyph::new(
            i,
            Rect::new(0, 0, w as i32, h as i32),
            (glyph.y_offset as f32 * factor) as i32,
            glyph.character,
        ));
        bitmaps.push(own);
    }

    // Proportional pages first, never smaller than the largest glyph;
    // doubled until everything fits on one page
    let margin2 = 2 * SHRINK_REPACK_MARGIN as u32;
    let widest = shrunk.iter().map(|g| g.rect.width as u32).max().unwrap_or(1) + margin2;
    let tallest = shrunk.iter().map(|g| g.rect.height as u32).max().unwrap_or(1) + margin2;
    let (page_w, page_h) = pages
        .first()
        .map(|p| (p.width(), p.height()))
        .unwrap_or((1, 1));
    let mut width = ((page_w as f32 * (SHRINK_PAGE_SLACK + factor)) as u32)
        .max(widest)
        .clamp(1, max_texture_size);
    let mut height = ((page_h as f32 * (SHRINK_PAGE_SLACK + factor)) as u32)
        .max(tallest)
        .clamp(1, max_texture_size);
    loop {
        let settings = PackSettings {
            max_width: width,
            max_height: height,
            margin: SHRINK_REPACK_MARGIN,
            force_power_of_two: false,
        };
        let at_limit = width >= max_texture_size && height >= max_texture_size;
        match pack(&shrunk, &bitmaps, &settings) {
            Ok(sheets) if sheets.pages.len() <= 1 || at_limit => return Ok(sheets),
            Ok(sheets) => debug!(
                "Shrunk glyphs need {} pages at {}x{}, growing",
                sheets.pages.len(),
                width,
                height
            ),
            Err(e) if at_limit => return Err(e),
            Err(e) => debug!("Repack at {}x{} failed ({}), growing", width, height, e),
        }
        width = width.saturating_mul(2).min(max_texture_size);
        height = height.saturating_mul(2).min(max_texture_size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "1\n3\nA 0 1 1 10 12 2\n  0 13 1 1 1 1\nj 0 20 1 4 15 4\n";

    #[test]
    fn test_deserialize_sample() {
        let (pages, glyphs) = deserialize(SAMPLE).unwrap();
        assert_eq!(pages, 1);
        assert_eq!(glyphs.len(), 3);
        assert_eq!(glyphs[0], Glyph::new(0, Rect::new(1, 1, 10, 12), 2, 'A'));
        assert_eq!(glyphs[1].character, ' ');
        assert_eq!(glyphs[1].rect, Rect::new(13, 1, 1, 1));
        assert_eq!(glyphs[2].y_offset, 4);
    }

    #[test]
    fn test_serialize_matches_format() {
        let (_, glyphs) = deserialize(SAMPLE).unwrap();
        let mut table = GlyphTable::new(&glyphs, vec![Bitmap::new(1, 1, PixelFormat::Rgba)]);
        table.update_metrics();
        let text = serialize(&table);
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("1"));
        assert_eq!(lines.next(), Some("3"));
        assert_eq!(lines.next(), Some("  0 13 1 1 1 1"));
        let (_, again) = deserialize(&text).unwrap();
        assert_eq!(again.len(), 3);
    }

    #[test]
    fn test_multibyte_character() {
        let (_, glyphs) = deserialize("1\n1\nあ 0 5 6 7 8 9\n").unwrap();
        assert_eq!(glyphs[0].character, 'あ');
        assert_eq!(glyphs[0].rect, Rect::new(5, 6, 7, 8));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(deserialize(""), Err(ParseError::MissingLine(1))));
        assert!(matches!(
            deserialize("x\n1\n"),
            Err(ParseError::InvalidNumber { line: 1, .. })
        ));
        assert!(matches!(
            deserialize("1\n2\nA 0 1 1 1 1 1\n"),
            Err(ParseError::MissingLine(4))
        ));
        assert!(matches!(
            deserialize("1\n1\nA 0 1 1 1\n"),
            Err(ParseError::MissingField { line: 3, field: "height" })
        ));
        assert!(matches!(
            deserialize("1\n1\nA 0 1 q 1 1 1\n"),
            Err(ParseError::InvalidNumber { line: 3, field: "y", .. })
        ));
        assert!(matches!(
            deserialize("1\n2\nA 0 1 1 1 1 1\nA 0 5 1 1 1 1\n"),
            Err(ParseError::DuplicateGlyph { line: 4, ch: 'A' })
        ));
        assert!(matches!(
            deserialize("1\n1\nA 2 1 1 1 1 1\n"),
            Err(ParseError::PageOutOfRange { page: 2, .. })
        ));
    }

    #[test]
    fn test_paths() {
        let q = qfont_path(Path::new("out/My Font"));
        assert_eq!(q, PathBuf::from("out/My Font.qfont"));
        assert_eq!(qfont_path(&q), q);
        assert_eq!(
            page_image_path(&q, 0, 1),
            PathBuf::from("out/MyFont.png")
        );
        assert_eq!(
            page_image_path(&q, 2, 3),
            PathBuf::from("out/MyFont_sheet_2.png")
        );
    }

    fn sample_table() -> GlyphTable {
        let mut page = Bitmap::new(64, 48, PixelFormat::Rgba);
        page.clear([255, 255, 255, 0]);
        page.fill_rect(Rect::new(2, 2, 8, 10), [255, 255, 255, 255]);
        page.fill_rect(Rect::new(14, 4, 6, 8), [255, 255, 255, 255]);
        let glyphs = [
            Glyph::new(0, Rect::new(2, 2, 8, 10), 1, 'H'),
            Glyph::new(0, Rect::new(14, 4, 6, 8), 3, 'o'),
        ];
        GlyphTable::new(&glyphs, vec![page])
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let table = sample_table();
        let path = save_glyph_table(&table, &dir.path().join("sample font")).unwrap();
        assert!(dir.path().join("samplefont.png").exists());

        let loaded = load_glyph_table(&path, &LoaderConfig::default()).unwrap();
        assert_eq!(loaded.glyphs, table.glyphs);
        assert_eq!(loaded.pages.len(), 1);
        assert!(loaded.validate_overlap("round trip").is_ok());
        assert_eq!(loaded.kerning_pairs.len(), 4);
        assert!(loaded.drop_shadow.is_none());
    }

    #[test]
    fn test_load_reports_invalid_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.qfont");
        std::fs::write(&path, "one\n").unwrap();
        let err = load_glyph_table(&path, &LoaderConfig::default()).unwrap_err();
        assert!(matches!(err, FontError::InvalidFormat { .. }));
    }

    #[test]
    fn test_load_with_shrink_and_shadow() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_glyph_table(&sample_table(), &dir.path().join("s")).unwrap();
        let config = LoaderConfig {
            down_sample: 0.5,
            shadow: Some(crate::config::ShadowConfig {
                blur_radius: 1,
                blur_passes: 1,
                max_texture_size: 64,
                ..Default::default()
            }),
            ..Default::default()
        };
        let loaded = load_glyph_table(&path, &config).unwrap();
        let h = loaded.glyph('H').unwrap();
        assert_eq!((h.rect.width, h.rect.height), (4, 5));
        assert!(loaded.validate_overlap("shrunk").is_ok());
        let shadow = loaded.drop_shadow.as_ref().unwrap();
        assert!(shadow.is_drop_shadow);
        assert!(shadow.contains('o'));
    }
}
