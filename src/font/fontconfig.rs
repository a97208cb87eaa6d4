//! System font lookup
//!
//! Resolves a family name and style to a font file. With the
//! `system-fonts` feature fontconfig is asked first; the well-known
//! font directories are scanned otherwise (and as fallback).

use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use crate::config::FontStyle;
use crate::error::{FontError, Result};

/// Font search result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontMatch {
    /// Font file path
    pub path: PathBuf,
    /// Font name
    pub family: String,
}

/// Search fonts using fontconfig
#[cfg(feature = "system-fonts")]
pub struct FontFinder {
    fc: fontconfig::Fontconfig,
}

#[cfg(feature = "system-fonts")]
impl FontFinder {
    /// Initialize FontFinder
    pub fn new() -> Result<Self> {
        let fc = fontconfig::Fontconfig::new()
            .ok_or_else(|| FontError::FontLoad("fontconfig initialization failed".to_string()))?;
        debug!("fontconfig initialized");
        Ok(Self { fc })
    }

    /// Search by family name and style
    ///
    /// fontconfig always returns the "closest" match, even if completely
    /// unrelated, so the returned family must contain the request.
    pub fn find_font(&self, family: &str, style: FontStyle) -> Option<FontMatch> {
        let font = self.fc.find(family, fontconfig_style(style))?;
        let req = family.to_ascii_lowercase();
        let got = font.name.to_ascii_lowercase();
        if got.contains(&req) || req.contains(&got) {
            return Some(FontMatch {
                path: font.path,
                family: font.name,
            });
        }
        warn!(
            "fontconfig: rejected false match for \"{}\": got \"{}\"",
            family, font.name
        );
        None
    }
}

#[cfg(feature = "system-fonts")]
fn fontconfig_style(style: FontStyle) -> Option<&'static str> {
    match style {
        FontStyle::Regular => None,
        FontStyle::Bold => Some("Bold"),
        FontStyle::Italic => Some("Italic"),
        FontStyle::BoldItalic => Some("Bold Italic"),
    }
}

/// Well-known font directories
pub fn font_dirs() -> Vec<PathBuf> {
    let mut dirs_out = vec![
        // Linux
        PathBuf::from("/usr/share/fonts"),
        PathBuf::from("/usr/local/share/fonts"),
        // macOS
        PathBuf::from("/System/Library/Fonts"),
        PathBuf::from("/Library/Fonts"),
    ];
    if let Some(data) = dirs::data_dir() {
        dirs_out.push(data.join("fonts"));
    }
    if let Some(home) = dirs::home_dir() {
        dirs_out.push(home.join(".fonts"));
    }
    dirs_out
}

/// Lowercase ASCII alphanumerics only ("DejaVu Sans-Bold" -> "dejavusansbold")
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn style_suffixes(style: FontStyle) -> &'static [&'static str] {
    match style {
        FontStyle::Regular => &["", "regular", "book", "roman", "normal"],
        FontStyle::Bold => &["bold"],
        FontStyle::Italic => &["italic", "oblique", "it"],
        FontStyle::BoldItalic => &["bolditalic", "boldoblique"],
    }
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|e| matches!(e.as_str(), "ttf" | "otf" | "ttc"))
}

/// Search `dirs` recursively for `<family><style>.{ttf,otf,ttc}`
///
/// File names are compared with separators and case ignored.
pub fn scan_font_dirs(dirs: &[PathBuf], family: &str, style: FontStyle) -> Option<FontMatch> {
    let family_key = normalize(family);
    if family_key.is_empty() {
        return None;
    }
    let wanted: Vec<String> = style_suffixes(style)
        .iter()
        .map(|s| format!("{}{}", family_key, s))
        .collect();

    debug!("Scanning {} font directories for \"{}\"", dirs.len(), family);
    let mut pending: Vec<PathBuf> = dirs.to_vec();
    let mut best: Option<(usize, PathBuf)> = None;
    while let Some(dir) = pending.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
                continue;
            }
            if !is_font_file(&path) {
                continue;
            }
            let stem = path
                .file_stem()
                .map(|s| normalize(&s.to_string_lossy()))
                .unwrap_or_default();
            // Earlier suffixes are preferred ("regular" over "book")
            if let Some(rank) = wanted.iter().position(|w| *w == stem) {
                if best.as_ref().map_or(true, |(r, p)| rank < *r || (rank == *r && path < *p)) {
                    best = Some((rank, path));
                }
            }
        }
    }

    best.map(|(_, path)| FontMatch {
        path,
        family: family.to_string(),
    })
}

/// Resolve an installed font by family name and style
pub fn find_system_font(family: &str, style: FontStyle) -> Result<FontMatch> {
    #[cfg(feature = "system-fonts")]
    {
        match FontFinder::new() {
            Ok(finder) => {
                if let Some(m) = finder.find_font(family, style) {
                    info!(
                        "Font resolved by name: \"{}\" {} → {} ({})",
                        family,
                        style,
                        m.family,
                        m.path.display()
                    );
                    return Ok(m);
                }
            }
            Err(e) => warn!("{}", e),
        }
        debug!("Not found via fontconfig, scanning font directories");
    }

    if let Some(m) = scan_font_dirs(&font_dirs(), family, style) {
        info!(
            "Font resolved by scan: \"{}\" {} → {}",
            family,
            style,
            m.path.display()
        );
        return Ok(m);
    }

    Err(FontError::FontNotFound(format!("{} {}", family, style)))
}

/// Load font file
pub fn load_font_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        FontError::FontLoad(format!("Failed to read font file: {} ({})", path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"").unwrap();
        path
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("DejaVu Sans-Mono_Bold"), "dejavusansmonobold");
    }

    #[test]
    fn test_scan_matches_style() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("truetype").join("dejavu");
        std::fs::create_dir_all(&nested).unwrap();
        let regular = touch(&nested, "DejaVuSans.ttf");
        let bold = touch(&nested, "DejaVuSans-Bold.ttf");
        touch(&nested, "DejaVuSansMono.ttf");
        touch(&nested, "DejaVuSans-Bold.txt");

        let dirs = vec![dir.path().to_path_buf()];
        let m = scan_font_dirs(&dirs, "DejaVu Sans", FontStyle::Regular).unwrap();
        assert_eq!(m.path, regular);
        assert_eq!(m.family, "DejaVu Sans");
        let m = scan_font_dirs(&dirs, "dejavu sans", FontStyle::Bold).unwrap();
        assert_eq!(m.path, bold);
        assert!(scan_font_dirs(&dirs, "DejaVu Sans", FontStyle::Italic).is_none());
        assert!(scan_font_dirs(&dirs, "Missing", FontStyle::Regular).is_none());
    }

    #[test]
    fn test_scan_prefers_regular_over_book() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "Foo-Book.otf");
        let regular = touch(dir.path(), "Foo-Regular.otf");
        let m = scan_font_dirs(&[dir.path().to_path_buf()], "Foo", FontStyle::Regular).unwrap();
        assert_eq!(m.path, regular);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_font_file(Path::new("/nonexistent/font.ttf")).unwrap_err();
        assert!(matches!(err, FontError::FontLoad(_)));
    }
}
