//! Error types
//!
//! Every failure in the build/load pipeline is unrecoverable at the point
//! it is raised; callers decide whether to fall back to another font.

use std::num::ParseIntError;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FontError>;

/// Main error type for font building, loading and layout
#[derive(Debug, Error)]
pub enum FontError {
    #[error("SuperSampleLevels = [{0}] is an unsupported value. Please use values in the range [1,8]")]
    InvalidSuperSample(u8),

    #[error("Font \"{family}\" does not support style {style}")]
    UnsupportedStyle { family: String, style: String },

    #[error("Font not found: \"{0}\"")]
    FontNotFound(String),

    #[error("Font loading failed: {0}")]
    FontLoad(String),

    #[error("Character set is empty (no characters supported by this font)")]
    EmptyCharacterSet,

    #[error("Failed to fit {glyphs} glyphs into texture pages after {attempts} attempts")]
    PackingFailed { glyphs: usize, attempts: usize },

    #[error("Glyphs '{first}' and '{second}' were overlapping {stage}")]
    GlyphOverlap {
        first: char,
        second: char,
        stage: String,
    },

    #[error("{} must use exactly one texture page, got {pages}", page_owner(.drop_shadow))]
    PageCount { pages: usize, drop_shadow: bool },

    #[error("Failed to parse font file {}: invalid format", .path.display())]
    InvalidFormat {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("Font texture has not been uploaded to the render context")]
    TextureNotUploaded,

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("PNG encoding failed: {0}")]
    PngEncode(#[from] png::EncodingError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn page_owner(drop_shadow: &bool) -> &'static str {
    if *drop_shadow {
        "Drop shadow font"
    } else {
        "Font"
    }
}

/// `.qfont` parse errors
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("line {0}: unexpected end of file")]
    MissingLine(usize),

    #[error("line {line}: missing field {field}")]
    MissingField { line: usize, field: &'static str },

    #[error("line {line}: invalid number in field {field}")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        #[source]
        source: ParseIntError,
    },

    #[error("line {line}: duplicate glyph '{ch}'")]
    DuplicateGlyph { line: usize, ch: char },

    #[error("glyph '{ch}' references page {page}, but the file declares {pages} pages")]
    PageOutOfRange { ch: char, page: usize, pages: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count_message() {
        let err = FontError::PageCount {
            pages: 2,
            drop_shadow: true,
        };
        assert_eq!(
            err.to_string(),
            "Drop shadow font must use exactly one texture page, got 2"
        );
    }

    #[test]
    fn test_invalid_format_keeps_source() {
        use std::error::Error as _;

        let source = "x".parse::<i32>().unwrap_err();
        let err = FontError::InvalidFormat {
            path: PathBuf::from("a.qfont"),
            source: ParseError::InvalidNumber {
                line: 3,
                field: "page",
                source,
            },
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("invalid format"));
    }
}
