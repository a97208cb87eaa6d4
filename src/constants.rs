//! Global constants for fontsheet
//!
//! Consolidates packing, retargeting and layout tunables
//! to eliminate magic numbers throughout the codebase.

// ============================================================================
// Builder Constants
// ============================================================================

/// Margin around each glyph in the initial rasterization strip (pixels)
pub const STRIP_MARGIN: i32 = 3;

/// Lowest accepted super-sample level
pub const MIN_SUPER_SAMPLE: u8 = 1;

/// Highest accepted super-sample level
pub const MAX_SUPER_SAMPLE: u8 = 8;

/// Packing gives up after this many placement attempts per glyph
pub const PACKING_RETRY_FACTOR: usize = 10;

/// Fonts at or below this size use grid fitting under `RenderHint::SizeDependent`
pub const SIZE_DEPENDENT_GRID_FIT_MAX: f32 = 12.0;

/// Width spread below this fraction of the widest glyph counts as monospaced
pub const MONOSPACE_TOLERANCE: f32 = 0.05;

/// Coverage at or above this value is kept when grid fitting
pub const GRID_FIT_THRESHOLD: u8 = 128;

// ============================================================================
// Loader Constants
// ============================================================================

/// Glyph margin used when repacking individually shrunk glyphs
pub const SHRINK_REPACK_MARGIN: i32 = 4;

/// Extra page fraction allowed when repacking shrunk glyphs
pub const SHRINK_PAGE_SLACK: f32 = 0.1;

/// Extension of serialized glyph tables
pub const FONT_FILE_EXTENSION: &str = "qfont";

// ============================================================================
// Drop Shadow Constants
// ============================================================================

/// Shadow margin grows by this many pixels per pixel of blur radius
pub const SHADOW_MARGIN_PER_RADIUS: i32 = 3;

// ============================================================================
// Layout Defaults
// ============================================================================

/// Default spacing between characters (fraction of mean glyph width)
pub const DEFAULT_CHARACTER_SPACING: f32 = 0.05;

/// Default width of a space (fraction of mean glyph width)
pub const DEFAULT_WORD_SPACING: f32 = 0.9;

/// Default line spacing (fraction of max line height)
pub const DEFAULT_LINE_SPACING: f32 = 1.0;

/// Default drop shadow offset (fraction of mean glyph width)
pub const DEFAULT_DROP_SHADOW_OFFSET: (f32, f32) = (0.16, 0.16);

/// Default drop shadow opacity
pub const DEFAULT_DROP_SHADOW_OPACITY: f32 = 0.5;

/// Share of justification pixels given to character gaps when expanding
pub const DEFAULT_JUSTIFY_CHAR_WEIGHT_EXPAND: f32 = 0.5;

/// Share of justification pixels given to character gaps when contracting
pub const DEFAULT_JUSTIFY_CHAR_WEIGHT_CONTRACT: f32 = 0.2;

/// Maximum expansion (fraction of line width)
pub const DEFAULT_JUSTIFY_CAP_EXPAND: f32 = 0.5;

/// Maximum contraction (fraction of line width)
pub const DEFAULT_JUSTIFY_CAP_CONTRACT: f32 = 0.1;

/// Contraction is only chosen when it beats expansion by this factor
pub const DEFAULT_JUSTIFY_CONTRACTION_PENALTY: f32 = 2.0;
