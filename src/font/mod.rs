//! Font loading and glyph rasterization
//!
//! Handles:
//! - TTF/OTF font loading (fontdue)
//! - Font lookup by family name (fontconfig / font directory scan)
//! - The `Font` resource used for layout and drawing

pub mod fontconfig;
pub mod rasterizer;
pub mod resource;

pub use fontconfig::{find_system_font, FontMatch};
pub use rasterizer::{open_font, FileFont, GlyphRasterizer, Rasterizer, SystemFont};
pub use resource::Font;
