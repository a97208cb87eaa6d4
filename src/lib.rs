//! fontsheet - bitmap font atlas builder and text layout engine
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │  Rasterizer (fontdue)  →  Atlas Builder  │
//! │                               ↓          │
//! │            Glyph Table  ⇄  .qfont + PNG  │
//! │                               ↓          │
//! │   Font  →  Layout Engine  →  Primitive   │
//! │                               ↓          │
//! │                      Render Context      │
//! └──────────────────────────────────────────┘
//! ```

pub mod atlas;
pub mod bitmap;
pub mod config;
pub mod constants;
pub mod drawing;
pub mod error;
pub mod font;
pub mod layout;
pub mod utils;

pub use atlas::{Builder, Glyph, GlyphTable};
pub use drawing::{DrawingPrimitive, RenderContext, Vertex};
pub use error::{FontError, Result};
pub use font::Font;
pub use layout::{Alignment, RenderOptions, Size};
