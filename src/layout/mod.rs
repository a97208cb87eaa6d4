//! Text layout
//!
//! Handles:
//! - Tokenizing text into words, spaces and line breaks
//! - Measuring nodes against a glyph table
//! - Word wrapping, alignment and justification

pub mod engine;
pub mod justify;
pub mod nodes;
pub mod options;

pub use engine::{GlyphSink, ProcessedText, TextLayout};
pub use nodes::{NodeId, TextNode, TextNodeKind, TextNodeList};
pub use options::{Alignment, Monospacing, RenderOptions, Size, ViewportTransform};
