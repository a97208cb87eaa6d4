//! Text drawing
//!
//! `DrawingPrimitive` emits vertex quads for laid out text and submits
//! them as batches to an explicit `RenderContext`.

pub mod context;
pub mod primitive;

pub use context::{DrawBatch, RenderContext, TextureId};
pub use primitive::{DrawingPrimitive, Vertex};
