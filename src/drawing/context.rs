//! Render context
//!
//! Owns the textures fonts upload and collects the vertex batches drawing
//! primitives submit. A graphics backend drains the batches once per frame
//! with `take_batches`.

use std::collections::HashMap;

use log::{debug, warn};

use super::primitive::Vertex;
use crate::bitmap::Bitmap;

/// Handle of an uploaded texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(u32);

impl TextureId {
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Triangles sharing one texture
#[derive(Debug, Clone, PartialEq)]
pub struct DrawBatch {
    pub texture: TextureId,
    /// Two triangles (six vertices) per quad
    pub vertices: Vec<Vertex>,
}

/// Texture registry plus pending draw batches
#[derive(Debug, Default)]
pub struct RenderContext {
    textures: HashMap<TextureId, Bitmap>,
    next_id: u32,
    batches: Vec<DrawBatch>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an RGBA copy of `bitmap`
    pub fn register_texture(&mut self, bitmap: &Bitmap) -> TextureId {
        self.next_id += 1;
        let id = TextureId(self.next_id);
        self.textures.insert(id, bitmap.to_rgba());
        debug!(
            "Texture {} registered: {}x{}",
            id.0,
            bitmap.width(),
            bitmap.height()
        );
        id
    }

    pub fn release_texture(&mut self, id: TextureId) {
        if self.textures.remove(&id).is_none() {
            warn!("Texture {} released twice", id.0);
        }
    }

    pub fn texture(&self, id: TextureId) -> Option<&Bitmap> {
        self.textures.get(&id)
    }

    pub fn texture_size(&self, id: TextureId) -> Option<(u32, u32)> {
        self.textures.get(&id).map(|b| (b.width(), b.height()))
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Queue a batch; empty batches and unknown textures are dropped
    pub fn submit(&mut self, batch: DrawBatch) {
        if batch.vertices.is_empty() {
            return;
        }
        if !self.textures.contains_key(&batch.texture) {
            warn!("Draw batch references unknown texture {}", batch.texture.0);
            return;
        }
        self.batches.push(batch);
    }

    pub fn batches(&self) -> &[DrawBatch] {
        &self.batches
    }

    /// Drain queued batches in submission order
    pub fn take_batches(&mut self) -> Vec<DrawBatch> {
        std::mem::take(&mut self.batches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::PixelFormat;

    fn vertex() -> Vertex {
        Vertex {
            position: [0.0; 3],
            tex_coord: [0.0; 2],
            color: [1.0; 4],
        }
    }

    #[test]
    fn test_texture_lifecycle() {
        let mut ctx = RenderContext::new();
        let a = ctx.register_texture(&Bitmap::new(8, 4, PixelFormat::Rgb));
        let b = ctx.register_texture(&Bitmap::new(2, 2, PixelFormat::Rgba));
        assert_ne!(a, b);
        assert_eq!(ctx.texture_size(a), Some((8, 4)));
        assert_eq!(ctx.texture(a).unwrap().format(), PixelFormat::Rgba);
        ctx.release_texture(a);
        assert_eq!(ctx.texture_size(a), None);
        assert_eq!(ctx.texture_count(), 1);
    }

    #[test]
    fn test_submit_filters_batches() {
        let mut ctx = RenderContext::new();
        let tex = ctx.register_texture(&Bitmap::new(4, 4, PixelFormat::Rgba));
        ctx.submit(DrawBatch {
            texture: tex,
            vertices: Vec::new(),
        });
        ctx.submit(DrawBatch {
            texture: TextureId(99),
            vertices: vec![vertex()],
        });
        ctx.submit(DrawBatch {
            texture: tex,
            vertices: vec![vertex(); 6],
        });
        assert_eq!(ctx.batches().len(), 1);
        let taken = ctx.take_batches();
        assert_eq!(taken[0].vertices.len(), 6);
        assert!(ctx.batches().is_empty());
    }
}
