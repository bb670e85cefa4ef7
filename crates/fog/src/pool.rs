use crate::texture::{FogTexture, TextureDescriptor, TextureKind};

/// Pool activity counters for instrumentation and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub allocated: u64,
    pub reused: u64,
    pub destroyed: u64,
}

/// Single-slot recycling pool for the fog bake target.
///
/// The bake target has stable dimensions across a session (barring a canvas
/// resize), so keeping one spare avoids a GPU allocation per bake cycle.
#[derive(Debug, Default)]
pub struct CoherentTextureBuffer {
    recycled: Option<FogTexture>,
    next_id: u64,
    stats: PoolStats,
}

impl CoherentTextureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    pub fn has_recycled(&self) -> bool {
        self.recycled.is_some()
    }

    /// The matching spare if one exists, else a fresh render target. A
    /// mismatched or invalidated spare is destroyed: the canvas was resized
    /// and the old size will not come back.
    pub fn acquire(&mut self, desc: TextureDescriptor) -> FogTexture {
        if let Some(tex) = self.recycled.take() {
            if tex.is_valid() && *tex.descriptor() == desc {
                self.stats.reused += 1;
                return tex;
            }
            self.destroy(tex);
        }
        self.stats.allocated += 1;
        self.next_id += 1;
        FogTexture::render_target(self.next_id, desc)
    }

    /// Keep a render target as the single spare, destroying whatever held
    /// the slot before; destroy anything else immediately.
    pub fn release(&mut self, tex: FogTexture) {
        match tex.kind() {
            TextureKind::RenderTarget => {
                if let Some(old) = self.recycled.replace(tex) {
                    self.destroy(old);
                }
            }
            _ => self.destroy(tex),
        }
    }

    /// Destroy without pooling. Used for sub-renders that must not evict the
    /// spare bake target.
    pub fn discard(&mut self, tex: FogTexture) {
        self.destroy(tex);
    }

    fn destroy(&mut self, tex: FogTexture) {
        // The shared placeholder is never destroyed.
        if tex.kind() == TextureKind::Empty {
            return;
        }
        self.stats.destroyed += 1;
        tracing::trace!(id = tex.id(), "destroyed texture");
    }
}
