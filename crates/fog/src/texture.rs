use serde::{Deserialize, Serialize};
use sightline_common::SceneDimensions;

/// Size and resolution of a GPU texture. Pool reuse requires an exact match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextureDescriptor {
    pub width: u32,
    pub height: u32,
    pub resolution: f64,
}

impl TextureDescriptor {
    /// Bake target covering the full padded canvas.
    pub fn for_scene(d: &SceneDimensions) -> Self {
        Self {
            width: d.width.ceil() as u32,
            height: d.height.ceil() as u32,
            resolution: d.resolution,
        }
    }
}

/// Resource category. Only render targets are poolable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    RenderTarget,
    Image,
    /// The shared "nothing explored yet" placeholder.
    Empty,
}

/// Handle to a host GPU texture resource.
///
/// The core tracks identity, dimensions, and validity; pixel contents live on
/// the GPU and are only touched through the bake renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct FogTexture {
    id: u64,
    kind: TextureKind,
    desc: TextureDescriptor,
    valid: bool,
}

impl FogTexture {
    pub(crate) fn render_target(id: u64, desc: TextureDescriptor) -> Self {
        Self {
            id,
            kind: TextureKind::RenderTarget,
            desc,
            valid: true,
        }
    }

    /// Wrap a non-poolable host resource (a sprite texture, an import).
    pub fn image(id: u64, desc: TextureDescriptor) -> Self {
        Self {
            id,
            kind: TextureKind::Image,
            desc,
            valid: true,
        }
    }

    /// The designated placeholder standing in for "nothing explored yet".
    /// Never pooled and never destroyed.
    pub fn empty() -> Self {
        Self {
            id: 0,
            kind: TextureKind::Empty,
            desc: TextureDescriptor {
                width: 0,
                height: 0,
                resolution: 1.0,
            },
            valid: true,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn kind(&self) -> TextureKind {
        self.kind
    }

    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.desc
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Host-side disposal. The next bake substitutes the placeholder instead
    /// of rendering over a dead resource.
    pub fn invalidate(&mut self) {
        self.valid = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_for_scene_rounds_up() {
        let d = SceneDimensions {
            width: 3000.5,
            height: 4000.0,
            padding_x: 500.0,
            padding_y: 500.0,
            resolution: 0.5,
        };
        let desc = TextureDescriptor::for_scene(&d);
        assert_eq!(desc.width, 3001);
        assert_eq!(desc.height, 4000);
        assert_eq!(desc.resolution, 0.5);
    }

    #[test]
    fn invalidation_marks_texture_dead() {
        let mut tex = FogTexture::empty();
        assert!(tex.is_valid());
        tex.invalidate();
        assert!(!tex.is_valid());
    }
}
