use glam::DVec2;
use sightline_common::{Polygon, Tile, Wall};
use sightline_kernel::{DebugTrace, KernelError, QueryKind};

/// Named options accepted by the query entry point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisionOptions {
    pub kind: QueryKind,
    /// Field-of-view cone width in degrees.
    pub angle: f64,
    /// Degrees between adjacent sweep rays.
    pub density: f64,
    /// Facing in degrees.
    pub rotation: f64,
    /// Ignore all walls (the permissive cache domain).
    pub unrestricted: bool,
}

impl Default for VisionOptions {
    fn default() -> Self {
        Self {
            kind: QueryKind::Sight,
            angle: 360.0,
            density: 6.0,
            rotation: 0.0,
            unrestricted: false,
        }
    }
}

/// Result of a visibility query.
#[derive(Debug, Clone, PartialEq)]
pub struct VisionResult {
    pub los: Polygon,
    pub fov: Polygon,
    /// Legacy ray-list field retained for call-site compatibility.
    /// Always `None`.
    pub rays: Option<Vec<DVec2>>,
    /// Present when debug capture is enabled for the session.
    pub trace: Option<DebugTrace>,
}

/// Errors surfaced by the query entry point.
#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    #[error("visibility kernel error: {0}")]
    Kernel(#[from] KernelError),
}

/// Replaces the host's built-in visibility computation. The host holds one
/// provider reference, assigned at load time.
pub trait VisibilityProvider {
    fn compute_vision(
        &mut self,
        walls: &[Wall],
        tiles: &[Tile],
        origin: DVec2,
        elevation: f64,
        radius: f64,
        options: &VisionOptions,
    ) -> Result<VisionResult, VisionError>;
}

/// Receives the host's per-frame tile occlusion recomputation.
pub trait OcclusionProvider {
    fn occlusion_changed(&mut self, tile: &Tile, occluded: bool);
}
