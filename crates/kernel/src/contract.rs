use glam::DVec2;
use serde::{Deserialize, Serialize};
use sightline_common::{Polygon, Tile, TileId, Wall};

/// Opaque handle to a kernel-resident geometry snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SnapshotId(pub u64);

/// What a query is probing for. Selects which wall restriction category
/// applies: `Sight`, `Light`, and `Move` use the sense category, `Sound`
/// uses the sound category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    Sight,
    Light,
    Sound,
    Move,
}

/// Numeric parameters for a single visibility computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisibilityQuery {
    pub origin: DVec2,
    pub elevation: f64,
    /// Radius of the vision source; bounds the field-of-view polygon.
    pub radius: f64,
    /// Maximum ray distance; sized by the caller to reach every canvas corner.
    pub distance: f64,
    /// Degrees between adjacent sweep rays.
    pub density: f64,
    /// Field-of-view cone width in degrees; 360 or more means unconstrained.
    pub angle: f64,
    /// Facing in degrees; 0 faces down the +y axis (screen south).
    pub rotation: f64,
    /// Request a debug trace alongside the polygons.
    pub debug: bool,
}

impl Default for VisibilityQuery {
    fn default() -> Self {
        Self {
            origin: DVec2::ZERO,
            elevation: 0.0,
            radius: 0.0,
            distance: 0.0,
            density: 6.0,
            angle: 360.0,
            rotation: 0.0,
            debug: false,
        }
    }
}

/// A tested ray endpoint reported in a debug trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TracedEndpoint {
    pub point: DVec2,
    /// Ray angle in radians.
    pub angle: f64,
    /// Whether the ray terminated on a wall intersection.
    pub is_intersection: bool,
}

/// Optional instrumentation captured during a computation, consumed by the
/// host's debug-visualization layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebugTrace {
    pub endpoints: Vec<TracedEndpoint>,
    pub tangents: Vec<DVec2>,
}

/// Result of one visibility computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilityOutput {
    /// Visible region given full wall occlusion from the origin.
    pub los: Polygon,
    /// Line-of-sight further restricted by radius and the angular cone.
    pub fov: Polygon,
    pub trace: Option<DebugTrace>,
}

/// Errors reported by a kernel implementation.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),
    #[error("invalid query parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },
    #[error("unknown snapshot handle {0:?}")]
    UnknownSnapshot(SnapshotId),
}

/// The call boundary between the cache layer and the geometry kernel.
///
/// Snapshot construction is a deterministic function of the wall/tile set and
/// the elevation flag. Computation is deterministic given the same handle and
/// parameters. Degenerate or malformed geometry is reported as an error, not
/// a panic; the caller decides how to surface it.
pub trait VisibilityKernel {
    /// Build a kernel-resident snapshot of the wall/tile set.
    fn build_snapshot(
        &mut self,
        walls: &[Wall],
        tiles: &[Tile],
        elevation_aware: bool,
    ) -> Result<SnapshotId, KernelError>;

    /// Free a snapshot and its kernel-side resources. Unknown handles are
    /// ignored so teardown paths can be idempotent.
    fn free_snapshot(&mut self, id: SnapshotId);

    /// Patch the occlusion flag of one roof tile inside a live snapshot,
    /// avoiding a full rebuild.
    fn set_tile_occlusion(
        &mut self,
        id: SnapshotId,
        tile: TileId,
        occluded: bool,
    ) -> Result<(), KernelError>;

    /// Compute line-of-sight and field-of-view polygons. A `None` snapshot
    /// means permissive mode: nothing occludes.
    fn compute(
        &self,
        snapshot: Option<SnapshotId>,
        kind: QueryKind,
        query: &VisibilityQuery,
    ) -> Result<VisibilityOutput, KernelError>;
}
