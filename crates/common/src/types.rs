use glam::DVec2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a wall document in the host scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WallId(pub Uuid);

impl WallId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WallId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for an overhead tile document in the host scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(pub Uuid);

impl TileId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TileId {
    fn default() -> Self {
        Self::new()
    }
}

/// Door kind carried on a wall segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoorKind {
    None,
    Door,
    Secret,
}

/// Runtime state of a door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoorState {
    Closed,
    Open,
    Locked,
}

/// How strongly a wall restricts a sense category.
///
/// `Limited` walls only block once a ray has already crossed another limited
/// wall; the kernel is responsible for that double-counting rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WallSense {
    None,
    Normal,
    Limited,
}

/// Which side(s) of the segment the wall blocks from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WallDirection {
    Both,
    Left,
    Right,
}

/// Elevation band over which a wall blocks. The default spans all elevations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallHeight {
    pub top: f64,
    pub bottom: f64,
}

impl Default for WallHeight {
    fn default() -> Self {
        Self {
            top: f64::INFINITY,
            bottom: f64::NEG_INFINITY,
        }
    }
}

/// A wall segment as fed to the visibility kernel.
///
/// Owned by the host's scene model and referenced here; the cache reads the
/// full set once per snapshot build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    pub id: WallId,
    pub p1: DVec2,
    pub p2: DVec2,
    /// Restriction applied to sight and light queries.
    pub sense: WallSense,
    /// Restriction applied to sound queries.
    pub sound: WallSense,
    pub door: DoorKind,
    pub door_state: DoorState,
    pub direction: WallDirection,
    pub height: WallHeight,
    /// Tile this wall sits under, if it is interior to a roof.
    pub roof: Option<TileId>,
}

impl Wall {
    /// A plain blocking wall between two points.
    pub fn new(p1: DVec2, p2: DVec2) -> Self {
        Self {
            id: WallId::new(),
            p1,
            p2,
            sense: WallSense::Normal,
            sound: WallSense::Normal,
            door: DoorKind::None,
            door_state: DoorState::Closed,
            direction: WallDirection::Both,
            height: WallHeight::default(),
            roof: None,
        }
    }

    /// An open door never blocks, regardless of sense category.
    pub fn is_open_door(&self) -> bool {
        self.door != DoorKind::None && self.door_state == DoorState::Open
    }
}

/// Occlusion behavior of an overhead tile.
///
/// Only `Roof` tiles participate in incremental occlusion patching; their
/// visibility depends on token occupancy rather than static wall geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OcclusionMode {
    None,
    Fade,
    Roof,
}

/// An overhead tile. `occluded` is recomputed each frame by the host from
/// token positions; the cache reads it to detect deltas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileId,
    pub occlusion: OcclusionMode,
    pub occluded: bool,
}

impl Tile {
    pub fn new(occlusion: OcclusionMode) -> Self {
        Self {
            id: TileId::new(),
            occlusion,
            occluded: false,
        }
    }
}

/// Padded canvas dimensions plus the fog bake resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneDimensions {
    /// Full padded canvas width in world units.
    pub width: f64,
    /// Full padded canvas height in world units.
    pub height: f64,
    pub padding_x: f64,
    pub padding_y: f64,
    /// Resolution of the baked fog texture relative to world units.
    pub resolution: f64,
}

impl SceneDimensions {
    /// Maximum ray distance needed so rays reach every canvas corner from
    /// `origin`, but never less than the query radius.
    pub fn max_ray_distance(&self, origin: DVec2, radius: f64) -> f64 {
        let dx = origin.x.max(self.width - origin.x);
        let dy = origin.y.max(self.height - origin.y);
        radius.max(dx.hypot(dy))
    }
}
