//! Shared scene types: walls, tiles, canvas dimensions, polygons.
//!
//! # Invariants
//! - Wall and tile data is owned by the host's scene model; this crate only
//!   describes the shape the core reads.
//! - A `Polygon`'s vertex list is immutable after construction, so its
//!   memoized bounding box can never go stale.

mod polygon;
mod types;

pub use polygon::{BBox, Polygon};
pub use types::{
    DoorKind, DoorState, OcclusionMode, SceneDimensions, Tile, TileId, Wall, WallDirection,
    WallHeight, WallId, WallSense,
};

pub fn crate_info() -> &'static str {
    "sightline-common v0.1.0"
}
