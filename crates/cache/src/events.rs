use serde::{Deserialize, Serialize};
use sightline_common::{Tile, TileId, WallId};

/// A host lifecycle event consumed by the cache layer.
///
/// Document mutations stale the whole snapshot; only per-frame occlusion
/// recomputation is eligible for incremental patching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SceneEvent {
    /// A scene finished loading; every cached snapshot is stale.
    SceneLoaded,
    WallCreated { id: WallId },
    WallUpdated { id: WallId },
    WallDeleted { id: WallId },
    TileCreated { id: TileId },
    TileUpdated { id: TileId },
    TileDeleted { id: TileId },
    /// The host's per-frame occlusion pass changed one tile's flag.
    TileOcclusionChanged { tile: Tile, occluded: bool },
}
