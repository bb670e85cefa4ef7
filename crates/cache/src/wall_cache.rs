use crate::events::SceneEvent;
use sightline_common::{OcclusionMode, Tile, TileId, Wall};
use sightline_kernel::{KernelError, SnapshotId, VisibilityKernel};
use std::collections::BTreeMap;

/// Which kernel snapshot a query runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheDomain {
    /// Normal wall occlusion; rebuilt after every scene mutation.
    Restricted,
    /// Ignore-all-walls mode; built once from an empty set and never
    /// invalidated, since an empty input never changes.
    Permissive,
}

/// Cache activity counters for instrumentation and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub builds: u64,
    pub invalidations: u64,
    pub patches: u64,
}

/// Lazily rebuilt cache of kernel-resident geometry snapshots.
///
/// Owns at most one live handle per domain. The first query after an
/// invalidating event rebuilds; queries in between reuse the handle.
pub struct WallCache {
    restricted: Option<SnapshotId>,
    permissive: Option<SnapshotId>,
    /// Last occlusion value observed per roof tile, captured at build time
    /// and advanced by each applied patch. Deltas are detected against this
    /// ledger rather than the (already mutated) tile document.
    occlusion_seen: BTreeMap<TileId, bool>,
    /// One-time feature toggle evaluated at startup.
    elevation_aware: bool,
    stats: CacheStats,
}

impl WallCache {
    pub fn new(elevation_aware: bool) -> Self {
        Self {
            restricted: None,
            permissive: None,
            occlusion_seen: BTreeMap::new(),
            elevation_aware,
            stats: CacheStats::default(),
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn has_live_snapshot(&self) -> bool {
        self.restricted.is_some()
    }

    /// Handle for the given domain, building lazily on first use.
    /// Construction failure propagates and leaves the cache empty, so the
    /// next query retries.
    pub fn snapshot(
        &mut self,
        kernel: &mut dyn VisibilityKernel,
        domain: CacheDomain,
        walls: &[Wall],
        tiles: &[Tile],
    ) -> Result<SnapshotId, KernelError> {
        match domain {
            CacheDomain::Permissive => {
                if let Some(id) = self.permissive {
                    return Ok(id);
                }
                let id = kernel.build_snapshot(&[], &[], self.elevation_aware)?;
                self.permissive = Some(id);
                self.stats.builds += 1;
                tracing::debug!(?id, "built permissive snapshot");
                Ok(id)
            }
            CacheDomain::Restricted => {
                if let Some(id) = self.restricted {
                    return Ok(id);
                }
                let id = kernel.build_snapshot(walls, tiles, self.elevation_aware)?;
                self.occlusion_seen = tiles
                    .iter()
                    .filter(|t| t.occlusion == OcclusionMode::Roof)
                    .map(|t| (t.id, t.occluded))
                    .collect();
                self.restricted = Some(id);
                self.stats.builds += 1;
                tracing::debug!(?id, walls = walls.len(), tiles = tiles.len(), "rebuilt wall cache");
                Ok(id)
            }
        }
    }

    /// Drop the restricted handle and free its kernel resource. Idempotent.
    pub fn invalidate(&mut self, kernel: &mut dyn VisibilityKernel) {
        if let Some(id) = self.restricted.take() {
            kernel.free_snapshot(id);
            self.stats.invalidations += 1;
            tracing::debug!(?id, "invalidated wall cache");
        }
        self.occlusion_seen.clear();
    }

    /// Apply an incremental occlusion patch, avoiding a full rebuild.
    ///
    /// Applies only when a restricted handle is live, the tile is in the
    /// roof category, and the value actually changed from the last observed
    /// one. Everything else is a no-op, not an error: state rebuilds lazily
    /// on the next query. A tile the ledger has never seen is also a no-op;
    /// its create event already invalidated the cache.
    pub fn update_occlusion(
        &mut self,
        kernel: &mut dyn VisibilityKernel,
        tile: &Tile,
        occluded: bool,
    ) -> Result<(), KernelError> {
        let Some(id) = self.restricted else {
            return Ok(());
        };
        if tile.occlusion != OcclusionMode::Roof {
            return Ok(());
        }
        match self.occlusion_seen.get(&tile.id) {
            Some(seen) if *seen != occluded => {}
            _ => return Ok(()),
        }
        kernel.set_tile_occlusion(id, tile.id, occluded)?;
        self.occlusion_seen.insert(tile.id, occluded);
        self.stats.patches += 1;
        tracing::trace!(tile = ?tile.id, occluded, "patched occlusion");
        Ok(())
    }

    /// Route a host lifecycle event to invalidation or patching.
    pub fn apply(
        &mut self,
        kernel: &mut dyn VisibilityKernel,
        event: &SceneEvent,
    ) -> Result<(), KernelError> {
        match event {
            SceneEvent::TileOcclusionChanged { tile, occluded } => {
                self.update_occlusion(kernel, tile, *occluded)
            }
            _ => {
                self.invalidate(kernel);
                Ok(())
            }
        }
    }

    /// Free both domains at session end.
    pub fn teardown(&mut self, kernel: &mut dyn VisibilityKernel) {
        self.invalidate(kernel);
        if let Some(id) = self.permissive.take() {
            kernel.free_snapshot(id);
        }
    }
}
