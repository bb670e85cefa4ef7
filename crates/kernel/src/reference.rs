use crate::contract::{
    DebugTrace, KernelError, QueryKind, SnapshotId, TracedEndpoint, VisibilityKernel,
    VisibilityOutput, VisibilityQuery,
};
use glam::DVec2;
use sightline_common::{OcclusionMode, Polygon, Tile, TileId, Wall, WallDirection, WallSense};
use std::collections::BTreeMap;
use std::f64::consts::TAU;

const EPS: f64 = 1.0e-9;

struct SnapshotData {
    walls: Vec<Wall>,
    /// Occlusion flags for roof tiles, patched in place between rebuilds.
    occluded: BTreeMap<TileId, bool>,
    elevation_aware: bool,
}

impl SnapshotData {
    fn empty() -> Self {
        Self {
            walls: Vec::new(),
            occluded: BTreeMap::new(),
            elevation_aware: false,
        }
    }
}

/// Deterministic ray-sweep kernel used by tests and offline replay.
///
/// Not the production algorithm: it casts one ray per `density` degrees and
/// trades performance for obviousness. It does honor the full wall-flag
/// contract (door state, sense category per query kind, limited-wall double
/// counting, directionality, elevation bounds, roof-tile occlusion) so the
/// surrounding layers can be exercised faithfully.
pub struct ReferenceKernel {
    snapshots: BTreeMap<u64, SnapshotData>,
    next_id: u64,
}

impl ReferenceKernel {
    pub fn new() -> Self {
        Self {
            snapshots: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Number of snapshots currently resident.
    pub fn live_snapshots(&self) -> usize {
        self.snapshots.len()
    }

    fn restriction(wall: &Wall, kind: QueryKind) -> WallSense {
        match kind {
            QueryKind::Sound => wall.sound,
            _ => wall.sense,
        }
    }

    fn blocks(wall: &Wall, data: &SnapshotData, kind: QueryKind, query: &VisibilityQuery) -> bool {
        if Self::restriction(wall, kind) == WallSense::None {
            return false;
        }
        if wall.is_open_door() {
            return false;
        }
        if data.elevation_aware
            && (query.elevation > wall.height.top || query.elevation < wall.height.bottom)
        {
            return false;
        }
        if let Some(tile) = wall.roof {
            // Walls under an occluded roof stop blocking: the interior is
            // revealed while a token stands beneath the tile.
            if data.occluded.get(&tile).copied().unwrap_or(false) {
                return false;
            }
        }
        match wall.direction {
            WallDirection::Both => true,
            // One-sided walls block only when the origin lies on the solid
            // side of the segment.
            WallDirection::Left => (wall.p2 - wall.p1).perp_dot(query.origin - wall.p1) > 0.0,
            WallDirection::Right => (wall.p2 - wall.p1).perp_dot(query.origin - wall.p1) < 0.0,
        }
    }

    /// March one ray against the blocking set. Returns the distance to the
    /// first effective hit (a normal wall, or the second limited wall) and
    /// whether the ray terminated on a wall at all.
    fn cast(origin: DVec2, dir: DVec2, max_t: f64, walls: &[(&Wall, bool)]) -> (f64, bool) {
        let mut hits: Vec<(f64, bool)> = Vec::new();
        for (wall, limited) in walls {
            let span = wall.p2 - wall.p1;
            let denom = dir.perp_dot(span);
            if denom.abs() < EPS {
                continue;
            }
            let ao = wall.p1 - origin;
            let t = ao.perp_dot(span) / denom;
            let s = ao.perp_dot(dir) / denom;
            if t > EPS && t <= max_t && (0.0..=1.0).contains(&s) {
                hits.push((t, *limited));
            }
        }
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        let mut limited_seen = 0;
        for (t, limited) in hits {
            if limited {
                limited_seen += 1;
                if limited_seen < 2 {
                    continue;
                }
            }
            return (t, true);
        }
        (max_t, false)
    }

    fn validate(query: &VisibilityQuery) -> Result<(), KernelError> {
        if !query.origin.is_finite() {
            return Err(KernelError::DegenerateGeometry("non-finite origin".into()));
        }
        if query.radius < 0.0 || !query.radius.is_finite() {
            return Err(KernelError::InvalidParameter {
                name: "radius",
                value: query.radius,
            });
        }
        if query.density <= 0.0 || !query.density.is_finite() {
            return Err(KernelError::InvalidParameter {
                name: "density",
                value: query.density,
            });
        }
        if query.distance <= 0.0 || !query.distance.is_finite() {
            return Err(KernelError::InvalidParameter {
                name: "distance",
                value: query.distance,
            });
        }
        Ok(())
    }
}

impl Default for ReferenceKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl VisibilityKernel for ReferenceKernel {
    fn build_snapshot(
        &mut self,
        walls: &[Wall],
        tiles: &[Tile],
        elevation_aware: bool,
    ) -> Result<SnapshotId, KernelError> {
        for wall in walls {
            if !wall.p1.is_finite() || !wall.p2.is_finite() {
                return Err(KernelError::DegenerateGeometry(format!(
                    "wall {:?} has non-finite endpoints",
                    wall.id
                )));
            }
            if (wall.p2 - wall.p1).length_squared() < EPS {
                return Err(KernelError::DegenerateGeometry(format!(
                    "wall {:?} has zero length",
                    wall.id
                )));
            }
        }
        let occluded = tiles
            .iter()
            .filter(|t| t.occlusion == OcclusionMode::Roof)
            .map(|t| (t.id, t.occluded))
            .collect();
        let id = self.next_id;
        self.next_id += 1;
        self.snapshots.insert(
            id,
            SnapshotData {
                walls: walls.to_vec(),
                occluded,
                elevation_aware,
            },
        );
        tracing::debug!(id, walls = walls.len(), tiles = tiles.len(), "built snapshot");
        Ok(SnapshotId(id))
    }

    fn free_snapshot(&mut self, id: SnapshotId) {
        if self.snapshots.remove(&id.0).is_some() {
            tracing::debug!(id = id.0, "freed snapshot");
        }
    }

    fn set_tile_occlusion(
        &mut self,
        id: SnapshotId,
        tile: TileId,
        occluded: bool,
    ) -> Result<(), KernelError> {
        let data = self
            .snapshots
            .get_mut(&id.0)
            .ok_or(KernelError::UnknownSnapshot(id))?;
        data.occluded.insert(tile, occluded);
        tracing::trace!(id = id.0, ?tile, occluded, "patched tile occlusion");
        Ok(())
    }

    fn compute(
        &self,
        snapshot: Option<SnapshotId>,
        kind: QueryKind,
        query: &VisibilityQuery,
    ) -> Result<VisibilityOutput, KernelError> {
        Self::validate(query)?;
        let permissive;
        let data = match snapshot {
            Some(id) => self
                .snapshots
                .get(&id.0)
                .ok_or(KernelError::UnknownSnapshot(id))?,
            None => {
                permissive = SnapshotData::empty();
                &permissive
            }
        };

        let blocking: Vec<(&Wall, bool)> = data
            .walls
            .iter()
            .filter(|w| Self::blocks(w, data, kind, query))
            .map(|w| (w, Self::restriction(w, kind) == WallSense::Limited))
            .collect();

        let mut trace = query.debug.then(DebugTrace::default);

        // Full-circle sweep: one ray per `density` degrees.
        let steps = (360.0 / query.density).ceil().max(1.0) as usize;
        let mut sweep = Vec::with_capacity(steps);
        for k in 0..steps {
            let theta = k as f64 * TAU / steps as f64;
            let dir = DVec2::new(theta.cos(), theta.sin());
            let (t, hit_wall) = Self::cast(query.origin, dir, query.distance, &blocking);
            sweep.push((dir, t));
            if let Some(trace) = trace.as_mut() {
                trace.endpoints.push(TracedEndpoint {
                    point: query.origin + dir * t,
                    angle: theta,
                    is_intersection: hit_wall,
                });
            }
        }
        let los = Polygon::from_pairs(sweep.iter().map(|(dir, t)| query.origin + *dir * *t));

        // Field of view: line of sight clamped to the radius, and to the
        // vision cone when one is in effect. Angles outside (0, 360) mean an
        // unconstrained cone.
        let fov = if query.angle >= 360.0 || query.angle <= 0.0 {
            Polygon::from_pairs(
                sweep
                    .iter()
                    .map(|(dir, t)| query.origin + *dir * t.min(query.radius)),
            )
        } else {
            // Pie slice anchored at the origin. Rotation 0 faces +y.
            let center = (query.rotation + 90.0).to_radians();
            let start = center - query.angle.to_radians() / 2.0;
            let cone_steps = (query.angle / query.density).ceil().max(1.0) as usize;
            let mut pts = vec![query.origin];
            for k in 0..=cone_steps {
                let theta = start + k as f64 * query.angle.to_radians() / cone_steps as f64;
                let dir = DVec2::new(theta.cos(), theta.sin());
                let (t, _) = Self::cast(query.origin, dir, query.distance, &blocking);
                pts.push(query.origin + dir * t.min(query.radius));
            }
            Polygon::from_pairs(pts)
        };

        Ok(VisibilityOutput { los, fov, trace })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sightline_common::{DoorKind, DoorState, WallHeight};

    fn query(origin: DVec2, radius: f64) -> VisibilityQuery {
        VisibilityQuery {
            origin,
            radius,
            distance: 1000.0,
            ..VisibilityQuery::default()
        }
    }

    /// Closed triangle around (300, 200).
    fn triangle() -> Vec<Wall> {
        let a = DVec2::new(100.0, 100.0);
        let b = DVec2::new(500.0, 100.0);
        let c = DVec2::new(300.0, 400.0);
        vec![Wall::new(a, b), Wall::new(b, c), Wall::new(c, a)]
    }

    #[test]
    fn restricted_area_not_larger_than_unrestricted() {
        let mut kernel = ReferenceKernel::new();
        let id = kernel.build_snapshot(&triangle(), &[], false).unwrap();
        let q = query(DVec2::new(300.0, 200.0), 100.0);

        let restricted = kernel.compute(Some(id), QueryKind::Sight, &q).unwrap();
        let unrestricted = kernel.compute(None, QueryKind::Sight, &q).unwrap();
        assert!(restricted.los.area() <= unrestricted.los.area());
        assert!(restricted.los.area() > 0.0);
    }

    #[test]
    fn identical_queries_yield_identical_polygons() {
        let mut kernel = ReferenceKernel::new();
        let id = kernel.build_snapshot(&triangle(), &[], false).unwrap();
        let q = query(DVec2::new(300.0, 200.0), 100.0);

        let a = kernel.compute(Some(id), QueryKind::Sight, &q).unwrap();
        let b = kernel.compute(Some(id), QueryKind::Sight, &q).unwrap();
        assert_eq!(a.los, b.los);
        assert_eq!(a.fov, b.fov);
    }

    #[test]
    fn open_door_does_not_block() {
        let mut kernel = ReferenceKernel::new();
        let mut door = Wall::new(DVec2::new(100.0, 100.0), DVec2::new(500.0, 100.0));
        door.door = DoorKind::Door;
        let q = query(DVec2::new(300.0, 200.0), 100.0);

        let closed = kernel.build_snapshot(std::slice::from_ref(&door), &[], false).unwrap();
        let blocked = kernel.compute(Some(closed), QueryKind::Sight, &q).unwrap();

        door.door_state = DoorState::Open;
        let open = kernel.build_snapshot(&[door], &[], false).unwrap();
        let unblocked = kernel.compute(Some(open), QueryKind::Sight, &q).unwrap();
        assert!(blocked.los.area() < unblocked.los.area());
    }

    #[test]
    fn sense_category_selected_by_query_kind() {
        let mut kernel = ReferenceKernel::new();
        let mut wall = Wall::new(DVec2::new(100.0, 100.0), DVec2::new(500.0, 100.0));
        wall.sense = WallSense::None;
        wall.sound = WallSense::Normal;
        let id = kernel.build_snapshot(&[wall], &[], false).unwrap();
        let q = query(DVec2::new(300.0, 200.0), 100.0);

        let sight = kernel.compute(Some(id), QueryKind::Sight, &q).unwrap();
        let sound = kernel.compute(Some(id), QueryKind::Sound, &q).unwrap();
        assert!(sound.los.area() < sight.los.area());
    }

    #[test]
    fn single_limited_wall_is_transparent() {
        let mut kernel = ReferenceKernel::new();
        let mut wall = Wall::new(DVec2::new(200.0, 50.0), DVec2::new(200.0, 350.0));
        wall.sense = WallSense::Limited;
        let id = kernel.build_snapshot(&[wall], &[], false).unwrap();
        let q = query(DVec2::new(100.0, 200.0), 100.0);

        let one = kernel.compute(Some(id), QueryKind::Sight, &q).unwrap();
        let none = kernel.compute(None, QueryKind::Sight, &q).unwrap();
        assert_eq!(one.los.area(), none.los.area());
    }

    #[test]
    fn second_limited_wall_blocks() {
        let mut kernel = ReferenceKernel::new();
        let mut near = Wall::new(DVec2::new(200.0, 50.0), DVec2::new(200.0, 350.0));
        near.sense = WallSense::Limited;
        let mut far = Wall::new(DVec2::new(250.0, 50.0), DVec2::new(250.0, 350.0));
        far.sense = WallSense::Limited;
        let q = query(DVec2::new(100.0, 200.0), 100.0);

        let one = kernel.build_snapshot(std::slice::from_ref(&near), &[], false).unwrap();
        let two = kernel.build_snapshot(&[near, far], &[], false).unwrap();
        let single = kernel.compute(Some(one), QueryKind::Sight, &q).unwrap();
        let double = kernel.compute(Some(two), QueryKind::Sight, &q).unwrap();
        assert!(double.los.area() < single.los.area());
    }

    #[test]
    fn elevation_band_respected_when_aware() {
        let mut kernel = ReferenceKernel::new();
        let mut wall = Wall::new(DVec2::new(100.0, 100.0), DVec2::new(500.0, 100.0));
        wall.height = WallHeight {
            top: 10.0,
            bottom: 0.0,
        };
        let id = kernel.build_snapshot(&[wall], &[], true).unwrap();

        let mut low = query(DVec2::new(300.0, 200.0), 100.0);
        low.elevation = 5.0;
        let mut high = low;
        high.elevation = 20.0;

        let blocked = kernel.compute(Some(id), QueryKind::Sight, &low).unwrap();
        let above = kernel.compute(Some(id), QueryKind::Sight, &high).unwrap();
        assert!(blocked.los.area() < above.los.area());
    }

    #[test]
    fn elevation_band_ignored_when_unaware() {
        let mut kernel = ReferenceKernel::new();
        let mut wall = Wall::new(DVec2::new(100.0, 100.0), DVec2::new(500.0, 100.0));
        wall.height = WallHeight {
            top: 10.0,
            bottom: 0.0,
        };
        let id = kernel.build_snapshot(&[wall], &[], false).unwrap();
        let mut q = query(DVec2::new(300.0, 200.0), 100.0);
        q.elevation = 20.0;

        let out = kernel.compute(Some(id), QueryKind::Sight, &q).unwrap();
        let free = kernel.compute(None, QueryKind::Sight, &q).unwrap();
        assert!(out.los.area() < free.los.area());
    }

    #[test]
    fn occluded_roof_reveals_interior() {
        let mut kernel = ReferenceKernel::new();
        let tile = Tile::new(OcclusionMode::Roof);
        let mut wall = Wall::new(DVec2::new(100.0, 100.0), DVec2::new(500.0, 100.0));
        wall.roof = Some(tile.id);
        let id = kernel
            .build_snapshot(&[wall], std::slice::from_ref(&tile), false)
            .unwrap();
        let q = query(DVec2::new(300.0, 200.0), 100.0);

        let blocked = kernel.compute(Some(id), QueryKind::Sight, &q).unwrap();
        kernel.set_tile_occlusion(id, tile.id, true).unwrap();
        let revealed = kernel.compute(Some(id), QueryKind::Sight, &q).unwrap();
        assert!(blocked.los.area() < revealed.los.area());
    }

    #[test]
    fn one_sided_wall_transparent_from_open_side() {
        let mut kernel = ReferenceKernel::new();
        let mut wall = Wall::new(DVec2::new(200.0, 50.0), DVec2::new(200.0, 350.0));
        wall.direction = WallDirection::Left;
        let id = kernel.build_snapshot(&[wall], &[], false).unwrap();

        let west = kernel
            .compute(Some(id), QueryKind::Sight, &query(DVec2::new(100.0, 200.0), 100.0))
            .unwrap();
        let east = kernel
            .compute(Some(id), QueryKind::Sight, &query(DVec2::new(300.0, 200.0), 100.0))
            .unwrap();
        // The wall faces west: the western origin is blocked, the eastern
        // one sees through.
        assert!(west.los.area() < east.los.area());
    }

    #[test]
    fn cone_fov_smaller_than_full_circle() {
        let kernel = ReferenceKernel::new();
        let mut narrow = query(DVec2::new(300.0, 200.0), 100.0);
        narrow.angle = 90.0;
        let full = query(DVec2::new(300.0, 200.0), 100.0);

        let cone = kernel.compute(None, QueryKind::Sight, &narrow).unwrap();
        let circle = kernel.compute(None, QueryKind::Sight, &full).unwrap();
        assert!(cone.fov.area() < circle.fov.area());
        assert!(cone.fov.area() <= cone.los.area());
    }

    #[test]
    fn debug_trace_only_when_requested() {
        let mut kernel = ReferenceKernel::new();
        let id = kernel.build_snapshot(&triangle(), &[], false).unwrap();
        let mut q = query(DVec2::new(300.0, 200.0), 100.0);

        let silent = kernel.compute(Some(id), QueryKind::Sight, &q).unwrap();
        assert!(silent.trace.is_none());

        q.debug = true;
        let traced = kernel.compute(Some(id), QueryKind::Sight, &q).unwrap();
        let trace = traced.trace.unwrap();
        assert_eq!(trace.endpoints.len(), 60);
        assert!(trace.endpoints.iter().any(|e| e.is_intersection));
    }

    #[test]
    fn invalid_parameters_rejected() {
        let kernel = ReferenceKernel::new();
        let mut q = query(DVec2::new(0.0, 0.0), 100.0);
        q.density = 0.0;
        assert!(matches!(
            kernel.compute(None, QueryKind::Sight, &q),
            Err(KernelError::InvalidParameter { name: "density", .. })
        ));

        let mut q = query(DVec2::new(0.0, 0.0), 100.0);
        q.distance = 0.0;
        assert!(matches!(
            kernel.compute(None, QueryKind::Sight, &q),
            Err(KernelError::InvalidParameter { name: "distance", .. })
        ));
    }

    #[test]
    fn zero_length_wall_is_degenerate() {
        let mut kernel = ReferenceKernel::new();
        let wall = Wall::new(DVec2::new(100.0, 100.0), DVec2::new(100.0, 100.0));
        assert!(matches!(
            kernel.build_snapshot(&[wall], &[], false),
            Err(KernelError::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn unknown_snapshot_rejected_and_free_idempotent() {
        let mut kernel = ReferenceKernel::new();
        let id = kernel.build_snapshot(&[], &[], false).unwrap();
        kernel.free_snapshot(id);
        kernel.free_snapshot(id);
        assert_eq!(kernel.live_snapshots(), 0);
        assert!(matches!(
            kernel.compute(Some(id), QueryKind::Sight, &query(DVec2::ZERO, 10.0)),
            Err(KernelError::UnknownSnapshot(_))
        ));
    }
}
