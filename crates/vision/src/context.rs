use crate::provider::{
    OcclusionProvider, VisibilityProvider, VisionError, VisionOptions, VisionResult,
};
use glam::DVec2;
use sightline_cache::{CacheDomain, SceneEvent, WallCache};
use sightline_common::{SceneDimensions, Tile, Wall};
use sightline_kernel::{ReproCapture, VisibilityKernel, VisibilityQuery};

/// One-time configuration evaluated at session start.
#[derive(Debug, Clone, Copy, Default)]
pub struct VisionConfig {
    /// Feed wall elevation bounds to the kernel. Evaluated once; changing it
    /// requires a new session.
    pub elevation_aware: bool,
    /// Attach a debug trace to every query for the visualization layer.
    pub debug_capture: bool,
}

/// Session-scoped vision state: the kernel, the wall cache, and the canvas
/// dimensions queries are sized against.
///
/// Owned by the rendering subsystem and passed by reference; constructed at
/// session start and torn down at session end.
pub struct VisionContext {
    kernel: Box<dyn VisibilityKernel>,
    cache: WallCache,
    dims: SceneDimensions,
    debug_capture: bool,
}

impl VisionContext {
    pub fn new(
        kernel: Box<dyn VisibilityKernel>,
        dims: SceneDimensions,
        config: VisionConfig,
    ) -> Self {
        Self {
            kernel,
            cache: WallCache::new(config.elevation_aware),
            dims,
            debug_capture: config.debug_capture,
        }
    }

    pub fn cache(&self) -> &WallCache {
        &self.cache
    }

    pub fn dimensions(&self) -> &SceneDimensions {
        &self.dims
    }

    /// Follow a canvas resize. The accompanying scene-load event takes care
    /// of invalidation.
    pub fn set_dimensions(&mut self, dims: SceneDimensions) {
        self.dims = dims;
    }

    /// Route a host lifecycle event into the cache.
    pub fn handle_event(&mut self, event: &SceneEvent) {
        if let Err(e) = self.cache.apply(self.kernel.as_mut(), event) {
            // A failed patch only means a stale snapshot; drop it and let
            // the next query rebuild.
            tracing::warn!(error = %e, "scene event handling failed; invalidating cache");
            self.cache.invalidate(self.kernel.as_mut());
        }
    }

    /// Free kernel resources at session end.
    pub fn teardown(&mut self) {
        self.cache.teardown(self.kernel.as_mut());
    }
}

impl VisibilityProvider for VisionContext {
    fn compute_vision(
        &mut self,
        walls: &[Wall],
        tiles: &[Tile],
        origin: DVec2,
        elevation: f64,
        radius: f64,
        options: &VisionOptions,
    ) -> Result<VisionResult, VisionError> {
        let distance = self.dims.max_ray_distance(origin, radius);
        let domain = if options.unrestricted {
            CacheDomain::Permissive
        } else {
            CacheDomain::Restricted
        };
        let snapshot = self
            .cache
            .snapshot(self.kernel.as_mut(), domain, walls, tiles)?;

        let query = VisibilityQuery {
            origin,
            elevation,
            radius,
            distance,
            density: options.density,
            angle: options.angle,
            rotation: options.rotation,
            debug: self.debug_capture,
        };

        let capture_walls = if options.unrestricted { &[][..] } else { walls };
        if self.debug_capture {
            if let Ok(json) = ReproCapture::new(options.kind, capture_walls, &query).to_json() {
                tracing::debug!(capture = %json, "visibility query");
            }
        }

        match self.kernel.compute(Some(snapshot), options.kind, &query) {
            Ok(output) => Ok(VisionResult {
                los: output.los,
                fov: output.fov,
                rays: None,
                trace: output.trace,
            }),
            Err(e) => {
                // Log a fully reproducible capture before re-raising; bug
                // reports are expected to include this line verbatim.
                match ReproCapture::new(options.kind, capture_walls, &query).to_json() {
                    Ok(json) => {
                        tracing::error!(error = %e, capture = %json, "visibility computation failed")
                    }
                    Err(ser) => {
                        tracing::error!(error = %e, serialize_error = %ser, "visibility computation failed; capture unavailable")
                    }
                }
                Err(VisionError::Kernel(e))
            }
        }
    }
}

impl OcclusionProvider for VisionContext {
    fn occlusion_changed(&mut self, tile: &Tile, occluded: bool) {
        if let Err(e) = self
            .cache
            .update_occlusion(self.kernel.as_mut(), tile, occluded)
        {
            tracing::warn!(error = %e, "occlusion patch failed; invalidating cache");
            self.cache.invalidate(self.kernel.as_mut());
        }
    }
}
