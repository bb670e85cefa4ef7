use crate::pool::CoherentTextureBuffer;
use crate::texture::{FogTexture, TextureDescriptor};
use glam::DVec2;
use sightline_common::SceneDimensions;
use std::time::{Duration, Instant};

/// Save delay matching the host's fog commit cadence.
pub const DEFAULT_SAVE_DELAY: Duration = Duration::from_secs(3);

/// Observable phase of the bake/save pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FogState {
    Idle,
    Baking,
    Swapped,
    PendingSave,
}

/// Errors from the bake/save pipeline.
#[derive(Debug, thiserror::Error)]
pub enum FogError {
    #[error("bake render failed: {0}")]
    Bake(String),
    #[error("save failed: {0}")]
    Save(String),
}

/// Renders the full accumulated-vision geometry into a staging texture.
///
/// Implemented by the host's GPU pipeline. The render covers the entire
/// world area translated by `offset`, bypassing any viewport clip.
pub trait FogBakeRenderer {
    fn bake(&mut self, target: &mut FogTexture, offset: DVec2) -> Result<(), FogError>;
}

/// The host's generic asset-save mechanism. Wire format is its concern; this
/// core only decides when to hand the texture over.
pub trait FogSaveSink {
    fn save(&mut self, texture: &FogTexture) -> Result<(), FogError>;
}

/// Debounce timer for the persisted-fog save. A newly armed deadline
/// supersedes a pending one; an in-flight save is never interrupted.
#[derive(Debug)]
struct SaveDebouncer {
    delay: Duration,
    deadline: Option<Instant>,
    in_flight: bool,
}

impl SaveDebouncer {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
            in_flight: false,
        }
    }

    fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    fn due(&self, now: Instant) -> bool {
        !self.in_flight && self.deadline.is_some_and(|d| now >= d)
    }
}

/// Orchestrates bake-render → atomic swap → debounced save of the persisted
/// fog-of-war texture.
///
/// Owned by the rendering subsystem, constructed at session start and torn
/// down at session end; nothing here is ambient module state.
pub struct FogPersistenceController {
    persisted: FogTexture,
    /// Per-client vision sub-renders awaiting the next bake.
    pending: Vec<FogTexture>,
    pool: CoherentTextureBuffer,
    state: FogState,
    /// Vision contributions accumulated since the last commit.
    accumulated: u64,
    fog_updated: bool,
    debounce: SaveDebouncer,
    saves_started: u64,
}

impl Default for FogPersistenceController {
    fn default() -> Self {
        Self::new(DEFAULT_SAVE_DELAY)
    }
}

impl FogPersistenceController {
    pub fn new(save_delay: Duration) -> Self {
        Self {
            persisted: FogTexture::empty(),
            pending: Vec::new(),
            pool: CoherentTextureBuffer::new(),
            state: FogState::Idle,
            accumulated: 0,
            fog_updated: false,
            debounce: SaveDebouncer::new(save_delay),
            saves_started: 0,
        }
    }

    pub fn state(&self) -> FogState {
        self.state
    }

    /// The texture currently backing the rendered fog sprite.
    pub fn persisted(&self) -> &FogTexture {
        &self.persisted
    }

    /// Host-side access for disposal scenarios (scene teardown races).
    pub fn persisted_mut(&mut self) -> &mut FogTexture {
        &mut self.persisted
    }

    pub fn pool(&self) -> &CoherentTextureBuffer {
        &self.pool
    }

    pub fn saves_started(&self) -> u64 {
        self.saves_started
    }

    /// Record one per-client vision sub-render awaiting the next bake.
    pub fn add_contribution(&mut self, texture: FogTexture) {
        self.pending.push(texture);
        self.accumulated += 1;
    }

    pub fn has_unbaked(&self) -> bool {
        self.accumulated > 0
    }

    /// Bake accumulated vision into the persisted texture and schedule a
    /// debounced save.
    ///
    /// On bake failure the previous persisted texture remains authoritative:
    /// nothing is swapped and nothing is destroyed; the staging target goes
    /// back to the pool.
    pub fn commit(
        &mut self,
        now: Instant,
        renderer: &mut dyn FogBakeRenderer,
        dims: &SceneDimensions,
    ) -> Result<(), FogError> {
        tracing::debug!("committing fog exploration to render texture");
        self.accumulated = 0;

        // Protect against an invalid or disposed persisted texture.
        if !self.persisted.is_valid() {
            self.persisted = FogTexture::empty();
        }

        self.state = FogState::Baking;
        let desc = TextureDescriptor::for_scene(dims);
        let mut staging = self.pool.acquire(desc);
        let offset = DVec2::new(-dims.padding_x, -dims.padding_y);
        if let Err(e) = renderer.bake(&mut staging, offset) {
            self.pool.release(staging);
            self.state = if self.debounce.is_armed() || self.debounce.in_flight {
                FogState::PendingSave
            } else {
                FogState::Idle
            };
            return Err(e);
        }

        // Single reference assignment: observers on this scheduler never see
        // a half-updated swap.
        self.state = FogState::Swapped;
        let previous = std::mem::replace(&mut self.persisted, staging);
        self.pool.release(previous);

        // The sub-renders are absorbed into the bake. They never enter the
        // single recycle slot, which is reserved for the bake target.
        for contribution in self.pending.drain(..) {
            self.pool.discard(contribution);
        }

        self.fog_updated = true;
        self.debounce.arm(now);
        self.state = FogState::PendingSave;
        Ok(())
    }

    /// Drive the debounced save; called once per scheduler turn. Returns
    /// whether a save was started this turn.
    pub fn pump(&mut self, now: Instant, sink: &mut dyn FogSaveSink) -> Result<bool, FogError> {
        if !self.debounce.due(now) {
            return Ok(false);
        }
        self.debounce.deadline = None;
        self.debounce.in_flight = true;
        self.saves_started += 1;
        tracing::debug!("saving fog exploration");
        if let Err(e) = sink.save(&self.persisted) {
            self.debounce.in_flight = false;
            return Err(e);
        }
        Ok(true)
    }

    /// The host's asynchronous save finished.
    pub fn save_complete(&mut self) {
        self.debounce.in_flight = false;
        if self.debounce.is_armed() {
            // A commit landed while the save ran; the re-armed deadline fires
            // on a later pump.
            self.state = FogState::PendingSave;
        } else {
            self.fog_updated = false;
            self.state = FogState::Idle;
        }
    }
}
