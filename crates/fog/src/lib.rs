//! Fog-of-war persistence: a single-slot texture recycling pool and the
//! bake → swap → debounced-save pipeline.
//!
//! # Invariants
//! - At most one recycled texture exists at any time.
//! - The persisted-texture reference is swapped in a single assignment after
//!   the bake has fully rendered; observers never see an intermediate state.
//! - A failed bake leaves the previously persisted texture untouched.
//! - All mutation happens on the host's single cooperative scheduler; a
//!   multi-threaded port must add a mutex around pool and swap mutation.

mod controller;
mod pool;
mod texture;

pub use controller::{
    DEFAULT_SAVE_DELAY, FogBakeRenderer, FogError, FogPersistenceController, FogSaveSink, FogState,
};
pub use pool::{CoherentTextureBuffer, PoolStats};
pub use texture::{FogTexture, TextureDescriptor, TextureKind};

pub fn crate_info() -> &'static str {
    "sightline-fog v0.1.0"
}
