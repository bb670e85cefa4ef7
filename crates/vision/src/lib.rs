//! Visibility query entry point: a session-scoped context wiring the wall
//! cache to the kernel, exposed to the host through provider traits.
//!
//! # Invariants
//! - The context is constructed at session start and torn down at session
//!   end; no module-level mutable state.
//! - The host assigns its visibility and occlusion providers once at load
//!   time instead of patching shared behavior in place.
//! - Kernel failures are logged with a reproducible capture before being
//!   re-raised; fatal to the frame, not the process.

mod context;
mod provider;

pub use context::{VisionConfig, VisionContext};
pub use provider::{OcclusionProvider, VisibilityProvider, VisionError, VisionOptions, VisionResult};

pub fn crate_info() -> &'static str {
    "sightline-vision v0.1.0"
}
