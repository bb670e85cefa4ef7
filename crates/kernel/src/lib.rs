//! Visibility kernel boundary: the call contract the cache layer builds
//! against, a reproduction-capture format for offline bug reports, and a
//! small deterministic reference kernel for tests and replay.
//!
//! # Invariants
//! - Identical snapshot handle plus identical numeric parameters always
//!   yields identical output polygons.
//! - Snapshot handles are opaque; only the cache layer holds them.
//! - The reference kernel is not the production algorithm; it exists so the
//!   surrounding layers can be exercised without the real kernel.

mod contract;
mod reference;
mod repro;

pub use contract::{
    DebugTrace, KernelError, QueryKind, SnapshotId, TracedEndpoint, VisibilityKernel,
    VisibilityOutput, VisibilityQuery,
};
pub use reference::ReferenceKernel;
pub use repro::{ReproCapture, ReproError, TestScene, VisionActor};

pub fn crate_info() -> &'static str {
    "sightline-kernel v0.1.0"
}
