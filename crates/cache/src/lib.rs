//! Wall cache: kernel-resident geometry snapshots with lazy rebuild and
//! incremental occlusion patching.
//!
//! # Invariants
//! - At most one live snapshot handle per domain.
//! - Invalidation frees the kernel-side resource before dropping the handle.
//! - All mutation happens on the host's single cooperative scheduler; a
//!   multi-threaded port must add a mutex around the handle swap.

mod events;
mod wall_cache;

pub use events::SceneEvent;
pub use wall_cache::{CacheDomain, CacheStats, WallCache};

pub fn crate_info() -> &'static str {
    "sightline-cache v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("cache"));
    }
}
