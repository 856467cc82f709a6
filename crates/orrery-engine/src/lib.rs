//! Orrery Engine -- fixed-timestep host for the Orrery physics kernel.
//!
//! This crate builds on [`orrery_core`] to provide the simulation driver: a
//! tick loop that owns the body collection, applies recorded input, steps the
//! kernel with a fixed time delta, advances rotation, and records what
//! happened as events. On top of it sit BLAKE3-hashed snapshots, deterministic
//! replay, and seeded scene construction.
//!
//! # Quick Start
//!
//! ```
//! use orrery_engine::prelude::*;
//!
//! let scene = Scene::orbit_pair(SimConfig::default());
//! let mut tick_loop = scene.into_tick_loop().unwrap();
//!
//! tick_loop.run_ticks(100);
//! assert_eq!(tick_loop.tick_count(), 100);
//! assert_eq!(tick_loop.bodies().len(), 2);
//! ```

#![deny(unsafe_code)]

pub mod events;
pub mod replay;
pub mod scene;
pub mod snapshot;
pub mod tick;

/// Re-export the kernel crate for convenience.
pub use orrery_core;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while loading or validating a scene.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The scene document could not be parsed.
    #[error("failed to parse scene: {0}")]
    Parse(#[from] serde_json::Error),

    /// A body or the kernel configuration failed validation.
    #[error("invalid scene: {0}")]
    Physics(#[from] orrery_core::PhysicsError),

    /// The scene's tick length is zero, negative or not finite.
    #[error("fixed_dt must be positive and finite, got {0}")]
    InvalidFixedDt(f64),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    // Re-export everything from the kernel prelude.
    pub use orrery_core::prelude::*;

    pub use crate::events::{EventLog, SimEvent};
    pub use crate::replay::{
        replay, ReplayDivergence, ReplayEntry, ReplayLog, ReplayRecorder, ReplayResult,
    };
    pub use crate::scene::Scene;
    pub use crate::snapshot::SimulationSnapshot;
    pub use crate::tick::{Impulse, InputFrame, TickConfig, TickDiagnostics, TickLoop};
    pub use crate::EngineError;
}
