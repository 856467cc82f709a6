//! Orrery Core -- a small 2D physics kernel for real-time simulation loops.
//!
//! The kernel advances a collection of [`Body`](body::Body) values by one
//! tick: every physical body first resolves its collisions against the rest
//! of the collection, then accumulates inverse-square gravitation from the
//! other massive bodies, then integrates its motion. Each stage only runs for
//! bodies that carry the matching [`Capabilities`](body::Capabilities) flag.
//!
//! # Quick Start
//!
//! ```
//! use orrery_core::prelude::*;
//!
//! let config = SimConfig::default();
//! let mut bodies = vec![
//!     physical(Body::at(Vector2::ZERO).with_inner_radius(1.0), PhysicalSettings::with_mass(1000.0)),
//!     physical(Body::at(Vector2::new(10.0, 0.0)).with_inner_radius(0.5), PhysicalSettings::with_mass(1.0)),
//! ];
//!
//! let report = step(&mut bodies, 0.01, &config);
//! assert_eq!(report.bodies_moved, 2);
//! assert!(bodies[1].position.x < 10.0); // pulled toward the heavy body
//! ```
//!
//! # Ordering
//!
//! Bodies are processed in collection order and mutated in place. A body
//! evaluated later in the tick observes the already-resolved state of bodies
//! evaluated earlier; there is no double buffering.

#![deny(unsafe_code)]

pub mod body;
pub mod collision;
pub mod config;
pub mod gravity;
pub mod motion;
pub mod step;
pub mod vector;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced at the validating boundaries of the kernel.
///
/// The per-tick operations themselves never fail: skipped pairs and
/// degenerate geometry are reported through return values instead.
#[derive(Debug, thiserror::Error)]
pub enum PhysicsError {
    /// The time delta passed to a validating step was negative or not finite.
    #[error("time delta must be finite and non-negative, got {dt}")]
    InvalidTimeDelta {
        dt: f64,
    },

    /// A configuration value is out of range.
    #[error("config field '{field}' has invalid value {value}")]
    InvalidConfig {
        field: &'static str,
        value: f64,
    },

    /// A body in the collection failed validation.
    #[error("body {index} is invalid: {reason}")]
    InvalidBody {
        index: usize,
        reason: String,
    },

    /// A configuration document could not be parsed.
    #[error("failed to parse config: {0}")]
    Config(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::body::{physical, Body, Capabilities, PhysicalSettings};
    pub use crate::collision::{
        check_bounding_box_overlap, check_radius_overlap, collide, collide_bounce,
        collide_damage, collide_pushback, damage_amount, detect, BounceOutcome, BounceSkip,
        CollideReport, DamageEvent, DamageHandler, NoDamage, Pushback, RadiusOverlap, Side,
    };
    pub use crate::config::SimConfig;
    pub use crate::gravity::{
        circular_orbit_velocity, gravitate, gravitate_one, gravity_force_magnitude,
        orbital_velocity,
    };
    pub use crate::motion::{integrate, rotate, POSITION_STEP_FRACTION};
    pub use crate::step::{step, step_with_handler, try_step, Contact, StepReport};
    pub use crate::vector::{Coords, Turn, Vector2};
    pub use crate::PhysicsError;
}
