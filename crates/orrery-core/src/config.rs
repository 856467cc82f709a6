//! Tunable simulation constants.
//!
//! Every stage of the kernel takes a [`SimConfig`] explicitly instead of
//! reading shared globals, so two simulations with different constants can
//! run side by side and tests can vary one constant at a time.

use serde::{Deserialize, Serialize};

use crate::PhysicsError;

/// Default gravitational constant.
pub const DEFAULT_BIG_G: f64 = 5.0;
/// Default velocity multiplier applied to a body that is colliding this tick.
pub const DEFAULT_COLLIDING_VELOCITY_MULTIPLIER: f64 = 0.95;
/// Default fraction of the overlap corrected by pushback in one tick.
pub const DEFAULT_PUSHBACK_MULTIPLIER: f64 = 0.2;
/// Default elasticity applied to the evaluating body after a bounce.
pub const DEFAULT_ELASTICITY: f64 = 0.98;
/// Default distance below which a pair exchanges no gravity.
pub const DEFAULT_MIN_GRAVITY_RADIUS: f64 = 1.0;

/// Constants that shape collision response and gravitation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Gravitational constant used by bodies without their own override.
    pub big_g: f64,
    /// Multiplier applied to a colliding body's velocity after it resolves
    /// all of its contacts for the tick.
    pub colliding_velocity_multiplier: f64,
    /// Fraction of the edge-to-edge overlap removed by pushback per contact.
    pub pushback_multiplier: f64,
    /// Factor applied to the evaluating body's velocity after a bounce.
    pub elasticity: f64,
    /// Pairs closer than this exchange no gravity.
    pub min_gravity_radius: f64,
    /// When true (the default) every detected contact is bounced, including
    /// the second evaluation of a pair that was resolved earlier in the same
    /// tick. When false, a contact whose bodies are already moving apart
    /// along the line of centres is left alone.
    pub bounce_separating: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            big_g: DEFAULT_BIG_G,
            colliding_velocity_multiplier: DEFAULT_COLLIDING_VELOCITY_MULTIPLIER,
            pushback_multiplier: DEFAULT_PUSHBACK_MULTIPLIER,
            elasticity: DEFAULT_ELASTICITY,
            min_gravity_radius: DEFAULT_MIN_GRAVITY_RADIUS,
            bounce_separating: true,
        }
    }
}

impl SimConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::Config`] if the document is not valid JSON for
    /// this type, or [`PhysicsError::InvalidConfig`] if a value is out of
    /// range.
    pub fn from_json_str(json: &str) -> Result<Self, PhysicsError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every constant is finite and non-negative.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidConfig`] naming the first offending
    /// field.
    pub fn validate(&self) -> Result<(), PhysicsError> {
        let fields = [
            ("big_g", self.big_g),
            (
                "colliding_velocity_multiplier",
                self.colliding_velocity_multiplier,
            ),
            ("pushback_multiplier", self.pushback_multiplier),
            ("elasticity", self.elasticity),
            ("min_gravity_radius", self.min_gravity_radius),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(PhysicsError::InvalidConfig { field, value });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
