//! The body record and its capability flags.
//!
//! A [`Body`] always carries every field the kernel can touch. Which stages
//! of the step actually run for it is decided by its [`Capabilities`]: a body
//! can be moved, collided, gravitating, rotating, or any combination, and a
//! body with no capabilities is still visible to the others as a collision
//! and gravity candidate.

use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::vector::{nonfinite, Vector2};
use crate::PhysicsError;

bitflags::bitflags! {
    /// Behaviours a body opts into.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Capabilities: u8 {
        /// Integrated by the motion stage.
        const MOVE = 0x01;
        /// Resolves its own contacts in the collision stage.
        const COLLIDE = 0x02;
        /// Accumulates gravity from other massive bodies.
        const GRAVITATE = 0x04;
        /// Carries rotational state advanced by [`rotate`](crate::motion::rotate).
        const ROTATE = 0x08;
        /// Reports collision damage through a [`DamageHandler`](crate::collision::DamageHandler).
        const DAMAGE = 0x10;

        /// Everything [`physical`] attaches.
        const PHYSICAL = Self::MOVE.bits()
            | Self::COLLIDE.bits()
            | Self::GRAVITATE.bits()
            | Self::ROTATE.bits();
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Capabilities::empty()
    }
}

/// One simulated point/disc entity.
///
/// Deserializing fills missing fields from [`Body::default`], so scene files
/// only need to name what differs. Vector and scalar fields are written through
/// [`nonfinite`], so a non-physical body survives a JSON round trip.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Body {
    /// Current location. Written by pushback and the motion stage.
    #[serde(with = "nonfinite")]
    pub position: Vector2,
    /// Position before the most recent integration.
    #[serde(with = "nonfinite")]
    pub last_position: Vector2,
    #[serde(with = "nonfinite")]
    pub velocity: Vector2,
    /// Zero at the start of every tick.
    #[serde(with = "nonfinite")]
    pub acceleration: Vector2,
    /// Force accumulator. Zero at the start of every tick.
    #[serde(with = "nonfinite")]
    pub force: Vector2,
    /// Non-negative. Zero means the body neither feels nor emits gravity
    /// and is not moved by force.
    #[serde(with = "nonfinite::scalar")]
    pub mass: f64,
    /// Solid radius used by the narrow-phase test.
    #[serde(with = "nonfinite::scalar")]
    pub inner_radius: f64,
    /// Half-extent of the broad-phase box. Falls back to `inner_radius`.
    pub outer_radius: Option<f64>,
    /// Indices of the bodies this one overlapped when it last resolved its
    /// collisions. Indices refer to the collection passed to the step.
    pub colliding: Vec<usize>,
    pub is_colliding: bool,
    #[serde(with = "nonfinite::scalar")]
    pub rotation: f64,
    #[serde(with = "nonfinite::scalar")]
    pub angular_velocity: f64,
    #[serde(with = "nonfinite::scalar")]
    pub torque: f64,
    #[serde(with = "nonfinite::scalar")]
    pub moment_of_inertia: f64,
    #[serde(with = "nonfinite::scalar")]
    pub inverse_moment_of_inertia: f64,
    /// Per-body gravitational constant; `None` uses [`SimConfig::big_g`].
    pub big_g: Option<f64>,
    pub capabilities: Capabilities,
}

impl Body {
    /// A stationary, massless body with no capabilities at `position`.
    pub fn at(position: Vector2) -> Self {
        Self {
            position,
            last_position: position,
            ..Default::default()
        }
    }

    pub fn with_velocity(mut self, velocity: Vector2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_inner_radius(mut self, radius: f64) -> Self {
        self.inner_radius = radius;
        self
    }

    pub fn with_outer_radius(mut self, radius: f64) -> Self {
        self.outer_radius = Some(radius);
        self
    }

    pub fn with_big_g(mut self, big_g: f64) -> Self {
        self.big_g = Some(big_g);
        self
    }

    pub fn with_angular_velocity(mut self, angular_velocity: f64) -> Self {
        self.angular_velocity = angular_velocity;
        self.capabilities |= Capabilities::ROTATE;
        self
    }

    /// Add capabilities on top of the ones already present.
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities |= capabilities;
        self
    }

    /// Opt into collision damage reporting.
    pub fn with_damage(self) -> Self {
        self.with_capabilities(Capabilities::DAMAGE)
    }

    // -- predicates ---------------------------------------------------------

    /// A body is physical when both its position and velocity are finite.
    /// Non-physical bodies are skipped by every stage, both as the body
    /// being evaluated and as a candidate.
    #[inline]
    pub fn is_physical(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite()
    }

    #[inline]
    pub fn can_move(&self) -> bool {
        self.capabilities.contains(Capabilities::MOVE)
    }

    #[inline]
    pub fn can_collide(&self) -> bool {
        self.capabilities.contains(Capabilities::COLLIDE)
    }

    #[inline]
    pub fn can_gravitate(&self) -> bool {
        self.capabilities.contains(Capabilities::GRAVITATE)
    }

    #[inline]
    pub fn can_rotate(&self) -> bool {
        self.capabilities.contains(Capabilities::ROTATE)
    }

    #[inline]
    pub fn takes_damage(&self) -> bool {
        self.capabilities.contains(Capabilities::DAMAGE)
    }

    // -- derived values -----------------------------------------------------

    /// Half-extent of the broad-phase box: the outer radius when it is set
    /// and positive, otherwise the inner radius.
    #[inline]
    pub fn half_extent(&self) -> f64 {
        match self.outer_radius {
            Some(r) if r > 0.0 => r,
            _ => self.inner_radius,
        }
    }

    /// The gravitational constant this body uses for its own pull.
    #[inline]
    pub fn effective_big_g(&self, config: &SimConfig) -> f64 {
        self.big_g.unwrap_or(config.big_g)
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.length_squared()
    }

    pub fn momentum(&self) -> Vector2 {
        self.velocity * self.mass
    }

    /// Check the scalar fields a step relies on.
    ///
    /// Position and velocity are not checked here: a non-finite vector makes
    /// the body non-physical, which the step already handles by skipping it.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidBody`] carrying `index` and the reason.
    pub fn validate(&self, index: usize) -> Result<(), PhysicsError> {
        let invalid = |reason: String| PhysicsError::InvalidBody { index, reason };

        if !self.mass.is_finite() || self.mass < 0.0 {
            return Err(invalid(format!(
                "mass must be finite and non-negative, got {}",
                self.mass
            )));
        }
        if !self.inner_radius.is_finite() || self.inner_radius < 0.0 {
            return Err(invalid(format!(
                "inner_radius must be finite and non-negative, got {}",
                self.inner_radius
            )));
        }
        if let Some(r) = self.outer_radius {
            if !r.is_finite() || r < 0.0 {
                return Err(invalid(format!(
                    "outer_radius must be finite and non-negative, got {r}"
                )));
            }
        }
        if let Some(g) = self.big_g {
            if !g.is_finite() {
                return Err(invalid(format!("big_g override must be finite, got {g}")));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Capability attachment
// ---------------------------------------------------------------------------

/// Settings applied by [`physical`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalSettings {
    pub mass: f64,
    /// Overrides [`SimConfig::big_g`] for this body's gravity.
    pub big_g: Option<f64>,
}

impl Default for PhysicalSettings {
    fn default() -> Self {
        Self {
            mass: 1.0,
            big_g: None,
        }
    }
}

impl PhysicalSettings {
    pub fn with_mass(mass: f64) -> Self {
        Self {
            mass,
            ..Default::default()
        }
    }
}

/// Attach move, collide, gravitate and rotate behaviour to `body`.
///
/// Sets the mass and gravitational override from `settings`, zeroes the
/// force and acceleration accumulators and the rotational state, and empties
/// the contact list. Position and velocity are kept. Attaching twice is
/// last-write-wins.
pub fn physical(mut body: Body, settings: PhysicalSettings) -> Body {
    body.mass = settings.mass;
    body.big_g = settings.big_g;
    body.capabilities |= Capabilities::PHYSICAL;

    body.last_position = body.position;
    body.force = Vector2::ZERO;
    body.acceleration = Vector2::ZERO;

    body.colliding.clear();
    body.is_colliding = false;

    body.rotation = 0.0;
    body.angular_velocity = 0.0;
    body.torque = 0.0;
    body.moment_of_inertia = 0.0;
    body.inverse_moment_of_inertia = 0.0;

    body
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
