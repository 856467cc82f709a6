//! Scene description and seeded scene builders.
//!
//! A [`Scene`] is everything needed to start a [`TickLoop`]: the kernel
//! configuration, the tick length and the initial bodies. Scenes load from
//! JSON, where every field may be omitted and falls back to its default, or
//! are built in code by the constructors below. Random scenes draw from a
//! seeded `Pcg64`, so a seed always reproduces the same scene.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

use orrery_core::body::{physical, Body, PhysicalSettings};
use orrery_core::config::SimConfig;
use orrery_core::gravity::circular_orbit_velocity;
use orrery_core::vector::{Turn, Vector2};

use crate::tick::{TickConfig, TickLoop};
use crate::EngineError;

fn default_fixed_dt() -> f64 {
    TickConfig::default().fixed_dt
}

/// Initial conditions for a simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub config: SimConfig,
    #[serde(default = "default_fixed_dt")]
    pub fixed_dt: f64,
    #[serde(default)]
    pub bodies: Vec<Body>,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            config: SimConfig::default(),
            fixed_dt: default_fixed_dt(),
            bodies: Vec::new(),
        }
    }
}

impl Scene {
    /// Parse and validate a scene from JSON.
    ///
    /// # Errors
    ///
    /// [`EngineError::Parse`] for malformed documents, otherwise whatever
    /// [`validate`](Self::validate) reports.
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let scene: Scene = serde_json::from_str(json)?;
        scene.validate()?;
        Ok(scene)
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the tick length, the configuration and every body.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidFixedDt`] or [`EngineError::Physics`] for the
    /// first problem found.
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.fixed_dt > 0.0 && self.fixed_dt.is_finite()) {
            return Err(EngineError::InvalidFixedDt(self.fixed_dt));
        }
        self.config.validate()?;
        for (index, body) in self.bodies.iter().enumerate() {
            body.validate(index)?;
        }
        Ok(())
    }

    /// Validate the scene and start a tick loop on it.
    pub fn into_tick_loop(self) -> Result<TickLoop, EngineError> {
        self.validate()?;
        tracing::debug!(
            bodies = self.bodies.len(),
            fixed_dt = self.fixed_dt,
            "starting tick loop from scene"
        );
        let config = TickConfig {
            fixed_dt: self.fixed_dt,
        };
        Ok(TickLoop::new(self.bodies, self.config, config))
    }

    // -- builders -----------------------------------------------------------

    /// A heavy body at the origin and a light body ten units out on a
    /// circular orbit around it.
    pub fn orbit_pair(config: SimConfig) -> Self {
        let star = physical(
            Body::at(Vector2::ZERO).with_inner_radius(1.0),
            PhysicalSettings::with_mass(1000.0),
        );
        let mut planet = physical(
            Body::at(Vector2::new(10.0, 0.0)).with_inner_radius(0.5),
            PhysicalSettings::with_mass(1.0),
        );
        planet.velocity = circular_orbit_velocity(&planet, &star, Turn::Left, config.big_g);

        Self {
            config,
            fixed_dt: 0.01,
            bodies: vec![star, planet],
        }
    }

    /// Two equal damage-taking discs six units apart, closing at `speed`
    /// each along the x axis.
    pub fn head_on_pair(config: SimConfig, speed: f64) -> Self {
        let disc = |x: f64, vx: f64| {
            physical(
                Body::at(Vector2::new(x, 0.0))
                    .with_inner_radius(1.0)
                    .with_velocity(Vector2::new(vx, 0.0)),
                PhysicalSettings::with_mass(1.0),
            )
            .with_damage()
        };

        Self {
            config,
            fixed_dt: default_fixed_dt(),
            bodies: vec![disc(-3.0, speed), disc(3.0, -speed)],
        }
    }

    /// `count` physical discs scattered uniformly over a square of side
    /// `2 * extent` centred on the origin, with small random velocities.
    pub fn random_cluster(config: SimConfig, seed: u64, count: usize, extent: f64) -> Self {
        let mut rng = Pcg64::seed_from_u64(seed);
        let extent = extent.abs().max(f64::EPSILON);

        let bodies = (0..count)
            .map(|_| {
                let position = Vector2::new(
                    rng.gen_range(-extent..extent),
                    rng.gen_range(-extent..extent),
                );
                let velocity = Vector2::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));
                physical(
                    Body::at(position)
                        .with_velocity(velocity)
                        .with_inner_radius(rng.gen_range(0.25..1.0)),
                    PhysicalSettings::with_mass(rng.gen_range(1.0..20.0)),
                )
            })
            .collect();

        Self {
            config,
            fixed_dt: default_fixed_dt(),
            bodies,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
