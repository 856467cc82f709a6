//! Fixed-timestep tick loop for deterministic simulation.
//!
//! The [`TickLoop`] owns the body collection and drives it forward. Each tick:
//!
//! 1. The pending [`InputFrame`] is consumed and its velocity impulses are
//!    applied, in order.
//! 2. The kernel [`step`](orrery_core::step::step_with_handler) runs with the
//!    fixed time delta.
//! 3. Bodies with the `ROTATE` capability advance their rotation angle.
//! 4. Contacts and damage from the step are appended to the event log.
//! 5. The tick counter advances.
//!
//! The kernel processes bodies in collection order with no hidden state, and
//! the loop adds nothing non-deterministic, so the same initial bodies, the
//! same configuration and the same inputs give bit-identical results.
//!
//! # Example
//!
//! ```
//! use orrery_engine::tick::{TickConfig, TickLoop};
//! use orrery_core::prelude::*;
//!
//! let bodies = vec![
//!     physical(Body::at(Vector2::ZERO).with_inner_radius(1.0), PhysicalSettings::with_mass(100.0)),
//!     physical(Body::at(Vector2::new(8.0, 0.0)).with_inner_radius(0.5), PhysicalSettings::default()),
//! ];
//! let config = TickConfig { fixed_dt: 1.0 / 60.0 };
//! let mut tick_loop = TickLoop::new(bodies, SimConfig::default(), config);
//!
//! for _ in 0..10 {
//!     tick_loop.tick();
//! }
//!
//! assert_eq!(tick_loop.tick_count(), 10);
//! assert!(tick_loop.bodies()[1].position.x < 8.0);
//! ```

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use orrery_core::body::Body;
use orrery_core::collision::DamageEvent;
use orrery_core::config::SimConfig;
use orrery_core::motion::rotate;
use orrery_core::step::{step_with_handler, StepReport};
use orrery_core::vector::Vector2;

use crate::events::{EventLog, SimEvent};

// ---------------------------------------------------------------------------
// TickConfig
// ---------------------------------------------------------------------------

/// Configuration for the fixed-timestep tick loop.
///
/// The `fixed_dt` is the duration in seconds of each simulation tick. A value
/// of `1.0 / 60.0` gives 60 ticks per second.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Fixed time step in seconds per tick. Must be positive and finite.
    pub fixed_dt: f64,
}

impl Default for TickConfig {
    /// Defaults to 60 Hz (1/60 second per tick).
    fn default() -> Self {
        Self { fixed_dt: 1.0 / 60.0 }
    }
}

// ---------------------------------------------------------------------------
// TickDiagnostics
// ---------------------------------------------------------------------------

/// Timing and physical totals for the last tick.
#[derive(Debug, Clone, Default)]
pub struct TickDiagnostics {
    /// Total wall-clock time for the tick.
    pub total_time: Duration,
    /// Time spent inside the kernel step.
    pub step_time: Duration,
    pub contacts: usize,
    pub gravity_pairs: usize,
    pub bodies_moved: usize,
    /// Impulses from the input frame that named a body outside the collection.
    pub impulses_dropped: usize,
    /// Sum of `m |v|^2 / 2` over all physical bodies after the tick.
    pub kinetic_energy: f64,
    /// Sum of `m v` over all physical bodies after the tick.
    pub momentum: Vector2,
}

// ---------------------------------------------------------------------------
// InputFrame
// ---------------------------------------------------------------------------

/// An instantaneous velocity change applied to one body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Impulse {
    /// Index into the tick loop's body collection.
    pub body: usize,
    #[serde(with = "orrery_core::vector::nonfinite")]
    pub delta_velocity: Vector2,
}

/// External input for a single tick.
///
/// The frame set with [`TickLoop::set_input`] is consumed by the next call
/// to [`TickLoop::tick`], so a tick with no explicitly set input always sees
/// an empty frame. Recording and replay rely on this.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputFrame {
    pub impulses: Vec<Impulse>,
}

impl InputFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an impulse for `body`.
    pub fn with_impulse(mut self, body: usize, delta_velocity: Vector2) -> Self {
        self.impulses.push(Impulse {
            body,
            delta_velocity,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.impulses.is_empty()
    }
}

// ---------------------------------------------------------------------------
// TickLoop
// ---------------------------------------------------------------------------

/// The deterministic fixed-timestep tick loop.
///
/// # Determinism Guarantee
///
/// Given the same initial bodies, the same [`SimConfig`], and the same input
/// frames, the tick loop produces identical body state across runs. Simulation
/// time is computed as `tick_count * fixed_dt` rather than accumulated, so it
/// carries no drift either.
pub struct TickLoop {
    bodies: Vec<Body>,
    sim_config: SimConfig,
    /// Number of ticks executed so far.
    tick_counter: u64,
    fixed_dt: f64,
    config: TickConfig,
    last_diagnostics: TickDiagnostics,
    /// Input for the next tick. Taken (and reset) by `tick()`.
    current_input: InputFrame,
    events: EventLog,
}

impl TickLoop {
    /// Create a new tick loop over `bodies`.
    ///
    /// The tick counter starts at 0 and simulation time at 0.0.
    ///
    /// # Panics
    ///
    /// Panics if `config.fixed_dt` is not positive and finite.
    pub fn new(bodies: Vec<Body>, sim_config: SimConfig, config: TickConfig) -> Self {
        assert!(
            config.fixed_dt > 0.0 && config.fixed_dt.is_finite(),
            "fixed_dt must be positive and finite, got {}",
            config.fixed_dt
        );
        Self {
            bodies,
            sim_config,
            tick_counter: 0,
            fixed_dt: config.fixed_dt,
            config,
            last_diagnostics: TickDiagnostics::default(),
            current_input: InputFrame::default(),
            events: EventLog::new(),
        }
    }

    /// Bound the event log to `max_events` undrained events. The default is
    /// [`DEFAULT_MAX_EVENTS`](crate::events::DEFAULT_MAX_EVENTS).
    pub fn with_max_events(mut self, max_events: usize) -> Self {
        self.events = EventLog::with_max_events(max_events);
        self
    }

    /// Append a body and return its index.
    pub fn add_body(&mut self, body: Body) -> usize {
        self.bodies.push(body);
        self.bodies.len() - 1
    }

    /// Execute one simulation tick and return the kernel's report.
    ///
    /// Every contact and damage report of the tick is appended to the event
    /// log. A resting contact keeps adding events each tick, so hosts should
    /// call [`drain_events`](Self::drain_events) regularly; past the log's
    /// bound the oldest undrained events are evicted.
    pub fn tick(&mut self) -> StepReport {
        let tick_start = Instant::now();
        let tick = self.tick_counter;

        // Phase 1: apply and consume input.
        let input = std::mem::take(&mut self.current_input);
        let impulses_dropped = self.apply_input(&input);

        // Phase 2: kernel step.
        let step_start = Instant::now();
        let mut on_damage = |event: &DamageEvent, other: &Body| {
            tracing::debug!(
                tick,
                body = event.body,
                other = event.other,
                amount = event.amount,
                other_mass = other.mass,
                "collision damage"
            );
        };
        let report = step_with_handler(
            &mut self.bodies,
            self.fixed_dt,
            &self.sim_config,
            &mut on_damage,
        );
        let step_time = step_start.elapsed();

        // Phase 3: rotation.
        for body in self.bodies.iter_mut() {
            if body.can_rotate() && body.is_physical() {
                rotate(body, self.fixed_dt);
            }
        }

        // Phase 4: events.
        self.events.record_step(tick, &report);

        // Phase 5: advance.
        self.tick_counter += 1;

        let (kinetic_energy, momentum) = self.totals();
        self.last_diagnostics = TickDiagnostics {
            total_time: tick_start.elapsed(),
            step_time,
            contacts: report.contacts.len(),
            gravity_pairs: report.gravity_pairs,
            bodies_moved: report.bodies_moved,
            impulses_dropped,
            kinetic_energy,
            momentum,
        };
        tracing::debug!(
            tick,
            contacts = report.contacts.len(),
            gravity_pairs = report.gravity_pairs,
            kinetic_energy,
            "tick complete"
        );

        report
    }

    /// Run `count` ticks in sequence and return the total number of contacts.
    pub fn run_ticks(&mut self, count: u64) -> u64 {
        let mut total_contacts = 0u64;
        for _ in 0..count {
            let report = self.tick();
            total_contacts += report.contacts.len() as u64;
        }
        total_contacts
    }

    fn apply_input(&mut self, input: &InputFrame) -> usize {
        let mut dropped = 0;
        for impulse in &input.impulses {
            match self.bodies.get_mut(impulse.body) {
                Some(body) => body.velocity += impulse.delta_velocity,
                None => {
                    tracing::debug!(
                        body = impulse.body,
                        bodies = self.bodies.len(),
                        "dropping impulse for unknown body"
                    );
                    dropped += 1;
                }
            }
        }
        dropped
    }

    fn totals(&self) -> (f64, Vector2) {
        self.bodies
            .iter()
            .filter(|body| body.is_physical())
            .fold((0.0, Vector2::ZERO), |(energy, momentum), body| {
                (energy + body.kinetic_energy(), momentum + body.momentum())
            })
    }

    // -- accessors ----------------------------------------------------------

    /// The number of ticks executed so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// The current simulation time in seconds.
    ///
    /// Computed as `tick_count * fixed_dt` to avoid floating-point drift from
    /// repeated addition.
    pub fn sim_time(&self) -> f64 {
        self.tick_counter as f64 * self.fixed_dt
    }

    pub fn fixed_dt(&self) -> f64 {
        self.fixed_dt
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    /// Mutable access to the body collection.
    ///
    /// Use for setup and tests. Changes made here between ticks are not
    /// captured by replay logs; use [`set_input`](Self::set_input) for that.
    pub fn bodies_mut(&mut self) -> &mut Vec<Body> {
        &mut self.bodies
    }

    pub fn sim_config(&self) -> &SimConfig {
        &self.sim_config
    }

    /// Diagnostics from the last tick.
    pub fn last_diagnostics(&self) -> &TickDiagnostics {
        &self.last_diagnostics
    }

    /// Set the input frame for the next tick.
    pub fn set_input(&mut self, input: InputFrame) {
        self.current_input = input;
    }

    /// The input frame the next tick will consume.
    pub fn current_input(&self) -> &InputFrame {
        &self.current_input
    }

    /// Events recorded since the last drain.
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Remove and return every buffered event, oldest first.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.events.drain()
    }

    // -- restore helpers (used by snapshot) ---------------------------------

    pub(crate) fn replace_state(
        &mut self,
        bodies: Vec<Body>,
        sim_config: SimConfig,
        tick_counter: u64,
        fixed_dt: f64,
        input: InputFrame,
    ) {
        self.bodies = bodies;
        self.sim_config = sim_config;
        self.tick_counter = tick_counter;
        self.fixed_dt = fixed_dt;
        self.config.fixed_dt = fixed_dt;
        self.current_input = input;
        self.events.clear();
        self.last_diagnostics = TickDiagnostics::default();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
