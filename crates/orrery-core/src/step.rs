//! The per-tick entry point.
//!
//! [`step`] walks the collection once, in order. For each physical body it
//! runs collision resolution (if the body can collide), then gravitation (if
//! it can gravitate), then motion integration (if it can move). Every ordered
//! pair `(o, b)` is evaluated from `o`'s side, so a pair of colliding bodies
//! is seen twice per tick, the second time with the first body already
//! resolved and integrated.

use serde::{Deserialize, Serialize};

use crate::body::Body;
use crate::collision::{collide, DamageEvent, DamageHandler, NoDamage};
use crate::config::SimConfig;
use crate::gravity::gravitate;
use crate::motion::integrate;
use crate::PhysicsError;

/// An ordered contact found during a step: `body` overlapped `other` when
/// `body` resolved its collisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub body: usize,
    pub other: usize,
}

/// What a step did, for hosts and tests that need the skip/apply signals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    /// Contacts in the order they were found.
    pub contacts: Vec<Contact>,
    pub damage: Vec<DamageEvent>,
    pub bounces_applied: usize,
    /// Contacts whose bounce was skipped (massless, coincident or separating).
    pub bounces_skipped: usize,
    /// Pairs that contributed gravity.
    pub gravity_pairs: usize,
    pub bodies_moved: usize,
    /// Bodies skipped because their position or velocity is not finite.
    pub non_physical: usize,
}

/// Advance `bodies` by `t` with no damage callback.
pub fn step(bodies: &mut [Body], t: f64, config: &SimConfig) -> StepReport {
    step_with_handler(bodies, t, config, &mut NoDamage)
}

/// Advance `bodies` by `t`, reporting collision damage to `handler`.
pub fn step_with_handler<H: DamageHandler + ?Sized>(
    bodies: &mut [Body],
    t: f64,
    config: &SimConfig,
    handler: &mut H,
) -> StepReport {
    let mut report = StepReport::default();

    for index in 0..bodies.len() {
        if !bodies[index].is_physical() {
            report.non_physical += 1;
            continue;
        }

        if bodies[index].can_collide() {
            let collided = collide(index, bodies, config, handler);
            report.contacts.extend(
                collided
                    .contacts
                    .iter()
                    .map(|&other| Contact { body: index, other }),
            );
            report.damage.extend(collided.damage);
            report.bounces_applied += collided.bounces_applied;
            report.bounces_skipped += collided.bounces_skipped;
        }

        if bodies[index].can_gravitate() {
            report.gravity_pairs += gravitate(index, bodies, config);
        }

        if bodies[index].can_move() {
            integrate(&mut bodies[index], t);
            report.bodies_moved += 1;
        }
    }

    tracing::trace!(
        bodies = bodies.len(),
        contacts = report.contacts.len(),
        gravity_pairs = report.gravity_pairs,
        moved = report.bodies_moved,
        "step complete"
    );

    report
}

/// Validate the inputs, then [`step_with_handler`].
///
/// Checks that `t` is finite and non-negative, that `config` is valid, and
/// that every body has a finite non-negative mass and radii. Nothing is
/// mutated when validation fails.
///
/// # Errors
///
/// Returns the first [`PhysicsError`] found.
pub fn try_step<H: DamageHandler + ?Sized>(
    bodies: &mut [Body],
    t: f64,
    config: &SimConfig,
    handler: &mut H,
) -> Result<StepReport, PhysicsError> {
    if !t.is_finite() || t < 0.0 {
        tracing::debug!(dt = t, "rejecting step with invalid time delta");
        return Err(PhysicsError::InvalidTimeDelta { dt: t });
    }
    config.validate()?;
    for (index, body) in bodies.iter().enumerate() {
        if let Err(e) = body.validate(index) {
            tracing::debug!(error = %e, "rejecting step with invalid body");
            return Err(e);
        }
    }
    Ok(step_with_handler(bodies, t, config, handler))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
