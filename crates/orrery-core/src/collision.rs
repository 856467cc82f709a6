//! Collision detection and response.
//!
//! Detection is two-phase. [`check_bounding_box_overlap`] rejects pairs
//! whose square boxes are apart; only pairs that survive it reach
//! [`check_radius_overlap`], which compares the centre distance against the
//! sum of the inner radii. Touching (edge-to-edge distance of exactly zero)
//! counts as colliding.
//!
//! Response for each contact runs in a fixed order inside [`collide`]:
//!
//! 1. [`collide_pushback`] moves the lighter body part of the way out of the
//!    overlap.
//! 2. [`collide_bounce`] exchanges an impulse along the line of centres.
//! 3. [`collide_damage`] reports damage to the host for bodies that opted in.
//!
//! Once every candidate has been scanned, a colliding body has its velocity
//! damped by [`SimConfig::colliding_velocity_multiplier`].

use serde::{Deserialize, Serialize};

use crate::body::Body;
use crate::config::SimConfig;
use crate::vector::{Coords, Vector2};

/// Combined speed at or below which a contact does no damage.
pub const DAMAGE_SPEED_THRESHOLD: f64 = 1.0;

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Result of the narrow-phase radius test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusOverlap {
    pub is_colliding: bool,
    /// Centre distance minus both inner radii. Negative while overlapping.
    pub edge_to_edge_distance: f64,
}

/// Broad-phase test on square boxes of half-extent
/// [`Body::half_extent`] centred on each body.
pub fn check_bounding_box_overlap(a: &Body, b: &Body) -> bool {
    let ar = a.half_extent();
    let br = b.half_extent();

    let a_max = a.position + ar;
    let b_min = b.position - br;
    if b_min.x > a_max.x || b_min.y > a_max.y {
        return false;
    }

    let a_min = a.position - ar;
    let b_max = b.position + br;
    if a_min.x > b_max.x || a_min.y > b_max.y {
        return false;
    }

    true
}

/// Narrow-phase test on the inner radii. A non-finite radius counts as 0.
pub fn check_radius_overlap(a: &Body, b: &Body) -> RadiusOverlap {
    let ra = finite_or_zero(a.inner_radius);
    let rb = finite_or_zero(b.inner_radius);
    let edge_to_edge_distance = a.position.distance(b.position) - ra - rb;
    RadiusOverlap {
        is_colliding: edge_to_edge_distance <= 0.0,
        edge_to_edge_distance,
    }
}

/// Run the broad phase and, only if it passes, the narrow phase.
///
/// Returns `None` when the boxes do not overlap.
pub fn detect(a: &Body, b: &Body) -> Option<RadiusOverlap> {
    if !check_bounding_box_overlap(a, b) {
        return None;
    }
    Some(check_radius_overlap(a, b))
}

#[inline]
fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Pushback
// ---------------------------------------------------------------------------

/// Which body of a pair a response step refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    /// The body whose collisions are being resolved.
    Evaluating,
    /// The other body of the pair.
    Candidate,
}

/// Outcome of [`collide_pushback`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pushback {
    /// The body that was moved.
    pub pushee: Side,
    /// Displacement added to the pushee's position.
    pub push: Vector2,
}

/// Separate an overlapping pair by moving the lighter body.
///
/// The body with strictly greater mass is the pusher and stays put; on a tie
/// the candidate `b` pushes and `o` moves. The pushee is displaced along the
/// line joining the two centres by `edge_to_edge_distance * multiplier`,
/// which points away from the pusher because the distance is negative while
/// overlapping. Coincident centres yield a zero push.
pub fn collide_pushback(
    o: &mut Body,
    b: &mut Body,
    edge_to_edge_distance: f64,
    multiplier: f64,
) -> Pushback {
    let amount = edge_to_edge_distance * multiplier;
    if o.mass > b.mass {
        let push = b.position.unit_toward(o.position) * amount;
        b.position += push;
        Pushback {
            pushee: Side::Candidate,
            push,
        }
    } else {
        let push = o.position.unit_toward(b.position) * amount;
        o.position += push;
        Pushback {
            pushee: Side::Evaluating,
            push,
        }
    }
}

// ---------------------------------------------------------------------------
// Bounce
// ---------------------------------------------------------------------------

/// Why a bounce was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BounceSkip {
    /// One of the bodies has zero (or negative) mass.
    Massless,
    /// The centres coincide, so there is no line of centres.
    Coincident,
    /// The bodies are already moving apart along the line of centres.
    Separating,
}

/// Outcome of [`collide_bounce`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BounceOutcome {
    /// The impulse was exchanged.
    Applied {
        /// `2 (a1 - a2) / (m1 + m2)`.
        impulse: f64,
    },
    Skipped(BounceSkip),
}

impl BounceOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, BounceOutcome::Applied { .. })
    }
}

/// Exchange an elastic impulse between `o1` (the evaluating body) and `o2`.
///
/// With `n` the unit vector from `o1` toward `o2`, `a1 = v1 . n`,
/// `a2 = v2 . n` and `p = 2 (a1 - a2) / (m1 + m2)`:
/// `v1 += -p m2 n`, `v2 += p m1 n`, then `v1 *= elasticity`. Only `o1`
/// loses energy to elasticity.
pub fn collide_bounce(o1: &mut Body, o2: &mut Body, config: &SimConfig) -> BounceOutcome {
    if o1.mass <= 0.0 || o2.mass <= 0.0 {
        return BounceOutcome::Skipped(BounceSkip::Massless);
    }
    let n = o1.position.unit_toward(o2.position);
    if n == Vector2::ZERO {
        return BounceOutcome::Skipped(BounceSkip::Coincident);
    }

    let a1 = o1.velocity.dot(n);
    let a2 = o2.velocity.dot(n);
    let closing = a1 - a2;
    if !config.bounce_separating && closing <= 0.0 {
        return BounceOutcome::Skipped(BounceSkip::Separating);
    }

    let impulse = 2.0 * closing / (o1.mass + o2.mass);
    o1.velocity += n * (-impulse * o2.mass);
    o2.velocity += n * (impulse * o1.mass);
    o1.velocity *= config.elasticity;

    BounceOutcome::Applied { impulse }
}

// ---------------------------------------------------------------------------
// Damage
// ---------------------------------------------------------------------------

/// Damage reported for one contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageEvent {
    /// Index of the damaged body.
    pub body: usize,
    /// Index of the body it collided with.
    pub other: usize,
    pub amount: u32,
}

/// Host callback for collision damage.
pub trait DamageHandler {
    /// Called once per damaging contact, with the other body as it was right
    /// after the bounce.
    fn on_damage(&mut self, event: &DamageEvent, other: &Body);
}

/// A handler that ignores damage.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDamage;

impl DamageHandler for NoDamage {
    fn on_damage(&mut self, _event: &DamageEvent, _other: &Body) {}
}

impl<F> DamageHandler for F
where
    F: FnMut(&DamageEvent, &Body),
{
    fn on_damage(&mut self, event: &DamageEvent, other: &Body) {
        self(event, other)
    }
}

/// Damage dealt by a contact at the given combined speed:
/// `ceil(speed^1.4 / 10)` above [`DAMAGE_SPEED_THRESHOLD`], otherwise 0.
pub fn damage_amount(speed: f64) -> u32 {
    if speed.is_nan() || speed <= DAMAGE_SPEED_THRESHOLD {
        return 0;
    }
    (speed.powf(1.4) / 10.0).ceil() as u32
}

/// Report damage to `o` (at `index`) from its contact with `b` (at `other`).
///
/// Only bodies with [`Capabilities::DAMAGE`](crate::body::Capabilities::DAMAGE)
/// take damage. The speed is the magnitude of the sum of both velocities.
/// Returns the event passed to `handler`, or `None` if no damage was dealt.
pub fn collide_damage<H: DamageHandler + ?Sized>(
    index: usize,
    other: usize,
    o: &Body,
    b: &Body,
    handler: &mut H,
) -> Option<DamageEvent> {
    if !o.takes_damage() {
        return None;
    }
    let speed = (o.velocity + b.velocity).length();
    let amount = damage_amount(speed);
    if amount == 0 {
        return None;
    }
    let event = DamageEvent {
        body: index,
        other,
        amount,
    };
    handler.on_damage(&event, b);
    Some(event)
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// What one body's collision pass did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollideReport {
    /// Indices of the candidates found overlapping, in collection order.
    pub contacts: Vec<usize>,
    pub bounces_applied: usize,
    pub bounces_skipped: usize,
    pub damage: Vec<DamageEvent>,
}

/// Resolve every contact of the body at `index` against the rest of
/// `bodies`, in collection order.
///
/// The body's contact list is cleared before scanning and rebuilt from the
/// candidates found overlapping. Self and non-physical candidates are
/// skipped.
///
/// # Panics
///
/// Panics if `index` is out of bounds.
pub fn collide<H: DamageHandler + ?Sized>(
    index: usize,
    bodies: &mut [Body],
    config: &SimConfig,
    handler: &mut H,
) -> CollideReport {
    let mut report = CollideReport::default();

    let mut colliding = std::mem::take(&mut bodies[index].colliding);
    colliding.clear();
    bodies[index].is_colliding = false;

    for other in 0..bodies.len() {
        if other == index {
            continue;
        }
        let (o, b) = pair_mut(bodies, index, other);
        if !b.is_physical() {
            continue;
        }
        let Some(overlap) = detect(o, b) else {
            continue;
        };
        if !overlap.is_colliding {
            continue;
        }

        colliding.push(other);
        collide_pushback(o, b, overlap.edge_to_edge_distance, config.pushback_multiplier);
        if collide_bounce(o, b, config).is_applied() {
            report.bounces_applied += 1;
        } else {
            report.bounces_skipped += 1;
        }
        if let Some(event) = collide_damage(index, other, o, b, handler) {
            report.damage.push(event);
        }
    }

    let o = &mut bodies[index];
    o.is_colliding = !colliding.is_empty();
    if o.is_colliding {
        o.velocity *= config.colliding_velocity_multiplier;
    }
    report.contacts.clone_from(&colliding);
    o.colliding = colliding;

    report
}

/// Mutable references to two distinct elements of `bodies`, in argument order.
pub(crate) fn pair_mut(bodies: &mut [Body], i: usize, j: usize) -> (&mut Body, &mut Body) {
    assert_ne!(i, j, "pair_mut requires distinct indices");
    if i < j {
        let (left, right) = bodies.split_at_mut(j);
        (&mut left[i], &mut right[0])
    } else {
        let (left, right) = bodies.split_at_mut(i);
        (&mut right[0], &mut left[j])
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
