//! Pairwise Newtonian gravitation.
//!
//! A gravitating body sums `G m1 m2 / r^2` attractions from every other
//! massive, physical body into its force accumulator. Pairs closer than
//! [`SimConfig::min_gravity_radius`] contribute nothing, and a body that is
//! colliding this tick receives no gravity at all: collision resolution runs
//! first in the step and its contact flag gates this stage.

use crate::body::Body;
use crate::collision::pair_mut;
use crate::config::SimConfig;
use crate::motion::POSITION_STEP_FRACTION;
use crate::vector::{Coords, Turn, Vector2};

/// `G m1 m2 / r^2`, or 0 when `r` is 0.
#[inline]
pub fn gravity_force_magnitude(big_g: f64, m1: f64, m2: f64, r: f64) -> f64 {
    let r_squared = r * r;
    if r_squared == 0.0 {
        return 0.0;
    }
    big_g * m1 * m2 / r_squared
}

/// Add the pull of `b` on `o` into `o.force`.
///
/// Returns `false` without touching `o` when either body is massless, `o`
/// is colliding or cannot gravitate, `b` is not physical, or the pair is
/// closer than the minimum gravity radius.
pub fn gravitate_one(o: &mut Body, b: &Body, big_g: f64, config: &SimConfig) -> bool {
    if b.mass <= 0.0
        || o.mass <= 0.0
        || o.is_colliding
        || !o.can_gravitate()
        || !b.is_physical()
    {
        return false;
    }

    let r = o.position.distance(b.position);
    if r < config.min_gravity_radius {
        return false;
    }

    let magnitude = gravity_force_magnitude(big_g, o.mass, b.mass, r);
    o.force += o.position.unit_toward(b.position) * magnitude;
    true
}

/// Accumulate gravity on the body at `index` from every other body, in
/// collection order, using the body's own gravitational constant.
///
/// Returns the number of pairs that contributed.
///
/// # Panics
///
/// Panics if `index` is out of bounds.
pub fn gravitate(index: usize, bodies: &mut [Body], config: &SimConfig) -> usize {
    let o = &bodies[index];
    if o.mass <= 0.0 || o.is_colliding {
        return 0;
    }
    let big_g = o.effective_big_g(config);

    let mut applied = 0;
    for other in 0..bodies.len() {
        if other == index {
            continue;
        }
        let (o, b) = pair_mut(bodies, index, other);
        if gravitate_one(o, b, big_g, config) {
            applied += 1;
        }
    }
    applied
}

/// Velocity that puts `small` on a Newtonian circular orbit around `big`:
/// speed `sqrt(G M / r)`, perpendicular to the line from `small` to `big`.
///
/// Because the kernel advances position by only [`POSITION_STEP_FRACTION`]
/// of the velocity per unit time, this speed produces an elliptical orbit
/// whose far point is the starting distance. Use
/// [`circular_orbit_velocity`] for an orbit that stays circular under
/// [`step`](crate::step::step). Coincident bodies yield the zero vector.
pub fn orbital_velocity(small: &Body, big: &Body, turn: Turn, big_g: f64) -> Vector2 {
    orbit_with_speed_factor(small, big, turn, big_g, 1.0)
}

/// Velocity that keeps `small` on a circular orbit around `big` under this
/// kernel's integrator: speed `sqrt(G M / (h r))` with
/// `h = POSITION_STEP_FRACTION`.
pub fn circular_orbit_velocity(small: &Body, big: &Body, turn: Turn, big_g: f64) -> Vector2 {
    orbit_with_speed_factor(small, big, turn, big_g, 1.0 / POSITION_STEP_FRACTION)
}

fn orbit_with_speed_factor(
    small: &Body,
    big: &Body,
    turn: Turn,
    big_g: f64,
    factor: f64,
) -> Vector2 {
    let r = small.position.distance(big.position);
    if r == 0.0 {
        return Vector2::ZERO;
    }
    let speed = (factor * big_g * big.mass / r).sqrt();
    small
        .position
        .unit_toward(big.position)
        .perpendicular(turn)
        * speed
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{physical, PhysicalSettings};

    fn mass_at(x: f64, y: f64, mass: f64) -> Body {
        physical(
            Body::at(Vector2::new(x, y)),
            PhysicalSettings::with_mass(mass),
        )
    }

    #[test]
    fn magnitude_follows_inverse_square() {
        let near = gravity_force_magnitude(5.0, 2.0, 3.0, 2.0);
        let far = gravity_force_magnitude(5.0, 2.0, 3.0, 4.0);
        assert_eq!(near, 7.5);
        assert_eq!(far, near / 4.0);
        assert_eq!(gravity_force_magnitude(5.0, 2.0, 3.0, 0.0), 0.0);
    }

    #[test]
    fn force_points_toward_other_body() {
        let config = SimConfig::default();
        let mut bodies = vec![mass_at(0.0, 0.0, 2.0), mass_at(0.0, 10.0, 4.0)];

        assert_eq!(gravitate(0, &mut bodies, &config), 1);
        // 5 * 2 * 4 / 100 = 0.4
        assert!(bodies[0].force.x.abs() < 1e-12);
        assert!((bodies[0].force.y - 0.4).abs() < 1e-12);
        // Only the evaluating body accumulates.
        assert_eq!(bodies[1].force, Vector2::ZERO);
    }

    #[test]
    fn contributions_sum_over_candidates() {
        let config = SimConfig::default();
        let mut bodies = vec![
            mass_at(0.0, 0.0, 1.0),
            mass_at(5.0, 0.0, 1.0),
            mass_at(-5.0, 0.0, 1.0),
            mass_at(0.0, 5.0, 1.0),
        ];
        assert_eq!(gravitate(0, &mut bodies, &config), 3);
        // x contributions cancel, y is 5 / 25.
        assert!(bodies[0].force.x.abs() < 1e-12);
        assert!((bodies[0].force.y - 0.2).abs() < 1e-12);
    }

    #[test]
    fn pairs_inside_min_radius_are_skipped() {
        let config = SimConfig::default();
        let mut bodies = vec![mass_at(0.0, 0.0, 1.0), mass_at(0.5, 0.0, 100.0)];
        assert_eq!(gravitate(0, &mut bodies, &config), 0);
        assert_eq!(bodies[0].force, Vector2::ZERO);

        // Exactly at the minimum radius still counts.
        bodies[1].position = Vector2::new(1.0, 0.0);
        assert_eq!(gravitate(0, &mut bodies, &config), 1);
    }

    #[test]
    fn massless_bodies_neither_feel_nor_emit() {
        let config = SimConfig::default();
        let mut bodies = vec![mass_at(0.0, 0.0, 0.0), mass_at(3.0, 0.0, 10.0)];
        assert_eq!(gravitate(0, &mut bodies, &config), 0);
        assert_eq!(bodies[0].force, Vector2::ZERO);

        assert_eq!(gravitate(1, &mut bodies, &config), 0);
        assert_eq!(bodies[1].force, Vector2::ZERO);
    }

    #[test]
    fn colliding_body_receives_no_gravity() {
        let config = SimConfig::default();
        let mut bodies = vec![mass_at(0.0, 0.0, 1.0), mass_at(3.0, 0.0, 10.0)];
        bodies[0].is_colliding = true;
        assert_eq!(gravitate(0, &mut bodies, &config), 0);
        assert_eq!(bodies[0].force, Vector2::ZERO);
    }

    #[test]
    fn non_physical_candidate_is_skipped() {
        let config = SimConfig::default();
        let mut bodies = vec![mass_at(0.0, 0.0, 1.0), mass_at(f64::NAN, 0.0, 10.0)];
        assert_eq!(gravitate(0, &mut bodies, &config), 0);
    }

    #[test]
    fn per_body_big_g_override_is_used() {
        let config = SimConfig::default();
        let mut bodies = vec![
            physical(
                Body::at(Vector2::ZERO),
                PhysicalSettings {
                    mass: 1.0,
                    big_g: Some(1.0),
                },
            ),
            mass_at(2.0, 0.0, 4.0),
        ];
        gravitate(0, &mut bodies, &config);
        assert!((bodies[0].force.x - 1.0).abs() < 1e-12);
        gravitate(1, &mut bodies, &config);
        assert!((bodies[1].force.x + 5.0).abs() < 1e-12);
    }

    #[test]
    fn gravitate_one_requires_capability() {
        let config = SimConfig::default();
        let mut inert = Body::at(Vector2::ZERO).with_mass(1.0);
        let other = mass_at(5.0, 0.0, 1.0);
        assert!(!gravitate_one(&mut inert, &other, config.big_g, &config));
        assert_eq!(inert.force, Vector2::ZERO);
    }

    #[test]
    fn orbital_velocity_is_perpendicular_with_newtonian_speed() {
        let big = mass_at(0.0, 0.0, 1000.0);
        let small = mass_at(10.0, 0.0, 1.0);
        let v = orbital_velocity(&small, &big, Turn::Right, 5.0);
        assert!(v.x.abs() < 1e-12);
        assert!((v.length() - 500.0_f64.sqrt()).abs() < 1e-9);
        assert!(v.dot(big.position - small.position).abs() < 1e-9);

        let left = orbital_velocity(&small, &big, Turn::Left, 5.0);
        assert!((left + v).length() < 1e-9);
    }

    #[test]
    fn circular_orbit_velocity_accounts_for_half_step() {
        let big = mass_at(0.0, 0.0, 1000.0);
        let small = mass_at(10.0, 0.0, 1.0);
        let newtonian = orbital_velocity(&small, &big, Turn::Left, 5.0);
        let circular = circular_orbit_velocity(&small, &big, Turn::Left, 5.0);
        assert!((circular.length() / newtonian.length() - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn orbital_velocity_of_coincident_bodies_is_zero() {
        let big = mass_at(1.0, 1.0, 1000.0);
        let small = mass_at(1.0, 1.0, 1.0);
        assert_eq!(orbital_velocity(&small, &big, Turn::Left, 5.0), Vector2::ZERO);
    }
}
