//! Motion integration.
//!
//! [`integrate`] converts the accumulated force into acceleration, updates
//! velocity over the full time step, then advances position with the
//! *updated* velocity over [`POSITION_STEP_FRACTION`] of the time step. The
//! halved position step is part of the kernel's numerical behaviour and is
//! kept as is; [`circular_orbit_velocity`](crate::gravity::circular_orbit_velocity)
//! compensates for it when seeding orbits.

use crate::body::Body;
use crate::vector::Coords;

/// Fraction of the time step used for the position update.
pub const POSITION_STEP_FRACTION: f64 = 0.5;

/// Advance `body` by `t`.
///
/// 1. `last_position = position`
/// 2. `acceleration += force / mass` (skipped for massless bodies)
/// 3. `velocity += acceleration * t`
/// 4. `position += velocity * t * POSITION_STEP_FRACTION`
/// 5. force and acceleration are cleared
pub fn integrate(body: &mut Body, t: f64) {
    body.last_position = body.position;

    if body.mass != 0.0 {
        body.acceleration += body.force / body.mass;
    }

    let delta_velocity = body.acceleration * t;
    body.velocity += delta_velocity;

    let delta_position = body.velocity * (t * POSITION_STEP_FRACTION);
    body.position += delta_position;

    body.force.clear();
    body.acceleration.clear();
}

/// Advance the rotation angle by `angular_velocity * t`.
///
/// Torque and moment of inertia are carried but not integrated.
pub fn rotate(body: &mut Body, t: f64) {
    body.rotation += body.angular_velocity * t;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{physical, PhysicalSettings};
    use crate::vector::Vector2;

    #[test]
    fn constant_velocity_moves_half_step() {
        let mut body = physical(
            Body::at(Vector2::new(1.0, 1.0)).with_velocity(Vector2::new(2.0, -4.0)),
            PhysicalSettings::default(),
        );
        integrate(&mut body, 1.0);
        assert_eq!(body.last_position, Vector2::new(1.0, 1.0));
        assert_eq!(body.velocity, Vector2::new(2.0, -4.0));
        assert_eq!(body.position, Vector2::new(2.0, -1.0));
    }

    #[test]
    fn force_updates_velocity_before_position() {
        let mut body = physical(Body::at(Vector2::ZERO), PhysicalSettings::with_mass(2.0));
        body.force = Vector2::new(4.0, 0.0);
        integrate(&mut body, 0.5);
        // a = 2, dv = 1, dx = 1 * 0.25
        assert_eq!(body.velocity, Vector2::new(1.0, 0.0));
        assert_eq!(body.position, Vector2::new(0.25, 0.0));
    }

    #[test]
    fn existing_acceleration_is_added_to() {
        let mut body = physical(Body::at(Vector2::ZERO), PhysicalSettings::with_mass(1.0));
        body.acceleration = Vector2::new(0.0, -10.0);
        body.force = Vector2::new(0.0, 4.0);
        integrate(&mut body, 1.0);
        assert_eq!(body.velocity, Vector2::new(0.0, -6.0));
    }

    #[test]
    fn force_and_acceleration_cleared() {
        let mut body = physical(Body::at(Vector2::ZERO), PhysicalSettings::with_mass(3.0));
        body.force = Vector2::new(123.0, -45.0);
        body.acceleration = Vector2::new(6.0, 7.0);
        integrate(&mut body, 0.016);
        assert_eq!(body.force, Vector2::ZERO);
        assert_eq!(body.acceleration, Vector2::ZERO);
    }

    #[test]
    fn massless_body_ignores_force() {
        let mut body = physical(
            Body::at(Vector2::ZERO).with_velocity(Vector2::new(1.0, 0.0)),
            PhysicalSettings::with_mass(0.0),
        );
        body.force = Vector2::new(1000.0, 1000.0);
        integrate(&mut body, 1.0);
        assert_eq!(body.velocity, Vector2::new(1.0, 0.0));
        assert_eq!(body.position, Vector2::new(0.5, 0.0));
        assert_eq!(body.force, Vector2::ZERO);
    }

    #[test]
    fn zero_time_step_only_clears() {
        let mut body = physical(
            Body::at(Vector2::new(3.0, 4.0)).with_velocity(Vector2::new(1.0, 1.0)),
            PhysicalSettings::default(),
        );
        body.force = Vector2::new(5.0, 5.0);
        integrate(&mut body, 0.0);
        assert_eq!(body.position, Vector2::new(3.0, 4.0));
        assert_eq!(body.velocity, Vector2::new(1.0, 1.0));
        assert_eq!(body.force, Vector2::ZERO);
    }

    #[test]
    fn rotate_advances_angle() {
        let mut body = Body::at(Vector2::ZERO).with_angular_velocity(0.5);
        rotate(&mut body, 2.0);
        assert_eq!(body.rotation, 1.0);
        rotate(&mut body, 2.0);
        assert_eq!(body.rotation, 2.0);
    }
}
