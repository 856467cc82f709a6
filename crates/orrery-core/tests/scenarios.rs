//! Whole-step scenario tests.
//!
//! These run the full collide -> gravitate -> integrate pipeline on small
//! scenes and check the behaviour a host loop relies on: bound orbits,
//! head-on bounces, damage thresholds, and the ordering rules between
//! collision, gravity and force clearing.

use orrery_core::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn disc(x: f64, y: f64, radius: f64, mass: f64) -> Body {
    physical(
        Body::at(Vector2::new(x, y)).with_inner_radius(radius),
        PhysicalSettings::with_mass(mass),
    )
}

/// Heavy body at the origin and a light body 10 units out along x, with the
/// light body's velocity chosen by `seed_velocity`.
fn orbit_scene(seed_velocity: fn(&Body, &Body, Turn, f64) -> Vector2) -> Vec<Body> {
    let config = SimConfig::default();
    let star = disc(0.0, 0.0, 0.5, 1000.0);
    let mut planet = disc(10.0, 0.0, 0.5, 1.0);
    planet.velocity = seed_velocity(&planet, &star, Turn::Left, config.big_g);
    vec![star, planet]
}

/// Run `ticks` steps and return the (min, max) separation seen.
fn separation_range(bodies: &mut [Body], ticks: usize, dt: f64) -> (f64, f64) {
    let config = SimConfig::default();
    let mut min = f64::INFINITY;
    let mut max: f64 = 0.0;
    for _ in 0..ticks {
        step(bodies, dt, &config);
        let r = bodies[0].position.distance(bodies[1].position);
        min = min.min(r);
        max = max.max(r);
    }
    (min, max)
}

/// Default constants with re-bouncing of separating pairs turned off.
fn skip_separating() -> SimConfig {
    SimConfig {
        bounce_separating: false,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Orbits
// ---------------------------------------------------------------------------

#[test]
fn orbit_seed_stays_bound_and_clear_of_singularity() {
    let mut bodies = orbit_scene(orbital_velocity);
    let (min, max) = separation_range(&mut bodies, 5000, 0.01);

    let config = SimConfig::default();
    assert!(
        min >= config.min_gravity_radius,
        "planet fell inside the gravity guard radius: {min}"
    );
    // The half-step integrator turns the Newtonian seed into an ellipse with
    // its far point at the starting radius and its near point at a third of it.
    assert!(min > 3.0, "periapsis too low: {min}");
    assert!(max < 10.05, "planet escaped outward: {max}");
}

#[test]
fn circular_orbit_seed_keeps_radius() {
    let mut bodies = orbit_scene(circular_orbit_velocity);
    let (min, max) = separation_range(&mut bodies, 5000, 0.01);
    assert!(
        (9.75..=10.25).contains(&min) && (9.75..=10.25).contains(&max),
        "separation drifted to [{min}, {max}]"
    );
    assert!(!bodies[0].is_colliding && !bodies[1].is_colliding);
}

// ---------------------------------------------------------------------------
// Head-on collision
// ---------------------------------------------------------------------------

#[test]
fn head_on_touching_pair_reverses_on_first_step() {
    let config = SimConfig::default();
    let mut bodies = vec![
        disc(-1.0, 0.0, 1.0, 1.0).with_velocity(Vector2::new(1.0, 0.0)),
        disc(1.0, 0.0, 1.0, 1.0).with_velocity(Vector2::new(-1.0, 0.0)),
    ];

    let report = step(&mut bodies, 0.1, &config);

    assert_eq!(report.contacts, vec![Contact { body: 0, other: 1 }]);
    assert!(bodies[0].is_colliding);
    assert_eq!(bodies[0].colliding, vec![1]);
    // -1 * elasticity * colliding multiplier
    assert!((bodies[0].velocity.x + 0.98 * 0.95).abs() < 1e-12);
    // The first body integrated away before the second was evaluated, so the
    // second no longer touches it; its velocity is reversed by the impulse
    // and then slowed slightly by gravity toward the first.
    assert!(!bodies[1].is_colliding);
    assert!(bodies[1].velocity.x > 0.8 && bodies[1].velocity.x < 1.0);
}

#[test]
fn head_on_pair_both_register_contact_when_resolved_together() {
    let config = skip_separating();
    let mut bodies = vec![
        disc(-1.0, 0.0, 1.0, 1.0).with_velocity(Vector2::new(1.0, 0.0)),
        disc(1.0, 0.0, 1.0, 1.0).with_velocity(Vector2::new(-1.0, 0.0)),
    ];

    collide(0, &mut bodies, &config, &mut NoDamage);
    let second = collide(1, &mut bodies, &config, &mut NoDamage);

    assert!(bodies[0].is_colliding && bodies[1].is_colliding);
    assert_eq!(bodies[0].colliding, vec![1]);
    assert_eq!(bodies[1].colliding, vec![0]);
    // The second evaluation sees a separating pair and does not bounce it back.
    assert_eq!(second.bounces_skipped, 1);
    assert!((bodies[0].velocity.x + 0.98 * 0.95).abs() < 1e-12);
    assert!((bodies[1].velocity.x - 0.95).abs() < 1e-12);
}

#[test]
fn overlapping_head_on_pair_both_collide_within_one_step() {
    let config = skip_separating();
    let mut bodies = vec![
        disc(-0.9, 0.0, 1.0, 1.0).with_velocity(Vector2::new(1.0, 0.0)),
        disc(0.9, 0.0, 1.0, 1.0).with_velocity(Vector2::new(-1.0, 0.0)),
    ];

    let report = step(&mut bodies, 0.1, &config);

    assert_eq!(
        report.contacts,
        vec![Contact { body: 0, other: 1 }, Contact { body: 1, other: 0 }]
    );
    assert_eq!(report.bounces_applied, 1);
    assert_eq!(report.bounces_skipped, 1);
    assert!(bodies[0].velocity.x < 0.0);
    assert!(bodies[1].velocity.x > 0.0);
    // Both were colliding, so neither took gravity.
    assert_eq!(report.gravity_pairs, 0);
}

#[test]
fn default_config_bounces_both_evaluations_of_a_pair() {
    let config = SimConfig::default();
    let mut bodies = vec![
        disc(-0.9, 0.0, 1.0, 1.0).with_velocity(Vector2::new(1.0, 0.0)),
        disc(0.9, 0.0, 1.0, 1.0).with_velocity(Vector2::new(-1.0, 0.0)),
    ];

    let report = step(&mut bodies, 0.1, &config);
    assert_eq!(report.bounces_applied, 2);
    // The second evaluation turns the second body back toward the first.
    assert!(bodies[1].velocity.x < 0.0);
}

// ---------------------------------------------------------------------------
// Damage
// ---------------------------------------------------------------------------

fn damage_in_contact(speed: f64) -> Vec<DamageEvent> {
    let config = SimConfig::default();
    // A massless candidate skips the bounce, so the contact speed is exactly
    // the evaluating body's speed.
    let mut bodies = vec![
        disc(0.0, 0.0, 1.0, 1.0)
            .with_velocity(Vector2::new(speed, 0.0))
            .with_damage(),
        disc(1.5, 0.0, 1.0, 0.0),
    ];
    let mut seen = Vec::new();
    let mut handler = |event: &DamageEvent, _: &Body| seen.push(*event);
    let report = step_with_handler(&mut bodies, 0.01, &config, &mut handler);
    assert_eq!(report.damage, seen);
    seen
}

#[test]
fn damage_threshold_boundary_deals_nothing() {
    assert!(damage_in_contact(1.0).is_empty());
    assert!(damage_in_contact(0.5).is_empty());
}

#[test]
fn damage_above_threshold() {
    let events = damage_in_contact(2.0);
    assert_eq!(
        events,
        vec![DamageEvent {
            body: 0,
            other: 1,
            amount: 1
        }]
    );
}

#[test]
fn only_damage_capable_bodies_are_damaged() {
    let config = SimConfig::default();
    let mut bodies = vec![
        disc(0.0, 0.0, 1.0, 1.0).with_velocity(Vector2::new(5.0, 0.0)),
        disc(1.5, 0.0, 1.0, 1.0).with_damage(),
    ];
    let report = step(&mut bodies, 0.01, &config);
    assert!(report.damage.iter().all(|event| event.body == 1));
}

// ---------------------------------------------------------------------------
// Ordering and invariants
// ---------------------------------------------------------------------------

#[test]
fn zero_mass_body_never_accelerates_from_gravity() {
    let config = SimConfig::default();
    let mut bodies = vec![
        disc(0.0, 0.0, 0.5, 0.0).with_velocity(Vector2::new(0.0, 1.0)),
        disc(5.0, 0.0, 0.5, 1.0e6),
    ];
    for _ in 0..100 {
        step(&mut bodies, 0.01, &config);
        assert_eq!(bodies[0].velocity, Vector2::new(0.0, 1.0));
        assert_eq!(bodies[0].force, Vector2::ZERO);
    }
    // The heavy body gets nothing from the massless one either.
    assert_eq!(bodies[1].velocity, Vector2::ZERO);
}

#[test]
fn forces_and_accelerations_are_zero_after_every_step() {
    let config = SimConfig::default();
    let mut bodies = vec![
        disc(0.0, 0.0, 0.5, 100.0),
        disc(4.0, 0.0, 0.5, 1.0),
        disc(0.0, 7.0, 0.5, 3.0),
        disc(0.4, 0.3, 0.5, 2.0),
    ];
    for _ in 0..50 {
        step(&mut bodies, 0.02, &config);
        for body in &bodies {
            assert_eq!(body.force, Vector2::ZERO);
            assert_eq!(body.acceleration, Vector2::ZERO);
        }
    }
}

#[test]
fn last_position_is_pre_integration_position() {
    let config = SimConfig::default();
    let mut bodies = vec![disc(2.0, 3.0, 0.5, 1.0).with_velocity(Vector2::new(4.0, 0.0))];
    step(&mut bodies, 1.0, &config);
    assert_eq!(bodies[0].last_position, Vector2::new(2.0, 3.0));
    assert_eq!(bodies[0].position, Vector2::new(4.0, 3.0));
}

#[test]
fn later_body_sees_earlier_resolution_in_same_tick() {
    // Body 0 is pushed by the heavier body 1 during body 0's own pass, and
    // body 1 then evaluates against the already-moved body 0.
    let config = SimConfig::default();
    let mut bodies = vec![disc(0.0, 0.0, 1.0, 1.0), disc(1.0, 0.0, 1.0, 5.0)];
    let report = step(&mut bodies, 0.0, &config);

    // Overlap -1 shrank to -0.8 after body 0's pushback, then to -0.64
    // after body 1's own pass pushed body 0 again.
    assert_eq!(report.contacts.len(), 2);
    let gap = check_radius_overlap(&bodies[0], &bodies[1]).edge_to_edge_distance;
    assert!((gap + 0.64).abs() < 1e-12, "gap = {gap}");
    assert_eq!(bodies[1].position, Vector2::new(1.0, 0.0));
}

#[test]
fn bare_body_is_candidate_but_never_evaluated() {
    let config = SimConfig::default();
    let wall = Body::at(Vector2::new(1.5, 0.0))
        .with_inner_radius(1.0)
        .with_mass(50.0);
    let mut bodies = vec![disc(0.0, 0.0, 1.0, 1.0).with_velocity(Vector2::new(1.0, 0.0)), wall];

    let report = step(&mut bodies, 0.1, &config);
    assert_eq!(report.contacts, vec![Contact { body: 0, other: 1 }]);
    assert_eq!(report.bodies_moved, 1);
    assert!(bodies[1].colliding.is_empty());
    assert!(!bodies[1].is_colliding);
}

#[test]
fn rotation_is_not_driven_by_step() {
    let config = SimConfig::default();
    let mut bodies = vec![disc(0.0, 0.0, 1.0, 1.0).with_angular_velocity(2.0)];
    step(&mut bodies, 1.0, &config);
    assert_eq!(bodies[0].rotation, 0.0);
    rotate(&mut bodies[0], 1.0);
    assert_eq!(bodies[0].rotation, 2.0);
}
