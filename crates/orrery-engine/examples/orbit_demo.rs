//! Headless orbit demo.
//!
//! Runs a two-body orbit, a head-on collision and a seeded random cluster for
//! a few simulated seconds each and prints a summary line per scene. Set
//! `RUST_LOG=debug` to see per-tick diagnostics and damage reports.
//!
//! Run with: `cargo run --example orbit_demo`

use orrery_engine::prelude::*;
use tracing_subscriber::EnvFilter;

fn run(name: &str, scene: Scene, seconds: f64) -> anyhow::Result<()> {
    let mut tick_loop = scene.into_tick_loop()?;
    let ticks = (seconds / tick_loop.fixed_dt()).round() as u64;
    let start_energy = {
        tick_loop.tick();
        tick_loop.last_diagnostics().kinetic_energy
    };

    let contacts = tick_loop.run_ticks(ticks.saturating_sub(1));
    let events = tick_loop.drain_events();
    let damage: u32 = events
        .iter()
        .map(|event| match event {
            SimEvent::Damage { amount, .. } => *amount,
            SimEvent::Collision { .. } => 0,
        })
        .sum();
    let diagnostics = tick_loop.last_diagnostics();

    println!(
        "{name:>8}: {ticks} ticks, t = {:.2}s, contacts = {contacts}, damage = {damage}, \
         kinetic energy {:.3} -> {:.3}, hash = {}",
        tick_loop.sim_time(),
        start_energy,
        diagnostics.kinetic_energy,
        &tick_loop.state_hash()[..16],
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let config = SimConfig::default();
    run("orbit", Scene::orbit_pair(config.clone()), 20.0)?;
    run("head-on", Scene::head_on_pair(config.clone(), 3.0), 5.0)?;
    run("cluster", Scene::random_cluster(config, 2024, 48, 15.0), 5.0)?;
    Ok(())
}
