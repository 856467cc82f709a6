//! Simulation snapshot and restore with BLAKE3 hashing.
//!
//! Provides [`SimulationSnapshot`] -- a serializable copy of everything that
//! determines the next tick (bodies, kernel configuration, tick counter, fixed
//! dt, pending input) together with a BLAKE3 digest of that state for
//! integrity checks and determinism testing.
//!
//! Non-physical bodies (NaN or infinite position or velocity) are part of the
//! state too. Their non-finite components are written as `"NaN"`, `"inf"` or
//! `"-inf"`, so such a snapshot reads back from JSON and its hash tells NaN
//! apart from the infinities.
//!
//! # Usage
//!
//! ```
//! use orrery_engine::prelude::*;
//!
//! let mut tick_loop = Scene::orbit_pair(SimConfig::default())
//!     .into_tick_loop()
//!     .unwrap();
//! tick_loop.run_ticks(10);
//!
//! let snapshot = tick_loop.capture_snapshot();
//! assert_eq!(snapshot.tick_counter, 10);
//! assert_eq!(snapshot.hash.len(), 64); // BLAKE3 hex digest
//!
//! tick_loop.run_ticks(10);
//! tick_loop.restore_from_snapshot(&snapshot).unwrap();
//! assert_eq!(tick_loop.tick_count(), 10);
//! assert_eq!(tick_loop.state_hash(), snapshot.hash);
//! ```
//!
//! # What Is NOT Serialized
//!
//! - **Events** -- the event log is cleared on restore.
//! - **Diagnostics** -- per-tick timing is transient.

use serde::{Deserialize, Serialize};

use orrery_core::body::Body;
use orrery_core::config::SimConfig;

use crate::tick::{InputFrame, TickLoop};

// ---------------------------------------------------------------------------
// SimulationSnapshot
// ---------------------------------------------------------------------------

/// A serializable snapshot of the full simulation state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    /// Every body, in collection order.
    pub bodies: Vec<Body>,
    /// Kernel constants in effect.
    pub config: SimConfig,
    /// Number of ticks executed at the time of capture.
    pub tick_counter: u64,
    /// Fixed time step in seconds per tick.
    pub fixed_dt: f64,
    /// Input pending for the next tick at the time of capture.
    pub current_input: InputFrame,
    /// BLAKE3 hex digest (64 lowercase hex chars) of the fields above.
    pub hash: String,
}

impl SimulationSnapshot {
    /// Recompute the digest from the snapshot's contents and compare it with
    /// the recorded one.
    pub fn verify(&self) -> bool {
        compute_hash(
            &self.bodies,
            &self.config,
            self.tick_counter,
            self.fixed_dt,
            &self.current_input,
        ) == self.hash
    }
}

// ---------------------------------------------------------------------------
// Hashing helpers
// ---------------------------------------------------------------------------

/// BLAKE3 hex digest of the canonical JSON encoding of the hashable state.
///
/// Field order is fixed by the wrapper struct, so equal state always
/// serializes to equal bytes.
fn compute_hash(
    bodies: &[Body],
    config: &SimConfig,
    tick_counter: u64,
    fixed_dt: f64,
    input: &InputFrame,
) -> String {
    #[derive(Serialize)]
    struct HashableState<'a> {
        bodies: &'a [Body],
        config: &'a SimConfig,
        tick_counter: u64,
        fixed_dt: f64,
        current_input: &'a InputFrame,
    }

    let hashable = HashableState {
        bodies,
        config,
        tick_counter,
        fixed_dt,
        current_input: input,
    };

    let mut hasher = blake3::Hasher::new();
    // Plain data with string keys; serializing into an in-memory hasher
    // cannot fail.
    if let Err(e) = serde_json::to_writer(&mut hasher, &hashable) {
        tracing::error!(error = %e, "simulation state failed to serialize for hashing");
    }
    hasher.finalize().to_hex().to_string()
}

// ---------------------------------------------------------------------------
// TickLoop snapshot/restore methods
// ---------------------------------------------------------------------------

impl TickLoop {
    /// Capture a complete snapshot of the simulation state.
    pub fn capture_snapshot(&self) -> SimulationSnapshot {
        let bodies = self.bodies().to_vec();
        let config = self.sim_config().clone();
        let tick_counter = self.tick_count();
        let fixed_dt = self.fixed_dt();
        let current_input = self.current_input().clone();

        let hash = compute_hash(&bodies, &config, tick_counter, fixed_dt, &current_input);

        SimulationSnapshot {
            bodies,
            config,
            tick_counter,
            fixed_dt,
            current_input,
            hash,
        }
    }

    /// Restore the simulation state from a previously captured snapshot.
    ///
    /// The snapshot is checked before anything is touched: its `fixed_dt`
    /// must be positive and finite, its configuration must validate, and its
    /// recorded hash must match the recomputed one. On success the event log
    /// and diagnostics are reset.
    ///
    /// # Errors
    ///
    /// Returns an error if any of those checks fails. The tick loop is left
    /// unmodified in that case.
    pub fn restore_from_snapshot(
        &mut self,
        snapshot: &SimulationSnapshot,
    ) -> Result<(), anyhow::Error> {
        if !(snapshot.fixed_dt > 0.0 && snapshot.fixed_dt.is_finite()) {
            return Err(anyhow::anyhow!(
                "snapshot has invalid fixed_dt: {}. Must be positive and finite.",
                snapshot.fixed_dt
            ));
        }

        snapshot
            .config
            .validate()
            .map_err(|e| anyhow::anyhow!("snapshot has invalid config: {e}"))?;

        let expected_hash = compute_hash(
            &snapshot.bodies,
            &snapshot.config,
            snapshot.tick_counter,
            snapshot.fixed_dt,
            &snapshot.current_input,
        );
        if expected_hash != snapshot.hash {
            return Err(anyhow::anyhow!(
                "snapshot hash mismatch: recorded {} but recomputed {}. \
                 The snapshot may be corrupted or tampered with.",
                snapshot.hash,
                expected_hash
            ));
        }

        self.replace_state(
            snapshot.bodies.clone(),
            snapshot.config.clone(),
            snapshot.tick_counter,
            snapshot.fixed_dt,
            snapshot.current_input.clone(),
        );

        tracing::info!(
            tick = snapshot.tick_counter,
            bodies = snapshot.bodies.len(),
            "restored simulation snapshot"
        );
        Ok(())
    }

    /// The BLAKE3 digest of the current state, without keeping a snapshot.
    pub fn state_hash(&self) -> String {
        compute_hash(
            self.bodies(),
            self.sim_config(),
            self.tick_count(),
            self.fixed_dt(),
            self.current_input(),
        )
    }

    /// Capture a branch point. Identical to
    /// [`capture_snapshot`](Self::capture_snapshot).
    pub fn fork_snapshot(&self) -> SimulationSnapshot {
        self.capture_snapshot()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
