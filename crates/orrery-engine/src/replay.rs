//! Deterministic replay with input recording and checkpoint verification.
//!
//! A [`ReplayRecorder`] captures the [`InputFrame`] consumed by each tick and
//! a state hash every `checkpoint_interval` ticks, producing a [`ReplayLog`].
//! [`replay`] restores the log's initial snapshot on a [`TickLoop`], feeds the
//! recorded inputs back tick by tick, and compares hashes at each checkpoint.
//!
//! # Recording and replaying
//!
//! ```
//! use orrery_engine::prelude::*;
//!
//! let mut tick_loop = Scene::head_on_pair(SimConfig::default(), 2.0)
//!     .into_tick_loop()
//!     .unwrap();
//! let mut recorder = ReplayRecorder::new(tick_loop.capture_snapshot(), 10);
//!
//! for tick in 0..60u64 {
//!     if tick == 5 {
//!         tick_loop.set_input(InputFrame::new().with_impulse(0, Vector2::new(0.0, 1.0)));
//!     }
//!     recorder.record(&tick_loop);
//!     tick_loop.tick();
//! }
//! let log = recorder.finish();
//!
//! let result = replay(&mut tick_loop, &log).unwrap();
//! assert!(result.completed);
//! assert!(result.first_divergence.is_none());
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::snapshot::SimulationSnapshot;
use crate::tick::{InputFrame, TickLoop};

// ---------------------------------------------------------------------------
// ReplayLog
// ---------------------------------------------------------------------------

/// An initial snapshot plus the ordered inputs and checkpoints recorded from
/// it. Serializable to JSON for regression fixtures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayLog {
    /// Replay begins by restoring this snapshot.
    pub initial_snapshot: SimulationSnapshot,
    /// Number of ticks to execute from the initial snapshot.
    pub total_ticks: u64,
    pub entries: Vec<ReplayEntry>,
}

impl ReplayLog {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn checkpoint_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(entry, ReplayEntry::Checkpoint { .. }))
            .count()
    }

    pub fn input_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(entry, ReplayEntry::Input { .. }))
            .count()
    }
}

/// A single entry in a [`ReplayLog`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReplayEntry {
    /// The non-empty input consumed by the tick numbered `tick`.
    Input { tick: u64, input: InputFrame },
    /// State hash taken before the tick numbered `tick` ran, with that
    /// tick's input already pending.
    Checkpoint { tick: u64, state_hash: String },
}

// ---------------------------------------------------------------------------
// ReplayResult
// ---------------------------------------------------------------------------

/// The outcome of replaying a [`ReplayLog`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayResult {
    /// Whether every recorded tick was replayed.
    pub completed: bool,
    pub ticks_replayed: u64,
    /// The first checkpoint whose hash did not match. `None` when the replay
    /// was deterministic.
    pub first_divergence: Option<ReplayDivergence>,
}

/// A checkpoint whose replayed hash differs from the recorded one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayDivergence {
    pub tick: u64,
    pub expected_hash: String,
    pub actual_hash: String,
}

// ---------------------------------------------------------------------------
// ReplayRecorder
// ---------------------------------------------------------------------------

/// Records a simulation run into a [`ReplayLog`].
///
/// Call [`record`](Self::record) (or [`record_tick`](Self::record_tick))
/// once before each tick, after setting that tick's input. Ticks must be
/// recorded in strictly increasing order.
pub struct ReplayRecorder {
    log: ReplayLog,
    /// Checkpoint every this many ticks. 0 checkpoints whenever a hash is
    /// supplied.
    checkpoint_interval: u64,
    ticks_recorded: u64,
    last_tick: Option<u64>,
}

impl ReplayRecorder {
    pub fn new(snapshot: SimulationSnapshot, checkpoint_interval: u64) -> Self {
        Self {
            log: ReplayLog {
                initial_snapshot: snapshot,
                total_ticks: 0,
                entries: Vec::new(),
            },
            checkpoint_interval,
            ticks_recorded: 0,
            last_tick: None,
        }
    }

    /// Record the tick `tick_loop` is about to run: its pending input, and a
    /// checkpoint of its state hash when the tick falls on the interval.
    pub fn record(&mut self, tick_loop: &TickLoop) {
        let tick = tick_loop.tick_count();
        let hash = self
            .is_checkpoint_tick(tick)
            .then(|| tick_loop.state_hash());
        self.record_tick(tick, tick_loop.current_input(), hash);
    }

    /// Record a single tick from its parts.
    ///
    /// Empty inputs are not stored; replay feeds an empty frame for any tick
    /// without an entry. A checkpoint is stored when `state_hash` is given
    /// and the tick falls on the interval.
    ///
    /// # Panics
    ///
    /// Panics if `tick` is not strictly greater than the previously recorded
    /// tick.
    pub fn record_tick(&mut self, tick: u64, input: &InputFrame, state_hash: Option<String>) {
        if let Some(prev) = self.last_tick {
            assert!(
                tick > prev,
                "ReplayRecorder::record_tick: tick {tick} is not strictly greater than previous tick {prev}"
            );
        }
        self.last_tick = Some(tick);
        self.ticks_recorded += 1;

        if !input.is_empty() {
            self.log.entries.push(ReplayEntry::Input {
                tick,
                input: input.clone(),
            });
        }

        if let Some(state_hash) = state_hash {
            if self.is_checkpoint_tick(tick) {
                self.log
                    .entries
                    .push(ReplayEntry::Checkpoint { tick, state_hash });
            }
        }
    }

    fn is_checkpoint_tick(&self, tick: u64) -> bool {
        self.checkpoint_interval == 0 || tick % self.checkpoint_interval == 0
    }

    /// Finish recording and return the completed [`ReplayLog`].
    pub fn finish(mut self) -> ReplayLog {
        self.log.total_ticks = self.ticks_recorded;
        self.log
    }
}

// ---------------------------------------------------------------------------
// replay()
// ---------------------------------------------------------------------------

/// Replay `log` on `tick_loop`, verifying determinism at each checkpoint.
///
/// For every tick in `[start, start + total_ticks)` the recorded input (or an
/// empty frame) is set, the checkpoint for that tick (if any) is compared,
/// and the tick is executed. Replay stops at the first divergence.
///
/// # Errors
///
/// Returns an error if the log has duplicate entries for a tick, if its tick
/// range overflows, or if the initial snapshot cannot be restored. The log is
/// validated before `tick_loop` is touched.
pub fn replay(tick_loop: &mut TickLoop, log: &ReplayLog) -> Result<ReplayResult, anyhow::Error> {
    let mut inputs: BTreeMap<u64, &InputFrame> = BTreeMap::new();
    let mut checkpoints: BTreeMap<u64, &str> = BTreeMap::new();

    for entry in &log.entries {
        match entry {
            ReplayEntry::Input { tick, input } => {
                if inputs.insert(*tick, input).is_some() {
                    return Err(anyhow::anyhow!(
                        "replay log contains duplicate Input entry at tick {tick}"
                    ));
                }
            }
            ReplayEntry::Checkpoint { tick, state_hash } => {
                if checkpoints.insert(*tick, state_hash.as_str()).is_some() {
                    return Err(anyhow::anyhow!(
                        "replay log contains duplicate Checkpoint entry at tick {tick}"
                    ));
                }
            }
        }
    }

    let start_tick = log.initial_snapshot.tick_counter;
    let end_tick = start_tick.checked_add(log.total_ticks).ok_or_else(|| {
        anyhow::anyhow!(
            "tick range overflow: start_tick ({start_tick}) + total_ticks ({}) exceeds u64::MAX",
            log.total_ticks
        )
    })?;

    tick_loop
        .restore_from_snapshot(&log.initial_snapshot)
        .map_err(|e| anyhow::anyhow!("failed to restore initial snapshot for replay: {e}"))?;

    let mut ticks_replayed: u64 = 0;
    for tick in start_tick..end_tick {
        // The recorded hash was taken with this tick's input already pending.
        let input = inputs.get(&tick).map(|&input| input.clone()).unwrap_or_default();
        tick_loop.set_input(input);

        if let Some(&expected_hash) = checkpoints.get(&tick) {
            let actual_hash = tick_loop.state_hash();
            if actual_hash != expected_hash {
                tracing::warn!(
                    tick,
                    expected = expected_hash,
                    actual = %actual_hash,
                    "replay diverged"
                );
                return Ok(ReplayResult {
                    completed: false,
                    ticks_replayed,
                    first_divergence: Some(ReplayDivergence {
                        tick,
                        expected_hash: expected_hash.to_owned(),
                        actual_hash,
                    }),
                });
            }
        }

        tick_loop.tick();
        ticks_replayed += 1;
    }

    Ok(ReplayResult {
        completed: true,
        ticks_replayed,
        first_divergence: None,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;
    use orrery_core::config::SimConfig;

    fn recorded(ticks: u64, interval: u64) -> (TickLoop, ReplayLog) {
        let mut tick_loop = Scene::orbit_pair(SimConfig::default())
            .into_tick_loop()
            .unwrap();
        let mut recorder = ReplayRecorder::new(tick_loop.capture_snapshot(), interval);
        for _ in 0..ticks {
            recorder.record(&tick_loop);
            tick_loop.tick();
        }
        (tick_loop, recorder.finish())
    }

    #[test]
    fn recorder_checkpoints_on_interval() {
        let (_, log) = recorded(25, 10);
        assert_eq!(log.total_ticks, 25);
        assert_eq!(log.checkpoint_count(), 3); // ticks 0, 10, 20
        assert_eq!(log.input_count(), 0);
    }

    #[test]
    fn zero_interval_checkpoints_every_recorded_tick() {
        let (_, log) = recorded(5, 0);
        assert_eq!(log.checkpoint_count(), 5);
    }

    #[test]
    #[should_panic(expected = "not strictly greater")]
    fn recorder_rejects_non_monotonic_ticks() {
        let (tick_loop, _) = recorded(0, 1);
        let mut recorder = ReplayRecorder::new(tick_loop.capture_snapshot(), 1);
        recorder.record_tick(3, &InputFrame::default(), None);
        recorder.record_tick(3, &InputFrame::default(), None);
    }

    #[test]
    fn empty_log_replays_trivially() {
        let (mut tick_loop, log) = recorded(0, 10);
        let result = replay(&mut tick_loop, &log).unwrap();
        assert!(result.completed);
        assert_eq!(result.ticks_replayed, 0);
    }

    #[test]
    fn duplicate_entries_are_rejected_before_restore() {
        let (mut tick_loop, mut log) = recorded(3, 1);
        log.entries.push(ReplayEntry::Checkpoint {
            tick: 0,
            state_hash: "00".repeat(32),
        });
        let before = tick_loop.state_hash();
        let err = replay(&mut tick_loop, &log).unwrap_err();
        assert!(err.to_string().contains("duplicate Checkpoint"), "{err}");
        assert_eq!(tick_loop.state_hash(), before);
    }
}
