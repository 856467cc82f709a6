//! Per-tick simulation events.
//!
//! The kernel reports contacts and damage through its [`StepReport`]; the
//! tick loop turns each report into [`SimEvent`]s stamped with the tick that
//! produced them and appends them to an [`EventLog`]. Hosts drain the log
//! whenever they are ready to react.
//!
//! The log is a rolling window: once it holds `max_events` undrained events,
//! each new event evicts the oldest one. A host that never drains still runs
//! in bounded memory but only sees the most recent events.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use orrery_core::step::StepReport;

/// Something observable that happened during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimEvent {
    /// `body` overlapped `other` while resolving its collisions.
    Collision { tick: u64, body: usize, other: usize },
    /// `body` took `amount` damage from its contact with `other`.
    Damage {
        tick: u64,
        body: usize,
        other: usize,
        amount: u32,
    },
}

impl SimEvent {
    /// The tick during which the event happened.
    pub fn tick(&self) -> u64 {
        match *self {
            SimEvent::Collision { tick, .. } | SimEvent::Damage { tick, .. } => tick,
        }
    }

    /// The body the event is about.
    pub fn body(&self) -> usize {
        match *self {
            SimEvent::Collision { body, .. } | SimEvent::Damage { body, .. } => body,
        }
    }
}

/// Default number of undrained events an [`EventLog`] retains.
pub const DEFAULT_MAX_EVENTS: usize = 65_536;

/// Ordered buffer of events not yet consumed by the host.
#[derive(Debug, Clone)]
pub struct EventLog {
    events: VecDeque<SimEvent>,
    /// Maximum number of events to retain before evicting the oldest.
    max_events: usize,
    /// Events evicted since the log was created.
    evicted: u64,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::with_max_events(DEFAULT_MAX_EVENTS)
    }
}

impl EventLog {
    /// Create a log retaining up to [`DEFAULT_MAX_EVENTS`] events.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a log retaining up to `max_events` undrained events.
    pub fn with_max_events(max_events: usize) -> Self {
        Self {
            events: VecDeque::new(),
            max_events,
            evicted: 0,
        }
    }

    /// Append the events of one step: all collisions in contact order, then
    /// all damage in the order it was dealt.
    pub fn record_step(&mut self, tick: u64, report: &StepReport) {
        for contact in &report.contacts {
            self.push(SimEvent::Collision {
                tick,
                body: contact.body,
                other: contact.other,
            });
        }
        for event in &report.damage {
            self.push(SimEvent::Damage {
                tick,
                body: event.body,
                other: event.other,
                amount: event.amount,
            });
        }
    }

    /// Append one event, evicting the oldest if the log is full.
    pub fn push(&mut self, event: SimEvent) {
        self.events.push_back(event);
        while self.events.len() > self.max_events {
            self.events.pop_front();
            if self.evicted == 0 {
                tracing::warn!(
                    max_events = self.max_events,
                    "event log full; evicting oldest events until drained"
                );
            }
            self.evicted += 1;
        }
    }

    /// Remove and return every buffered event, oldest first.
    pub fn drain(&mut self) -> Vec<SimEvent> {
        self.events.drain(..).collect()
    }

    pub fn max_events(&self) -> usize {
        self.max_events
    }

    /// Total number of events evicted unread.
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    pub fn iter(&self) -> impl Iterator<Item = &SimEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
