//! Cancellable Timers
//!
//! The engine never sleeps. It records which timers should exist and emits
//! [`TimerCommand`]s; the session turns those into real tokio timers and
//! feeds expiries back as [`TimerId`]s.
//!
//! At most one timer per [`TimerPurpose`] is live. Scheduling a purpose
//! that is already live cancels the old one first, and an expiry whose id
//! is no longer live is stale and ignored.

use std::collections::BTreeMap;
use std::time::Duration;
use serde::{Serialize, Deserialize};

/// Monotonic timer identifier, never reused within a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerId(pub u64);

/// What a timer guards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPurpose {
    /// Current player's consideration time.
    Turn,
    /// Claim window freeze after a discard.
    ClaimWindow,
    /// Rob-the-kong window after an extended kong.
    RobKong,
}

/// A live timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerHandle {
    /// Identifier reported back on expiry.
    pub id: TimerId,
    /// What it guards.
    pub purpose: TimerPurpose,
    /// Delay until expiry.
    pub duration: Duration,
}

/// Instruction for the session's timer driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerCommand {
    /// Start a timer.
    Schedule(TimerHandle),
    /// Abort a timer if it has not fired yet.
    Cancel(TimerId),
}

/// Live timers of one match plus the commands not yet handed out.
#[derive(Clone, Debug, Default)]
pub struct TimerSet {
    live: BTreeMap<TimerPurpose, TimerHandle>,
    next_id: u64,
    commands: Vec<TimerCommand>,
}

impl TimerSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a timer for `purpose`, cancelling any live one first.
    pub fn schedule(&mut self, purpose: TimerPurpose, duration: Duration) -> TimerId {
        self.cancel(purpose);

        let id = TimerId(self.next_id);
        self.next_id += 1;

        let handle = TimerHandle { id, purpose, duration };
        self.live.insert(purpose, handle);
        self.commands.push(TimerCommand::Schedule(handle));
        id
    }

    /// Cancel the live timer for `purpose`, if any.
    pub fn cancel(&mut self, purpose: TimerPurpose) -> Option<TimerId> {
        let handle = self.live.remove(&purpose)?;
        self.commands.push(TimerCommand::Cancel(handle.id));
        Some(handle.id)
    }

    /// Cancel everything.
    pub fn cancel_all(&mut self) {
        let purposes: Vec<TimerPurpose> = self.live.keys().copied().collect();
        for purpose in purposes {
            self.cancel(purpose);
        }
    }

    /// Consume an expiry.
    ///
    /// Returns the purpose if `id` was live; stale ids return `None`.
    pub fn fire(&mut self, id: TimerId) -> Option<TimerPurpose> {
        let purpose = self.live.iter().find(|(_, h)| h.id == id).map(|(p, _)| *p)?;
        self.live.remove(&purpose);
        Some(purpose)
    }

    /// Live timer for `purpose`.
    pub fn get(&self, purpose: TimerPurpose) -> Option<&TimerHandle> {
        self.live.get(&purpose)
    }

    /// Number of live timers.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Take the commands accumulated since the last call.
    pub fn take_commands(&mut self) -> Vec<TimerCommand> {
        std::mem::take(&mut self.commands)
    }
}
