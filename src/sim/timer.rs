//! Single-shot timer scheduler
//!
//! Timers are plain records `(fire_at_tick, action, id)`. They fire at the
//! start of the tick they are due, in `(fire_at, id)` order, on the same
//! thread as the rest of the simulation. Cancelling a timer that already
//! fired or was already cancelled does nothing.

use serde::{Deserialize, Serialize};

use super::registry::EntityId;

/// Cancel token for a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimerId(pub u64);

/// Deferred work the director and combat engine schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerAction {
    /// Place the current wave's ground adversaries
    SpawnWave,
    /// Clear the spawning flag after adversaries are registered
    SettleSpawn,
    /// Try to start the special event
    StartSpecialEvent,
    /// Special event countdown ran out
    SpecialEventExpired,
    /// Spawn one flying adversary during a rush
    SpawnFlyer,
    /// Rush window is over
    EndRush,
    /// Projectile time-to-live elapsed
    ExpireProjectile(EntityId),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Timer {
    id: TimerId,
    fire_at: u64,
    action: TimerAction,
}

/// Pending timers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scheduler {
    pending: Vec<Timer>,
    next_id: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `action` to fire at tick `now + delay_ticks`
    pub fn schedule(&mut self, now: u64, delay_ticks: u64, action: TimerAction) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.pending.push(Timer {
            id,
            fire_at: now.saturating_add(delay_ticks),
            action,
        });
        id
    }

    /// Cancel a timer. Returns false if it was not pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|t| t.id != id);
        self.pending.len() != before
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.iter().any(|t| t.id == id)
    }

    /// Tick at which a pending timer fires
    pub fn fire_at(&self, id: TimerId) -> Option<u64> {
        self.pending.iter().find(|t| t.id == id).map(|t| t.fire_at)
    }

    /// Remove and return every timer due at or before `now`, in firing order
    pub fn take_due(&mut self, now: u64) -> Vec<(TimerId, TimerAction)> {
        let mut due: Vec<Timer> = Vec::new();
        self.pending.retain(|t| {
            if t.fire_at <= now {
                due.push(t.clone());
                false
            } else {
                true
            }
        });
        due.sort_by_key(|t| (t.fire_at, t.id));
        due.into_iter().map(|t| (t.id, t.action)).collect()
    }

    /// Drop every pending timer
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
