//! Combat timer sequencer
//!
//! Cooperative "suspend for N seconds, resume later" primitive.
//! Замена корутинам: вместо стека исполнения храним фазу + deadline,
//! система тика опрашивает `poll(now)` и выполняет переход.
//!
//! - `start` - stop-then-restart: предыдущая pending фаза отменяется и возвращается
//! - `cancel` - переписывает состояние (никаких abort'ов)
//! - `poll` - возвращает фазу ровно один раз, когда deadline наступил

use serde::{Deserialize, Serialize};


/// Pending timed phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendingPhase<P> {
    pub phase: P,
    pub deadline: f32,
}

/// One suspension slot per kind of sequence (attack lifecycle, hit-stun, hit check).
///
/// Two sequences of the same kind never overlap on one actor: `start` replaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequencer<P> {
    pending: Option<PendingPhase<P>>,
}

impl<P> Default for Sequencer<P> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<P: Copy + PartialEq> Sequencer<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suspend in `phase` for `duration` seconds starting at `now`.
    ///
    /// Returns the phase that was cancelled to make room, if any.
    pub fn start(&mut self, phase: P, now: f32, duration: f32) -> Option<P> {
        let cancelled = self.cancel();
        self.pending = Some(PendingPhase {
            phase,
            deadline: now + duration.max(0.0),
        });
        cancelled
    }

    pub fn cancel(&mut self) -> Option<P> {
        self.pending.take().map(|pending| pending.phase)
    }

    /// Resume point: returns the phase once `now >= deadline`, clearing the slot.
    pub fn poll(&mut self, now: f32) -> Option<P> {
        match self.pending {
            Some(pending) if now >= pending.deadline => {
                self.pending = None;
                Some(pending.phase)
            }
            _ => None,
        }
    }

    /// `state == WAITING && now < deadline`
    pub fn is_waiting(&self, now: f32) -> bool {
        self.pending.is_some_and(|pending| now < pending.deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn phase(&self) -> Option<P> {
        self.pending.map(|pending| pending.phase)
    }
}

/// Wait a fixed number of scheduler ticks (animation settle), then hand over to a deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickDelay {
    remaining: u32,
}

impl TickDelay {
    pub fn new(ticks: u32) -> Self {
        Self { remaining: ticks }
    }

    /// Consume one tick. Returns `true` on the tick the delay is exhausted.
    pub fn tick(&mut self) -> bool {
        if self.remaining == 0 {
            return true;
        }
        self.remaining -= 1;
        self.remaining == 0
    }

    pub fn is_done(&self) -> bool {
        self.remaining == 0
    }
}
