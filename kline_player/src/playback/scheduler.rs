//! Repeating-timer abstraction driving playback ticks.
//!
//! A scheduler does not call back into the controller. Each registered timer
//! is identified by a [`TimerId`]; when it fires, the owner's event loop hands
//! that id to [`PlaybackController::on_timer`](super::PlaybackController::on_timer),
//! which ignores ids that are no longer active. This keeps all state mutation
//! on one thread and makes cancelled timers harmless even if a firing is
//! already queued.

use std::{collections::BTreeMap, time::Duration};

/// Identity of one registered repeating timer. Ids are never reused by a
/// scheduler instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub(crate) u64);

pub trait Scheduler {
    /// Registers a timer that fires every `period`, first after one period.
    fn schedule_repeating(&mut self, period: Duration) -> TimerId;

    /// Unregisters `id`. Unknown or already cancelled ids are ignored.
    fn cancel(&mut self, id: TimerId);
}

#[derive(Debug, Clone, Copy)]
struct ManualTimer {
    period: Duration,
    next_due: Duration,
}

/// Deterministic scheduler on a virtual clock.
///
/// Nothing fires on its own; [`ManualScheduler::fire_next`] pops due timers in
/// chronological order while the clock is moved forward.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    now: Duration,
    next_id: u64,
    timers: BTreeMap<TimerId, ManualTimer>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since creation.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of currently registered timers.
    pub fn active_timers(&self) -> usize {
        self.timers.len()
    }

    /// Period of a registered timer.
    pub fn period_of(&self, id: TimerId) -> Option<Duration> {
        self.timers.get(&id).map(|t| t.period)
    }

    /// Fires the earliest timer due at or before `deadline`, moving the clock
    /// to its due time. Timers due at the same instant fire in registration
    /// order (lower [`TimerId`] first). Returns `None` (and moves the clock to
    /// `deadline`) when nothing else is due.
    pub fn fire_next(&mut self, deadline: Duration) -> Option<TimerId> {
        let due = self
            .timers
            .iter()
            .filter(|(_, t)| t.next_due <= deadline)
            .min_by_key(|(id, t)| (t.next_due, **id))
            .map(|(id, _)| *id);

        match due {
            Some(id) => {
                if let Some(timer) = self.timers.get_mut(&id) {
                    self.now = timer.next_due;
                    timer.next_due += timer.period;
                }
                Some(id)
            }
            None => {
                self.now = self.now.max(deadline);
                None
            }
        }
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_repeating(&mut self, period: Duration) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.insert(
            id,
            ManualTimer {
                period,
                next_due: self.now + period,
            },
        );
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.timers.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn fires_on_period_boundaries() {
        let mut s = ManualScheduler::new();
        let id = s.schedule_repeating(ms(100));

        assert_eq!(s.fire_next(ms(99)), None);
        assert_eq!(s.now(), ms(99));
        assert_eq!(s.fire_next(ms(250)), Some(id));
        assert_eq!(s.now(), ms(100));
        assert_eq!(s.fire_next(ms(250)), Some(id));
        assert_eq!(s.now(), ms(200));
        assert_eq!(s.fire_next(ms(250)), None);
        assert_eq!(s.now(), ms(250));
    }

    #[test]
    fn interleaves_timers_chronologically() {
        let mut s = ManualScheduler::new();
        let slow = s.schedule_repeating(ms(300));
        let fast = s.schedule_repeating(ms(200));

        let mut fired = Vec::new();
        while let Some(id) = s.fire_next(ms(600)) {
            fired.push(id);
        }
        // both are due at 600ms; the earlier registration wins the tie
        assert_eq!(fired, vec![fast, slow, fast, slow, fast]);
    }

    #[test]
    fn cancelled_timer_never_fires_and_ids_are_fresh() {
        let mut s = ManualScheduler::new();
        let a = s.schedule_repeating(ms(10));
        s.cancel(a);
        s.cancel(a);
        assert_eq!(s.active_timers(), 0);
        assert_eq!(s.fire_next(ms(100)), None);

        let b = s.schedule_repeating(ms(10));
        assert_ne!(a, b);
        // first firing is one period after registration
        assert_eq!(s.period_of(b), Some(ms(10)));
        assert_eq!(s.fire_next(ms(109)), None);
        assert_eq!(s.fire_next(ms(110)), Some(b));
    }
}
