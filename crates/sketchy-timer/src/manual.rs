//! Virtual-clock scheduler for deterministic tests and simulations.

use std::time::Duration;

use crate::{Fired, Scheduler, TimerToken, as_millis};

#[derive(Debug)]
struct Pending<E> {
    token: TimerToken,
    due: u64,
    event: E,
}

/// A scheduler whose clock only moves when the caller moves it.
///
/// Timers are stored, not run. Drive them with [`ManualScheduler::next_due`]
/// in a loop, feeding each [`Fired`] event back into the code under test:
///
/// ```
/// use std::time::Duration;
/// use sketchy_timer::{ManualScheduler, Scheduler};
///
/// let mut clock = ManualScheduler::new(1_000);
/// clock.schedule(Duration::from_millis(500), "reveal");
///
/// assert!(clock.next_due(1_499).is_none());
/// let fired = clock.next_due(10_000).unwrap();
/// assert_eq!(fired.event, "reveal");
/// assert_eq!(clock.now_millis(), 1_500);
/// ```
#[derive(Debug)]
pub struct ManualScheduler<E> {
    now: u64,
    pending: Vec<Pending<E>>,
    next_token: u64,
}

impl<E> ManualScheduler<E> {
    /// Creates a scheduler whose clock starts at `epoch_ms`.
    pub fn new(epoch_ms: u64) -> Self {
        Self {
            now: epoch_ms,
            pending: Vec::new(),
            next_token: 1,
        }
    }

    /// Pops the earliest timer due at or before `deadline_ms`.
    ///
    /// The clock jumps to that timer's due time. Timers due at the same
    /// instant fire in the order they were armed. Returns `None` when
    /// nothing is due by the deadline; the clock is left unchanged.
    pub fn next_due(&mut self, deadline_ms: u64) -> Option<Fired<E>> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due <= deadline_ms)
            .min_by_key(|(_, p)| (p.due, p.token))
            .map(|(i, _)| i)?;

        let timer = self.pending.remove(idx);
        self.now = self.now.max(timer.due);
        Some(Fired {
            token: timer.token,
            event: timer.event,
        })
    }

    /// Pops the earliest pending timer regardless of how far away it is.
    pub fn fire_next(&mut self) -> Option<Fired<E>> {
        self.next_due(u64::MAX)
    }

    /// Moves the clock forward to `ms` without firing anything.
    ///
    /// Moving backwards is ignored.
    pub fn advance_to(&mut self, ms: u64) {
        self.now = self.now.max(ms);
    }

    /// Moves the clock forward by `by` without firing anything.
    pub fn advance(&mut self, by: Duration) {
        self.now = self.now.saturating_add(as_millis(by));
    }

    /// Due time of the earliest pending timer.
    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.iter().map(|p| p.due).min()
    }
}

impl<E: Clone> ManualScheduler<E> {
    /// Copies of all pending timers as they would fire, earliest first.
    ///
    /// Lets a test capture a fire, act on the state, and then deliver the
    /// captured fire late to check it is treated as stale.
    pub fn pending_events(&self) -> Vec<Fired<E>> {
        let mut all: Vec<_> = self.pending.iter().collect();
        all.sort_by_key(|p| (p.due, p.token));
        all.into_iter()
            .map(|p| Fired {
                token: p.token,
                event: p.event.clone(),
            })
            .collect()
    }
}

impl<E> Scheduler<E> for ManualScheduler<E> {
    fn now_millis(&self) -> u64 {
        self.now
    }

    fn schedule(&mut self, delay: Duration, event: E) -> TimerToken {
        let token = TimerToken::new(self.next_token);
        self.next_token += 1;
        self.pending.push(Pending {
            token,
            due: self.now.saturating_add(as_millis(delay)),
            event,
        });
        token
    }

    fn cancel(&mut self, token: TimerToken) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.token != token);
        self.pending.len() != before
    }

    fn pending(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_due_fires_in_due_order() {
        let mut clock = ManualScheduler::new(0);
        clock.schedule(Duration::from_millis(300), 'c');
        clock.schedule(Duration::from_millis(100), 'a');
        clock.schedule(Duration::from_millis(200), 'b');

        let order: Vec<char> = std::iter::from_fn(|| clock.fire_next())
            .map(|f| f.event)
            .collect();
        assert_eq!(order, vec!['a', 'b', 'c']);
        assert_eq!(clock.now_millis(), 300);
    }

    #[test]
    fn test_next_due_ties_fire_in_arm_order() {
        let mut clock = ManualScheduler::new(0);
        let first = clock.schedule(Duration::from_millis(50), 1);
        let second = clock.schedule(Duration::from_millis(50), 2);

        assert_eq!(clock.fire_next().unwrap().token, first);
        assert_eq!(clock.fire_next().unwrap().token, second);
    }

    #[test]
    fn test_next_due_respects_deadline() {
        let mut clock = ManualScheduler::new(1_000);
        clock.schedule(Duration::from_millis(500), ());

        assert!(clock.next_due(1_499).is_none());
        assert_eq!(clock.now_millis(), 1_000);
        assert!(clock.next_due(1_500).is_some());
        assert_eq!(clock.now_millis(), 1_500);
    }

    #[test]
    fn test_cancel_removes_pending_timer() {
        let mut clock = ManualScheduler::new(0);
        let token = clock.schedule(Duration::from_secs(1), ());
        assert_eq!(clock.pending(), 1);

        assert!(clock.cancel(token));
        assert_eq!(clock.pending(), 0);
        assert!(!clock.cancel(token), "second cancel is a no-op");
        assert!(clock.fire_next().is_none());
    }

    #[test]
    fn test_schedule_is_relative_to_advanced_clock() {
        let mut clock = ManualScheduler::new(0);
        clock.advance(Duration::from_secs(10));
        clock.schedule(Duration::from_secs(1), ());
        assert_eq!(clock.next_deadline(), Some(11_000));
    }

    #[test]
    fn test_advance_to_never_moves_backwards() {
        let mut clock: ManualScheduler<()> = ManualScheduler::new(5_000);
        clock.advance_to(1_000);
        assert_eq!(clock.now_millis(), 5_000);
    }

    #[test]
    fn test_pending_events_does_not_consume() {
        let mut clock = ManualScheduler::new(0);
        clock.schedule(Duration::from_millis(20), "late");
        clock.schedule(Duration::from_millis(10), "early");

        let snapshot = clock.pending_events();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].event, "early");
        assert_eq!(clock.pending(), 2);
    }
}
