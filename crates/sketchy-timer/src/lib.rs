//! One-shot cancellable timers for Sketchy.
//!
//! Every timed phase of a game (round intro, word pick, drawing, reveal,
//! result screen, matchmaking countdown) is a single delayed event. This
//! crate provides the primitive behind them:
//!
//! - [`Scheduler::schedule`] arms a timer and returns a [`TimerToken`].
//! - [`Scheduler::cancel`] disarms it. Cancelling a timer that already
//!   fired (or was already cancelled) is a no-op.
//! - When a timer fires, its event comes back as a [`Fired`] value carrying
//!   the token, so the receiver can tell a live fire from a stale one.
//!
//! Timers never run callbacks. They hand an event value back to whoever
//! owns the game state, which keeps all mutation on one logical thread.
//!
//! # Implementations
//!
//! - [`TokioScheduler`]: each timer is a Tokio task that sleeps and then
//!   sends its [`Fired`] event into an mpsc channel.
//! - [`ManualScheduler`]: a virtual clock driven by the caller. Used to
//!   step a game through its phases deterministically.
//!
//! # Integration
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(event) = inbound_rx.recv() => { /* connection events */ }
//!         Some(fired) = timer_rx.recv() => manager.on_timer(fired),
//!     }
//! }
//! ```

mod manual;
mod tokio_scheduler;

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub use manual::ManualScheduler;
pub use tokio_scheduler::TokioScheduler;

/// Handle to one armed timer.
///
/// Tokens are never reused within a scheduler, so comparing a fired token
/// against the one a caller stored is enough to detect stale fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(u64);

impl TimerToken {
    /// Creates a token from a raw sequence number.
    pub fn new(seq: u64) -> Self {
        Self(seq)
    }

    /// Returns the raw sequence number.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

/// A timer that went off, with the event it was armed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<E> {
    pub token: TimerToken,
    pub event: E,
}

/// Schedules one-shot events.
pub trait Scheduler<E> {
    /// Current wall-clock time in milliseconds since the Unix epoch.
    ///
    /// Used for the absolute countdown deadlines shown to clients.
    fn now_millis(&self) -> u64;

    /// Arms a timer that delivers `event` once `delay` has elapsed.
    fn schedule(&mut self, delay: Duration, event: E) -> TimerToken;

    /// Disarms a timer. Returns `true` if it was still pending.
    fn cancel(&mut self, token: TimerToken) -> bool;

    /// Number of timers armed and not yet fired or cancelled.
    fn pending(&self) -> usize;
}

/// Milliseconds since the Unix epoch according to the system clock.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Converts a duration to whole milliseconds, saturating at `u64::MAX`.
pub fn as_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
