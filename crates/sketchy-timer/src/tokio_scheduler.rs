//! Tokio-backed scheduler.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::trace;

use crate::{Fired, Scheduler, TimerToken, unix_millis};

/// Runs each timer as a Tokio task that sleeps, then sends its [`Fired`]
/// event into the channel given at construction.
///
/// Cancelling aborts the task. A fire that was already queued in the
/// channel before cancellation still arrives; receivers must compare the
/// token with the one they expect.
pub struct TokioScheduler<E> {
    tx: mpsc::UnboundedSender<Fired<E>>,
    tasks: HashMap<TimerToken, AbortHandle>,
    next_token: u64,
}

impl<E: Send + 'static> TokioScheduler<E> {
    /// Creates a scheduler that delivers fired events to `tx`.
    ///
    /// Must be used from within a Tokio runtime.
    pub fn new(tx: mpsc::UnboundedSender<Fired<E>>) -> Self {
        Self {
            tx,
            tasks: HashMap::new(),
            next_token: 1,
        }
    }

    /// Creates a scheduler together with the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Fired<E>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Forgets tasks that already completed.
    fn reap(&mut self) {
        self.tasks.retain(|_, handle| !handle.is_finished());
    }
}

impl<E: Send + 'static> Scheduler<E> for TokioScheduler<E> {
    fn now_millis(&self) -> u64 {
        unix_millis()
    }

    fn schedule(&mut self, delay: Duration, event: E) -> TimerToken {
        self.reap();

        let token = TimerToken::new(self.next_token);
        self.next_token += 1;

        let tx = self.tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The receiver is gone only when the game loop shut down.
            let _ = tx.send(Fired { token, event });
        });
        self.tasks.insert(token, task.abort_handle());

        trace!(%token, delay_ms = delay.as_millis() as u64, "timer armed");
        token
    }

    fn cancel(&mut self, token: TimerToken) -> bool {
        match self.tasks.remove(&token) {
            Some(handle) => {
                let was_pending = !handle.is_finished();
                handle.abort();
                trace!(%token, was_pending, "timer cancelled");
                was_pending
            }
            None => false,
        }
    }

    fn pending(&self) -> usize {
        self.tasks.values().filter(|h| !h.is_finished()).count()
    }
}
