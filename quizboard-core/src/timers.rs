//! Cancellable delayed actions on the tokio runtime.
//!
//! Each pending [`TimerAction`] runs as a spawned sleep that reports back
//! through a channel. Scheduling an action that is already pending replaces
//! it. Cancelled timers are aborted, and a firing that raced its own
//! cancellation is discarded by ticket. Dropping the scheduler cancels
//! everything.

use crate::turn::{TimerAction, TimerRequest, TurnUpdate};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// A timer that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub action: TimerAction,
    pub generation: u64,
    ticket: u64,
}

struct Pending {
    ticket: u64,
    handle: JoinHandle<()>,
}

/// Owner of every pending turn timer.
pub struct Scheduler {
    tx: mpsc::UnboundedSender<Fired>,
    rx: mpsc::UnboundedReceiver<Fired>,
    pending: HashMap<TimerAction, Pending>,
    next_ticket: u64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx,
            pending: HashMap::new(),
            next_ticket: 0,
        }
    }

    /// Start a timer. Must be called from within a tokio runtime.
    pub fn schedule(&mut self, request: TimerRequest) {
        self.cancel(request.action);

        self.next_ticket += 1;
        let fired = Fired {
            action: request.action,
            generation: request.generation,
            ticket: self.next_ticket,
        };
        let tx = self.tx.clone();
        let delay = request.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(fired);
        });

        debug!(action = ?request.action, delay_ms = delay.as_millis() as u64, "Timer scheduled");
        self.pending.insert(
            request.action,
            Pending {
                ticket: fired.ticket,
                handle,
            },
        );
    }

    pub fn cancel(&mut self, action: TimerAction) -> bool {
        match self.pending.remove(&action) {
            Some(pending) => {
                pending.handle.abort();
                debug!(?action, "Timer cancelled");
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, pending) in self.pending.drain() {
            pending.handle.abort();
        }
    }

    /// Apply the timer requests of a controller update, cancellations first.
    pub fn apply(&mut self, update: &TurnUpdate) {
        if update.cancel_all {
            self.cancel_all();
        }
        for action in &update.cancel {
            self.cancel(*action);
        }
        for request in &update.schedule {
            self.schedule(*request);
        }
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending(&self) -> impl Iterator<Item = TimerAction> + '_ {
        self.pending.keys().copied()
    }

    /// Wait for the next live timer. Returns `None` once nothing is pending.
    ///
    /// Cancel safe: nothing is lost if the returned future is dropped.
    pub async fn next_fired(&mut self) -> Option<Fired> {
        while !self.pending.is_empty() {
            let fired = self.rx.recv().await?;
            match self.pending.get(&fired.action) {
                Some(pending) if pending.ticket == fired.ticket => {
                    self.pending.remove(&fired.action);
                    return Some(fired);
                }
                _ => debug!(action = ?fired.action, "Discarding cancelled timer"),
            }
        }
        None
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn request(action: TimerAction, millis: u64) -> TimerRequest {
        TimerRequest {
            action,
            delay: Duration::from_millis(millis),
            generation: 1,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_in_deadline_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(request(TimerAction::CompleteTurn, 2500));
        scheduler.schedule(request(TimerAction::ReleaseLatch, 300));

        let first = scheduler.next_fired().await.unwrap();
        assert_eq!(first.action, TimerAction::ReleaseLatch);
        let second = scheduler.next_fired().await.unwrap();
        assert_eq!(second.action, TimerAction::CompleteTurn);
        assert!(scheduler.next_fired().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(request(TimerAction::CompleteTurn, 100));
        scheduler.schedule(request(TimerAction::ReleaseLatch, 200));
        assert!(scheduler.cancel(TimerAction::CompleteTurn));

        let fired = scheduler.next_fired().await.unwrap();
        assert_eq!(fired.action, TimerAction::ReleaseLatch);
        assert!(scheduler.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_replaces_pending() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(request(TimerAction::ReleaseLatch, 100));
        tokio::time::sleep(Duration::from_millis(150)).await;

        // The first timer already sent; its ticket no longer matches.
        let mut replacement = request(TimerAction::ReleaseLatch, 300);
        replacement.generation = 2;
        scheduler.schedule(replacement);

        let fired = scheduler.next_fired().await.unwrap();
        assert_eq!(fired.generation, 2);
        assert!(scheduler.is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_apply_cancel_all_then_schedule() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(request(TimerAction::CompleteTurn, 100));

        let update = TurnUpdate {
            cancel_all: true,
            schedule: vec![request(TimerAction::FinishRoll, 50)],
            ..TurnUpdate::default()
        };
        scheduler.apply(&update);

        let pending: Vec<_> = scheduler.pending().collect();
        assert_eq!(pending, vec![TimerAction::FinishRoll]);
    }
}
