use chrono::{DateTime, Utc};
use futures_channel::oneshot;

use crate::*;

/// Raised once, when the last open chunk of a contest is revealed.
#[derive(Clone, Debug, PartialEq)]
pub struct FinishedEvent {
    pub finished_at: DateTime<Utc>,
    /// Sequence of the snapshot that recorded the final step
    pub snapshot: usize,
    pub stats: Vec<PrizeStats>,
}

type FinishCallback = Box<dyn FnOnce(&FinishedEvent) + Send>;

/// Single-fire fan-out of [`FinishedEvent`].
///
/// Listeners added after the event fired are served immediately, so every
/// listener sees the event exactly once.
#[derive(Default)]
pub struct FinishNotifier {
    fired: Option<FinishedEvent>,
    callbacks: Vec<FinishCallback>,
    subscribers: Vec<oneshot::Sender<FinishedEvent>>,
}

impl FinishNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_fired(&self) -> bool {
        self.fired.is_some()
    }

    pub fn on_finished<F>(&mut self, callback: F)
    where
        F: FnOnce(&FinishedEvent) + Send + 'static,
    {
        match &self.fired {
            Some(event) => callback(event),
            None => self.callbacks.push(Box::new(callback)),
        }
    }

    pub fn subscribe(&mut self) -> oneshot::Receiver<FinishedEvent> {
        let (sender, receiver) = oneshot::channel();
        match &self.fired {
            Some(event) => {
                // receiver is alive, it is returned below
                let _ = sender.send(event.clone());
            }
            None => self.subscribers.push(sender),
        }
        receiver
    }

    /// Delivers `event` to every listener. Returns `false` if an event was
    /// already delivered, in which case nothing happens.
    pub fn fire(&mut self, event: FinishedEvent) -> bool {
        if self.fired.is_some() {
            log::warn!("Finish notification already delivered, ignoring");
            return false;
        }

        log::debug!(
            "Notifying {} callbacks and {} subscribers of finish",
            self.callbacks.len(),
            self.subscribers.len()
        );
        for callback in self.callbacks.drain(..) {
            callback(&event);
        }
        for subscriber in self.subscribers.drain(..) {
            if subscriber.send(event.clone()).is_err() {
                log::trace!("Finish subscriber dropped before notification");
            }
        }
        self.fired = Some(event);
        true
    }
}

impl core::fmt::Debug for FinishNotifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FinishNotifier")
            .field("fired", &self.fired)
            .field("callbacks", &self.callbacks.len())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
