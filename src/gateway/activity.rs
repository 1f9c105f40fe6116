use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use crate::core::events::ActivityEvent;
use crate::gateway::events::EventPublisher;

/// In-process activity log that fans every published event out to the
/// subscribers present at publish time. History is never replayed.
///
/// Closing drops the only sender: subscribers still receive what was already
/// published and then observe the end of the stream.
#[derive(Debug)]
pub struct ActivityLog {
    sender: Mutex<Option<broadcast::Sender<ActivityEvent>>>,
}

impl ActivityLog {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Mutex::new(Some(sender)),
        }
    }

    pub fn subscribe(&self) -> ActivitySubscription {
        match self.sender.lock().as_ref() {
            Some(sender) => ActivitySubscription { rx: sender.subscribe() },
            None => {
                let (sender, rx) = broadcast::channel(1);
                drop(sender);
                ActivitySubscription { rx }
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.lock().as_ref().map(|s| s.receiver_count()).unwrap_or(0)
    }
}

impl EventPublisher for ActivityLog {
    fn publish(&self, event: ActivityEvent) -> usize {
        match self.sender.lock().as_ref() {
            // send only errs when nobody is listening
            Some(sender) => sender.send(event).unwrap_or(0),
            None => {
                tracing::debug!(event_id = %event.event_id, "activity log closed, event dropped");
                0
            }
        }
    }

    fn close(&self) {
        if self.sender.lock().take().is_some() {
            tracing::info!("activity log closed");
        }
    }

    fn is_closed(&self) -> bool {
        self.sender.lock().is_none()
    }
}

#[derive(Debug)]
pub struct ActivitySubscription {
    rx: broadcast::Receiver<ActivityEvent>,
}

impl ActivitySubscription {
    /// Next event, or `None` once the log is closed and drained. A subscriber
    /// that fell behind skips what it missed and keeps going.
    pub async fn recv(&mut self) -> Option<ActivityEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "activity subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    pub fn try_recv(&mut self) -> Option<ActivityEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "activity subscriber lagged");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Drains whatever is buffered right now, rendered as display text.
    pub fn drain_messages(&mut self) -> Vec<String> {
        let mut messages = vec![];
        while let Some(event) = self.try_recv() {
            messages.push(event.to_string());
        }
        messages
    }

    pub fn unsubscribe(self) {}
}
