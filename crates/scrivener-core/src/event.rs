//! Session events for hosts.
//!
//! A `tokio::sync::broadcast` channel: the session emits, any number of
//! hosts (a text area, a queue view, a log panel) subscribe. Events are
//! plain values, so subscribers never hold references into the session.

use tokio::sync::broadcast;

use crate::sequence::LineId;

/// Something observable happened in a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Content, cursor or selection changed
    BufferChanged,
    /// Lines were added, edited, replaced or removed
    QueueChanged,
    /// A single line was executed
    CommandExecuted { line: LineId, success: bool },
    /// A sequence was committed
    SequenceCommitted { attempted: usize, failed: usize },
    /// The assistant request failed
    AssistFailed(String),
}

/// Event bus for broadcasting session events.
///
/// Lagged receivers lose old events instead of blocking the sender.
pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    /// Creates a new event bus.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }

    /// Emits an event to all subscribers.
    pub fn emit(&self, event: SessionEvent) {
        // No receivers is fine.
        let _ = self.sender.send(event);
    }

    /// Subscribes to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

/// Helper for consuming events asynchronously.
///
/// ```ignore
/// let mut events = EventHandler::new(session.subscribe());
///
/// tokio::spawn(async move {
///     while let Some(event) = events.next().await {
///         if let SessionEvent::BufferChanged = event {
///             // redraw
///         }
///     }
/// });
/// ```
pub struct EventHandler {
    receiver: broadcast::Receiver<SessionEvent>,
}

impl EventHandler {
    pub fn new(receiver: broadcast::Receiver<SessionEvent>) -> Self {
        Self { receiver }
    }

    /// Waits for the next event; `None` once the bus is gone.
    pub async fn next(&mut self) -> Option<SessionEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Event handler lagged, missed {} events", n);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.emit(SessionEvent::BufferChanged);

        let event = rx.recv().await.unwrap();
        assert_eq!(event, SessionEvent::BufferChanged);
    }

    #[tokio::test]
    async fn test_handler_ends_when_bus_dropped() {
        let bus = EventBus::new();
        let mut handler = EventHandler::new(bus.subscribe());

        bus.emit(SessionEvent::QueueChanged);
        drop(bus);

        assert_eq!(handler.next().await, Some(SessionEvent::QueueChanged));
        assert_eq!(handler.next().await, None);
    }
}
