//! Interrupt-driven event system.
//!
//! Events are produced by:
//! - Timer callbacks (periodic sensor tick, one-shot retry backoff)
//! - The modem byte transport (a dialog terminator or unsolicited line
//!   was recognised)
//!
//! Events are consumed by the main loop, which runs the deferred
//! state-machine work one event at a time in FIFO order.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Tick timer  │────▶│              │     │              │
//! │ Retry timer │────▶│  Event Queue │────▶│  Main Loop   │
//! │ Modem link  │────▶│  (channel)   │     │  (consumer)  │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use crate::modem::link::Reply;

/// Maximum number of pending events.
const EVENT_QUEUE_CAP: usize = 16;

/// System event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Periodic sensor / pump / alert tick.
    SensorTick,
    /// The modem link completed a scan.  At most one is ever pending
    /// because nothing is transmitted until it has been consumed.
    ModemReply(Reply),
    /// The one-shot retry backoff timer ran out.
    RetryTimerExpired,
}

/// Bounded event queue.  Producers may run in timer or transport
/// context; the consumer is the main loop.
pub struct EventQueue<const N: usize> {
    channel: Channel<CriticalSectionRawMutex, Event, N>,
}

impl<const N: usize> EventQueue<N> {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Push an event.  Returns `false` if the queue is full (event dropped).
    pub fn push(&self, event: Event) -> bool {
        self.channel.try_send(event).is_ok()
    }

    /// Pop the next event, or `None` if the queue is empty.
    pub fn pop(&self) -> Option<Event> {
        self.channel.try_receive().ok()
    }

    /// Drain all pending events into a callback, in FIFO order.
    pub fn drain(&self, mut handler: impl FnMut(Event)) {
        while let Some(event) = self.pop() {
            handler(event);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }
}

impl<const N: usize> Default for EventQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

// ── Firmware-wide queue ───────────────────────────────────────

static EVENTS: EventQueue<EVENT_QUEUE_CAP> = EventQueue::new();

/// Push an event into the firmware queue.
/// Returns `false` if the queue is full (event dropped).
pub fn push_event(event: Event) -> bool {
    let accepted = EVENTS.push(event);
    if !accepted {
        log::warn!("event queue full, dropped {:?}", event);
    }
    accepted
}

/// Drain all pending events into a callback.
pub fn drain_events(handler: impl FnMut(Event)) {
    EVENTS.drain(handler);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modem::link::{DialogResult, Reply};

    #[test]
    fn fifo_order() {
        let q: EventQueue<4> = EventQueue::new();
        assert!(q.push(Event::SensorTick));
        assert!(q.push(Event::ModemReply(Reply::Dialog(DialogResult::Ok))));
        assert!(q.push(Event::RetryTimerExpired));
        assert_eq!(q.len(), 3);

        let mut seen = Vec::new();
        q.drain(|e| seen.push(e));
        assert_eq!(
            seen,
            vec![
                Event::SensorTick,
                Event::ModemReply(Reply::Dialog(DialogResult::Ok)),
                Event::RetryTimerExpired,
            ]
        );
        assert!(q.is_empty());
    }

    #[test]
    fn full_queue_drops() {
        let q: EventQueue<2> = EventQueue::new();
        assert!(q.push(Event::SensorTick));
        assert!(q.push(Event::SensorTick));
        assert!(!q.push(Event::RetryTimerExpired));
        assert_eq!(q.pop(), Some(Event::SensorTick));
        assert_eq!(q.pop(), Some(Event::SensorTick));
        assert_eq!(q.pop(), None);
    }
}
