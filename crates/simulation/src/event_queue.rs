//! Event queue with deterministic ordering.

use crate::event::Event;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::time::Duration;

/// Key for ordering events in the queue.
///
/// Events are ordered by:
/// 1. Time (earlier first)
/// 2. Sequence number (FIFO for events scheduled at the same time)
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct EventKey {
    /// When this event fires.
    pub time: Duration,
    /// Insertion order, unique per queue.
    pub sequence: u64,
}

impl Ord for EventKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.time.cmp(&other.time) {
            Ordering::Equal => {}
            ord => return ord,
        }
        self.sequence.cmp(&other.sequence)
    }
}

impl PartialOrd for EventKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-queue of pending events keyed by `(time, sequence)`.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: BTreeMap<EventKey, Event>,
    next_sequence: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an event. Ties on time keep insertion order.
    pub fn push(&mut self, event: Event) -> EventKey {
        let key = EventKey {
            time: event.timestamp(),
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;
        self.events.insert(key, event);
        key
    }

    /// Time of the earliest pending event.
    pub fn peek_time(&self) -> Option<Duration> {
        self.events.first_key_value().map(|(key, _)| key.time)
    }

    /// Remove the earliest event.
    pub fn pop(&mut self) -> Option<(EventKey, Event)> {
        self.events.pop_first()
    }

    /// Remove the earliest event if it fires at or before `stop`.
    pub fn pop_due(&mut self, stop: Duration) -> Option<(EventKey, Event)> {
        match self.peek_time() {
            Some(time) if time <= stop => self.events.pop_first(),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(millis: u64, tag: &str) -> Event {
        Event::transaction_created(Duration::from_millis(millis), "node-0", tag)
    }

    #[test]
    fn test_event_key_ordering() {
        let earlier = EventKey {
            time: Duration::from_secs(1),
            sequence: 7,
        };
        let later = EventKey {
            time: Duration::from_secs(2),
            sequence: 1,
        };
        assert!(earlier < later);
    }

    #[test]
    fn test_sequence_breaks_ties() {
        let first = EventKey {
            time: Duration::from_secs(1),
            sequence: 1,
        };
        let second = EventKey {
            time: Duration::from_secs(1),
            sequence: 2,
        };
        assert!(first < second);
    }

    #[test]
    fn test_pop_returns_time_order_then_fifo() {
        let mut queue = EventQueue::new();
        queue.push(at(200, "late"));
        queue.push(at(100, "early-a"));
        queue.push(at(100, "early-b"));

        let order: Vec<String> = std::iter::from_fn(|| queue.pop())
            .map(|(_, event)| match event.kind() {
                crate::EventKind::TransactionCreated { tx_id } => tx_id.clone(),
                other => other.type_tag().to_string(),
            })
            .collect();
        assert_eq!(order, vec!["early-a", "early-b", "late"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_pop_due_respects_stop() {
        let mut queue = EventQueue::new();
        queue.push(at(100, "a"));
        queue.push(at(300, "b"));

        assert!(queue.pop_due(Duration::from_millis(100)).is_some());
        assert!(queue.pop_due(Duration::from_millis(250)).is_none());
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.peek_time(), Some(Duration::from_millis(300)));
    }
}
