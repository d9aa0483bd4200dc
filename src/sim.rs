//! Deterministic virtual time.
//!
//! A [`VirtualClock`] is an ordered queue of future events. Tests schedule the
//! timers a state machine asks for, then pop events in time order and feed
//! them back, so timing properties can be checked without waiting on a real
//! clock.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::time::Duration;

/// Key for ordering events in the queue.
///
/// Events are ordered by:
/// 1. Time (earlier first)
/// 2. Sequence number (FIFO for events due at the same instant)
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct EventKey {
    pub time: Duration,
    pub sequence: u64,
}

impl Ord for EventKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.time.cmp(&other.time) {
            Ordering::Equal => self.sequence.cmp(&other.sequence),
            ord => ord,
        }
    }
}

impl PartialOrd for EventKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub struct VirtualClock<E> {
    now: Duration,
    sequence: u64,
    queue: BTreeMap<EventKey, E>,
}

impl<E> Default for VirtualClock<E> {
    fn default() -> Self {
        VirtualClock::new()
    }
}

impl<E> VirtualClock<E> {
    pub fn new() -> VirtualClock<E> {
        VirtualClock {
            now: Duration::ZERO,
            sequence: 0,
            queue: BTreeMap::new(),
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn schedule(&mut self, after: Duration, event: E) -> EventKey {
        self.sequence += 1;
        let key = EventKey { time: self.now + after, sequence: self.sequence };
        self.queue.insert(key, event);
        key
    }

    pub fn cancel(&mut self, key: &EventKey) -> Option<E> {
        self.queue.remove(key)
    }

    /// Pops the earliest event due at or before `deadline`, moving `now` to
    /// its time.
    pub fn next_before(&mut self, deadline: Duration) -> Option<(Duration, E)> {
        let key = *self.queue.keys().next()?;
        if key.time > deadline {
            return None;
        }

        let event = self.queue.remove(&key)?;
        self.now = key.time;
        Some((key.time, event))
    }

    /// Moves `now` forward without popping anything. Never moves backwards.
    pub fn advance_to(&mut self, time: Duration) {
        if time > self.now {
            self.now = time;
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn events_pop_in_time_then_fifo_order() {
        let mut clock = VirtualClock::new();
        clock.schedule(ms(20), "late");
        clock.schedule(ms(10), "first");
        clock.schedule(ms(10), "second");

        assert_eq!(clock.next_before(ms(100)), Some((ms(10), "first")));
        assert_eq!(clock.next_before(ms(100)), Some((ms(10), "second")));
        assert_eq!(clock.now(), ms(10));
        assert_eq!(clock.next_before(ms(15)), None);
        assert_eq!(clock.next_before(ms(20)), Some((ms(20), "late")));
    }

    #[test]
    fn schedule_is_relative_to_now() {
        let mut clock = VirtualClock::new();
        clock.advance_to(ms(500));
        let key = clock.schedule(ms(250), ());
        assert_eq!(key.time, ms(750));

        clock.advance_to(ms(100));
        assert_eq!(clock.now(), ms(500));
    }

    #[test]
    fn cancelled_events_never_fire() {
        let mut clock = VirtualClock::new();
        let key = clock.schedule(ms(10), 1);
        clock.schedule(ms(20), 2);

        assert_eq!(clock.cancel(&key), Some(1));
        assert_eq!(clock.next_before(ms(30)), Some((ms(20), 2)));
        assert_eq!(clock.pending(), 0);
    }
}
