//! Timer plumbing shared by the poller and the animator.
//!
//! The state machines never touch a clock. They arm and cancel timers through
//! a [`TimerSlot`] and emit [`TimerCommand`]s; the runtime (async-std tasks in
//! production, [`crate::sim::VirtualClock`] in tests) turns those into fires
//! that are fed back as tokens.

use std::sync::{ Mutex, MutexGuard, PoisonError };
use std::time::Duration;

use async_std::task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(u64);

impl TimerToken {
    pub fn id(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Set { token: TimerToken, after: Duration },
    Cancel { token: TimerToken },
}

/// Owner of at most one live timer.
///
/// Arming hands out a fresh token and forgets the previous one, so a fire
/// carrying an old token is recognised as stale and dropped.
#[derive(Debug, Default)]
pub struct TimerSlot {
    next_id: u64,
    armed: Option<TimerToken>,
}

impl TimerSlot {
    pub fn new() -> TimerSlot {
        TimerSlot::default()
    }

    /// Arms a new timer, pushing a cancel for the replaced one (if any) and a
    /// set for the new one.
    pub fn arm(&mut self, after: Duration, commands: &mut Vec<TimerCommand>) -> TimerToken {
        self.disarm(commands);

        self.next_id += 1;
        let token = TimerToken(self.next_id);
        self.armed = Some(token);
        commands.push(TimerCommand::Set { token, after });
        token
    }

    pub fn disarm(&mut self, commands: &mut Vec<TimerCommand>) -> bool {
        match self.armed.take() {
            Some(token) => {
                commands.push(TimerCommand::Cancel { token });
                true
            },
            None => false,
        }
    }

    /// Consumes a fire. Returns true only when `token` is the armed timer,
    /// which leaves the slot empty.
    pub fn fire(&mut self, token: TimerToken) -> bool {
        if self.armed == Some(token) {
            self.armed = None;
            true
        } else {
            trace!("Ignoring stale timer {}", token.id());
            false
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn armed(&self) -> Option<TimerToken> {
        self.armed
    }
}

/// Runs `on_fire` on an async-std task once `after` has elapsed.
///
/// There is no handle to cancel it: cancellation happens in the owning
/// [`TimerSlot`], which rejects the token when it eventually arrives.
pub fn spawn_timer<F>(after: Duration, on_fire: F)
where
    F: FnOnce() + Send + 'static,
{
    task::spawn(async move {
        task::sleep(after).await;
        on_fire();
    });
}

// A panicking consumer callback must not wedge the runtime.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arm_replaces_previous_timer() {
        let mut slot = TimerSlot::new();
        let mut commands = vec![];

        let first = slot.arm(Duration::from_millis(100), &mut commands);
        let second = slot.arm(Duration::from_millis(200), &mut commands);

        assert_ne!(first, second);
        assert_eq!(commands, vec![
            TimerCommand::Set { token: first, after: Duration::from_millis(100) },
            TimerCommand::Cancel { token: first },
            TimerCommand::Set { token: second, after: Duration::from_millis(200) },
        ]);
        assert_eq!(slot.armed(), Some(second));
    }

    #[test]
    fn stale_fire_is_rejected() {
        let mut slot = TimerSlot::new();
        let mut commands = vec![];

        let first = slot.arm(Duration::from_millis(100), &mut commands);
        let second = slot.arm(Duration::from_millis(100), &mut commands);

        assert!(!slot.fire(first));
        assert!(slot.is_armed());
        assert!(slot.fire(second));
        assert!(!slot.is_armed());
        assert!(!slot.fire(second));
    }

    #[test]
    fn disarm_is_idempotent() {
        let mut slot = TimerSlot::new();
        let mut commands = vec![];

        slot.arm(Duration::from_millis(5), &mut commands);
        assert!(slot.disarm(&mut commands));
        assert!(!slot.disarm(&mut commands));
        assert_eq!(commands.len(), 2);
    }
}
