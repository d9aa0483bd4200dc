use std::time::Duration;

use crate::error::PollError;
use crate::iracing::PollResult;
use crate::timer::{ TimerCommand, TimerSlot, TimerToken };

#[derive(Debug, Clone, PartialEq)]
pub enum PollAction {
    Timer(TimerCommand),
    /// Issue one fetch. The completion must be fed back with the same session.
    Fetch { session: u64 },
    /// Hand a result to the consumer, provided the session is still live.
    Deliver { session: u64, result: PollResult },
}

/// The polling controller's bookkeeping, free of any clock or I/O.
///
/// The timer is armed exactly while the controller is running. Every start
/// opens a new session so completions of fetches issued before a stop (or
/// before a stop and restart) can be recognised and dropped.
#[derive(Debug)]
pub struct PollState {
    running: bool,
    interval: Duration,
    timer: TimerSlot,
    session: u64,
}

impl PollState {
    pub fn new(interval: Duration) -> Result<PollState, PollError> {
        if interval.is_zero() {
            return Err(PollError::ZeroInterval);
        }

        Ok(PollState {
            running: false,
            interval,
            timer: TimerSlot::new(),
            session: 0,
        })
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    /// Fetches right away and arms the repeating timer. No-op while running.
    pub fn start(&mut self) -> Vec<PollAction> {
        if self.running {
            return vec![];
        }

        self.running = true;
        self.session += 1;
        self.tick()
    }

    /// Idempotent.
    pub fn stop(&mut self) -> Vec<PollAction> {
        let mut commands = vec![];
        if self.timer.disarm(&mut commands) {
            self.running = false;
        }
        commands.into_iter().map(PollAction::Timer).collect()
    }

    /// Replaces the running timer with one at the new cadence, counted from
    /// now. Returns `None` when the request is dropped: the controller is
    /// stopped, or the interval is zero.
    pub fn set_interval(&mut self, interval: Duration) -> Option<Vec<PollAction>> {
        if interval.is_zero() || !self.timer.is_armed() {
            return None;
        }

        self.interval = interval;
        let mut commands = vec![];
        self.timer.arm(interval, &mut commands);
        Some(commands.into_iter().map(PollAction::Timer).collect())
    }

    pub fn on_timer(&mut self, token: TimerToken) -> Vec<PollAction> {
        if !self.timer.fire(token) || !self.running {
            return vec![];
        }
        self.tick()
    }

    pub fn on_fetch_complete(&mut self, session: u64, result: PollResult) -> Vec<PollAction> {
        if !self.accepts(session) {
            debug!("Dropping result of fetch from session {} (current {}, running {})", session, self.session, self.running);
            return vec![];
        }
        vec![PollAction::Deliver { session, result }]
    }

    /// Whether a result from `session` may still reach the consumer.
    pub fn accepts(&self, session: u64) -> bool {
        self.running && session == self.session
    }

    fn tick(&mut self) -> Vec<PollAction> {
        let mut commands = vec![];
        self.timer.arm(self.interval, &mut commands);

        let mut actions = vec![PollAction::Fetch { session: self.session }];
        actions.extend(commands.into_iter().map(PollAction::Timer));
        actions
    }
}
