//! Cycles a fixed set of slots, one at a time, with timed entrance and exit.

use std::sync::{ Arc, Mutex };
use std::time::Duration;

use crate::error::AnimatorError;
use crate::overlay::Slot;
use crate::timer::{ TimerCommand, TimerToken, lock, spawn_timer };

pub mod state;

pub use state::{ Phase, Timings };
use state::{ CycleAction, CycleState, SlotCommand };

/// A [`CycleState`] wired to the slots it drives.
///
/// Slot commands are applied immediately; timer commands are returned to
/// whoever owns the clock.
pub struct CycleAnimator<S> {
    state: CycleState,
    slots: Vec<S>,
}

impl<S: Slot> CycleAnimator<S> {
    /// Takes ownership of the slots and puts every one of them at the hidden
    /// baseline. Fails on an empty collection.
    pub fn new(slots: Vec<S>, timings: Timings) -> Result<CycleAnimator<S>, AnimatorError> {
        let state = CycleState::new(slots.len(), timings)?;
        let mut animator = CycleAnimator { state, slots };

        let actions = animator.state.hide_all();
        animator.apply(actions);
        Ok(animator)
    }

    pub fn start(&mut self) -> Vec<TimerCommand> {
        let actions = self.state.start();
        self.apply(actions)
    }

    pub fn stop(&mut self) -> Vec<TimerCommand> {
        let actions = self.state.stop();
        self.apply(actions)
    }

    pub fn reset(&mut self) -> Vec<TimerCommand> {
        let actions = self.state.reset();
        self.apply(actions)
    }

    pub fn on_timer(&mut self, token: TimerToken) -> Vec<TimerCommand> {
        let actions = self.state.on_timer(token);
        self.apply(actions)
    }

    pub fn set_display_duration(&mut self, display: Duration) {
        self.state.set_display_duration(display);
    }

    /// The slot entering or dwelling. While a slot exits this is already the
    /// slot that will enter next.
    pub fn current_index(&self) -> usize {
        self.state.current_index()
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn timings(&self) -> Timings {
        self.state.timings()
    }

    pub fn slots(&self) -> &[S] {
        &self.slots
    }

    pub fn slots_mut(&mut self) -> &mut [S] {
        &mut self.slots
    }

    fn apply(&mut self, actions: Vec<CycleAction>) -> Vec<TimerCommand> {
        let mut timers = vec![];
        for action in actions {
            match action {
                CycleAction::Slot(SlotCommand::Mark { slot, marker }) => self.slots[slot].set_marker(marker),
                CycleAction::Slot(SlotCommand::Hide { slot }) => self.slots[slot].hide(),
                CycleAction::Timer(command) => timers.push(command),
            }
        }
        timers
    }
}

/// Runs a [`CycleAnimator`] on async-std timers.
pub struct AnimatorHandle<S> {
    inner: Arc<Mutex<CycleAnimator<S>>>,
}

impl<S> Clone for AnimatorHandle<S> {
    fn clone(&self) -> Self {
        AnimatorHandle { inner: Arc::clone(&self.inner) }
    }
}

impl<S: Slot + Send + 'static> AnimatorHandle<S> {
    pub fn new(animator: CycleAnimator<S>) -> AnimatorHandle<S> {
        AnimatorHandle { inner: Arc::new(Mutex::new(animator)) }
    }

    pub fn start(&self) {
        let commands = {
            let mut animator = lock(&self.inner);
            if !animator.is_running() {
                info!("Cycling {} slots, {:?}", animator.slots().len(), animator.timings());
            }
            animator.start()
        };
        schedule(&self.inner, commands);
    }

    pub fn stop(&self) {
        let commands = lock(&self.inner).stop();
        schedule(&self.inner, commands);
    }

    pub fn reset(&self) {
        let commands = lock(&self.inner).reset();
        schedule(&self.inner, commands);
    }

    pub fn set_display_duration(&self, display: Duration) {
        lock(&self.inner).set_display_duration(display);
    }

    pub fn current_index(&self) -> usize {
        lock(&self.inner).current_index()
    }

    pub fn phase(&self) -> Phase {
        lock(&self.inner).phase()
    }

    pub fn is_running(&self) -> bool {
        lock(&self.inner).is_running()
    }

    /// Gives `f` the slots, e.g. to write fresh data into them.
    pub fn with_slots<R>(&self, f: impl FnOnce(&mut [S]) -> R) -> R {
        f(lock(&self.inner).slots_mut())
    }
}

fn schedule<S: Slot + Send + 'static>(inner: &Arc<Mutex<CycleAnimator<S>>>, commands: Vec<TimerCommand>) {
    for command in commands {
        match command {
            TimerCommand::Set { token, after } => {
                let inner = Arc::clone(inner);
                spawn_timer(after, move || {
                    let commands = lock(&inner).on_timer(token);
                    schedule(&inner, commands);
                });
            },
            TimerCommand::Cancel { token } => trace!("Cancelled animator timer {}", token.id()),
        }
    }
}
