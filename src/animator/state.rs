use std::time::Duration;

use crate::error::AnimatorError;
use crate::overlay::Marker;
use crate::timer::{ TimerCommand, TimerSlot, TimerToken };

pub const DEFAULT_ENTER: Duration = Duration::from_millis(600);
pub const DEFAULT_EXIT: Duration = Duration::from_millis(800);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Entering,
    VisiblePendingExit,
    Exiting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// Dwell time, counted from the moment a slot starts entering.
    pub display: Duration,
    pub enter: Duration,
    pub exit: Duration,
}

impl Timings {
    pub fn new(display: Duration) -> Timings {
        Timings { display, enter: DEFAULT_ENTER, exit: DEFAULT_EXIT }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotCommand {
    Mark { slot: usize, marker: Option<Marker> },
    Hide { slot: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleAction {
    Timer(TimerCommand),
    Slot(SlotCommand),
}

/// Phase bookkeeping for cycling through `len` slots.
///
/// Only one timer is ever pending. Entering arms the enter timer; when it
/// fires the rest of the dwell is armed, so the dwell overlaps the entrance.
/// The current index moves to the next slot as soon as the exit starts.
#[derive(Debug)]
pub struct CycleState {
    len: usize,
    current: usize,
    phase: Phase,
    timings: Timings,
    timer: TimerSlot,
    exiting: Option<usize>,
    // Dwell left once the entrance completes; None when the dwell ends first.
    dwell_after_enter: Option<Duration>,
}

impl CycleState {
    pub fn new(len: usize, timings: Timings) -> Result<CycleState, AnimatorError> {
        if len == 0 {
            return Err(AnimatorError::NoSlots);
        }

        Ok(CycleState {
            len,
            current: 0,
            phase: Phase::Idle,
            timings,
            timer: TimerSlot::new(),
            exiting: None,
            dwell_after_enter: None,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn timings(&self) -> Timings {
        self.timings
    }

    pub fn is_running(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Hidden baseline for every slot.
    pub fn hide_all(&self) -> Vec<CycleAction> {
        (0..self.len)
            .flat_map(|slot| vec![
                CycleAction::Slot(SlotCommand::Mark { slot, marker: None }),
                CycleAction::Slot(SlotCommand::Hide { slot }),
            ])
            .collect()
    }

    /// Begins cycling at the current index. No-op while running.
    pub fn start(&mut self) -> Vec<CycleAction> {
        if self.is_running() {
            return vec![];
        }

        let mut actions = vec![];
        // a stop during an exit leaves that slot marked; finish it first
        if let Some(slot) = self.exiting.take() {
            actions.extend(finish_exit(slot));
        }
        self.enter(self.current, &mut actions);
        actions
    }

    /// Cancels the pending timer. Slots keep whatever state they are in.
    pub fn stop(&mut self) -> Vec<CycleAction> {
        let mut commands = vec![];
        self.timer.disarm(&mut commands);
        self.phase = Phase::Idle;
        commands.into_iter().map(CycleAction::Timer).collect()
    }

    /// Back to slot 0, idle, with every slot hidden and unmarked.
    pub fn reset(&mut self) -> Vec<CycleAction> {
        let mut actions = self.stop();
        self.current = 0;
        self.exiting = None;
        self.dwell_after_enter = None;
        actions.extend(self.hide_all());
        actions
    }

    /// Takes effect for the next slot to enter.
    pub fn set_display_duration(&mut self, display: Duration) {
        self.timings.display = display;
    }

    pub fn on_timer(&mut self, token: TimerToken) -> Vec<CycleAction> {
        if !self.timer.fire(token) {
            return vec![];
        }

        let mut actions = vec![];
        match self.phase {
            Phase::Entering => match self.dwell_after_enter.take() {
                Some(rest) => {
                    self.phase = Phase::VisiblePendingExit;
                    self.arm(rest, &mut actions);
                },
                None => self.begin_exit(&mut actions),
            },
            Phase::VisiblePendingExit => self.begin_exit(&mut actions),
            Phase::Exiting => {
                if let Some(slot) = self.exiting.take() {
                    actions.extend(finish_exit(slot));
                }
                self.enter(self.current, &mut actions);
            },
            Phase::Idle => {},
        }
        actions
    }

    fn enter(&mut self, slot: usize, actions: &mut Vec<CycleAction>) {
        self.phase = Phase::Entering;
        actions.push(CycleAction::Slot(SlotCommand::Mark { slot, marker: Some(Marker::Entering) }));

        let Timings { display, enter, .. } = self.timings;
        if enter < display {
            self.dwell_after_enter = Some(display - enter);
            self.arm(enter, actions);
        } else {
            self.dwell_after_enter = None;
            self.arm(display, actions);
        }
    }

    fn begin_exit(&mut self, actions: &mut Vec<CycleAction>) {
        let slot = self.current;
        self.phase = Phase::Exiting;
        self.exiting = Some(slot);
        self.current = (slot + 1) % self.len;

        actions.push(CycleAction::Slot(SlotCommand::Mark { slot, marker: Some(Marker::Exiting) }));
        self.arm(self.timings.exit, actions);
    }

    fn arm(&mut self, after: Duration, actions: &mut Vec<CycleAction>) {
        let mut commands = vec![];
        self.timer.arm(after, &mut commands);
        actions.extend(commands.into_iter().map(CycleAction::Timer));
    }
}

fn finish_exit(slot: usize) -> Vec<CycleAction> {
    vec![
        CycleAction::Slot(SlotCommand::Mark { slot, marker: None }),
        CycleAction::Slot(SlotCommand::Hide { slot }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn armed_token(actions: &[CycleAction]) -> TimerToken {
        actions.iter()
            .filter_map(|action| match action {
                CycleAction::Timer(TimerCommand::Set { token, .. }) => Some(*token),
                _ => None,
            })
            .last()
            .expect("no timer armed")
    }

    #[test]
    fn empty_collection_is_rejected() {
        assert_eq!(CycleState::new(0, Timings::new(ms(1000))).unwrap_err(), AnimatorError::NoSlots);
    }

    #[test]
    fn start_marks_first_slot_and_arms_enter_timer() {
        let mut state = CycleState::new(3, Timings::new(ms(1000))).unwrap();
        let actions = state.start();

        assert_eq!(state.phase(), Phase::Entering);
        assert_eq!(actions[0], CycleAction::Slot(SlotCommand::Mark { slot: 0, marker: Some(Marker::Entering) }));
        assert!(matches!(actions[1], CycleAction::Timer(TimerCommand::Set { after, .. }) if after == ms(600)));
        assert!(state.start().is_empty());
    }

    #[test]
    fn long_entrance_goes_straight_to_exit_at_dwell_end() {
        let timings = Timings { display: ms(300), enter: ms(600), exit: ms(800) };
        let mut state = CycleState::new(2, timings).unwrap();

        let actions = state.start();
        assert!(matches!(actions[1], CycleAction::Timer(TimerCommand::Set { after, .. }) if after == ms(300)));

        let actions = state.on_timer(armed_token(&actions));
        assert_eq!(state.phase(), Phase::Exiting);
        assert_eq!(state.current_index(), 1);
        assert_eq!(actions[0], CycleAction::Slot(SlotCommand::Mark { slot: 0, marker: Some(Marker::Exiting) }));
    }

    #[test]
    fn single_slot_wraps_onto_itself() {
        let timings = Timings { display: ms(100), enter: ms(0), exit: ms(50) };
        let mut state = CycleState::new(1, timings).unwrap();

        let actions = state.start();
        let actions = state.on_timer(armed_token(&actions));
        assert_eq!(state.phase(), Phase::VisiblePendingExit);
        let actions = state.on_timer(armed_token(&actions));
        assert_eq!(state.phase(), Phase::Exiting);
        assert_eq!(state.current_index(), 0);

        let actions = state.on_timer(armed_token(&actions));
        assert_eq!(state.phase(), Phase::Entering);
        assert_eq!(&actions[..3], &[
            CycleAction::Slot(SlotCommand::Mark { slot: 0, marker: None }),
            CycleAction::Slot(SlotCommand::Hide { slot: 0 }),
            CycleAction::Slot(SlotCommand::Mark { slot: 0, marker: Some(Marker::Entering) }),
        ]);
    }

    #[test]
    fn stale_token_after_stop_does_nothing() {
        let mut state = CycleState::new(2, Timings::new(ms(1000))).unwrap();
        let actions = state.start();
        let token = armed_token(&actions);

        let stopped = state.stop();
        assert_eq!(stopped, vec![CycleAction::Timer(TimerCommand::Cancel { token })]);
        assert!(state.on_timer(token).is_empty());
        assert_eq!(state.phase(), Phase::Idle);
    }

    #[test]
    fn reset_hides_everything_and_returns_to_first_slot() {
        let timings = Timings { display: ms(100), enter: ms(10), exit: ms(10) };
        let mut state = CycleState::new(2, timings).unwrap();
        let actions = state.start();
        let actions = state.on_timer(armed_token(&actions));
        state.on_timer(armed_token(&actions));
        assert_eq!(state.current_index(), 1);

        let actions = state.reset();
        assert_eq!(state.current_index(), 0);
        assert_eq!(state.phase(), Phase::Idle);
        assert!(matches!(actions[0], CycleAction::Timer(TimerCommand::Cancel { .. })));
        assert_eq!(&actions[1..], &state.hide_all()[..]);
    }

    #[test]
    fn restart_after_stop_mid_exit_cleans_up_exiting_slot() {
        let timings = Timings { display: ms(100), enter: ms(10), exit: ms(50) };
        let mut state = CycleState::new(3, timings).unwrap();
        let actions = state.start();
        let actions = state.on_timer(armed_token(&actions));
        state.on_timer(armed_token(&actions));
        assert_eq!(state.phase(), Phase::Exiting);

        state.stop();
        let actions = state.start();
        assert_eq!(&actions[..3], &[
            CycleAction::Slot(SlotCommand::Mark { slot: 0, marker: None }),
            CycleAction::Slot(SlotCommand::Hide { slot: 0 }),
            CycleAction::Slot(SlotCommand::Mark { slot: 1, marker: Some(Marker::Entering) }),
        ]);
    }
}
