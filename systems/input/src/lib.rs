#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure input system that maps player taps onto session commands.

use std::time::Duration;

use carrot_hop_core::{AdvanceMode, Command, Event, SessionState, Step};

/// Abstract control identifiers delivered by an adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tap {
    /// Queue a forward move.
    Forward,
    /// Queue a counter-clockwise turn.
    Left,
    /// Queue a clockwise turn.
    Right,
    /// Remove the most recently queued move.
    Undo,
    /// Start executing the queue.
    Execute,
    /// Advance after a completed level, otherwise restart the current one.
    AdvanceOrReset,
}

impl Tap {
    /// Control identifiers in button order.
    pub const ALL: [Tap; 6] = [
        Tap::Forward,
        Tap::Left,
        Tap::Right,
        Tap::Undo,
        Tap::Execute,
        Tap::AdvanceOrReset,
    ];

    /// Resolves the button at `index` of the control panel.
    #[must_use]
    pub const fn from_button_index(index: usize) -> Option<Self> {
        if index < Self::ALL.len() {
            Some(Self::ALL[index])
        } else {
            None
        }
    }
}

/// Input system that translates taps into commands.
///
/// Execution is not requested on the tap itself: the system waits for
/// `execute_delay` of simulated time, counted from `TimeAdvanced` events,
/// before emitting [`Command::Execute`]. A zero delay emits it immediately.
#[derive(Clone, Debug)]
pub struct Input {
    state: SessionState,
    execute_delay: Duration,
    pending_execute: Option<Duration>,
}

impl Default for Input {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

impl Input {
    /// Creates an input system that defers execution by `execute_delay`.
    #[must_use]
    pub const fn new(execute_delay: Duration) -> Self {
        Self {
            state: SessionState::Start,
            execute_delay,
            pending_execute: None,
        }
    }

    /// Session state as last observed through events.
    #[must_use]
    pub const fn session_state(&self) -> SessionState {
        self.state
    }

    /// Reports whether an execute request is waiting for its delay to elapse.
    #[must_use]
    pub const fn execute_pending(&self) -> bool {
        self.pending_execute.is_some()
    }

    /// Consumes world events and the taps of this frame to emit commands.
    pub fn handle(&mut self, events: &[Event], taps: &[Tap], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::SessionStateChanged { to, .. } => {
                    self.state = *to;
                    if *to != SessionState::Start {
                        self.pending_execute = None;
                    }
                }
                Event::LevelLoaded { .. } => self.pending_execute = None,
                Event::TimeAdvanced { dt } => self.count_down(*dt, out),
                _ => {}
            }
        }

        for tap in taps {
            self.tap(*tap, out);
        }
    }

    fn count_down(&mut self, dt: Duration, out: &mut Vec<Command>) {
        let Some(remaining) = self.pending_execute else {
            return;
        };

        let remaining = remaining.saturating_sub(dt);
        if remaining.is_zero() {
            self.pending_execute = None;
            out.push(Command::Execute);
        } else {
            self.pending_execute = Some(remaining);
        }
    }

    fn tap(&mut self, tap: Tap, out: &mut Vec<Command>) {
        match tap {
            Tap::Forward => out.push(Command::QueueStep {
                step: Step::Forward,
            }),
            Tap::Left => out.push(Command::QueueStep { step: Step::Left }),
            Tap::Right => out.push(Command::QueueStep { step: Step::Right }),
            Tap::Undo => out.push(Command::UndoStep),
            Tap::Execute => {
                if self.pending_execute.is_some() {
                    return;
                }
                if self.execute_delay.is_zero() {
                    out.push(Command::Execute);
                } else {
                    self.pending_execute = Some(self.execute_delay);
                }
            }
            Tap::AdvanceOrReset => out.push(match self.state {
                SessionState::Complete => Command::Advance {
                    mode: AdvanceMode::Next,
                },
                SessionState::Running => Command::Abort,
                SessionState::Start | SessionState::Failed => Command::Reset,
            }),
        }
    }
}
