#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic execution engine that steps the token through a level.
//!
//! The engine is a pure function of the level geometry and the queued moves.
//! It never sleeps or schedules: the complete [`RunTrace`] is computed in one
//! call, and any pacing between steps is layered on top by replaying the
//! trace.

use carrot_hop_core::{
    Coordinate, FailureCause, GeometryView, Outcome, Pose, RunTrace, Step, TraceStep,
};

/// Pure system that traces queued moves against level geometry.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExecutionEngine;

impl ExecutionEngine {
    /// Creates a new execution engine.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Runs `steps` from the spawn pose of `geometry` and records every
    /// consumed command.
    ///
    /// Turns consume a command without moving. After every forward step the
    /// new cell is classified: reaching the goal completes the run, while a
    /// danger cell or a cell beyond the lattice fails it at that command
    /// index. Commands after a terminal step are never consumed. Running out
    /// of commands fails the run with [`FailureCause::Exhausted`].
    #[must_use]
    pub fn execute<I>(&self, geometry: &GeometryView<'_>, steps: I) -> RunTrace
    where
        I: IntoIterator<Item = Step>,
    {
        let start = Pose {
            position: geometry.spawn(),
            heading: geometry.facing(),
        };
        let mut state = ExecutionState::new(start);
        let mut trace = Vec::new();

        for step in steps {
            let index = state.cursor;
            let moved = state.advance(step, geometry.step_units());
            trace.push(TraceStep {
                index,
                step,
                pose: state.pose,
            });

            if !moved {
                continue;
            }

            let outcome = match classify(geometry, state.pose.position) {
                CellKind::Goal => Outcome::Completed { steps: index + 1 },
                CellKind::Path => continue,
                CellKind::Danger => Outcome::Failed {
                    step: index,
                    cause: FailureCause::Danger,
                },
                CellKind::OffLattice => Outcome::Failed {
                    step: index,
                    cause: FailureCause::OffLattice,
                },
            };

            return RunTrace {
                start,
                steps: trace,
                outcome,
            };
        }

        RunTrace {
            start,
            steps: trace,
            outcome: Outcome::Failed {
                step: state.cursor,
                cause: FailureCause::Exhausted,
            },
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct ExecutionState {
    pose: Pose,
    cursor: usize,
}

impl ExecutionState {
    const fn new(pose: Pose) -> Self {
        Self { pose, cursor: 0 }
    }

    /// Consumes one command, returning whether the token changed cells.
    fn advance(&mut self, step: Step, step_units: i64) -> bool {
        self.cursor += 1;
        match step {
            Step::Forward => {
                self.pose.position = self.pose.position.stepped(self.pose.heading, step_units);
                true
            }
            Step::Left => {
                self.pose.heading = self.pose.heading.turned_left();
                false
            }
            Step::Right => {
                self.pose.heading = self.pose.heading.turned_right();
                false
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CellKind {
    Goal,
    Path,
    Danger,
    OffLattice,
}

fn classify(geometry: &GeometryView<'_>, cell: Coordinate) -> CellKind {
    if cell == geometry.goal() {
        CellKind::Goal
    } else if geometry.is_path(cell) {
        CellKind::Path
    } else if geometry.is_danger(cell) {
        CellKind::Danger
    } else {
        CellKind::OffLattice
    }
}
