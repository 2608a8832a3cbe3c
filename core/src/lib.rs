#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Carrot Hop puzzle.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems and
//! presentation layers to react to deterministically. Systems consume event
//! streams, query immutable views, and respond exclusively with new command
//! batches.

use std::{collections::HashSet, fmt, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod levels;

pub use levels::{LevelCatalog, LevelDefinition, PathIndex};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Carrot Hop.";

/// Number of coordinate units that make up one world unit.
///
/// Coordinates are rounded to four decimal digits, so one unit is one
/// ten-thousandth of a world unit.
pub const COORDINATE_SCALE: f64 = 10_000.0;

/// Half-extent of the default square lattice in world units.
pub const DEFAULT_GRID_SIZE: f64 = 0.36;

/// Distance between neighbouring lattice cells in the default configuration.
pub const DEFAULT_GRID_INCREMENT: f64 = 0.12;

/// Number of moves a player may queue before executing.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

const DEFAULT_EXECUTE_DELAY_MS: u64 = 300;
const DEFAULT_STEP_INTERVAL_MS: u64 = 400;

/// Rounds a world-space value onto the shared four-digit grid.
#[must_use]
pub fn round4(value: f64) -> f64 {
    (value * COORDINATE_SCALE).round() / COORDINATE_SCALE
}

/// Converts a world-space value into whole coordinate units.
#[must_use]
pub fn to_units(value: f64) -> i64 {
    (value * COORDINATE_SCALE).round() as i64
}

/// Commands that express all permissible session mutations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Appends a move to the end of the command queue.
    QueueStep {
        /// Move requested by the player.
        step: Step,
    },
    /// Removes the most recently queued move.
    UndoStep,
    /// Runs the queued moves against the active level.
    Execute,
    /// Applies the outcome of a run whose resolution was deferred for playback.
    ResolveRun,
    /// Abandons a deferred run and returns the session to its starting state.
    Abort,
    /// Reloads the active level and clears the queue.
    Reset,
    /// Moves on from a completed level.
    Advance {
        /// Which level should become active.
        mode: AdvanceMode,
    },
    /// Loads an arbitrary level from the catalog.
    SelectLevel {
        /// Catalog index of the requested level.
        level: LevelIndex,
    },
    /// Advances the session clock by the provided delta time.
    Tick {
        /// Duration of time that elapsed since the previous tick.
        dt: Duration,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Indicates that the session clock advanced.
    TimeAdvanced {
        /// Duration of time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that a level became active with freshly derived geometry.
    LevelLoaded {
        /// Catalog index of the loaded level.
        level: LevelIndex,
        /// Pose the token occupies before any move executes.
        spawn: Pose,
        /// Cell the token must reach to complete the level.
        goal: Coordinate,
    },
    /// Confirms that the session moved from one level to another.
    LevelAdvanced {
        /// Level that was active before advancing.
        from: LevelIndex,
        /// Level that is active after advancing.
        to: LevelIndex,
    },
    /// Confirms that a move was appended to the queue.
    StepQueued {
        /// Move together with the placeholder slot it was bound to.
        queued: QueuedStep,
    },
    /// Confirms that the most recent move was removed from the queue.
    StepUndone {
        /// Move together with the placeholder slot it released.
        queued: QueuedStep,
    },
    /// Reports that the queue was emptied by a reset or level change.
    QueueCleared {
        /// Number of moves that were discarded.
        discarded: usize,
    },
    /// Announces a session state transition.
    SessionStateChanged {
        /// State before the transition.
        from: SessionState,
        /// State after the transition.
        to: SessionState,
    },
    /// Reports a single command consumed by the execution engine.
    ExecutionStep {
        /// Command that was consumed and the pose it produced.
        step: TraceStep,
    },
    /// Reports that a run was traced and awaits [`Command::ResolveRun`].
    RunPending {
        /// Number of commands consumed by the pending trace.
        steps: usize,
    },
    /// Reports that the token reached the goal.
    RunCompleted {
        /// Number of commands consumed before reaching the goal.
        steps: usize,
    },
    /// Reports that the run ended without reaching the goal.
    RunFailed {
        /// Zero-based index of the command at which the run failed.
        step: usize,
        /// Reason the run failed.
        cause: FailureCause,
        /// Position of the token when the run failed.
        position: Coordinate,
    },
    /// Reports that a pending run was abandoned.
    RunAborted,
    /// Reports that a command was refused without changing the session.
    CommandRejected {
        /// Kind of command that was refused.
        action: Action,
        /// Specific reason the command was refused.
        reason: Rejection,
    },
}

/// Lifecycle states of a level session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// The player is assembling the command queue.
    Start,
    /// The queue is being executed.
    Running,
    /// The token reached the goal.
    Complete,
    /// The token left the path or ran out of commands.
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Start => "start",
            Self::Running => "running",
            Self::Complete => "complete",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Selects the level that becomes active when advancing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvanceMode {
    /// The following catalog entry, wrapping to the first after the last.
    Next,
    /// The first catalog entry.
    First,
}

/// Kinds of commands that may be rejected by the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// [`Command::QueueStep`].
    QueueStep,
    /// [`Command::UndoStep`].
    UndoStep,
    /// [`Command::Execute`].
    Execute,
    /// [`Command::ResolveRun`].
    ResolveRun,
    /// [`Command::Abort`].
    Abort,
    /// [`Command::Reset`].
    Reset,
    /// [`Command::Advance`].
    Advance,
    /// [`Command::SelectLevel`].
    SelectLevel,
}

/// Reasons a command may be rejected by the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rejection {
    /// The session is not in a state that permits the command.
    WrongState {
        /// State the session was in when the command arrived.
        state: SessionState,
    },
    /// The queue already holds as many moves as it can.
    QueueFull {
        /// Maximum number of moves the queue accepts.
        capacity: usize,
    },
    /// The queue holds no moves.
    QueueEmpty,
    /// No deferred run awaits resolution.
    NoPendingRun,
    /// The requested level does not exist in the catalog.
    UnknownLevel {
        /// Index that was requested.
        level: LevelIndex,
    },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongState { state } => write!(f, "not permitted while {state}"),
            Self::QueueFull { capacity } => write!(f, "queue is full ({capacity} moves)"),
            Self::QueueEmpty => write!(f, "queue is empty"),
            Self::NoPendingRun => write!(f, "no run awaits resolution"),
            Self::UnknownLevel { level } => write!(f, "level {} does not exist", level.get()),
        }
    }
}

/// Compass headings available to the token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Heading {
    /// Movement toward decreasing z.
    North,
    /// Movement toward increasing x.
    East,
    /// Movement toward increasing z.
    South,
    /// Movement toward decreasing x.
    West,
}

impl Heading {
    /// Heading after a quarter turn counter-clockwise.
    #[must_use]
    pub const fn turned_left(self) -> Self {
        match self {
            Self::North => Self::West,
            Self::West => Self::South,
            Self::South => Self::East,
            Self::East => Self::North,
        }
    }

    /// Heading after a quarter turn clockwise.
    #[must_use]
    pub const fn turned_right(self) -> Self {
        match self {
            Self::North => Self::East,
            Self::East => Self::South,
            Self::South => Self::West,
            Self::West => Self::North,
        }
    }

    /// Unit offset along the x and z axes for a single forward step.
    #[must_use]
    pub const fn delta(self) -> (i64, i64) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }
}

/// Moves a player can place in the command queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    /// Advance one cell along the current heading.
    Forward,
    /// Rotate a quarter turn counter-clockwise in place.
    Left,
    /// Rotate a quarter turn clockwise in place.
    Right,
}

/// Identifier of the placeholder slot a queued move is displayed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(usize);

impl SlotId {
    /// Creates a new slot identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: usize) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the slot identifier.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }
}

/// Move held by the command queue together with its placeholder slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueuedStep {
    /// Move the player requested.
    pub step: Step,
    /// Placeholder slot the move occupies.
    pub slot: SlotId,
}

/// Index into the ordered level catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LevelIndex(usize);

impl LevelIndex {
    /// Creates a new level index wrapper.
    #[must_use]
    pub const fn new(value: usize) -> Self {
        Self(value)
    }

    /// Retrieves the underlying catalog position.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }
}

/// Lattice position rounded to four decimal digits.
///
/// Components are stored as whole ten-thousandths so equality and hashing are
/// exact regardless of how the value was computed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    x: i64,
    z: i64,
}

impl Coordinate {
    /// Creates a coordinate from world-space values, rounding both components.
    #[must_use]
    pub fn new(x: f64, z: f64) -> Self {
        Self {
            x: to_units(x),
            z: to_units(z),
        }
    }

    /// Creates a coordinate from values already expressed in coordinate units.
    #[must_use]
    pub const fn from_units(x: i64, z: i64) -> Self {
        Self { x, z }
    }

    /// X component in world units.
    #[must_use]
    pub fn x(&self) -> f64 {
        self.x as f64 / COORDINATE_SCALE
    }

    /// Z component in world units.
    #[must_use]
    pub fn z(&self) -> f64 {
        self.z as f64 / COORDINATE_SCALE
    }

    /// X component in coordinate units.
    #[must_use]
    pub const fn x_units(&self) -> i64 {
        self.x
    }

    /// Z component in coordinate units.
    #[must_use]
    pub const fn z_units(&self) -> i64 {
        self.z
    }

    /// Coordinate one grid step away along the provided heading.
    #[must_use]
    pub const fn stepped(self, heading: Heading, step_units: i64) -> Self {
        let (dx, dz) = heading.delta();
        Self {
            x: self.x + dx * step_units,
            z: self.z + dz * step_units,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x(), self.z())
    }
}

/// Position and heading of the token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pose {
    /// Cell the token occupies.
    pub position: Coordinate,
    /// Direction the token faces.
    pub heading: Heading,
}

/// Reasons a run can end without reaching the goal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureCause {
    /// The token stepped onto a lattice cell that is not part of the path.
    Danger,
    /// The token stepped beyond the lattice.
    OffLattice,
    /// Every queued command was consumed without reaching the goal.
    Exhausted,
}

/// Terminal classification of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// The token reached the goal.
    Completed {
        /// Number of commands consumed, including the final step.
        steps: usize,
    },
    /// The token failed to reach the goal.
    Failed {
        /// Zero-based command index at which the run failed. Equals the
        /// number of commands when the queue ran out.
        step: usize,
        /// Reason the run failed.
        cause: FailureCause,
    },
}

/// A single command consumed during a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraceStep {
    /// Zero-based index of the command within the queue.
    pub index: usize,
    /// Command that was consumed.
    pub step: Step,
    /// Pose of the token after the command.
    pub pose: Pose,
}

/// Replayable record of a run, computed atomically by the execution engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTrace {
    /// Pose of the token before the first command.
    pub start: Pose,
    /// Commands consumed in order.
    pub steps: Vec<TraceStep>,
    /// Classification of the run.
    pub outcome: Outcome,
}

impl RunTrace {
    /// Pose of the token once the run stopped.
    #[must_use]
    pub fn final_pose(&self) -> Pose {
        self.steps.last().map_or(self.start, |step| step.pose)
    }

    /// Reports whether the run reached the goal.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self.outcome, Outcome::Completed { .. })
    }
}

/// Read-only view of the geometry of the active level.
#[derive(Clone, Copy, Debug)]
pub struct GeometryView<'a> {
    spawn: Coordinate,
    goal: Coordinate,
    path: &'a [Coordinate],
    danger: &'a HashSet<Coordinate>,
    facing: Heading,
    step_units: i64,
}

impl<'a> GeometryView<'a> {
    /// Captures a new geometry view backed by the provided path and danger set.
    ///
    /// Returns `None` when the path is empty, since a level without a spawn
    /// cell cannot be played.
    #[must_use]
    pub fn new(
        path: &'a [Coordinate],
        danger: &'a HashSet<Coordinate>,
        facing: Heading,
        step_units: i64,
    ) -> Option<Self> {
        let (spawn, goal) = (*path.first()?, *path.last()?);
        Some(Self {
            spawn,
            goal,
            path,
            danger,
            facing,
            step_units,
        })
    }

    /// Ordered path cells from spawn to goal.
    #[must_use]
    pub fn path(&self) -> &'a [Coordinate] {
        self.path
    }

    /// Cell the token spawns on.
    #[must_use]
    pub const fn spawn(&self) -> Coordinate {
        self.spawn
    }

    /// Cell the token must reach.
    #[must_use]
    pub const fn goal(&self) -> Coordinate {
        self.goal
    }

    /// Heading the token faces when spawned.
    #[must_use]
    pub const fn facing(&self) -> Heading {
        self.facing
    }

    /// Distance between neighbouring cells in coordinate units.
    #[must_use]
    pub const fn step_units(&self) -> i64 {
        self.step_units
    }

    /// Reports whether the provided cell is a danger cell.
    #[must_use]
    pub fn is_danger(&self, cell: Coordinate) -> bool {
        self.danger.contains(&cell)
    }

    /// Reports whether the provided cell lies on the path.
    #[must_use]
    pub fn is_path(&self, cell: Coordinate) -> bool {
        self.path.contains(&cell)
    }

    /// Iterator over the danger cells in no particular order.
    pub fn danger(&self) -> impl Iterator<Item = Coordinate> + 'a {
        self.danger.iter().copied()
    }
}

/// Controls when the outcome of a traced run is applied to the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunPacing {
    /// The outcome is applied as soon as the run is traced.
    Immediate,
    /// The session stays running until [`Command::ResolveRun`] or [`Command::Abort`].
    Deferred,
}

/// Tunable parameters of a puzzle session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Half-extent of the square lattice in world units.
    pub grid_size: f64,
    /// Distance between neighbouring lattice cells in world units.
    pub grid_increment: f64,
    /// Maximum number of moves the queue accepts.
    pub queue_capacity: usize,
    /// When the outcome of a traced run is applied.
    pub pacing: RunPacing,
    /// Delay between an execute tap and the execute command, in milliseconds.
    pub execute_delay_ms: u64,
    /// Time each replayed step is displayed for, in milliseconds.
    pub step_interval_ms: u64,
}

impl GameConfig {
    /// Delay between an execute tap and the execute command.
    #[must_use]
    pub const fn execute_delay(&self) -> Duration {
        Duration::from_millis(self.execute_delay_ms)
    }

    /// Time each replayed step is displayed for.
    #[must_use]
    pub const fn step_interval(&self) -> Duration {
        Duration::from_millis(self.step_interval_ms)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            grid_increment: DEFAULT_GRID_INCREMENT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            pacing: RunPacing::Immediate,
            execute_delay_ms: DEFAULT_EXECUTE_DELAY_MS,
            step_interval_ms: DEFAULT_STEP_INTERVAL_MS,
        }
    }
}

/// Reasons a lattice description is unusable.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum GridError {
    /// The half-extent was negative or not a finite number.
    #[error("grid size must be a finite, non-negative number (received {0})")]
    InvalidSize(f64),
    /// The increment was too small to keep cells distinct after rounding.
    #[error("grid increment must be a finite number of at least 0.0001 (received {0})")]
    InvalidIncrement(f64),
    /// The lattice would hold more cells along an axis than a session supports.
    #[error("grid would span {cells_per_axis} cells per axis (at most {limit} supported)")]
    TooLarge {
        /// Cells per axis the size and increment describe, saturated at `u64::MAX`.
        cells_per_axis: u64,
        /// Largest supported number of cells per axis.
        limit: u64,
    },
}

/// Data-integrity faults detected while loading levels.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum LevelError {
    /// The catalog does not contain a single level.
    #[error("level catalog contains no levels")]
    EmptyCatalog,
    /// A level path lists no cells.
    #[error("level {level} has an empty path")]
    EmptyPath {
        /// Catalog position of the faulty level.
        level: usize,
    },
    /// A level path references a cell outside the lattice.
    #[error(
        "level {level} path entry {step} references ({row}, {column}) outside a {side}x{side} lattice"
    )]
    IndexOutOfRange {
        /// Catalog position of the faulty level.
        level: usize,
        /// Position of the faulty entry within the path.
        step: usize,
        /// Row index of the faulty entry.
        row: u32,
        /// Column index of the faulty entry.
        column: u32,
        /// Number of cells along each lattice axis.
        side: usize,
    },
    /// The lattice itself could not be built.
    #[error(transparent)]
    Grid(#[from] GridError),
}
