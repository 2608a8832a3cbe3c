#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared presentation contracts for Carrot Hop adapters.
//!
//! Nothing in this crate draws or plays audio. It describes what a frame
//! should show as plain data and leaves the drawing to a [`RenderingBackend`].

use std::{error::Error, f32::consts::FRAC_PI_2, fmt, time::Duration};

use anyhow::Result as AnyResult;
use carrot_hop_core::{
    to_units, Coordinate, Event, FailureCause, GeometryView, Heading, LevelIndex, Pose,
    QueuedStep, SessionState, SlotId, Step,
};
use glam::Vec3;

/// Converts a lattice coordinate into a world-space position on the ground plane.
#[must_use]
pub fn world_position(cell: Coordinate) -> Vec3 {
    Vec3::new(cell.x() as f32, 0.0, cell.z() as f32)
}

/// Rotation about the vertical axis, in radians from north towards east.
#[must_use]
pub fn heading_yaw(heading: Heading) -> f32 {
    match heading {
        Heading::North => 0.0,
        Heading::East => FRAC_PI_2,
        Heading::South => 2.0 * FRAC_PI_2,
        Heading::West => 3.0 * FRAC_PI_2,
    }
}

/// Dimensions of the square lattice as seen by a backend.
///
/// Held in coordinate units so cells resolve exactly as the world lays them out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridPresentation {
    /// Number of cells along each axis.
    pub side: usize,
    /// Value of the first cell along both axes, in coordinate units.
    pub origin_units: i64,
    /// Distance between neighbouring cells in coordinate units.
    pub step_units: i64,
}

impl GridPresentation {
    /// Creates a grid descriptor for a lattice of `side` cells per axis.
    pub fn new(side: usize, origin_units: i64, step_units: i64) -> Result<Self, RenderingError> {
        if step_units <= 0 {
            return Err(RenderingError::InvalidStep { step_units });
        }
        if side == 0 {
            return Err(RenderingError::EmptyLattice);
        }
        Ok(Self {
            side,
            origin_units,
            step_units,
        })
    }

    /// Number of cells along each axis.
    #[must_use]
    pub const fn side(&self) -> usize {
        self.side
    }

    /// Resolves a ground-plane position to the `(row, column)` of its cell.
    ///
    /// Rows follow the x axis and columns the z axis.
    #[must_use]
    pub fn cell_index(&self, position: Vec3) -> Option<(usize, usize)> {
        let row = self.axis_index(f64::from(position.x))?;
        let column = self.axis_index(f64::from(position.z))?;
        Some((row, column))
    }

    fn axis_index(&self, value: f64) -> Option<usize> {
        let offset = to_units(value).checked_sub(self.origin_units)?;
        if offset < 0 {
            return None;
        }
        let index = usize::try_from((offset + self.step_units / 2) / self.step_units).ok()?;
        (index < self.side).then_some(index)
    }
}

/// Token representing the player.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TokenPresentation {
    /// World-space position of the token.
    pub position: Vec3,
    /// Facing of the token, see [`heading_yaw`].
    pub yaw: f32,
    /// Heading the yaw was derived from.
    pub heading: Heading,
    /// Whether the token should be drawn. Hidden after it dropped into water.
    pub visible: bool,
}

impl TokenPresentation {
    /// Creates a visible token at the provided pose.
    #[must_use]
    pub fn from_pose(pose: Pose) -> Self {
        Self {
            position: world_position(pose.position),
            yaw: heading_yaw(pose.heading),
            heading: pose.heading,
            visible: true,
        }
    }
}

/// Water cell drawn around the path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DangerCue {
    /// World-space position of the cell.
    pub position: Vec3,
    /// Whether the token fell in at this cell.
    pub highlighted: bool,
}

/// Placeholder showing one entry of the command queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueSlotPresentation {
    /// Slot shown by this placeholder.
    pub slot: SlotId,
    /// Move occupying the slot, if any.
    pub step: Option<Step>,
}

/// Scene description of a single frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Lattice dimensions.
    pub grid: GridPresentation,
    /// Title of the active level.
    pub title: String,
    /// Active level.
    pub level: LevelIndex,
    /// Session state at the time the scene was composed.
    pub state: SessionState,
    /// The player token.
    pub token: TokenPresentation,
    /// Platforms in path order, spawn first.
    pub platforms: Vec<Vec3>,
    /// Position of the goal marker.
    pub goal: Vec3,
    /// Water cells sorted by position.
    pub danger: Vec<DangerCue>,
    /// Queue placeholders, one per slot of capacity.
    pub queue: Vec<QueueSlotPresentation>,
    /// Feedback cues raised since the previous frame.
    pub cues: Vec<Cue>,
    /// Whether the adapter should keep advancing time without input.
    pub busy: bool,
}

impl Scene {
    /// Composes the static parts of a scene from the geometry of the active level.
    ///
    /// The token starts at the spawn pose, the queue is empty and no cell is
    /// highlighted.
    #[must_use]
    pub fn compose(
        grid: GridPresentation,
        title: impl Into<String>,
        level: LevelIndex,
        state: SessionState,
        geometry: &GeometryView<'_>,
    ) -> Self {
        let mut danger: Vec<Coordinate> = geometry.danger().collect();
        danger.sort_by_key(|cell| (cell.x_units(), cell.z_units()));

        Self {
            grid,
            title: title.into(),
            level,
            state,
            token: TokenPresentation::from_pose(Pose {
                position: geometry.spawn(),
                heading: geometry.facing(),
            }),
            platforms: geometry.path().iter().copied().map(world_position).collect(),
            goal: world_position(geometry.goal()),
            danger: danger
                .into_iter()
                .map(|cell| DangerCue {
                    position: world_position(cell),
                    highlighted: false,
                })
                .collect(),
            queue: Vec::new(),
            cues: Vec::new(),
            busy: false,
        }
    }

    /// Places the token at `pose`.
    #[must_use]
    pub fn with_token(mut self, pose: Pose) -> Self {
        self.token = TokenPresentation::from_pose(pose);
        self
    }

    /// Fills `capacity` queue placeholders with the queued moves.
    #[must_use]
    pub fn with_queue(mut self, queued: &[QueuedStep], capacity: usize) -> Self {
        self.queue = (0..capacity)
            .map(|index| QueueSlotPresentation {
                slot: SlotId::new(index),
                step: queued
                    .iter()
                    .find(|entry| entry.slot.get() == index)
                    .map(|entry| entry.step),
            })
            .collect();
        self
    }

    /// Marks the cell the token fell into and hides the token.
    ///
    /// Cells outside the lattice have no cue to highlight; the token is still
    /// hidden.
    #[must_use]
    pub fn with_splash(mut self, cell: Coordinate) -> Self {
        let position = world_position(cell);
        for cue in &mut self.danger {
            cue.highlighted = cue.position == position;
        }
        self.token.visible = false;
        self
    }

    /// Number of queue placeholders holding a move.
    #[must_use]
    pub fn queued_len(&self) -> usize {
        self.queue.iter().filter(|slot| slot.step.is_some()).count()
    }
}

/// Audio-visual feedback the presentation layer may play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cue {
    /// A move was queued.
    Click,
    /// A queued move was removed.
    Remove,
    /// The token hopped forward.
    Jump,
    /// The token dropped into water or off the lattice.
    Drop,
    /// The run ended without reaching the goal.
    Fail,
    /// The goal was reached.
    Complete,
}

/// Feedback for a consumed move.
#[must_use]
pub const fn cue_for_step(step: Step) -> Option<Cue> {
    match step {
        Step::Forward => Some(Cue::Jump),
        Step::Left | Step::Right => None,
    }
}

/// Feedback associated with a world event, if any.
#[must_use]
pub fn cue_for(event: &Event) -> Option<Cue> {
    match event {
        Event::StepQueued { .. } => Some(Cue::Click),
        Event::StepUndone { .. } => Some(Cue::Remove),
        Event::ExecutionStep { step } => cue_for_step(step.step),
        Event::RunCompleted { .. } => Some(Cue::Complete),
        Event::RunFailed { cause, .. } => Some(match cause {
            FailureCause::Danger | FailureCause::OffLattice => Cue::Drop,
            FailureCause::Exhausted => Cue::Fail,
        }),
        _ => None,
    }
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct FrameInput {
    /// Control panel buttons pressed on this frame, by index.
    pub buttons: Vec<usize>,
    /// Level requested directly by the player.
    pub select_level: Option<LevelIndex>,
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title shown by the backend.
    pub window_title: String,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            scene,
        }
    }
}

/// Rendering backend capable of presenting Carrot Hop scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the simulated frame delta
    /// and the input captured by the adapter, and rewrites the scene before it
    /// is presented.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing presentation descriptors.
#[derive(Debug, PartialEq, Eq)]
pub enum RenderingError {
    /// Cell spacing must be positive to keep cells apart.
    InvalidStep {
        /// Provided spacing in coordinate units.
        step_units: i64,
    },
    /// A lattice needs at least one cell to be drawn.
    EmptyLattice,
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidStep { step_units } => {
                write!(f, "cell step must be positive (received {step_units} units)")
            }
            Self::EmptyLattice => write!(f, "lattice has no cells to present"),
        }
    }
}

impl Error for RenderingError {}
