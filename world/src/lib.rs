#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative level session for Carrot Hop.
//!
//! The [`World`] owns the lattice, the active level geometry, the command
//! queue and the session state machine. Every mutation flows through
//! [`apply`]; read-only access goes through [`query`].

pub mod geometry;
pub mod grid;
pub mod queue;

use carrot_hop_core::{
    Action, AdvanceMode, Command, Event, GameConfig, LevelCatalog, LevelError, LevelIndex,
    Outcome, Rejection, RunPacing, RunTrace, SessionState, Step, WELCOME_BANNER,
};
use carrot_hop_system_execution::ExecutionEngine;
use tracing::{debug, error, info};

use self::{
    geometry::LevelGeometry,
    grid::{GridModel, Lattice},
    queue::CommandQueue,
};

/// Represents the authoritative Carrot Hop session state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    config: GameConfig,
    grid: GridModel,
    lattice: Lattice,
    catalog: LevelCatalog,
    level: LevelIndex,
    geometry: LevelGeometry,
    queue: CommandQueue,
    state: SessionState,
    engine: ExecutionEngine,
    pending_run: Option<RunTrace>,
    last_run: Option<RunTrace>,
}

impl World {
    /// Creates a session with the first catalog level active.
    ///
    /// Every level in the catalog is resolved against the lattice up front so
    /// that a malformed definition is reported here instead of when the
    /// player reaches it.
    pub fn new(config: GameConfig, catalog: LevelCatalog) -> Result<Self, LevelError> {
        let grid = GridModel::from_config(&config)?;
        let lattice = grid.build_lattice();

        let mut levels = catalog.levels().iter().enumerate();
        let Some((_, first)) = levels.next() else {
            return Err(LevelError::EmptyCatalog);
        };
        let geometry = LevelGeometry::load(&lattice, grid.step_units(), 0, first)?;
        for (index, definition) in levels {
            let _ = LevelGeometry::load(&lattice, grid.step_units(), index, definition)?;
        }

        info!(
            levels = catalog.len(),
            cells = lattice.len(),
            "level catalog validated"
        );

        Ok(Self {
            banner: WELCOME_BANNER,
            queue: CommandQueue::with_capacity(config.queue_capacity),
            config,
            grid,
            lattice,
            catalog,
            level: LevelIndex::new(0),
            geometry,
            state: SessionState::Start,
            engine: ExecutionEngine::new(),
            pending_run: None,
            last_run: None,
        })
    }

    fn transition(&mut self, to: SessionState, out_events: &mut Vec<Event>) {
        if self.state == to {
            return;
        }

        let from = self.state;
        self.state = to;
        debug!(%from, %to, "session state changed");
        out_events.push(Event::SessionStateChanged { from, to });
    }

    fn load_level(&mut self, level: LevelIndex, out_events: &mut Vec<Event>) -> bool {
        let Some(definition) = self.catalog.levels().get(level.get()) else {
            return false;
        };

        let geometry = match LevelGeometry::load(
            &self.lattice,
            self.grid.step_units(),
            level.get(),
            definition,
        ) {
            Ok(geometry) => geometry,
            Err(error) => {
                error!(%error, level = level.get(), "level failed to load");
                return false;
            }
        };

        info!(
            level = level.get(),
            name = definition.name().unwrap_or("unnamed"),
            path_cells = geometry.path().len(),
            "level loaded"
        );

        self.geometry = geometry;
        self.level = level;
        self.pending_run = None;

        let discarded = self.queue.clear();
        if discarded > 0 {
            out_events.push(Event::QueueCleared { discarded });
        }
        out_events.push(Event::LevelLoaded {
            level,
            spawn: self.geometry.spawn_pose(),
            goal: self.geometry.goal(),
        });
        self.transition(SessionState::Start, out_events);
        true
    }

    fn queue_step(&mut self, step: Step, out_events: &mut Vec<Event>) {
        if self.state != SessionState::Start {
            reject(out_events, Action::QueueStep, self.wrong_state());
            return;
        }

        match self.queue.push(step) {
            Ok(queued) => out_events.push(Event::StepQueued { queued }),
            Err(reason) => reject(out_events, Action::QueueStep, reason),
        }
    }

    fn undo_step(&mut self, out_events: &mut Vec<Event>) {
        if self.state != SessionState::Start {
            reject(out_events, Action::UndoStep, self.wrong_state());
            return;
        }

        match self.queue.pop() {
            Some(queued) => out_events.push(Event::StepUndone { queued }),
            None => reject(out_events, Action::UndoStep, Rejection::QueueEmpty),
        }
    }

    fn execute(&mut self, out_events: &mut Vec<Event>) {
        if self.state != SessionState::Start {
            reject(out_events, Action::Execute, self.wrong_state());
            return;
        }
        if self.queue.is_empty() {
            reject(out_events, Action::Execute, Rejection::QueueEmpty);
            return;
        }
        let Some(view) = self.geometry.view() else {
            error!(level = self.level.get(), "active level has no spawn cell");
            reject(out_events, Action::Execute, Rejection::UnknownLevel { level: self.level });
            return;
        };

        let trace = self
            .engine
            .execute(&view, self.queue.steps().iter().map(|queued| queued.step));

        self.transition(SessionState::Running, out_events);
        for step in &trace.steps {
            out_events.push(Event::ExecutionStep { step: *step });
        }

        match self.config.pacing {
            RunPacing::Immediate => self.resolve(trace, out_events),
            RunPacing::Deferred => {
                out_events.push(Event::RunPending {
                    steps: trace.steps.len(),
                });
                self.pending_run = Some(trace);
            }
        }
    }

    fn resolve(&mut self, trace: RunTrace, out_events: &mut Vec<Event>) {
        match trace.outcome {
            Outcome::Completed { steps } => {
                info!(level = self.level.get(), steps, "level completed");
                out_events.push(Event::RunCompleted { steps });
                self.transition(SessionState::Complete, out_events);
            }
            Outcome::Failed { step, cause } => {
                let position = trace.final_pose().position;
                info!(level = self.level.get(), step, ?cause, %position, "run failed");
                out_events.push(Event::RunFailed {
                    step,
                    cause,
                    position,
                });
                self.transition(SessionState::Failed, out_events);
            }
        }
        self.last_run = Some(trace);
    }

    fn resolve_pending(&mut self, out_events: &mut Vec<Event>) {
        if self.state != SessionState::Running {
            reject(out_events, Action::ResolveRun, self.wrong_state());
            return;
        }

        match self.pending_run.take() {
            Some(trace) => self.resolve(trace, out_events),
            None => reject(out_events, Action::ResolveRun, Rejection::NoPendingRun),
        }
    }

    fn abort(&mut self, out_events: &mut Vec<Event>) {
        if self.state != SessionState::Running {
            reject(out_events, Action::Abort, self.wrong_state());
            return;
        }

        self.pending_run = None;
        out_events.push(Event::RunAborted);
        self.transition(SessionState::Start, out_events);
    }

    fn reset(&mut self, out_events: &mut Vec<Event>) {
        if self.state == SessionState::Running {
            reject(out_events, Action::Reset, self.wrong_state());
            return;
        }

        let level = self.level;
        if !self.load_level(level, out_events) {
            reject(out_events, Action::Reset, Rejection::UnknownLevel { level });
        }
    }

    fn advance(&mut self, mode: AdvanceMode, out_events: &mut Vec<Event>) {
        if self.state != SessionState::Complete {
            reject(out_events, Action::Advance, self.wrong_state());
            return;
        }

        let from = self.level;
        let to = match mode {
            AdvanceMode::Next => LevelIndex::new((from.get() + 1) % self.catalog.len()),
            AdvanceMode::First => LevelIndex::new(0),
        };

        if self.load_level(to, out_events) {
            out_events.push(Event::LevelAdvanced { from, to });
        } else {
            reject(out_events, Action::Advance, Rejection::UnknownLevel { level: to });
        }
    }

    fn select_level(&mut self, level: LevelIndex, out_events: &mut Vec<Event>) {
        if self.state == SessionState::Running {
            reject(out_events, Action::SelectLevel, self.wrong_state());
            return;
        }

        if !self.load_level(level, out_events) {
            reject(out_events, Action::SelectLevel, Rejection::UnknownLevel { level });
        }
    }

    fn wrong_state(&self) -> Rejection {
        Rejection::WrongState { state: self.state }
    }
}

fn reject(out_events: &mut Vec<Event>, action: Action, reason: Rejection) {
    debug!(?action, %reason, "command rejected");
    out_events.push(Event::CommandRejected { action, reason });
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::QueueStep { step } => world.queue_step(step, out_events),
        Command::UndoStep => world.undo_step(out_events),
        Command::Execute => world.execute(out_events),
        Command::ResolveRun => world.resolve_pending(out_events),
        Command::Abort => world.abort(out_events),
        Command::Reset => world.reset(out_events),
        Command::Advance { mode } => world.advance(mode, out_events),
        Command::SelectLevel { level } => world.select_level(level, out_events),
        Command::Tick { dt } => out_events.push(Event::TimeAdvanced { dt }),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use carrot_hop_core::{
        GameConfig, GeometryView, LevelIndex, Pose, QueuedStep, RunTrace, SessionState,
    };

    use super::{geometry::LevelGeometry, grid::Lattice, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Configuration the session was created with.
    #[must_use]
    pub fn config(world: &World) -> &GameConfig {
        &world.config
    }

    /// Current state of the session state machine.
    #[must_use]
    pub fn session_state(world: &World) -> SessionState {
        world.state
    }

    /// Catalog index of the active level.
    #[must_use]
    pub fn level_index(world: &World) -> LevelIndex {
        world.level
    }

    /// Number of levels in the catalog.
    #[must_use]
    pub fn level_count(world: &World) -> usize {
        world.catalog.len()
    }

    /// Display name of the active level, if one was authored.
    #[must_use]
    pub fn level_name(world: &World) -> Option<&str> {
        world
            .catalog
            .levels()
            .get(world.level.get())
            .and_then(|definition| definition.name())
    }

    /// Every cell of the lattice in row-major order.
    #[must_use]
    pub fn lattice(world: &World) -> &Lattice {
        &world.lattice
    }

    /// Geometry of the active level.
    #[must_use]
    pub fn geometry(world: &World) -> &LevelGeometry {
        &world.geometry
    }

    /// Geometry of the active level as consumed by the execution engine.
    #[must_use]
    pub fn geometry_view(world: &World) -> Option<GeometryView<'_>> {
        world.geometry.view()
    }

    /// Pose the token occupies before any move executes.
    #[must_use]
    pub fn spawn_pose(world: &World) -> Pose {
        world.geometry.spawn_pose()
    }

    /// Moves currently held by the queue in execution order.
    #[must_use]
    pub fn queued_steps(world: &World) -> &[QueuedStep] {
        world.queue.steps()
    }

    /// Maximum number of moves the queue accepts.
    #[must_use]
    pub fn queue_capacity(world: &World) -> usize {
        world.queue.capacity()
    }

    /// Trace awaiting resolution while the session runs with deferred pacing.
    #[must_use]
    pub fn pending_run(world: &World) -> Option<&RunTrace> {
        world.pending_run.as_ref()
    }

    /// Trace of the most recently resolved run.
    #[must_use]
    pub fn last_run(world: &World) -> Option<&RunTrace> {
        world.last_run.as_ref()
    }
}
