//! Frame loop that drives the world and its systems.

use std::time::Duration;

use anyhow::{Context, Result};
use carrot_hop_core::{Command, Event, FailureCause, Outcome, SessionState};
use carrot_hop_presentation::{
    cue_for, cue_for_step, Cue, FrameInput, GridPresentation, Scene,
};
use carrot_hop_system_bootstrap::Bootstrap;
use carrot_hop_system_input::{Input, Tap};
use carrot_hop_system_playback::Playback;
use carrot_hop_world::{self as world, query, World};

/// Owns the session and the systems reacting to it.
#[derive(Debug)]
pub(crate) struct GameLoop {
    world: World,
    input: Input,
    playback: Playback,
    grid: GridPresentation,
    held_cues: Vec<Cue>,
}

impl GameLoop {
    pub(crate) fn new(world: World) -> Result<Self> {
        let config = query::config(&world);
        let input = Input::new(config.execute_delay());
        let playback = Playback::new(config.step_interval());
        let lattice = query::lattice(&world);
        let grid = GridPresentation::new(
            lattice.side(),
            lattice.origin_units(),
            lattice.step_units(),
        )
        .context("lattice cannot be presented")?;

        Ok(Self {
            world,
            input,
            playback,
            grid,
            held_cues: Vec::new(),
        })
    }

    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    pub(crate) fn initial_scene(&self) -> Result<Scene> {
        self.compose(Vec::new())
            .context("active level has no geometry to present")
    }

    /// Advances the session by `dt`, applies the frame input and rewrites
    /// `scene`. Returns every event the world raised during the frame.
    pub(crate) fn frame(&mut self, dt: Duration, input: FrameInput, scene: &mut Scene) -> Vec<Event> {
        let mut events = Vec::new();
        if !dt.is_zero() {
            world::apply(&mut self.world, Command::Tick { dt }, &mut events);
        }

        let taps: Vec<Tap> = input
            .buttons
            .iter()
            .filter_map(|&button| Tap::from_button_index(button))
            .collect();
        let mut frames = Vec::new();
        let mut commands = Vec::new();
        self.input.handle(&events, &taps, &mut commands);
        self.playback.handle(&events, &mut frames, &mut commands);
        if let Some(level) = input.select_level {
            commands.push(Command::SelectLevel { level });
        }

        // Systems only react to time, so follow-up commands settle within a frame.
        let mut delivered = events.len();
        while !commands.is_empty() {
            for command in commands.drain(..) {
                world::apply(&mut self.world, command, &mut events);
            }
            let fresh = &events[delivered..];
            self.input.handle(fresh, &[], &mut commands);
            self.playback.handle(fresh, &mut frames, &mut commands);
            delivered = events.len();
        }

        let mut cues = Vec::new();
        for event in &events {
            match event {
                Event::ExecutionStep { .. } => {}
                Event::RunCompleted { .. } | Event::RunFailed { .. } => {
                    self.held_cues.extend(cue_for(event));
                }
                Event::LevelLoaded { .. } | Event::RunAborted => self.held_cues.clear(),
                _ => cues.extend(cue_for(event)),
            }
        }
        cues.extend(frames.iter().filter_map(|frame| cue_for_step(frame.step.step)));
        if !self.playback.is_playing() {
            cues.append(&mut self.held_cues);
        }

        if let Some(next) = self.compose(cues) {
            *scene = next;
        }
        events
    }

    fn compose(&self, cues: Vec<Cue>) -> Option<Scene> {
        let view = query::geometry_view(&self.world)?;
        let state = query::session_state(&self.world);
        let playing = self.playback.is_playing();
        let token = self
            .playback
            .current_pose()
            .unwrap_or_else(|| query::spawn_pose(&self.world));

        let mut scene = Scene::compose(
            self.grid,
            Bootstrap.level_title(&self.world),
            query::level_index(&self.world),
            state,
            &view,
        )
        .with_token(token)
        .with_queue(
            query::queued_steps(&self.world),
            query::queue_capacity(&self.world),
        );

        if state == SessionState::Failed && !playing {
            if let Some(trace) = query::last_run(&self.world) {
                if matches!(
                    trace.outcome,
                    Outcome::Failed {
                        cause: FailureCause::Danger | FailureCause::OffLattice,
                        ..
                    }
                ) {
                    scene = scene.with_splash(trace.final_pose().position);
                }
            }
        }

        scene.cues = cues;
        scene.busy = playing
            || self.input.execute_pending()
            || query::pending_run(&self.world).is_some();
        Some(scene)
    }
}

#[cfg(test)]
mod tests {
    use carrot_hop_core::{
        Coordinate, GameConfig, Heading, LevelCatalog, LevelDefinition, LevelIndex, PathIndex,
        RunPacing,
    };
    use carrot_hop_presentation::world_position;

    use super::*;

    const FRAME: Duration = Duration::from_millis(400);

    fn game(pacing: RunPacing) -> (GameLoop, Scene) {
        let config = GameConfig {
            pacing,
            ..GameConfig::default()
        };
        let world = World::new(config, LevelCatalog::builtin()).expect("builtin levels");
        let game = GameLoop::new(world).expect("grid presents");
        let scene = game.initial_scene().expect("scene composes");
        (game, scene)
    }

    fn press(buttons: &[usize]) -> FrameInput {
        FrameInput {
            buttons: buttons.to_vec(),
            ..FrameInput::default()
        }
    }

    fn settle(game: &mut GameLoop, scene: &mut Scene) -> Vec<Vec<Cue>> {
        let mut cues = Vec::new();
        for _ in 0..20 {
            if !scene.busy {
                break;
            }
            let _ = game.frame(FRAME, FrameInput::default(), scene);
            cues.push(scene.cues.clone());
        }
        cues
    }

    #[test]
    fn queued_run_replays_hops_before_completion() {
        for pacing in [RunPacing::Immediate, RunPacing::Deferred] {
            let (mut game, mut scene) = game(pacing);

            let _ = game.frame(Duration::ZERO, press(&[0, 0, 0, 4]), &mut scene);
            assert_eq!(scene.queued_len(), 3);
            assert!(scene.busy, "execute is delayed");
            assert_eq!(scene.cues, vec![Cue::Click; 3]);

            let cues = settle(&mut game, &mut scene);

            assert_eq!(scene.state, SessionState::Complete);
            assert!(!scene.busy);
            assert_eq!(
                scene.token.position,
                world_position(Coordinate::new(0.0, -0.12))
            );
            let flat: Vec<Cue> = cues.into_iter().flatten().collect();
            assert_eq!(
                flat,
                vec![Cue::Jump, Cue::Jump, Cue::Jump, Cue::Complete],
                "{pacing:?}"
            );
        }
    }

    #[test]
    fn failed_run_ends_with_splash() {
        let (mut game, mut scene) = game(RunPacing::Immediate);

        let _ = game.frame(Duration::ZERO, press(&[0, 1, 0, 4]), &mut scene);
        let _ = settle(&mut game, &mut scene);

        assert_eq!(scene.state, SessionState::Failed);
        assert!(!scene.token.visible);
        let splashed: Vec<_> = scene.danger.iter().filter(|cue| cue.highlighted).collect();
        assert_eq!(splashed.len(), 1);
        assert_eq!(
            splashed[0].position,
            world_position(Coordinate::new(-0.12, 0.12))
        );

        let _ = game.frame(Duration::ZERO, press(&[5]), &mut scene);
        assert_eq!(scene.state, SessionState::Start);
        assert!(scene.token.visible);
        assert_eq!(scene.queued_len(), 0);
    }

    #[test]
    fn grid_matches_the_world_lattice() {
        let config = GameConfig {
            grid_size: 0.4,
            grid_increment: 0.12,
            ..GameConfig::default()
        };
        let catalog = LevelCatalog::new(vec![LevelDefinition::new(
            Heading::East,
            vec![PathIndex::new(0, 0), PathIndex::new(1, 0), PathIndex::new(2, 0)],
        )]);
        let world = World::new(config, catalog).expect("level fits the lattice");
        let game = GameLoop::new(world).expect("grid presents");
        let scene = game.initial_scene().expect("scene composes");

        let lattice = query::lattice(game.world());
        assert_eq!(scene.grid.side(), lattice.side());
        for (index, &cell) in lattice.cells().iter().enumerate() {
            assert_eq!(
                scene.grid.cell_index(world_position(cell)),
                Some((index / lattice.side(), index % lattice.side())),
                "{cell:?}"
            );
        }
    }

    #[test]
    fn level_selection_rebuilds_scene() {
        let (mut game, mut scene) = game(RunPacing::Immediate);
        let platforms_before = scene.platforms.clone();

        let events = game.frame(
            Duration::ZERO,
            FrameInput {
                select_level: Some(LevelIndex::new(2)),
                ..FrameInput::default()
            },
            &mut scene,
        );

        assert!(events
            .iter()
            .any(|event| matches!(event, Event::LevelLoaded { .. })));
        assert_eq!(scene.level, LevelIndex::new(2));
        assert_ne!(scene.platforms, platforms_before);
        assert_eq!(query::level_index(game.world()), LevelIndex::new(2));
    }
}
