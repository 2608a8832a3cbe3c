use carrot_hop_core::{
    Action, AdvanceMode, Command, Coordinate, Event, FailureCause, GameConfig, Heading,
    LevelCatalog, LevelDefinition, LevelIndex, PathIndex, Rejection, RunPacing, SessionState,
    SlotId, Step,
};
use carrot_hop_world::{self as world, geometry::compute_danger, query, World};

fn two_level_catalog() -> LevelCatalog {
    LevelCatalog::new(vec![
        LevelDefinition::new(
            Heading::North,
            vec![
                PathIndex::new(3, 5),
                PathIndex::new(3, 4),
                PathIndex::new(3, 3),
                PathIndex::new(3, 2),
            ],
        )
        .with_name("Straight"),
        LevelDefinition::new(
            Heading::East,
            vec![PathIndex::new(1, 1), PathIndex::new(2, 1), PathIndex::new(2, 2)],
        )
        .with_name("Corner"),
    ])
}

fn new_world(pacing: RunPacing) -> World {
    let config = GameConfig {
        pacing,
        ..GameConfig::default()
    };
    World::new(config, two_level_catalog()).expect("catalog is valid")
}

fn run(world: &mut World, commands: impl IntoIterator<Item = Command>) -> Vec<Event> {
    let mut events = Vec::new();
    for command in commands {
        world::apply(world, command, &mut events);
    }
    events
}

fn queue(steps: &[Step]) -> Vec<Command> {
    steps
        .iter()
        .map(|&step| Command::QueueStep { step })
        .collect()
}

fn rejection(events: &[Event]) -> Option<(Action, Rejection)> {
    events.iter().find_map(|event| match event {
        Event::CommandRejected { action, reason } => Some((*action, *reason)),
        _ => None,
    })
}

#[test]
fn straight_run_completes_level() {
    let mut world = new_world(RunPacing::Immediate);
    let _ = run(&mut world, queue(&[Step::Forward, Step::Forward, Step::Forward]));

    let events = run(&mut world, [Command::Execute]);

    assert_eq!(
        events.first(),
        Some(&Event::SessionStateChanged {
            from: SessionState::Start,
            to: SessionState::Running,
        })
    );
    let step_events = events
        .iter()
        .filter(|event| matches!(event, Event::ExecutionStep { .. }))
        .count();
    assert_eq!(step_events, 3);
    assert!(events.contains(&Event::RunCompleted { steps: 3 }));
    assert_eq!(
        events.last(),
        Some(&Event::SessionStateChanged {
            from: SessionState::Running,
            to: SessionState::Complete,
        })
    );
    assert_eq!(query::session_state(&world), SessionState::Complete);
}

#[test]
fn turn_off_path_fails_on_following_forward() {
    let mut world = new_world(RunPacing::Immediate);
    let _ = run(&mut world, queue(&[Step::Forward, Step::Left, Step::Forward]));

    let events = run(&mut world, [Command::Execute]);

    assert!(events.contains(&Event::RunFailed {
        step: 2,
        cause: FailureCause::Danger,
        position: Coordinate::new(-0.12, 0.12),
    }));
    assert_eq!(query::session_state(&world), SessionState::Failed);
}

#[test]
fn running_out_of_moves_fails_the_run() {
    let mut world = new_world(RunPacing::Immediate);
    let _ = run(&mut world, queue(&[Step::Forward]));

    let events = run(&mut world, [Command::Execute]);

    assert!(events.iter().any(|event| matches!(
        event,
        Event::RunFailed {
            step: 1,
            cause: FailureCause::Exhausted,
            ..
        }
    )));
    assert_eq!(query::session_state(&world), SessionState::Failed);
}

#[test]
fn execute_with_empty_queue_stays_in_start() {
    let mut world = new_world(RunPacing::Immediate);

    let events = run(&mut world, [Command::Execute]);

    assert_eq!(
        events,
        vec![Event::CommandRejected {
            action: Action::Execute,
            reason: Rejection::QueueEmpty,
        }]
    );
    assert_eq!(query::session_state(&world), SessionState::Start);
}

#[test]
fn queue_capacity_is_enforced() {
    let mut world = new_world(RunPacing::Immediate);
    let capacity = query::queue_capacity(&world);

    let events = run(&mut world, queue(&vec![Step::Forward; capacity + 1]));

    assert_eq!(query::queued_steps(&world).len(), capacity);
    assert_eq!(
        events.last(),
        Some(&Event::CommandRejected {
            action: Action::QueueStep,
            reason: Rejection::QueueFull { capacity },
        })
    );
}

#[test]
fn undo_returns_last_queued_move() {
    let mut world = new_world(RunPacing::Immediate);
    let _ = run(&mut world, queue(&[Step::Forward, Step::Right]));

    let events = run(&mut world, [Command::UndoStep]);

    assert_eq!(
        events,
        vec![Event::StepUndone {
            queued: carrot_hop_core::QueuedStep {
                step: Step::Right,
                slot: SlotId::new(1),
            },
        }]
    );
    assert_eq!(query::queued_steps(&world).len(), 1);

    let _ = run(&mut world, [Command::UndoStep]);
    let events = run(&mut world, [Command::UndoStep]);
    assert_eq!(
        rejection(&events),
        Some((Action::UndoStep, Rejection::QueueEmpty))
    );
}

#[test]
fn queue_is_frozen_outside_start() {
    let mut world = new_world(RunPacing::Immediate);
    let _ = run(&mut world, queue(&[Step::Forward]));
    let _ = run(&mut world, [Command::Execute]);
    assert_eq!(query::session_state(&world), SessionState::Failed);

    let append = run(&mut world, queue(&[Step::Forward]));
    let undo = run(&mut world, [Command::UndoStep]);
    let execute = run(&mut world, [Command::Execute]);

    let failed = Rejection::WrongState {
        state: SessionState::Failed,
    };
    assert_eq!(rejection(&append), Some((Action::QueueStep, failed)));
    assert_eq!(rejection(&undo), Some((Action::UndoStep, failed)));
    assert_eq!(rejection(&execute), Some((Action::Execute, failed)));
    assert_eq!(query::queued_steps(&world).len(), 1);
}

#[test]
fn reset_from_failed_restores_start_with_same_geometry() {
    let mut world = new_world(RunPacing::Immediate);
    let path_before = query::geometry(&world).path().to_vec();
    let _ = run(&mut world, queue(&[Step::Left, Step::Forward]));
    let _ = run(&mut world, [Command::Execute]);
    assert_eq!(query::session_state(&world), SessionState::Failed);

    let events = run(&mut world, [Command::Reset]);

    assert!(events.contains(&Event::QueueCleared { discarded: 2 }));
    assert_eq!(query::session_state(&world), SessionState::Start);
    assert!(query::queued_steps(&world).is_empty());
    assert_eq!(query::level_index(&world), LevelIndex::new(0));
    assert_eq!(query::geometry(&world).path(), path_before.as_slice());
}

#[test]
fn reset_in_start_is_idempotent() {
    let mut world = new_world(RunPacing::Immediate);
    let _ = run(&mut world, queue(&[Step::Forward]));

    let first = run(&mut world, [Command::Reset]);
    let second = run(&mut world, [Command::Reset]);

    assert!(first.contains(&Event::QueueCleared { discarded: 1 }));
    assert!(!first
        .iter()
        .any(|event| matches!(event, Event::SessionStateChanged { .. })));
    assert_eq!(second.len(), 1, "only the reload is reported: {second:?}");
    assert_eq!(query::session_state(&world), SessionState::Start);
}

#[test]
fn advance_requires_completion() {
    let mut world = new_world(RunPacing::Immediate);

    let events = run(
        &mut world,
        [Command::Advance {
            mode: AdvanceMode::Next,
        }],
    );

    assert_eq!(
        rejection(&events),
        Some((
            Action::Advance,
            Rejection::WrongState {
                state: SessionState::Start,
            },
        ))
    );
    assert_eq!(query::level_index(&world), LevelIndex::new(0));
}

#[test]
fn advance_rebuilds_geometry_and_wraps_past_last_level() {
    let mut world = new_world(RunPacing::Immediate);
    let _ = run(&mut world, queue(&[Step::Forward, Step::Forward, Step::Forward]));
    let _ = run(&mut world, [Command::Execute]);

    let events = run(
        &mut world,
        [Command::Advance {
            mode: AdvanceMode::Next,
        }],
    );

    assert!(events.contains(&Event::LevelAdvanced {
        from: LevelIndex::new(0),
        to: LevelIndex::new(1),
    }));
    assert_eq!(query::session_state(&world), SessionState::Start);
    assert!(query::queued_steps(&world).is_empty());
    assert_eq!(query::level_name(&world), Some("Corner"));

    let geometry = query::geometry(&world);
    assert_eq!(geometry.path().len(), 3);
    assert_eq!(
        geometry.danger(),
        &compute_danger(query::lattice(&world), geometry.path()),
        "danger set must be derived from the new path"
    );
    assert!(geometry.danger().contains(&Coordinate::new(0.0, 0.24)));

    let _ = run(&mut world, queue(&[Step::Forward, Step::Right, Step::Forward]));
    let _ = run(&mut world, [Command::Execute]);
    assert_eq!(query::session_state(&world), SessionState::Complete);

    let events = run(
        &mut world,
        [Command::Advance {
            mode: AdvanceMode::Next,
        }],
    );
    assert!(events.contains(&Event::LevelAdvanced {
        from: LevelIndex::new(1),
        to: LevelIndex::new(0),
    }));
    assert_eq!(query::geometry(&world).path().len(), 4);
    assert!(!query::geometry(&world)
        .danger()
        .contains(&Coordinate::new(0.0, 0.24)));
}

#[test]
fn deferred_run_waits_for_resolution() {
    let mut world = new_world(RunPacing::Deferred);
    let _ = run(&mut world, queue(&[Step::Forward, Step::Forward, Step::Forward]));

    let events = run(&mut world, [Command::Execute]);

    assert!(events.contains(&Event::RunPending { steps: 3 }));
    assert_eq!(query::session_state(&world), SessionState::Running);
    assert!(query::pending_run(&world).is_some());

    let queued = query::queued_steps(&world).to_vec();
    let pending = query::pending_run(&world).cloned();
    let blocked_commands = [
        (Command::QueueStep { step: Step::Left }, Action::QueueStep),
        (Command::UndoStep, Action::UndoStep),
        (Command::Execute, Action::Execute),
        (Command::Reset, Action::Reset),
        (
            Command::Advance {
                mode: AdvanceMode::Next,
            },
            Action::Advance,
        ),
        (
            Command::SelectLevel {
                level: LevelIndex::new(1),
            },
            Action::SelectLevel,
        ),
    ];
    for (command, action) in blocked_commands {
        let blocked = run(&mut world, [command]);
        assert_eq!(
            blocked,
            vec![Event::CommandRejected {
                action,
                reason: Rejection::WrongState {
                    state: SessionState::Running,
                },
            }],
            "{action:?}"
        );
        assert_eq!(query::session_state(&world), SessionState::Running);
        assert_eq!(query::queued_steps(&world), queued.as_slice());
        assert_eq!(query::pending_run(&world), pending.as_ref());
        assert_eq!(query::level_index(&world), LevelIndex::new(0));
    }

    let events = run(&mut world, [Command::ResolveRun]);
    assert!(events.contains(&Event::RunCompleted { steps: 3 }));
    assert_eq!(query::session_state(&world), SessionState::Complete);
    assert!(query::pending_run(&world).is_none());
    assert!(query::last_run(&world).is_some_and(|trace| trace.is_completed()));
}

#[test]
fn abort_returns_to_start_and_keeps_queue() {
    let mut world = new_world(RunPacing::Deferred);
    let _ = run(&mut world, queue(&[Step::Forward, Step::Left]));
    let _ = run(&mut world, [Command::Execute]);

    let events = run(&mut world, [Command::Abort]);

    assert_eq!(
        events,
        vec![
            Event::RunAborted,
            Event::SessionStateChanged {
                from: SessionState::Running,
                to: SessionState::Start,
            },
        ]
    );
    assert_eq!(query::queued_steps(&world).len(), 2);

    let events = run(&mut world, [Command::ResolveRun]);
    assert_eq!(
        rejection(&events),
        Some((
            Action::ResolveRun,
            Rejection::WrongState {
                state: SessionState::Start,
            },
        ))
    );
}

#[test]
fn abort_outside_running_is_rejected() {
    let mut world = new_world(RunPacing::Immediate);

    let events = run(&mut world, [Command::Abort]);

    assert_eq!(
        rejection(&events),
        Some((
            Action::Abort,
            Rejection::WrongState {
                state: SessionState::Start,
            },
        ))
    );
}

#[test]
fn select_level_loads_requested_level() {
    let mut world = new_world(RunPacing::Immediate);

    let events = run(
        &mut world,
        [Command::SelectLevel {
            level: LevelIndex::new(1),
        }],
    );
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::LevelLoaded { level, .. } if *level == LevelIndex::new(1))));
    assert_eq!(query::level_index(&world), LevelIndex::new(1));

    let events = run(
        &mut world,
        [Command::SelectLevel {
            level: LevelIndex::new(5),
        }],
    );
    assert_eq!(
        rejection(&events),
        Some((
            Action::SelectLevel,
            Rejection::UnknownLevel {
                level: LevelIndex::new(5),
            },
        ))
    );
    assert_eq!(query::level_index(&world), LevelIndex::new(1));
}

#[test]
fn advance_first_returns_to_the_opening_level() {
    let mut world = new_world(RunPacing::Immediate);
    let _ = run(
        &mut world,
        [Command::SelectLevel {
            level: LevelIndex::new(1),
        }],
    );
    let _ = run(&mut world, queue(&[Step::Forward, Step::Right, Step::Forward]));
    let _ = run(&mut world, [Command::Execute]);
    assert_eq!(query::session_state(&world), SessionState::Complete);

    let events = run(
        &mut world,
        [Command::Advance {
            mode: AdvanceMode::First,
        }],
    );

    assert!(events.contains(&Event::LevelAdvanced {
        from: LevelIndex::new(1),
        to: LevelIndex::new(0),
    }));
    assert_eq!(query::level_index(&world), LevelIndex::new(0));
    assert_eq!(query::level_name(&world), Some("Straight"));
    assert_eq!(query::session_state(&world), SessionState::Start);
    assert!(query::queued_steps(&world).is_empty());
}
