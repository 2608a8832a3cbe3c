#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Replays computed runs one step per interval of simulated time.
//!
//! The world resolves every run in a single call, so there is nothing for the
//! presentation to animate unless the steps are released gradually. This
//! system buffers `ExecutionStep` events and hands them out on `TimeAdvanced`
//! boundaries. When the world holds a run pending, the system requests its
//! resolution once the last step has been shown.

use std::{collections::VecDeque, time::Duration};

use carrot_hop_core::{Command, Event, Pose, TraceStep};

/// Step of a run released for presentation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaybackFrame {
    /// Trace entry being shown.
    pub step: TraceStep,
    /// Number of buffered steps still waiting after this one.
    pub remaining: usize,
}

/// Pure system that paces trace replay.
#[derive(Clone, Debug)]
pub struct Playback {
    interval: Duration,
    accumulator: Duration,
    buffered: VecDeque<TraceStep>,
    spawn: Option<Pose>,
    pose: Option<Pose>,
    awaiting_resolution: bool,
}

impl Default for Playback {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

impl Playback {
    /// Creates a playback system releasing one step every `interval`.
    ///
    /// A zero interval releases every buffered step on the next tick.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            accumulator: Duration::ZERO,
            buffered: VecDeque::new(),
            spawn: None,
            pose: None,
            awaiting_resolution: false,
        }
    }

    /// Pose of the token as last shown, or `None` before a level loaded.
    #[must_use]
    pub const fn current_pose(&self) -> Option<Pose> {
        self.pose
    }

    /// Reports whether buffered steps remain to be shown.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        !self.buffered.is_empty()
    }

    /// Consumes world events, releasing frames and emitting follow-up commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        frames: &mut Vec<PlaybackFrame>,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            match event {
                Event::LevelLoaded { spawn, .. } => {
                    self.spawn = Some(*spawn);
                    self.restart();
                }
                Event::RunAborted => self.restart(),
                Event::ExecutionStep { step } => self.buffered.push_back(*step),
                Event::RunPending { .. } => self.awaiting_resolution = true,
                Event::TimeAdvanced { dt } => self.advance(*dt, frames, out),
                _ => {}
            }
        }
    }

    fn restart(&mut self) {
        self.buffered.clear();
        self.accumulator = Duration::ZERO;
        self.awaiting_resolution = false;
        self.pose = self.spawn;
    }

    fn advance(&mut self, dt: Duration, frames: &mut Vec<PlaybackFrame>, out: &mut Vec<Command>) {
        if self.buffered.is_empty() {
            self.accumulator = Duration::ZERO;
        } else {
            self.accumulator = self.accumulator.saturating_add(dt);
            while self.accumulator >= self.interval {
                let Some(step) = self.buffered.pop_front() else {
                    self.accumulator = Duration::ZERO;
                    break;
                };
                self.accumulator -= self.interval;
                self.pose = Some(step.pose);
                frames.push(PlaybackFrame {
                    step,
                    remaining: self.buffered.len(),
                });
            }
        }

        if self.awaiting_resolution && self.buffered.is_empty() {
            self.awaiting_resolution = false;
            out.push(Command::ResolveRun);
        }
    }
}
