#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the Carrot Hop experience.

mod game;
mod text;

use std::{path::PathBuf, time::Duration};

use anyhow::{ensure, Context, Result};
use carrot_hop_core::{Event, LevelIndex};
use carrot_hop_presentation::{FrameInput, Presentation, RenderingBackend};
use carrot_hop_system_bootstrap::Bootstrap;
use carrot_hop_world::query;
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::{game::GameLoop, text::TextBackend};

#[derive(Debug, Parser)]
#[command(
    name = "carrot-hop",
    about = "Guide the bunny to the carrot by queuing hops and turns."
)]
struct Args {
    /// Session configuration file (TOML). Built-in defaults apply when omitted.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Level catalog file (TOML). The built-in levels apply when omitted.
    #[arg(long, value_name = "PATH")]
    levels: Option<PathBuf>,
    /// Level to start on, counting from 1.
    #[arg(long, value_name = "N")]
    level: Option<usize>,
    /// Print every world event as a JSON line.
    #[arg(long)]
    json: bool,
}

/// Entry point for the Carrot Hop command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let bootstrap = Bootstrap;
    let world = bootstrap
        .create_world(args.config.as_deref(), args.levels.as_deref())
        .context("failed to prepare the session")?;
    let banner = bootstrap.welcome_banner(&world).to_owned();
    let frame_time = query::config(&world).step_interval();

    let mut game = GameLoop::new(world)?;
    let mut scene = game.initial_scene()?;
    if let Some(number) = args.level {
        let count = query::level_count(game.world());
        ensure!(
            (1..=count).contains(&number),
            "--level must be between 1 and {count} (received {number})"
        );
        let input = FrameInput {
            select_level: Some(LevelIndex::new(number - 1)),
            ..FrameInput::default()
        };
        report(&game.frame(Duration::ZERO, input, &mut scene), args.json);
    }

    let json = args.json;
    TextBackend::stdio(frame_time).run(
        Presentation::new(banner, scene),
        move |dt, input, scene| {
            let events = game.frame(dt, input, scene);
            report(&events, json);
        },
    )
}

fn report(events: &[Event], json: bool) {
    for event in events {
        if json {
            match serde_json::to_string(event) {
                Ok(line) => println!("{line}"),
                Err(error) => warn!(%error, "event could not be encoded"),
            }
        } else if let Event::CommandRejected { action, reason } = event {
            println!("  ({action:?} ignored: {reason})");
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
