//! Terminal rendering backend.
//!
//! Every input line is one frame. While the scene reports itself busy the
//! backend keeps advancing simulated time so queued runs play out hop by hop.

use std::{
    io::{self, BufRead, Stdout, StdinLock, Write},
    time::Duration,
};

use anyhow::{Context, Result as AnyResult};
use carrot_hop_core::{Heading, LevelIndex, SessionState, Step};
use carrot_hop_presentation::{Cue, FrameInput, Presentation, RenderingBackend, Scene};
use glam::Vec3;

const HELP: &str = "\
commands (several per line are fine):
  f, forward    queue a hop forward
  l, left       queue a left turn
  r, right      queue a right turn
  u, undo       remove the last queued move
  go            run the queue
  n, next       next level when complete, otherwise reset (aborts a running replay)
  level <n>     jump to level n
  help          show this list
  quit          leave the game";

/// Upper bound on frames advanced without input after a single line.
const MAX_BUSY_FRAMES: usize = 256;

/// Parsed meaning of one input line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Line {
    Frame(FrameInput),
    Help,
    Quit,
}

/// Parses a line typed by the player.
pub(crate) fn parse_line(line: &str) -> Result<Line, String> {
    let mut input = FrameInput::default();
    let mut words = line.split_whitespace();

    while let Some(word) = words.next() {
        let word = word.to_ascii_lowercase();
        match word.as_str() {
            "q" | "quit" | "exit" => return Ok(Line::Quit),
            "?" | "h" | "help" => return Ok(Line::Help),
            "level" => {
                let number = words
                    .next()
                    .and_then(|value| value.parse::<usize>().ok())
                    .filter(|&number| number > 0)
                    .ok_or_else(|| "`level` expects a level number starting at 1".to_owned())?;
                input.select_level = Some(LevelIndex::new(number - 1));
            }
            other => {
                let button = button_index(other).ok_or_else(|| {
                    format!("unknown command `{other}`; type `help` for a list")
                })?;
                input.buttons.push(button);
            }
        }
    }

    Ok(Line::Frame(input))
}

/// Control panel button addressed by a typed word.
fn button_index(word: &str) -> Option<usize> {
    match word {
        "f" | "forward" => Some(0),
        "l" | "left" => Some(1),
        "r" | "right" => Some(2),
        "u" | "undo" => Some(3),
        "go" | "run" | "execute" => Some(4),
        "n" | "next" | "reset" | "abort" => Some(5),
        _ => None,
    }
}

/// Draws the scene as text, north at the top.
pub(crate) fn render(scene: &Scene) -> String {
    let side = scene.grid.side();
    let mut cells = vec![vec!['~'; side]; side];

    for cue in scene.danger.iter().filter(|cue| cue.highlighted) {
        place(scene, &mut cells, cue.position, '*');
    }
    for &platform in &scene.platforms {
        place(scene, &mut cells, platform, '=');
    }
    place(scene, &mut cells, scene.goal, 'C');
    if scene.token.visible {
        place(scene, &mut cells, scene.token.position, token_glyph(scene.token.heading));
    }

    let mut out = format!("{} [{}]\n", scene.title, scene.state);
    for line in &cells {
        out.push_str("  ");
        for (index, glyph) in line.iter().enumerate() {
            if index > 0 {
                out.push(' ');
            }
            out.push(*glyph);
        }
        out.push('\n');
    }

    let slots: Vec<&str> = scene
        .queue
        .iter()
        .map(|slot| match slot.step {
            Some(Step::Forward) => "F",
            Some(Step::Left) => "L",
            Some(Step::Right) => "R",
            None => "_",
        })
        .collect();
    out.push_str(&format!("  queue [{}]\n", slots.join(" ")));

    if !scene.cues.is_empty() {
        let cues: Vec<&str> = scene.cues.iter().map(|cue| cue_label(*cue)).collect();
        out.push_str(&format!("  ({})\n", cues.join(", ")));
    }
    if !scene.busy {
        match scene.state {
            SessionState::Complete => out.push_str("  The carrot is yours! `next` moves on.\n"),
            SessionState::Failed => out.push_str("  Splash! `reset` to try again.\n"),
            SessionState::Start | SessionState::Running => {}
        }
    }
    out
}

// Cells are printed one z value per line, so `row` (x) selects the column of text.
fn place(scene: &Scene, cells: &mut [Vec<char>], position: Vec3, glyph: char) {
    if let Some((row, column)) = scene.grid.cell_index(position) {
        cells[column][row] = glyph;
    }
}

fn token_glyph(heading: Heading) -> char {
    match heading {
        Heading::North => '^',
        Heading::East => '>',
        Heading::South => 'v',
        Heading::West => '<',
    }
}

fn cue_label(cue: Cue) -> &'static str {
    match cue {
        Cue::Click => "click",
        Cue::Remove => "remove",
        Cue::Jump => "hop",
        Cue::Drop => "splash",
        Cue::Fail => "out of moves",
        Cue::Complete => "munch",
    }
}

/// Backend that reads commands from a line reader and prints scenes.
#[derive(Debug)]
pub(crate) struct TextBackend<R, W> {
    reader: R,
    writer: W,
    frame_time: Duration,
}

impl TextBackend<StdinLock<'static>, Stdout> {
    /// Creates a backend bound to the process standard streams.
    pub(crate) fn stdio(frame_time: Duration) -> Self {
        Self::new(io::stdin().lock(), io::stdout(), frame_time)
    }
}

impl<R, W> TextBackend<R, W>
where
    R: BufRead,
    W: Write,
{
    pub(crate) fn new(reader: R, writer: W, frame_time: Duration) -> Self {
        Self {
            reader,
            writer,
            frame_time: frame_time.max(Duration::from_millis(1)),
        }
    }

    fn present(&mut self, scene: &Scene) -> AnyResult<()> {
        self.writer
            .write_all(render(scene).as_bytes())
            .context("failed to write frame")
    }
}

impl<R, W> RenderingBackend for TextBackend<R, W>
where
    R: BufRead,
    W: Write,
{
    fn run<F>(mut self, presentation: Presentation, mut update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let mut scene = presentation.scene;
        writeln!(self.writer, "{}\n{HELP}\n", presentation.window_title)?;
        self.present(&scene)?;

        let mut line = String::new();
        loop {
            write!(self.writer, "> ")?;
            self.writer.flush()?;

            line.clear();
            let read = self
                .reader
                .read_line(&mut line)
                .context("failed to read input")?;
            if read == 0 {
                break;
            }

            let input = match parse_line(&line) {
                Ok(Line::Frame(input)) => input,
                Ok(Line::Help) => {
                    writeln!(self.writer, "{HELP}")?;
                    continue;
                }
                Ok(Line::Quit) => break,
                Err(message) => {
                    writeln!(self.writer, "{message}")?;
                    continue;
                }
            };

            update_scene(Duration::ZERO, input, &mut scene);
            self.present(&scene)?;

            let mut frames = 0;
            while scene.busy && frames < MAX_BUSY_FRAMES {
                let previous = scene.clone();
                update_scene(self.frame_time, FrameInput::default(), &mut scene);
                if scene != previous {
                    self.present(&scene)?;
                }
                frames += 1;
            }
        }

        writeln!(self.writer, "Bye!")?;
        Ok(())
    }
}
