//! Console presenter: picks comparison triples and reads the user's choices.
//!
//! All I/O goes through the injected reader, writer and random source, so a
//! whole session can be replayed in tests from a string and a fixed seed.
//!
//! # Input grammar
//!
//! | Input                               | Meaning                          |
//! |-------------------------------------|----------------------------------|
//! | `1`..=`k`                           | the k-th presented value wins    |
//! | `0`                                 | no preference, nothing recorded  |
//! | empty line, `exit`, `end`, `quit`   | end the session                  |
//! | end of input                        | end the session                  |
//!
//! Anything else re-prompts, at most `max_retries` times.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use corevalue_core::{PreferenceGraph, ValueSet};
use rand::Rng;
use rand::seq::index;
use tracing::{debug, warn};

/// ANSI "clear screen, cursor home".
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Largest number of values shown per comparison.
pub const TRIPLE: usize = 3;

/// What the user answered for one comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// Item index (not menu position) of the preferred value.
    Winner(usize),
    Indifferent,
    Quit,
}

/// How a comparison loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    RoundsExhausted,
    UserQuit,
}

/// Summary of one comparison loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOutcome {
    /// Comparisons that recorded a winner.
    pub decided: usize,
    /// Comparisons answered with "no preference".
    pub skipped: usize,
    pub end: SessionEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Parsed {
    Position(usize),
    Quit,
    Invalid,
}

/// Interpret one input line against a menu of `max` entries (`0..=max`).
fn parse_line(line: &str, max: usize) -> Parsed {
    let trimmed = line.trim();
    let lower = trimmed.to_ascii_lowercase();
    if lower.is_empty() || matches!(lower.as_str(), "exit" | "end" | "quit") {
        return Parsed::Quit;
    }
    match trimmed.parse::<usize>() {
        Ok(position) if position <= max => Parsed::Position(position),
        _ => Parsed::Invalid,
    }
}

pub struct Presenter<R, W, G> {
    input: R,
    output: W,
    rng: G,
    max_retries: u32,
    clear_screen: bool,
    show_descriptions: bool,
}

impl<R: BufRead, W: Write, G: Rng> Presenter<R, W, G> {
    pub const fn new(input: R, output: W, rng: G) -> Self {
        Self {
            input,
            output,
            rng,
            max_retries: 5,
            clear_screen: false,
            show_descriptions: true,
        }
    }

    #[must_use]
    pub const fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub const fn clear_screen(mut self, enabled: bool) -> Self {
        self.clear_screen = enabled;
        self
    }

    #[must_use]
    pub const fn show_descriptions(mut self, enabled: bool) -> Self {
        self.show_descriptions = enabled;
        self
    }

    /// Write a line to the presenter's sink.
    pub fn say(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{text}")
    }

    /// Pick `min(3, len)` distinct item indices uniformly at random.
    pub fn pick_triple(&mut self, len: usize) -> Vec<usize> {
        index::sample(&mut self.rng, len, len.min(TRIPLE)).into_vec()
    }

    /// Read one line; `None` at end of input.
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    /// Prompt until a valid menu position in `min..=max` is entered.
    ///
    /// Returns `None` when the user quits, input ends, or retries run out.
    /// Positions below `min` count against the retry budget.
    fn read_position(&mut self, min: usize, max: usize, hint: &str) -> io::Result<Option<usize>> {
        for _ in 0..=self.max_retries {
            let Some(line) = self.read_line()? else {
                debug!("end of input");
                return Ok(None);
            };
            match parse_line(&line, max) {
                Parsed::Position(position) if position >= min => return Ok(Some(position)),
                Parsed::Quit => return Ok(None),
                Parsed::Position(_) | Parsed::Invalid => writeln!(self.output, "{hint}")?,
            }
        }
        warn!(retries = self.max_retries, "too many invalid answers");
        Ok(None)
    }

    /// Present `triple` and read which value the user prefers.
    pub fn ask(&mut self, triple: &[usize], values: &ValueSet) -> io::Result<Choice> {
        if self.clear_screen {
            write!(self.output, "{CLEAR_SCREEN}")?;
        }

        if self.show_descriptions {
            for (position, &item) in triple.iter().enumerate() {
                let name = values.name(item).unwrap_or("?");
                let descr = values.description(item).unwrap_or("");
                writeln!(self.output, "[{}] {name} -- {descr}", position + 1)?;
            }
        } else {
            let line: Vec<String> = triple
                .iter()
                .enumerate()
                .map(|(position, &item)| {
                    format!("[{}] {}", position + 1, values.name(item).unwrap_or("?"))
                })
                .collect();
            writeln!(self.output, "{}", line.join(" "))?;
        }
        self.output.flush()?;

        let hint = choice_hint(triple.len());
        Ok(match self.read_position(0, triple.len(), &hint)? {
            None => Choice::Quit,
            Some(0) => Choice::Indifferent,
            Some(position) => Choice::Winner(triple[position - 1]),
        })
    }

    /// Run up to `rounds` comparisons, recording outcomes into `graph`.
    ///
    /// `on_record` runs after every comparison that changed the graph, e.g.
    /// to checkpoint the session.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the presenter sinks, graph errors, and
    /// errors returned by `on_record`.
    pub fn run_comparisons(
        &mut self,
        graph: &mut PreferenceGraph,
        values: &ValueSet,
        rounds: usize,
        mut on_record: impl FnMut(&PreferenceGraph) -> anyhow::Result<()>,
    ) -> anyhow::Result<SessionOutcome> {
        let mut outcome = SessionOutcome {
            decided: 0,
            skipped: 0,
            end: SessionEnd::RoundsExhausted,
        };
        if graph.len() < 2 {
            return Ok(outcome);
        }

        for _ in 0..rounds {
            let triple = self.pick_triple(graph.len());
            match self.ask(&triple, values)? {
                Choice::Quit => {
                    outcome.end = SessionEnd::UserQuit;
                    break;
                }
                Choice::Indifferent => outcome.skipped += 1,
                Choice::Winner(winner) => {
                    for &other in triple.iter().filter(|&&other| other != winner) {
                        graph.add_edge(winner, other)?;
                    }
                    outcome.decided += 1;
                    on_record(graph)?;
                }
            }
        }

        Ok(outcome)
    }

    /// Ask which value set to load when several exist.
    ///
    /// Returns `None` if the user quits without choosing.
    pub fn select_value_set(&mut self, paths: &[PathBuf]) -> io::Result<Option<PathBuf>> {
        writeln!(self.output, "Present value sets:")?;
        for (position, path) in paths.iter().enumerate() {
            writeln!(self.output, "[{}] {}", position + 1, display_name(path))?;
        }
        write!(self.output, "Load value set: ")?;
        self.output.flush()?;

        let hint = format!("Please enter a number between 1 and {}.", paths.len());
        Ok(self
            .read_position(1, paths.len(), &hint)?
            .map(|position| paths[position - 1].clone()))
    }

    /// Ask which stored session to resume; `None` starts a new one.
    pub fn select_session(&mut self, paths: &[PathBuf]) -> io::Result<Option<PathBuf>> {
        writeln!(self.output, "Present Sessions:")?;
        writeln!(self.output, "[0] New Session")?;
        for (position, path) in paths.iter().enumerate() {
            writeln!(self.output, "[{}] {}", position + 1, display_name(path))?;
        }
        write!(self.output, "Load Session: ")?;
        self.output.flush()?;

        let hint = format!(
            "Please enter a number between 0 and {}, or press enter for a new session.",
            paths.len()
        );
        Ok(match self.read_position(0, paths.len(), &hint)? {
            None | Some(0) => None,
            Some(position) => Some(paths[position - 1].clone()),
        })
    }
}

fn choice_hint(len: usize) -> String {
    let options: Vec<String> = (1..=len).map(|p| format!("'{p}'")).collect();
    let listed = match options.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{} or {last}", rest.join(", ")),
        Some((last, _)) => last.clone(),
        None => String::new(),
    };
    format!(
        "Please enter {listed} to select one of the presented values, \
         or '0' if they are of equal value to you."
    )
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}
