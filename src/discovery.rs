//! Command discovery from the device's `help` output
//!
//! After `help\r\n` is sent, the device prints a pipe-delimited table:
//!
//! ```text
//! GMU Commands
//! ---------+----------+-------+---------------------
//! CMD      | ARGS     | CAT   | DESCRIPTION
//! ---------+----------+-------+---------------------
//! start    | -        | state | Start the motor
//! setpid   | kp ki kd | param | Set PID gains
//! help     | -        | sys   | Show this table
//! ---------+----------+-------+---------------------
//! ```
//!
//! Every row whose ARGS column is `-` becomes a [`CommandSpec`]. The table
//! ends on a closing separator (after at least one data row), on the
//! `help | - | sys` row, or after 2 seconds without a new line.

use crate::constants::DISCOVERY_TIMEOUT;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Line that opens the command table
const TABLE_HEADER: &str = "GMU Commands";

/// Button group of a discovered command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    State,
    Diagnostics,
    Parameters,
    System,
}

impl Category {
    /// Display order for grouped buttons
    pub const ORDER: [Category; 4] = [
        Category::State,
        Category::Diagnostics,
        Category::Parameters,
        Category::System,
    ];

    /// Map the CAT column code; unknown codes yield `None`
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "state" => Some(Self::State),
            "diag" => Some(Self::Diagnostics),
            "param" => Some(Self::Parameters),
            "sys" => Some(Self::System),
            _ => None,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::State => "State",
            Self::Diagnostics => "Diagnostics",
            Self::Parameters => "Parameters",
            Self::System => "System",
        }
    }
}

/// A device command that takes no arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Display name (capitalized command)
    pub name: String,
    /// Command as typed on the device shell
    pub command: String,
    pub category: Category,
}

/// Parser state
#[derive(Debug)]
enum State {
    Idle,
    Active {
        specs: Vec<CommandSpec>,
        /// Data rows seen, qualifying or not
        rows: usize,
        silence: Duration,
    },
}

/// Why an active parse ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryEnd {
    Separator,
    HelpRow,
    Timeout,
}

/// Recognizes the command table in a sequence of text lines
pub struct CommandTableParser {
    state: State,
    /// Result of the last pass that found at least one command
    discovered: Vec<CommandSpec>,
    last_end: Option<DiscoveryEnd>,
}

impl Default for CommandTableParser {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandTableParser {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            discovered: Vec::new(),
            last_end: None,
        }
    }

    /// Process one text line
    ///
    /// `elapsed` is the time since the previous `feed`/`tick` call. Returns
    /// the command set when the table ends; an empty set means discovery
    /// failed and the previously discovered commands are kept.
    pub fn feed(&mut self, line: &str, elapsed: Duration) -> Option<Vec<CommandSpec>> {
        // A line arriving after the timeout does not belong to the stale table
        let timed_out = self.tick(elapsed);

        if line.contains(TABLE_HEADER) {
            debug!("command table started");
            self.state = State::Active {
                specs: Vec::new(),
                rows: 0,
                silence: Duration::ZERO,
            };
            return timed_out;
        }

        let State::Active {
            specs,
            rows,
            silence,
        } = &mut self.state
        else {
            return timed_out;
        };
        *silence = Duration::ZERO;

        if is_separator(line) {
            if *rows > 0 {
                return Some(self.finish(DiscoveryEnd::Separator));
            }
            return None;
        }

        let row = Row::parse(line)?;
        if row.is_column_header() {
            return None;
        }
        *rows += 1;

        if row.args == "-" {
            match Category::from_code(row.category) {
                Some(category) => specs.push(CommandSpec {
                    name: capitalize(row.command),
                    command: row.command.to_string(),
                    category,
                }),
                None => debug!(command = row.command, category = row.category, "unknown category, row dropped"),
            }
        }

        if row.category == "sys" && row.command == "help" {
            return Some(self.finish(DiscoveryEnd::HelpRow));
        }
        None
    }

    /// Advance time without a new line; ends an active parse after 2 s of silence
    pub fn tick(&mut self, elapsed: Duration) -> Option<Vec<CommandSpec>> {
        let State::Active { silence, .. } = &mut self.state else {
            return None;
        };
        *silence = silence.saturating_add(elapsed);
        if *silence < DISCOVERY_TIMEOUT {
            return None;
        }
        Some(self.finish(DiscoveryEnd::Timeout))
    }

    /// Forget any table in progress (called before sending `help`)
    pub fn restart(&mut self) {
        self.state = State::Idle;
    }

    /// Drop the discovered command set
    pub fn clear(&mut self) {
        self.state = State::Idle;
        self.discovered.clear();
        self.last_end = None;
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, State::Active { .. })
    }

    /// Commands from the last successful pass
    pub fn commands(&self) -> &[CommandSpec] {
        &self.discovered
    }

    pub fn last_end(&self) -> Option<DiscoveryEnd> {
        self.last_end
    }

    fn finish(&mut self, end: DiscoveryEnd) -> Vec<CommandSpec> {
        let specs = match std::mem::replace(&mut self.state, State::Idle) {
            State::Active { specs, .. } => specs,
            State::Idle => Vec::new(),
        };
        self.last_end = Some(end);

        if specs.is_empty() {
            info!(?end, "command discovery found no commands");
        } else {
            info!(?end, count = specs.len(), "commands discovered");
            self.discovered = specs.clone();
        }
        specs
    }
}

/// One pipe-delimited table row
struct Row<'a> {
    command: &'a str,
    args: &'a str,
    category: &'a str,
}

impl<'a> Row<'a> {
    fn parse(line: &'a str) -> Option<Self> {
        if line.matches('|').count() < 3 {
            return None;
        }
        let mut fields = line.split('|').map(str::trim);
        let command = fields.next()?;
        let args = fields.next()?;
        let category = fields.next()?;
        Some(Self {
            command,
            args,
            category,
        })
    }

    fn is_column_header(&self) -> bool {
        self.command == "CMD" && self.args == "ARGS"
    }
}

/// `---------+------` style rule
fn is_separator(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && line.chars().all(|c| c == '-' || c == '+')
}

/// First character upper-case, the rest lower-case
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
