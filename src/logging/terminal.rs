//! Terminal history: text lines received from and commands sent to the device
//!
//! Pure data structure with no I/O side effects. Uses a ring buffer
//! (`VecDeque`) with a fixed maximum capacity.
//!
//! # Features
//!
//! - **Automatic rotation**: Old lines are dropped when capacity is reached
//! - **Pause**: Freeze the visible history while lines keep arriving
//! - **Export**: Format lines as plain text

use serde::Serialize;
use std::collections::VecDeque;

/// Direction of a terminal line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Device -> host
    In,
    /// Host -> device
    Out,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerminalEntry {
    pub timestamp: String, // HH:MM:SS.mmm
    pub direction: Direction,
    pub text: String,
}

impl TerminalEntry {
    #[inline]
    fn now() -> String {
        chrono::Local::now().format("%H:%M:%S%.3f").to_string()
    }

    pub fn received(text: impl Into<String>) -> Self {
        Self {
            timestamp: Self::now(),
            direction: Direction::In,
            text: text.into(),
        }
    }

    pub fn sent(text: impl Into<String>) -> Self {
        Self {
            timestamp: Self::now(),
            direction: Direction::Out,
            text: text.into(),
        }
    }

    fn to_text(&self) -> String {
        match self.direction {
            Direction::In => format!("{} {}", self.timestamp, self.text),
            Direction::Out => format!("{} > {}", self.timestamp, self.text),
        }
    }
}

pub struct TerminalLog {
    entries: VecDeque<TerminalEntry>,
    /// Lines received while paused, appended on resume
    held: VecDeque<TerminalEntry>,
    max_entries: usize,
    paused: bool,
}

impl TerminalLog {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_entries),
            held: VecDeque::new(),
            max_entries,
            paused: false,
        }
    }

    /// Add a line, rotating out the oldest if at capacity
    pub fn add(&mut self, entry: TerminalEntry) {
        if self.paused {
            Self::push_bounded(&mut self.held, entry, self.max_entries);
        } else {
            Self::push_bounded(&mut self.entries, entry, self.max_entries);
        }
    }

    fn push_bounded(queue: &mut VecDeque<TerminalEntry>, entry: TerminalEntry, max: usize) {
        if queue.len() >= max {
            queue.pop_front();
        }
        queue.push_back(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.held.clear();
    }

    // === Pause ===

    /// Toggle pause state, returns new paused state
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        if !self.paused {
            while let Some(entry) = self.held.pop_front() {
                Self::push_bounded(&mut self.entries, entry, self.max_entries);
            }
        }
        self.paused
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    // === Data access ===

    /// Visible lines, oldest first
    pub fn entries(&self) -> &VecDeque<TerminalEntry> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of lines waiting for resume
    pub fn held_count(&self) -> usize {
        self.held.len()
    }

    // === Export ===

    pub fn to_text(&self) -> String {
        self.to_text_limited(self.entries.len())
    }

    /// Format the most recent `max` visible lines
    pub fn to_text_limited(&self, max: usize) -> String {
        let start = self.entries.len().saturating_sub(max);
        self.entries
            .iter()
            .skip(start)
            .map(TerminalEntry::to_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
