//! Text line accumulation
//!
//! Bytes that are not part of a frame may be human-readable output from
//! the device (shell prompts, `help` tables). They are collected here until
//! a CR, LF, silence timeout or the line length cap closes the line.

use super::TextLine;
use crate::constants::{MAX_TEXT_LINE_LEN, TEXT_LINE_TIMEOUT};
use std::time::Duration;

pub(crate) struct LineAccumulator {
    buffer: Vec<u8>,
    /// Time since the last byte was received
    silence: Duration,
}

impl LineAccumulator {
    pub(crate) fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(128),
            silence: Duration::ZERO,
        }
    }

    /// Offer one out-of-frame byte
    ///
    /// Printable ASCII, tab and non-ASCII bytes (UTF-8 sequences) are kept;
    /// other control bytes are dropped.
    pub(crate) fn push(&mut self, byte: u8) -> Option<TextLine> {
        match byte {
            b'\r' | b'\n' => self.flush(),
            b'\t' | 0x20..=0x7E | 0x80..=0xFF => {
                self.buffer.push(byte);
                if self.buffer.len() >= MAX_TEXT_LINE_LEN {
                    self.flush()
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Account for time passing; closes the line once silence reaches the timeout
    pub(crate) fn idle(&mut self, elapsed: Duration) -> Option<TextLine> {
        self.silence = self.silence.saturating_add(elapsed);
        if self.silence < TEXT_LINE_TIMEOUT {
            return None;
        }
        self.silence = Duration::ZERO;
        self.flush()
    }

    /// Bytes were received
    pub(crate) fn touch(&mut self) {
        self.silence = Duration::ZERO;
    }

    pub(crate) fn flush(&mut self) -> Option<TextLine> {
        if self.buffer.is_empty() {
            return None;
        }
        let text = String::from_utf8_lossy(&self.buffer).into_owned();
        self.buffer.clear();
        Some(TextLine::new(text))
    }

    pub(crate) fn clear(&mut self) {
        self.buffer.clear();
        self.silence = Duration::ZERO;
    }
}
