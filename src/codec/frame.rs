//! Decoded frame values
//!
//! Wire format (little-endian, no checksum):
//!
//! | Frame | Byte 0 | Byte 1 | Body |
//! |---|---|---|---|
//! | Data | `0xAA` | COUNT (1..32) | COUNT × int16 LE |
//! | Label | `0xAB` | COUNT (1..32) | COUNT × (channel:u8, len:u8 1..16, UTF-8 bytes) |

use crate::constants::{MAX_CHANNELS, MAX_LABEL_LEN, START_DATA, START_LABEL};
use serde::Serialize;

/// Marker byte plus COUNT byte
pub(crate) const HEADER_LEN: usize = 2;

/// One sample per channel, channel index = position
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataFrame {
    values: Vec<i16>,
}

impl DataFrame {
    /// Build a frame from 1..=32 channel values
    pub fn new(values: Vec<i16>) -> Option<Self> {
        if values.is_empty() || values.len() > MAX_CHANNELS {
            return None;
        }
        Some(Self { values })
    }

    /// Decoder-side constructor, length already bounded by COUNT
    pub(crate) fn from_le_bytes(body: &[u8]) -> Self {
        let values = body
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Self { values }
    }

    pub fn values(&self) -> &[i16] {
        &self.values
    }

    /// Append the wire encoding of this frame to `output`
    pub fn encode_into(&self, output: &mut Vec<u8>) {
        output.reserve(HEADER_LEN + self.values.len() * 2);
        output.push(START_DATA);
        output.push(self.values.len() as u8);
        for value in &self.values {
            output.extend_from_slice(&value.to_le_bytes());
        }
    }
}

/// A channel name update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelEntry {
    pub channel: u8,
    pub name: String,
}

impl LabelEntry {
    pub fn new(channel: u8, name: impl Into<String>) -> Self {
        Self {
            channel,
            name: name.into(),
        }
    }
}

/// Channel names announced by the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelFrame {
    entries: Vec<LabelEntry>,
}

impl LabelFrame {
    /// Build a frame, validating every entry against the wire limits
    pub fn new(entries: Vec<LabelEntry>) -> Option<Self> {
        if entries.is_empty() || entries.len() > MAX_CHANNELS {
            return None;
        }
        let valid = entries.iter().all(|e| {
            (e.channel as usize) < MAX_CHANNELS
                && !e.name.is_empty()
                && e.name.len() <= MAX_LABEL_LEN
        });
        valid.then_some(Self { entries })
    }

    pub(crate) fn from_decoded(entries: Vec<LabelEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[LabelEntry] {
        &self.entries
    }

    /// Append the wire encoding of this frame to `output`
    ///
    /// Names longer than the wire limit (possible after lossy decoding)
    /// are cut at `MAX_LABEL_LEN` bytes.
    pub fn encode_into(&self, output: &mut Vec<u8>) {
        output.push(START_LABEL);
        output.push(self.entries.len() as u8);
        for entry in &self.entries {
            let name = entry.name.as_bytes();
            let name = &name[..name.len().min(MAX_LABEL_LEN)];
            output.push(entry.channel);
            output.push(name.len() as u8);
            output.extend_from_slice(name);
        }
    }
}

/// A line of non-frame bytes, decoded as UTF-8 with replacement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextLine {
    text: String,
}

impl TextLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}
