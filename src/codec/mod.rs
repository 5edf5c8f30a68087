//! Streaming decoder for the serial plot protocol
//!
//! The device sends three kinds of data on the same stream:
//! - **Data frames**: `0xAA COUNT int16×COUNT`
//! - **Label frames**: `0xAB COUNT (channel len name)×COUNT`
//! - **Text**: free-form ASCII lines (shell output, `help` tables)
//!
//! `FrameDecoder` turns arbitrarily chunked bytes into a sequence of
//! [`Event`]s. Malformed input never fails: it surfaces as `Resync` or
//! `InvalidEncoding` events and decoding continues.

mod decoder;
mod frame;
mod text;

pub use decoder::FrameDecoder;
pub use frame::{DataFrame, LabelEntry, LabelFrame, TextLine};

use serde::Serialize;

/// Which frame type a header belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameKind {
    Data,
    Label,
}

/// Header field that caused a frame to be rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedHeader {
    /// COUNT was 0 or above 32
    InvalidCount { kind: FrameKind, count: u8 },
    /// Label entry channel index above 31
    InvalidChannel { channel: u8 },
    /// Label entry length 0 or above 16
    InvalidLabelLength { channel: u8, len: u8 },
}

/// Stream ended while a frame was still being received
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IncompleteFrame {
    pub kind: FrameKind,
    /// Bytes of the frame received so far (header included)
    pub buffered: usize,
}

/// Decoded item from the byte stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Event {
    Data(DataFrame),
    Label(LabelFrame),
    Text(TextLine),
    /// A frame header was rejected; scanning resumed
    Resync(MalformedHeader),
    /// A label name was not valid UTF-8 and was decoded with replacement
    InvalidEncoding { channel: u8 },
    /// Reported by `FrameDecoder::close` when bytes of a frame were pending
    Incomplete(IncompleteFrame),
}
