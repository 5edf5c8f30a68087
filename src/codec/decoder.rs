//! Byte-oriented frame decoder
//!
//! State machine:
//!
//! ```text
//! Scanning ──0xAA/0xAB──▶ AwaitingCount ──1..32──▶ AwaitingDataBody / AwaitingLabelBody
//!    ▲                        │ invalid COUNT (Resync, COUNT byte rescanned)
//!    └────────────────────────┘
//! ```
//!
//! Only the byte under examination is ever rescanned after a rejection, so a
//! valid frame start directly following a rejected marker is never skipped.
//! Bytes that are not part of a frame attempt feed the text line accumulator.

use super::frame::HEADER_LEN;
use super::text::LineAccumulator;
use super::{DataFrame, Event, FrameKind, IncompleteFrame, LabelEntry, LabelFrame, MalformedHeader};
use crate::constants::{MAX_CHANNELS, MAX_LABEL_LEN, START_DATA, START_LABEL};
use std::time::Duration;
use tracing::{debug, trace};

/// Next field expected inside a label entry
#[derive(Debug, Clone, Copy)]
enum LabelField {
    Channel,
    Length { channel: u8 },
    Name { channel: u8, start: usize, len: usize },
}

#[derive(Debug)]
enum Mode {
    Scanning,
    AwaitingCount(FrameKind),
    AwaitingDataBody {
        count: usize,
    },
    AwaitingLabelBody {
        count: usize,
        entries: Vec<LabelEntry>,
        field: LabelField,
    },
}

impl Mode {
    fn frame_kind(&self) -> Option<FrameKind> {
        match self {
            Mode::Scanning => None,
            Mode::AwaitingCount(kind) => Some(*kind),
            Mode::AwaitingDataBody { .. } => Some(FrameKind::Data),
            Mode::AwaitingLabelBody { .. } => Some(FrameKind::Label),
        }
    }
}

/// Outcome of examining one byte
enum Step {
    Consumed,
    /// The byte must be examined again in the (new) current mode
    Rescan,
}

/// Incremental decoder for data frames, label frames and text lines
///
/// Output is independent of how the stream is split into chunks, as long as
/// the elapsed time passed between chunks stays below the text timeout.
///
/// # Example
///
/// ```ignore
/// let mut decoder = FrameDecoder::new();
/// let events = decoder.feed(&[0xAA, 0x01, 0x2A, 0x00], Duration::ZERO);
/// // events[0] = Event::Data([42])
/// ```
pub struct FrameDecoder {
    /// Bytes of the frame in progress, header included
    pending: Vec<u8>,
    mode: Mode,
    line: LineAccumulator,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            pending: Vec::with_capacity(HEADER_LEN + MAX_CHANNELS * 2),
            mode: Mode::Scanning,
            line: LineAccumulator::new(),
        }
    }

    /// Decode a chunk and collect the resulting events
    ///
    /// `elapsed` is the time since the previous call; it drives the text
    /// line silence timeout. Pass an empty chunk to only advance time.
    pub fn feed(&mut self, chunk: &[u8], elapsed: Duration) -> Vec<Event> {
        let mut events = Vec::new();
        self.feed_with(chunk, elapsed, |e| events.push(e));
        events
    }

    /// Decode a chunk, calling `on_event` for each event in stream order
    pub fn feed_with(&mut self, chunk: &[u8], elapsed: Duration, mut on_event: impl FnMut(Event)) {
        if let Some(line) = self.line.idle(elapsed) {
            on_event(Event::Text(line));
        }

        for &byte in chunk {
            while let Step::Rescan = self.step(byte, &mut on_event) {}
        }

        if !chunk.is_empty() {
            self.line.touch();
        }
    }

    /// Stream closed: report a partial frame and flush the partial text line
    pub fn close(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        if let Some(line) = self.line.flush() {
            events.push(Event::Text(line));
        }
        if let Some(kind) = self.mode.frame_kind() {
            debug!(?kind, buffered = self.pending.len(), "stream closed mid-frame");
            events.push(Event::Incomplete(IncompleteFrame {
                kind,
                buffered: self.pending.len(),
            }));
        }
        self.reset();
        events
    }

    /// Drop all buffered state
    pub fn reset(&mut self) {
        self.pending.clear();
        self.mode = Mode::Scanning;
        self.line.clear();
    }

    /// True while a frame header or body is being received
    pub fn in_frame(&self) -> bool {
        !matches!(self.mode, Mode::Scanning)
    }

    /// Number of frame bytes held
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn step(&mut self, byte: u8, on_event: &mut impl FnMut(Event)) -> Step {
        match std::mem::replace(&mut self.mode, Mode::Scanning) {
            Mode::Scanning => {
                match byte {
                    START_DATA => self.begin(FrameKind::Data, byte),
                    START_LABEL => self.begin(FrameKind::Label, byte),
                    _ => {
                        if let Some(line) = self.line.push(byte) {
                            on_event(Event::Text(line));
                        }
                    }
                }
                Step::Consumed
            }

            Mode::AwaitingCount(kind) => {
                let count = byte as usize;
                if count == 0 || count > MAX_CHANNELS {
                    return self.reject(MalformedHeader::InvalidCount { kind, count: byte }, true, on_event);
                }
                self.pending.push(byte);
                self.mode = match kind {
                    FrameKind::Data => Mode::AwaitingDataBody { count },
                    FrameKind::Label => Mode::AwaitingLabelBody {
                        count,
                        entries: Vec::with_capacity(count),
                        field: LabelField::Channel,
                    },
                };
                Step::Consumed
            }

            Mode::AwaitingDataBody { count } => {
                self.pending.push(byte);
                if self.pending.len() < HEADER_LEN + count * 2 {
                    self.mode = Mode::AwaitingDataBody { count };
                } else {
                    let frame = DataFrame::from_le_bytes(&self.pending[HEADER_LEN..]);
                    self.pending.clear();
                    trace!(channels = count, "data frame");
                    on_event(Event::Data(frame));
                }
                Step::Consumed
            }

            Mode::AwaitingLabelBody {
                count,
                mut entries,
                field,
            } => match field {
                LabelField::Channel => {
                    if byte as usize >= MAX_CHANNELS {
                        let rescan = is_start_marker(byte);
                        return self.reject(MalformedHeader::InvalidChannel { channel: byte }, rescan, on_event);
                    }
                    self.pending.push(byte);
                    self.mode = Mode::AwaitingLabelBody {
                        count,
                        entries,
                        field: LabelField::Length { channel: byte },
                    };
                    Step::Consumed
                }
                LabelField::Length { channel } => {
                    let len = byte as usize;
                    if len == 0 || len > MAX_LABEL_LEN {
                        let rescan = is_start_marker(byte);
                        return self.reject(
                            MalformedHeader::InvalidLabelLength { channel, len: byte },
                            rescan,
                            on_event,
                        );
                    }
                    self.pending.push(byte);
                    let start = self.pending.len();
                    self.mode = Mode::AwaitingLabelBody {
                        count,
                        entries,
                        field: LabelField::Name { channel, start, len },
                    };
                    Step::Consumed
                }
                LabelField::Name { channel, start, len } => {
                    self.pending.push(byte);
                    if self.pending.len() - start < len {
                        self.mode = Mode::AwaitingLabelBody {
                            count,
                            entries,
                            field,
                        };
                        return Step::Consumed;
                    }

                    let raw = &self.pending[start..];
                    let name = match std::str::from_utf8(raw) {
                        Ok(name) => name.to_owned(),
                        Err(_) => {
                            debug!(channel, "label is not valid UTF-8");
                            on_event(Event::InvalidEncoding { channel });
                            String::from_utf8_lossy(raw).into_owned()
                        }
                    };
                    entries.push(LabelEntry { channel, name });

                    if entries.len() < count {
                        self.mode = Mode::AwaitingLabelBody {
                            count,
                            entries,
                            field: LabelField::Channel,
                        };
                    } else {
                        self.pending.clear();
                        trace!(entries = count, "label frame");
                        on_event(Event::Label(LabelFrame::from_decoded(entries)));
                    }
                    Step::Consumed
                }
            },
        }
    }

    fn begin(&mut self, kind: FrameKind, marker: u8) {
        self.pending.clear();
        self.pending.push(marker);
        self.mode = Mode::AwaitingCount(kind);
    }

    /// Abandon the current frame. The mode is already `Scanning`.
    ///
    /// The rejected byte is rescanned when `rescan` is set; everything
    /// before it is dropped.
    fn reject(&mut self, reason: MalformedHeader, rescan: bool, on_event: &mut impl FnMut(Event)) -> Step {
        debug!(?reason, dropped = self.pending.len(), "resync");
        self.pending.clear();
        on_event(Event::Resync(reason));
        if rescan {
            Step::Rescan
        } else {
            Step::Consumed
        }
    }
}

fn is_start_marker(byte: u8) -> bool {
    byte == START_DATA || byte == START_LABEL
}
