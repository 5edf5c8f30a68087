//! Plot session - single writer between the byte source and shared state
//!
//! The session handles:
//! - Decoding incoming bytes into events
//! - Timestamping data frames and applying them to the channel store
//! - Routing text lines to the terminal log and the command table parser
//! - Driving silence timeouts when no bytes arrive
//! - Statistics tracking
//!
//! The session does NOT handle:
//! - Transport lifecycle (that's the caller's responsibility)
//! - Rendering (readers poll the shared handles)

use crate::codec::{Event, FrameDecoder};
use crate::constants::{HELP_REQUEST, SESSION_TICK_MS, TERMINAL_MAX_LINES};
use crate::discovery::{CommandSpec, CommandTableParser};
use crate::error::Result;
use crate::logging::{TerminalEntry, TerminalLog};
use crate::stats::Stats;
use crate::store::ChannelStore;
use crate::transport::TransportChannels;
use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub type SharedStore = Arc<RwLock<ChannelStore>>;
pub type SharedCommands = Arc<RwLock<Vec<CommandSpec>>>;
pub type SharedTerminal = Arc<Mutex<TerminalLog>>;

/// Handles readers use to observe a running session
#[derive(Clone)]
pub struct SharedState {
    pub store: SharedStore,
    /// Commands from the last successful discovery
    pub commands: SharedCommands,
    pub terminal: SharedTerminal,
    pub stats: Arc<Stats>,
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(ChannelStore::new())),
            commands: Arc::new(RwLock::new(Vec::new())),
            terminal: Arc::new(Mutex::new(TerminalLog::new(TERMINAL_MAX_LINES))),
            stats: Arc::new(Stats::new()),
        }
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

/// Requests from the presentation side
#[derive(Debug, Clone)]
pub enum Control {
    /// Restart discovery and send `help`
    Discover,
    /// Write raw bytes to the device
    Send(Bytes),
    /// Drop all stored samples
    ClearData,
}

pub struct Session {
    decoder: FrameDecoder,
    parser: CommandTableParser,
    shared: SharedState,
    /// Time since session start at the previous `handle_chunk`/`tick`
    clock: Duration,
    event_tx: Option<mpsc::Sender<Event>>,
}

impl Session {
    pub fn new(shared: SharedState) -> Self {
        Self {
            decoder: FrameDecoder::new(),
            parser: CommandTableParser::new(),
            shared,
            clock: Duration::ZERO,
            event_tx: None,
        }
    }

    /// Copy every decoded event to `tx` (dropped if the receiver lags)
    pub fn with_event_tap(mut self, tx: mpsc::Sender<Event>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn shared(&self) -> &SharedState {
        &self.shared
    }

    // =========================================================================
    // Synchronous pipeline
    // =========================================================================

    /// Process a chunk received `now` (time since session start)
    ///
    /// Returns the command set when a discovery pass ended.
    pub fn handle_chunk(&mut self, chunk: &[u8], now: Duration) -> Option<Vec<CommandSpec>> {
        let elapsed = self.advance(now);
        self.shared.stats.add_rx(chunk.len());

        let mut events = Vec::new();
        self.decoder.feed_with(chunk, elapsed, |e| events.push(e));
        self.dispatch(events, elapsed)
    }

    /// Advance time with no bytes; drives the 2 s silence timeouts
    pub fn tick(&mut self, now: Duration) -> Option<Vec<CommandSpec>> {
        self.handle_chunk(&[], now)
    }

    /// Stream ended: flush the partial line and report a partial frame
    pub fn close(&mut self) -> Option<Vec<CommandSpec>> {
        let events = self.decoder.close();
        self.dispatch(events, Duration::ZERO)
    }

    /// Forget any table in progress; the caller sends `help` next
    pub fn restart_discovery(&mut self) {
        self.parser.restart();
    }

    fn advance(&mut self, now: Duration) -> Duration {
        let elapsed = now.saturating_sub(self.clock);
        self.clock = self.clock.max(now);
        elapsed
    }

    fn dispatch(&mut self, events: Vec<Event>, elapsed: Duration) -> Option<Vec<CommandSpec>> {
        let timestamp = self.clock.as_secs_f64();
        // Silence is charged once, to the first line (or to a tick below)
        let mut silence = Some(elapsed);
        let mut discovered = None;

        for event in events {
            self.shared.stats.record(&event);

            match &event {
                Event::Data(frame) => {
                    self.shared.store.write().apply_data_frame(frame, timestamp);
                }
                Event::Label(frame) => {
                    let applied = self.shared.store.write().apply_label_frame(frame);
                    debug!("Applied {} channel labels", applied);
                }
                Event::Text(line) => {
                    self.shared
                        .terminal
                        .lock()
                        .add(TerminalEntry::received(line.as_str()));
                    let waited = silence.take().unwrap_or_default();
                    if let Some(specs) = self.parser.feed(line.as_str(), waited) {
                        discovered = Some(specs);
                    }
                }
                Event::Resync(reason) => warn!("Resync: {:?}", reason),
                Event::InvalidEncoding { channel } => {
                    warn!("Label for channel {} is not valid UTF-8", channel)
                }
                Event::Incomplete(frame) => {
                    warn!("Stream ended mid-frame: {:?}", frame)
                }
            }

            if let Some(tx) = &self.event_tx {
                let _ = tx.try_send(event);
            }
        }

        if let Some(waited) = silence {
            if let Some(specs) = self.parser.tick(waited) {
                discovered = Some(specs);
            }
        }

        if let Some(specs) = &discovered {
            if !specs.is_empty() {
                *self.shared.commands.write() = self.parser.commands().to_vec();
            }
        }
        discovered
    }

    // =========================================================================
    // Async loop
    // =========================================================================

    /// Run until shutdown or transport disconnect
    ///
    /// Returns `Ok(())` on clean shutdown or disconnect. Discovery results
    /// are published to `SharedState::commands`.
    pub async fn run(
        mut self,
        mut channels: TransportChannels,
        mut control_rx: mpsc::Receiver<Control>,
        shutdown: Arc<AtomicBool>,
    ) -> Result<()> {
        let started = Instant::now();
        let mut ticker = tokio::time::interval(Duration::from_millis(SESSION_TICK_MS));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = ticker.tick() => {
                    if shutdown.load(Ordering::Relaxed) {
                        info!("Session shutdown requested");
                        break;
                    }
                    self.tick(started.elapsed());
                }

                msg = channels.rx.recv() => {
                    match msg {
                        Some(data) => {
                            self.handle_chunk(&data, started.elapsed());
                        }
                        None => {
                            info!("Transport closed");
                            break;
                        }
                    }
                }

                Some(control) = control_rx.recv() => {
                    self.handle_control(control, &channels.tx);
                }
            }
        }

        self.close();
        Ok(())
    }

    fn handle_control(&mut self, control: Control, tx: &mpsc::Sender<Bytes>) {
        match control {
            Control::Discover => {
                info!("Discovering commands");
                self.restart_discovery();
                self.send(Bytes::from_static(HELP_REQUEST), tx);
            }
            Control::Send(data) => self.send(data, tx),
            Control::ClearData => {
                self.shared.store.write().clear();
                debug!("Channel data cleared");
            }
        }
    }

    fn send(&self, data: Bytes, tx: &mpsc::Sender<Bytes>) {
        let echo = String::from_utf8_lossy(&data).trim_end().to_string();
        let len = data.len();
        if tx.try_send(data).is_err() {
            warn!("Transport busy or closed, dropped {} bytes", len);
            return;
        }
        self.shared.stats.add_tx(len);
        self.shared.terminal.lock().add(TerminalEntry::sent(echo));
    }
}
