//! Byte source abstraction
//!
//! Separates I/O from decoding:
//! - **Transport**: how bytes flow (serial port, test doubles)
//! - **Codec**: how bytes are turned into events (handled separately)
//!
//! Each transport manages its own execution model internally. The serial
//! transport uses blocking threads; the session only sees channels.

pub mod serial;

pub use serial::{list_ports, SerialTransport};

use bytes::Bytes;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::error::Result;

/// Channels for bidirectional communication with a transport
///
/// The transport owns the underlying I/O and closes `rx` when it stops
/// (shutdown, disconnect or error).
pub struct TransportChannels {
    /// Raw bytes from the device; `None` once the transport has stopped
    pub rx: mpsc::Receiver<Bytes>,

    /// Raw bytes to write to the device
    pub tx: mpsc::Sender<Bytes>,
}

/// Trait for spawnable transports
///
/// A transport does NOT handle framing, statistics or reconnection.
///
/// # Lifecycle
///
/// 1. Create transport with configuration
/// 2. Call `spawn()` to start I/O in background
/// 3. Use returned channels for communication
/// 4. Transport runs until `shutdown` is set or a fatal error occurs,
///    then closes its channels
pub trait Transport: Send + 'static {
    /// Start I/O and return the channels
    ///
    /// # Errors
    ///
    /// Returns an error if the transport cannot be initialized
    /// (e.g., port not found).
    fn spawn(self, shutdown: Arc<AtomicBool>) -> Result<TransportChannels>;
}
