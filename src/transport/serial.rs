//! Serial transport
//!
//! Uses blocking threads:
//! - Reader thread: reads from serial port, sends to channel
//! - Writer thread: receives from channel, writes to serial port
//!
//! The transport stops when:
//! - `shutdown` flag is set
//! - Serial port disconnects (detected via consecutive empty reads)
//! - Write error occurs

use super::{Transport, TransportChannels};
use crate::constants::{
    CHANNEL_CAPACITY, DEFAULT_BAUD_RATE, READ_BUFFER_SIZE, SERIAL_DISCONNECT_THRESHOLD,
    SERIAL_READ_TIMEOUT_MS,
};
use crate::error::{PlotError, Result};
use bytes::Bytes;
use serialport::{DataBits, FlowControl, Parity, StopBits};
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Serial port transport, 8N1 without flow control
pub struct SerialTransport {
    port_name: String,
    baud_rate: u32,
}

impl SerialTransport {
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Pick the only available port
    ///
    /// # Errors
    ///
    /// - `NoDeviceFound` - No port available
    /// - `MultipleDevicesFound` - More than one port, caller must choose
    pub fn detect() -> Result<String> {
        let mut ports = list_ports()?;
        match ports.len() {
            0 => Err(PlotError::NoDeviceFound),
            1 => Ok(ports.remove(0)),
            n => Err(PlotError::MultipleDevicesFound { count: n }),
        }
    }

    /// Open the port and assert RTS/DTR (many USB-serial devices only
    /// transmit once DTR is set)
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Box<dyn serialport::SerialPort>> {
        let map_err = |e: serialport::Error| PlotError::SerialOpen {
            port: port_name.to_string(),
            source: std::io::Error::other(e.to_string()),
        };

        let mut port = serialport::new(port_name, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_millis(SERIAL_READ_TIMEOUT_MS))
            .open()
            .map_err(map_err)?;

        if let Err(e) = port.write_request_to_send(true) {
            warn!("Cannot set RTS on {}: {}", port_name, e);
        }
        if let Err(e) = port.write_data_terminal_ready(true) {
            warn!("Cannot set DTR on {}: {}", port_name, e);
        }

        Ok(port)
    }
}

/// Names of the serial ports present on this machine
pub fn list_ports() -> Result<Vec<String>> {
    let ports = serialport::available_ports().map_err(|e| PlotError::PortEnumeration {
        source: std::io::Error::other(e.to_string()),
    })?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

impl Transport for SerialTransport {
    fn spawn(self, shutdown: Arc<AtomicBool>) -> Result<TransportChannels> {
        let (in_tx, in_rx) = mpsc::channel::<Bytes>(CHANNEL_CAPACITY);
        let (out_tx, mut out_rx) = mpsc::channel::<Bytes>(CHANNEL_CAPACITY);

        let port_read = Self::open(&self.port_name, self.baud_rate)?;
        let port_write = port_read.try_clone().map_err(|e| PlotError::SerialOpen {
            port: self.port_name.clone(),
            source: std::io::Error::other(e.to_string()),
        })?;
        info!("Opened {} at {} baud", self.port_name, self.baud_rate);

        // Reader thread (blocking)
        let shutdown_reader = shutdown.clone();
        let name = self.port_name.clone();
        std::thread::spawn(move || {
            let mut port = port_read;
            let mut buf = [0u8; READ_BUFFER_SIZE];
            let mut empty_reads = 0u32;

            while !shutdown_reader.load(Ordering::Relaxed) {
                match port.read(&mut buf) {
                    Ok(n) if n > 0 => {
                        empty_reads = 0;
                        if in_tx
                            .blocking_send(Bytes::copy_from_slice(&buf[..n]))
                            .is_err()
                        {
                            break;
                        }
                    }
                    Ok(_) => {
                        // Zero bytes without timeout: port likely gone
                        empty_reads += 1;
                        if empty_reads > SERIAL_DISCONNECT_THRESHOLD {
                            warn!("{}: no data after {} reads, disconnecting", name, empty_reads);
                            break;
                        }
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::TimedOut => {
                        empty_reads = 0;
                    }
                    Err(e) => {
                        warn!("{}: read error: {}", name, e);
                        break;
                    }
                }
            }
            debug!("{}: reader stopped", name);
        });

        // Writer thread (blocking)
        let name = self.port_name;
        std::thread::spawn(move || {
            let mut port = port_write;

            while let Some(data) = out_rx.blocking_recv() {
                if shutdown.load(Ordering::Relaxed) {
                    break;
                }
                if let Err(e) = port.write_all(&data).and_then(|_| port.flush()) {
                    warn!("{}: write error: {}", name, e);
                    break;
                }
            }
            debug!("{}: writer stopped", name);
        });

        Ok(TransportChannels {
            rx: in_rx,
            tx: out_tx,
        })
    }
}
