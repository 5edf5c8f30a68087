//! Application-wide constants
//!
//! Centralized constants to avoid duplication and ensure consistency.

use std::time::Duration;

// =============================================================================
// Wire protocol
// =============================================================================

/// Start-of-frame marker for data frames
pub const START_DATA: u8 = 0xAA;

/// Start-of-frame marker for label frames
pub const START_LABEL: u8 = 0xAB;

/// Maximum number of channels (also the maximum COUNT field)
pub const MAX_CHANNELS: usize = 32;

/// Maximum length of a channel label on the wire (bytes)
pub const MAX_LABEL_LEN: usize = 16;

// =============================================================================
// Text lines and discovery
// =============================================================================

/// Silence after which a partial text line is closed
pub const TEXT_LINE_TIMEOUT: Duration = Duration::from_secs(2);

/// Silence after which an active command-table parse is finalized
pub const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(2);

/// Longest text line kept before it is force-closed
pub const MAX_TEXT_LINE_LEN: usize = 1024;

/// Request sent to the device to print its command table
pub const HELP_REQUEST: &[u8] = b"help\r\n";

// =============================================================================
// Channel store
// =============================================================================

/// Samples retained per channel
pub const SAMPLE_CAPACITY: usize = 10_000;

/// Default plot window (seconds)
pub const DEFAULT_TIME_WINDOW: f64 = 10.0;

/// Smallest selectable plot window (seconds)
pub const MIN_TIME_WINDOW: f64 = 1.0;

/// Largest selectable plot window (seconds)
pub const MAX_TIME_WINDOW: f64 = 300.0;

// =============================================================================
// Serial
// =============================================================================

/// Default baud rate
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Baud rates offered to the user
pub const BAUD_RATES: &[u32] = &[9600, 19200, 38400, 57600, 115_200, 230_400, 460_800, 921_600];

/// Serial read timeout (milliseconds)
pub const SERIAL_READ_TIMEOUT_MS: u64 = 50;

/// Consecutive zero-byte reads before assuming port disconnected
pub const SERIAL_DISCONNECT_THRESHOLD: u32 = 10;

/// Serial read buffer size
pub const READ_BUFFER_SIZE: usize = 4096;

// =============================================================================
// Session
// =============================================================================

/// Channel capacity for async message passing
pub const CHANNEL_CAPACITY: usize = 256;

/// Interval at which the session drives timeouts when no bytes arrive (milliseconds)
pub const SESSION_TICK_MS: u64 = 100;

/// Minimum interval between rate updates (seconds)
pub const RATE_UPDATE_MIN_INTERVAL_SECS: f64 = 0.1;

/// Interval between periodic stats reports in headless mode (seconds)
pub const STATS_REPORT_INTERVAL_SECS: u64 = 2;

/// Text lines retained in the terminal log
pub const TERMINAL_MAX_LINES: usize = 500;
