//! Centralized error types
//!
//! All errors raised by the outer surfaces (serial, config, commands) are
//! represented by the `PlotError` enum. Malformed bytes on the wire are not
//! errors: the decoder reports them as events.
//! Use `Result<T>` as shorthand for `std::result::Result<T, PlotError>`.

use std::fmt;
use std::path::PathBuf;

/// All plotter errors
#[derive(Debug)]
pub enum PlotError {
    // === Transport ===
    /// Failed to open serial port
    SerialOpen {
        port: String,
        source: std::io::Error,
    },
    /// Failed to enumerate serial ports
    PortEnumeration { source: std::io::Error },

    // === IO ===
    /// File system operation failed
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Config file could not be parsed or serialized
    ConfigFormat { path: PathBuf, reason: String },
    /// Invalid config value
    ConfigValidation { field: &'static str, reason: String },

    // === Store ===
    /// Channel index outside 0..MAX_CHANNELS
    ChannelOutOfRange { index: usize },

    // === Commands ===
    /// Hex command payload could not be parsed
    InvalidHex { data: String },

    // === Detection ===
    /// No serial port available
    NoDeviceFound,
    /// Multiple serial ports available and none selected
    MultipleDevicesFound { count: usize },

    // === Runtime ===
    /// Tokio runtime creation failed
    Runtime { source: std::io::Error },
}

impl std::error::Error for PlotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SerialOpen { source, .. }
            | Self::PortEnumeration { source }
            | Self::Io { source, .. }
            | Self::Runtime { source } => Some(source),
            _ => None,
        }
    }
}

impl fmt::Display for PlotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SerialOpen { port, .. } => write!(f, "Cannot open serial port: {}", port),
            Self::PortEnumeration { .. } => write!(f, "Cannot enumerate serial ports"),
            Self::Io { path, .. } => write!(f, "IO error: {}", path.display()),
            Self::ConfigFormat { path, reason } => {
                write!(f, "Invalid config {}: {}", path.display(), reason)
            }
            Self::ConfigValidation { field, reason } => {
                write!(f, "Invalid {}: {}", field, reason)
            }
            Self::ChannelOutOfRange { index } => {
                write!(f, "Channel index {} out of range", index)
            }
            Self::InvalidHex { data } => write!(f, "Invalid hex payload: {}", data),
            Self::NoDeviceFound => write!(f, "No serial port found"),
            Self::MultipleDevicesFound { count } => {
                write!(f, "Multiple serial ports found ({}), specify one", count)
            }
            Self::Runtime { .. } => write!(f, "Failed to create runtime"),
        }
    }
}

/// Alias for Result with PlotError
pub type Result<T> = std::result::Result<T, PlotError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_display_channel_out_of_range() {
        let err = PlotError::ChannelOutOfRange { index: 40 };
        assert_eq!(err.to_string(), "Channel index 40 out of range");
    }

    #[test]
    fn test_source_is_forwarded() {
        let err = PlotError::SerialOpen {
            port: "COM3".into(),
            source: std::io::Error::other("busy"),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("COM3"));
    }

    #[test]
    fn test_source_absent_for_validation() {
        let err = PlotError::InvalidHex { data: "zz".into() };
        assert!(err.source().is_none());
    }
}
