//! Serial plotter core
//!
//! Bytes from a serial device flow one way:
//! `transport` → [`codec::FrameDecoder`] → {[`store::ChannelStore`],
//! [`discovery::CommandTableParser`], [`logging::TerminalLog`]}.
//! [`session::Session`] is the single writer; readers use the shared
//! handles in [`session::SharedState`].

pub mod cli;
pub mod codec;
pub mod commands;
pub mod config;
pub mod constants;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod session;
pub mod stats;
pub mod store;
pub mod transport;

pub use error::{PlotError, Result};
