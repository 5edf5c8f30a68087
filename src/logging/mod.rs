//! Logging
//!
//! - `init_tracing` - internal diagnostics via `tracing`
//! - `TerminalLog` - bounded history of device text and sent commands

pub mod terminal;

pub use terminal::{Direction, TerminalEntry, TerminalLog};

/// Initialize tracing output
///
/// Call early in main() before any logging occurs.
/// Set `verbose` to true for debug-level output; `RUST_LOG` overrides both.
pub fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_file(false)
                .compact(),
        )
        .with(filter)
        .try_init();
}
