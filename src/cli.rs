//! Command-line interface definition using clap

use clap::Parser;
use std::path::PathBuf;

// =============================================================================
// CLI Definition
// =============================================================================

/// Headless serial plotter: decodes plot frames, tracks channels and
/// discovers device commands
#[derive(Parser, Debug, Default)]
#[command(name = "dragoonplot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose debug output
    #[arg(short, long)]
    pub verbose: bool,

    /// List available serial ports and exit
    #[arg(long)]
    pub list: bool,

    /// Serial port to use (overrides config)
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<String>,

    /// Baud rate (overrides config)
    #[arg(short, long, value_name = "BAUD")]
    pub baud: Option<u32>,

    /// Send `help` after connecting to discover device commands
    #[arg(long)]
    pub discover: bool,

    /// Print every decoded event as a JSON line
    #[arg(long)]
    pub events: bool,

    /// Plot window in seconds used for the periodic channel summary
    #[arg(short, long, value_name = "SECONDS")]
    pub window: Option<f64>,

    /// Config file (default: dragoonplot.toml next to the executable)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_defaults() {
        let cli = Cli::parse_from(["dragoonplot"]);
        assert!(!cli.verbose);
        assert!(!cli.list);
        assert!(!cli.discover);
        assert!(cli.port.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_parse_verbose() {
        let cli = Cli::parse_from(["dragoonplot", "-v"]);
        assert!(cli.verbose);

        let cli = Cli::parse_from(["dragoonplot", "--verbose"]);
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_parse_port_and_baud() {
        let cli = Cli::parse_from(["dragoonplot", "--port", "/dev/ttyACM0", "-b", "921600"]);
        assert_eq!(cli.port.as_deref(), Some("/dev/ttyACM0"));
        assert_eq!(cli.baud, Some(921_600));
    }

    #[test]
    fn test_cli_parse_flags() {
        let cli = Cli::parse_from([
            "dragoonplot",
            "--discover",
            "--events",
            "--window",
            "30",
            "--config",
            "plot.toml",
        ]);
        assert!(cli.discover);
        assert!(cli.events);
        assert_eq!(cli.window, Some(30.0));
        assert_eq!(cli.config, Some(PathBuf::from("plot.toml")));
    }

    #[test]
    fn test_cli_rejects_bad_baud() {
        assert!(Cli::try_parse_from(["dragoonplot", "--baud", "fast"]).is_err());
    }
}
