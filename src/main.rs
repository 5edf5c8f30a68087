//! dragoonplot - headless serial plotter
//!
//! Usage:
//!   dragoonplot --list                    List serial ports
//!   dragoonplot --port /dev/ttyACM0       Plot from a port (Ctrl-C to stop)
//!   dragoonplot --discover --events       Discover commands, print events as JSON

use anyhow::Result;
use clap::Parser;
use dragoonplot::cli::Cli;
use dragoonplot::codec::Event;
use dragoonplot::commands::CommandButton;
use dragoonplot::config::{self, clamp_time_window, AppConfig};
use dragoonplot::constants::{BAUD_RATES, CHANNEL_CAPACITY, STATS_REPORT_INTERVAL_SECS};
use dragoonplot::logging;
use dragoonplot::session::{Control, Session, SharedState};
use dragoonplot::transport::{self, SerialTransport, Transport};
use dragoonplot::PlotError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    if cli.list {
        let ports = transport::list_ports()?;
        if ports.is_empty() {
            eprintln!("No serial ports found");
        }
        for port in ports {
            println!("{}", port);
        }
        return Ok(());
    }

    let config_path = cli.config.clone().unwrap_or_else(config::default_path);
    let mut cfg = config::load(&config_path);

    if let Some(window) = cli.window {
        cfg.plot.set_time_window(window);
    }

    let port = match cli.port.clone() {
        Some(p) => p,
        None if !cfg.serial.last_port.is_empty() => cfg.serial.last_port.clone(),
        None => SerialTransport::detect()?,
    };
    let baud = cli.baud.unwrap_or(cfg.serial.last_baud);
    if !BAUD_RATES.contains(&baud) {
        warn!("Non-standard baud rate {}", baud);
    }

    let rt = tokio::runtime::Runtime::new().map_err(|source| PlotError::Runtime { source })?;
    rt.block_on(run_headless(&cli, port, baud, &mut cfg))?;

    config::save(&config_path, &cfg)?;
    info!("Config saved to {}", config_path.display());
    Ok(())
}

async fn run_headless(cli: &Cli, port: String, baud: u32, cfg: &mut AppConfig) -> Result<()> {
    let shared = SharedState::new();
    shared.store.write().apply_configs(&cfg.channels);

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown_signal.store(true, Ordering::SeqCst);
        }
    });

    eprintln!("Plotting {} @ {} baud (Ctrl-C to stop)", port, baud);
    let channels = SerialTransport::new(port.clone())
        .with_baud_rate(baud)
        .spawn(shutdown.clone())?;

    let mut session = Session::new(shared.clone());
    if cli.events {
        let (event_tx, event_rx) = mpsc::channel(CHANNEL_CAPACITY);
        session = session.with_event_tap(event_tx);
        tokio::spawn(print_events(event_rx));
    }

    let (control_tx, control_rx) = mpsc::channel(8);
    if cli.discover {
        control_tx.send(Control::Discover).await?;
    }

    let reporter = tokio::spawn(report_periodically(
        shared.clone(),
        cfg.plot.time_window,
        shutdown.clone(),
    ));

    session.run(channels, control_rx, shutdown.clone()).await?;
    shutdown.store(true, Ordering::SeqCst);
    let _ = reporter.await;

    // Persist what this run learned
    let commands = shared.commands.read().clone();
    for spec in &commands {
        println!("[{}] {} ({})", spec.category.display_name(), spec.name, spec.command);
    }
    cfg.merge_discovered(commands.iter().map(CommandButton::from).collect());

    let store = shared.store.read();
    let keep = store.channel_count().max(cfg.channels.len());
    cfg.channels = store.configs().into_iter().take(keep).collect();
    cfg.serial.last_port = port;
    cfg.serial.last_baud = baud;
    Ok(())
}

async fn print_events(mut event_rx: mpsc::Receiver<Event>) {
    while let Some(event) = event_rx.recv().await {
        match serde_json::to_string(&event) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!("Cannot serialize event: {}", e),
        }
    }
}

/// Log traffic counters and a per-channel summary of the plot window
async fn report_periodically(shared: SharedState, window: f64, shutdown: Arc<AtomicBool>) {
    let window = clamp_time_window(window);
    let mut interval = tokio::time::interval(Duration::from_secs(STATS_REPORT_INTERVAL_SECS));
    interval.tick().await;

    while !shutdown.load(Ordering::Relaxed) {
        interval.tick().await;

        let snap = shared.stats.snapshot();
        info!(
            "RX {:.1} KB/s | frames {} | labels {} | lines {} | resyncs {}",
            snap.rx_kbps, snap.data_frames, snap.label_frames, snap.text_lines, snap.resyncs
        );

        let store = shared.store.read();
        for index in 0..store.channel_count() {
            let Some((now, value)) = store.channel(index).and_then(|c| c.latest()) else {
                continue;
            };
            let label = store.label(index).unwrap_or_default();
            let in_window = store.samples_in_window(index, window, now).count();
            info!("  {:<16} {:>10.3} ({} samples in {}s)", label, value, in_window, window);
        }
    }
}
