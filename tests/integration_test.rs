//! Integration tests for the plot session
//!
//! Tests the complete data flow (bytes → decoder → store/parser/terminal)
//! using a mock transport.

use bytes::Bytes;
use dragoonplot::codec::{Event, FrameDecoder, FrameKind, LabelEntry, LabelFrame, MalformedHeader};
use dragoonplot::commands::CommandButton;
use dragoonplot::config::{self, AppConfig};
use dragoonplot::discovery::{Category, CommandTableParser};
use dragoonplot::error::Result;
use dragoonplot::session::{Control, Session, SharedState};
use dragoonplot::store::ChannelConfigUpdate;
use dragoonplot::transport::{Transport, TransportChannels};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

// =============================================================================
// Mock Transport
// =============================================================================

/// Mock transport for driving a session without real I/O
pub struct MockTransport {
    /// Chunks delivered to the session, in order
    rx_data: Vec<Bytes>,
    /// Bytes written by the session
    tx_captured: Arc<tokio::sync::Mutex<Vec<Bytes>>>,
    /// Close the byte stream after the last chunk
    close_after: bool,
}

impl MockTransport {
    pub fn new(rx_data: Vec<Bytes>) -> Self {
        Self {
            rx_data,
            tx_captured: Arc::new(tokio::sync::Mutex::new(Vec::new())),
            close_after: true,
        }
    }

    /// Keep the stream open after the last chunk (until shutdown)
    pub fn keep_open(mut self) -> Self {
        self.close_after = false;
        self
    }

    pub fn captured(&self) -> Arc<tokio::sync::Mutex<Vec<Bytes>>> {
        self.tx_captured.clone()
    }
}

impl Transport for MockTransport {
    fn spawn(self, shutdown: Arc<AtomicBool>) -> Result<TransportChannels> {
        let (tx_to_session, rx_from_mock) = mpsc::channel::<Bytes>(16);
        let (tx_from_session, mut rx_to_capture) = mpsc::channel::<Bytes>(16);

        let tx_captured = self.tx_captured.clone();
        tokio::spawn(async move {
            while let Some(data) = rx_to_capture.recv().await {
                tx_captured.lock().await.push(data);
            }
        });

        let rx_data = self.rx_data;
        let close_after = self.close_after;
        tokio::spawn(async move {
            for data in rx_data {
                tokio::time::sleep(Duration::from_millis(5)).await;
                if tx_to_session.send(data).await.is_err() {
                    return;
                }
            }
            if !close_after {
                while !shutdown.load(Ordering::Relaxed) {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        });

        Ok(TransportChannels {
            rx: rx_from_mock,
            tx: tx_from_session,
        })
    }
}

fn help_table() -> &'static [u8] {
    b"help\r\n\
GMU Commands\r\n\
---------+----------+-------+----------------\r\n\
CMD      | ARGS     | CAT   | DESCRIPTION\r\n\
---------+----------+-------+----------------\r\n\
start    | -        | state | Start the motor\r\n\
stop     | -        | state | Stop the motor\r\n\
setpid   | kp ki kd | param | Set PID gains\r\n\
status   | -        | diag  | Print status\r\n\
reboot   | -        | sys   | Reboot\r\n\
help     | -        | sys   | Show this table\r\n\
---------+----------+-------+----------------\r\n"
}

// =============================================================================
// Session over a mock transport
// =============================================================================

#[tokio::test]
async fn test_session_end_to_end() {
    // Label frame, two data frames split across chunks, then the help table
    let mut stream = vec![0xAB, 0x02, 0x00, 0x04, b'T', b'e', b'm', b'p', 0x01, 0x01, b'V'];
    stream.extend_from_slice(&[0xAA, 0x02, 0x64, 0x00, 0xD0, 0x07]);
    stream.extend_from_slice(&[0xAA, 0x02, 0x0C, 0xFE, 0x01, 0x00]);
    stream.extend_from_slice(help_table());

    let chunks: Vec<Bytes> = stream.chunks(7).map(Bytes::copy_from_slice).collect();
    let transport = MockTransport::new(chunks);
    let shutdown = Arc::new(AtomicBool::new(false));
    let channels = transport.spawn(shutdown.clone()).unwrap();

    let shared = SharedState::new();
    let (_control_tx, control_rx) = mpsc::channel(4);
    let result = tokio::time::timeout(
        Duration::from_secs(5),
        Session::new(shared.clone()).run(channels, control_rx, shutdown),
    )
    .await
    .expect("session did not end");
    assert!(result.is_ok());

    let store = shared.store.read();
    assert_eq!(store.channel_count(), 2);
    assert_eq!(store.label(0).as_deref(), Some("Temp"));
    assert_eq!(store.label(1).as_deref(), Some("V"));

    let ch0: Vec<f64> = store
        .samples_in_window(0, f64::INFINITY, 0.0)
        .map(|(_, v)| v)
        .collect();
    assert_eq!(ch0, vec![100.0, -500.0]);
    let ch1: Vec<f64> = store
        .samples_in_window(1, f64::INFINITY, 0.0)
        .map(|(_, v)| v)
        .collect();
    assert_eq!(ch1, vec![2000.0, 1.0]);

    let commands = shared.commands.read();
    let names: Vec<_> = commands.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Start", "Stop", "Status", "Reboot", "Help"]);
    assert_eq!(commands[2].category, Category::Diagnostics);

    let snap = shared.stats.snapshot();
    assert_eq!(snap.data_frames, 2);
    assert_eq!(snap.label_frames, 1);
    assert_eq!(snap.resyncs, 0);
    assert_eq!(snap.rx_bytes, stream.len() as u64);

    let terminal = shared.terminal.lock();
    assert!(terminal.entries().iter().any(|e| e.text == "GMU Commands"));
}

#[tokio::test]
async fn test_session_control_commands() {
    let transport = MockTransport::new(vec![Bytes::from_static(&[0xAA, 0x01, 0x05, 0x00])]).keep_open();
    let captured = transport.captured();
    let shutdown = Arc::new(AtomicBool::new(false));
    let channels = transport.spawn(shutdown.clone()).unwrap();

    let shared = SharedState::new();
    let (control_tx, control_rx) = mpsc::channel(4);
    let handle = tokio::spawn(Session::new(shared.clone()).run(channels, control_rx, shutdown.clone()));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(shared.store.read().channel(0).unwrap().len(), 1);

    control_tx.send(Control::Discover).await.unwrap();
    let button = CommandButton::hex("Raw", "0x01 0x02");
    control_tx
        .send(Control::Send(Bytes::from(button.payload().unwrap())))
        .await
        .unwrap();
    control_tx.send(Control::ClearData).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    shutdown.store(true, Ordering::SeqCst);
    handle.await.unwrap().unwrap();

    let sent = captured.lock().await;
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].as_ref(), b"help\r\n");
    assert_eq!(sent[1].as_ref(), &[0x01, 0x02]);

    assert!(shared.store.read().channel(0).unwrap().is_empty());
    assert_eq!(shared.stats.tx_bytes(), 8);
}

#[tokio::test]
async fn test_session_event_tap_order() {
    let stream: &[u8] = &[0xAA, 0x00, 0xAB, 0x01, 0x00, 0x04, b'T', b'e', b'm', b'p', b'o', b'k', b'\n'];
    let transport = MockTransport::new(vec![Bytes::from_static(stream)]);
    let shutdown = Arc::new(AtomicBool::new(false));
    let channels = transport.spawn(shutdown.clone()).unwrap();

    let (event_tx, mut event_rx) = mpsc::channel(16);
    let (_control_tx, control_rx) = mpsc::channel(4);
    Session::new(SharedState::new())
        .with_event_tap(event_tx)
        .run(channels, control_rx, shutdown)
        .await
        .unwrap();

    let mut events = Vec::new();
    while let Ok(event) = event_rx.try_recv() {
        events.push(event);
    }
    assert_eq!(events.len(), 3);
    assert_eq!(
        events[0],
        Event::Resync(MalformedHeader::InvalidCount {
            kind: FrameKind::Data,
            count: 0
        })
    );
    assert_eq!(
        events[1],
        Event::Label(LabelFrame::new(vec![LabelEntry::new(0, "Temp")]).unwrap())
    );
    assert!(matches!(&events[2], Event::Text(line) if line.as_str() == "ok"));
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_scenario_data_frame() {
    let mut decoder = FrameDecoder::new();
    let events = decoder.feed(&[0xAA, 0x03, 0x64, 0x00, 0xD0, 0x07, 0x0C, 0xFE], Duration::ZERO);
    assert_eq!(events.len(), 1);
    let Event::Data(frame) = &events[0] else {
        panic!("expected data frame, got {:?}", events[0]);
    };
    assert_eq!(frame.values(), &[100, 2000, -500]);
}

#[test]
fn test_scenario_label_frame() {
    let mut decoder = FrameDecoder::new();
    let events = decoder.feed(&[0xAB, 0x01, 0x00, 0x04, 0x54, 0x65, 0x6D, 0x70], Duration::ZERO);
    assert_eq!(
        events,
        vec![Event::Label(LabelFrame::new(vec![LabelEntry::new(0, "Temp")]).unwrap())]
    );
}

#[test]
fn test_scenario_invalid_count_then_label() {
    let mut decoder = FrameDecoder::new();
    let events = decoder.feed(
        &[0xAA, 0x00, 0xAB, 0x01, 0x00, 0x04, 0x54, 0x65, 0x6D, 0x70],
        Duration::ZERO,
    );
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], Event::Resync(_)));
    assert!(matches!(&events[1], Event::Label(f) if f.entries()[0].name == "Temp"));
}

#[test]
fn test_scenario_command_table() {
    let mut parser = CommandTableParser::new();
    assert!(parser.feed("GMU Commands", Duration::ZERO).is_none());
    assert!(parser
        .feed("start | - | state | Start the motor", Duration::ZERO)
        .is_none());
    assert!(parser
        .feed("setpid | kp ki kd | param | Set PID", Duration::ZERO)
        .is_none());
    let specs = parser.feed("------+----+-----+------", Duration::ZERO).unwrap();

    assert_eq!(specs.len(), 1);
    assert_eq!(specs[0].name, "Start");
    assert_eq!(specs[0].category, Category::State);
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn test_config_roundtrip_through_store() {
    let path = std::env::temp_dir().join(format!("dragoonplot-it-{}.toml", std::process::id()));
    let shared = SharedState::new();
    {
        let mut store = shared.store.write();
        store
            .set_channel_config(
                1,
                ChannelConfigUpdate {
                    label: Some("Current".into()),
                    scale: Some(0.001),
                    ..Default::default()
                },
            )
            .unwrap();
    }

    let mut cfg = AppConfig::default();
    cfg.channels = shared.store.read().configs().into_iter().take(2).collect();
    config::save(&path, &cfg).unwrap();

    let restored = config::load(&path);
    let _ = std::fs::remove_file(&path);

    let other = SharedState::new();
    other.store.write().apply_configs(&restored.channels);
    let store = other.store.read();
    assert_eq!(store.label(1).as_deref(), Some("Current"));
    assert_eq!(store.channel(1).unwrap().config().scale, 0.001);
}
