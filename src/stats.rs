//! Traffic and decoder statistics
//!
//! Thread-safe counters for throughput and decoder anomalies.
//! Uses lock-free atomics for all operations.

use crate::codec::Event;
use crate::constants::RATE_UPDATE_MIN_INTERVAL_SECS;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Counters with rate calculation (fully lock-free)
pub struct Stats {
    /// Total bytes written to the device
    tx_total: AtomicU64,
    /// Total bytes received from the device
    rx_total: AtomicU64,
    tx_snapshot: AtomicU64,
    rx_snapshot: AtomicU64,
    start_time: Instant,
    /// Nanoseconds since start_time at last rate calculation
    last_calc_nanos: AtomicU64,
    /// Cached rates in KB/s (stored as f64 bits)
    tx_rate: AtomicU64,
    rx_rate: AtomicU64,

    data_frames: AtomicU64,
    label_frames: AtomicU64,
    text_lines: AtomicU64,
    resyncs: AtomicU64,
    encoding_errors: AtomicU64,
    incomplete_frames: AtomicU64,
}

/// Point-in-time copy of all counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub tx_bytes: u64,
    pub rx_bytes: u64,
    pub tx_kbps: f64,
    pub rx_kbps: f64,
    pub data_frames: u64,
    pub label_frames: u64,
    pub text_lines: u64,
    pub resyncs: u64,
    pub encoding_errors: u64,
    pub incomplete_frames: u64,
}

impl Stats {
    pub fn new() -> Self {
        Self {
            tx_total: AtomicU64::new(0),
            rx_total: AtomicU64::new(0),
            tx_snapshot: AtomicU64::new(0),
            rx_snapshot: AtomicU64::new(0),
            start_time: Instant::now(),
            last_calc_nanos: AtomicU64::new(0),
            tx_rate: AtomicU64::new(0),
            rx_rate: AtomicU64::new(0),
            data_frames: AtomicU64::new(0),
            label_frames: AtomicU64::new(0),
            text_lines: AtomicU64::new(0),
            resyncs: AtomicU64::new(0),
            encoding_errors: AtomicU64::new(0),
            incomplete_frames: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn add_tx(&self, bytes: usize) {
        self.tx_total.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn add_rx(&self, bytes: usize) {
        self.rx_total.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn tx_bytes(&self) -> u64 {
        self.tx_total.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn rx_bytes(&self) -> u64 {
        self.rx_total.load(Ordering::Relaxed)
    }

    /// Count a decoded event
    pub fn record(&self, event: &Event) {
        let counter = match event {
            Event::Data(_) => &self.data_frames,
            Event::Label(_) => &self.label_frames,
            Event::Text(_) => &self.text_lines,
            Event::Resync(_) => &self.resyncs,
            Event::InvalidEncoding { .. } => &self.encoding_errors,
            Event::Incomplete(_) => &self.incomplete_frames,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Update rate calculations and return (tx_kb_s, rx_kb_s)
    pub fn update_rates(&self) -> (f64, f64) {
        let now_nanos = self.start_time.elapsed().as_nanos() as u64;
        let last_nanos = self.last_calc_nanos.load(Ordering::Relaxed);
        let elapsed = now_nanos.saturating_sub(last_nanos) as f64 / 1_000_000_000.0;

        if elapsed < RATE_UPDATE_MIN_INTERVAL_SECS {
            return self.cached_rates();
        }

        // Claim the update; losers return cached values
        if self
            .last_calc_nanos
            .compare_exchange(last_nanos, now_nanos, Ordering::SeqCst, Ordering::Relaxed)
            .is_err()
        {
            return self.cached_rates();
        }

        let tx_now = self.tx_total.load(Ordering::Relaxed);
        let rx_now = self.rx_total.load(Ordering::Relaxed);
        let tx_prev = self.tx_snapshot.swap(tx_now, Ordering::Relaxed);
        let rx_prev = self.rx_snapshot.swap(rx_now, Ordering::Relaxed);

        let tx_rate = tx_now.saturating_sub(tx_prev) as f64 / elapsed / 1024.0;
        let rx_rate = rx_now.saturating_sub(rx_prev) as f64 / elapsed / 1024.0;

        self.tx_rate.store(tx_rate.to_bits(), Ordering::Relaxed);
        self.rx_rate.store(rx_rate.to_bits(), Ordering::Relaxed);

        (tx_rate, rx_rate)
    }

    fn cached_rates(&self) -> (f64, f64) {
        (
            f64::from_bits(self.tx_rate.load(Ordering::Relaxed)),
            f64::from_bits(self.rx_rate.load(Ordering::Relaxed)),
        )
    }

    /// Refresh rates and copy every counter
    pub fn snapshot(&self) -> StatsSnapshot {
        let (tx_kbps, rx_kbps) = self.update_rates();
        StatsSnapshot {
            tx_bytes: self.tx_bytes(),
            rx_bytes: self.rx_bytes(),
            tx_kbps,
            rx_kbps,
            data_frames: self.data_frames.load(Ordering::Relaxed),
            label_frames: self.label_frames.load(Ordering::Relaxed),
            text_lines: self.text_lines.load(Ordering::Relaxed),
            resyncs: self.resyncs.load(Ordering::Relaxed),
            encoding_errors: self.encoding_errors.load(Ordering::Relaxed),
            incomplete_frames: self.incomplete_frames.load(Ordering::Relaxed),
        }
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{DataFrame, FrameKind, MalformedHeader, TextLine};

    #[test]
    fn test_byte_counters() {
        let stats = Stats::new();
        stats.add_rx(10);
        stats.add_rx(5);
        stats.add_tx(3);
        assert_eq!(stats.rx_bytes(), 15);
        assert_eq!(stats.tx_bytes(), 3);
    }

    #[test]
    fn test_record_events() {
        let stats = Stats::new();
        stats.record(&Event::Data(DataFrame::new(vec![1]).unwrap()));
        stats.record(&Event::Data(DataFrame::new(vec![2]).unwrap()));
        stats.record(&Event::Text(TextLine::new("ok")));
        stats.record(&Event::Resync(MalformedHeader::InvalidCount {
            kind: FrameKind::Data,
            count: 0,
        }));

        let snap = stats.snapshot();
        assert_eq!(snap.data_frames, 2);
        assert_eq!(snap.text_lines, 1);
        assert_eq!(snap.resyncs, 1);
        assert_eq!(snap.label_frames, 0);
    }

    #[test]
    fn test_rates_cached_within_interval() {
        let stats = Stats::new();
        stats.add_rx(1024);
        let first = stats.update_rates();
        let second = stats.update_rates();
        assert_eq!(first, second);
    }
}
