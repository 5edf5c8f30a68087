//! Per-channel sample history and display settings
//!
//! `ChannelStore` keeps a fixed-capacity ring of raw samples for each of the
//! 32 channels. Scale and offset are applied when reading, so changing them
//! affects the whole retained history. The time window only limits what is
//! read; retention is bounded by buffer capacity alone.

mod channel;
mod ring;

pub use channel::{ChannelConfig, ChannelConfigUpdate, ChannelRecord, Color, Sample, DEFAULT_COLORS};
pub use ring::RingBuffer;

use crate::codec::{DataFrame, LabelFrame};
use crate::constants::MAX_CHANNELS;
use crate::error::{PlotError, Result};
use tracing::{debug, warn};

pub struct ChannelStore {
    channels: Vec<ChannelRecord>,
    /// Highest channel index that received data, plus one
    active: usize,
}

impl Default for ChannelStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelStore {
    pub fn new() -> Self {
        Self {
            channels: (0..MAX_CHANNELS).map(ChannelRecord::new).collect(),
            active: 0,
        }
    }

    // =========================================================================
    // Writes (decoder side)
    // =========================================================================

    /// Push the i-th frame value onto channel i
    pub fn apply_data_frame(&mut self, frame: &DataFrame, timestamp: f64) {
        for (channel, &raw) in self.channels.iter_mut().zip(frame.values()) {
            channel.samples.push(Sample { timestamp, raw });
        }
        self.active = self.active.max(frame.values().len().min(MAX_CHANNELS));
    }

    /// Apply device-supplied labels; returns the number of channels updated
    pub fn apply_label_frame(&mut self, frame: &LabelFrame) -> usize {
        let mut applied = 0;
        for entry in frame.entries() {
            match self.channels.get_mut(entry.channel as usize) {
                Some(channel) => {
                    debug!("Channel {} labelled '{}'", entry.channel, entry.name);
                    channel.config.label = entry.name.clone();
                    applied += 1;
                }
                None => warn!("Ignoring label for channel {}", entry.channel),
            }
        }
        applied
    }

    /// Drop all samples; settings are kept
    pub fn clear(&mut self) {
        for channel in &mut self.channels {
            channel.samples.clear();
        }
        self.active = 0;
    }

    // =========================================================================
    // Settings (presentation side)
    // =========================================================================

    pub fn set_channel_config(&mut self, index: usize, update: ChannelConfigUpdate) -> Result<()> {
        let channel = self
            .channels
            .get_mut(index)
            .ok_or(PlotError::ChannelOutOfRange { index })?;
        update.apply_to(&mut channel.config);
        Ok(())
    }

    /// Settings of every channel, in index order
    pub fn configs(&self) -> Vec<ChannelConfig> {
        self.channels.iter().map(|c| c.config.clone()).collect()
    }

    /// Restore persisted settings; extra entries are ignored
    pub fn apply_configs(&mut self, configs: &[ChannelConfig]) {
        if configs.len() > MAX_CHANNELS {
            warn!(
                "Config has {} channels, keeping the first {}",
                configs.len(),
                MAX_CHANNELS
            );
        }
        for (channel, config) in self.channels.iter_mut().zip(configs) {
            channel.config = config.clone();
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn channel(&self, index: usize) -> Option<&ChannelRecord> {
        self.channels.get(index)
    }

    /// Number of channels that have carried data (highest index + 1)
    pub fn channel_count(&self) -> usize {
        self.active
    }

    /// Display label: the received/user label, or `Ch{index}`
    pub fn label(&self, index: usize) -> Option<String> {
        self.channels.get(index).map(|c| {
            if c.config.label.is_empty() {
                format!("Ch{}", index)
            } else {
                c.config.label.clone()
            }
        })
    }

    /// Samples with `timestamp >= now - window`, oldest first, as
    /// `(timestamp, raw * scale + offset)`. Empty for an unknown channel.
    pub fn samples_in_window(
        &self,
        index: usize,
        window: f64,
        now: f64,
    ) -> impl Iterator<Item = (f64, f64)> + '_ {
        let cutoff = now - window;
        self.channels.get(index).into_iter().flat_map(move |channel| {
            let config = &channel.config;
            channel
                .samples
                .iter()
                .filter(move |s| s.timestamp >= cutoff)
                .map(move |s| (s.timestamp, config.convert(s.raw)))
        })
    }

    /// Windowed samples positioned on a `0..=window` axis with the newest
    /// sample at the right edge
    pub fn plot_points(
        &self,
        index: usize,
        window: f64,
        now: f64,
    ) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.samples_in_window(index, window, now)
            .map(move |(t, v)| (window - (now - t), v))
    }
}
