//! Per-channel display settings and sample storage

use super::ring::RingBuffer;
use crate::constants::SAMPLE_CAPACITY;
use serde::{Deserialize, Serialize};

/// RGB color
pub type Color = [u8; 3];

/// Colors assigned to channels in index order
pub const DEFAULT_COLORS: [Color; 12] = [
    [255, 87, 51],  // red-orange
    [51, 255, 87],  // green
    [51, 87, 255],  // blue
    [255, 255, 51], // yellow
    [255, 51, 255], // magenta
    [51, 255, 255], // cyan
    [255, 153, 51], // orange
    [153, 51, 255], // purple
    [51, 255, 153], // mint
    [255, 51, 153], // pink
    [153, 255, 51], // lime
    [51, 153, 255], // sky blue
];

/// User-facing channel settings (persisted)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Empty until the device or user names the channel
    #[serde(alias = "name")]
    pub label: String,
    pub color: Color,
    pub visible: bool,
    pub scale: f64,
    pub offset: f64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            label: String::new(),
            color: [255, 255, 255],
            visible: true,
            scale: 1.0,
            offset: 0.0,
        }
    }
}

impl ChannelConfig {
    /// Defaults for a given channel index (palette color)
    pub fn for_index(index: usize) -> Self {
        Self {
            color: DEFAULT_COLORS[index % DEFAULT_COLORS.len()],
            ..Self::default()
        }
    }

    /// Raw sample to display value
    #[inline]
    pub fn convert(&self, raw: i16) -> f64 {
        raw as f64 * self.scale + self.offset
    }
}

/// Partial update of a channel's settings; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct ChannelConfigUpdate {
    pub label: Option<String>,
    pub color: Option<Color>,
    pub visible: Option<bool>,
    pub scale: Option<f64>,
    pub offset: Option<f64>,
}

impl ChannelConfigUpdate {
    pub(crate) fn apply_to(self, config: &mut ChannelConfig) {
        if let Some(label) = self.label {
            config.label = label;
        }
        if let Some(color) = self.color {
            config.color = color;
        }
        if let Some(visible) = self.visible {
            config.visible = visible;
        }
        if let Some(scale) = self.scale {
            config.scale = scale;
        }
        if let Some(offset) = self.offset {
            config.offset = offset;
        }
    }
}

/// Stored sample: seconds since session start and raw value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: f64,
    pub raw: i16,
}

/// One channel: settings plus sample history
pub struct ChannelRecord {
    pub(crate) config: ChannelConfig,
    pub(crate) samples: RingBuffer<Sample>,
}

impl ChannelRecord {
    pub(crate) fn new(index: usize) -> Self {
        Self {
            config: ChannelConfig::for_index(index),
            samples: RingBuffer::new(SAMPLE_CAPACITY),
        }
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Latest sample converted with the current scale/offset
    pub fn latest(&self) -> Option<(f64, f64)> {
        self.samples
            .last()
            .map(|s| (s.timestamp, self.config.convert(s.raw)))
    }
}
