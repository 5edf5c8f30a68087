//! Command buttons
//!
//! A button sends a fixed payload to the device. Buttons come from two
//! places: the user's config and the command table discovered via `help`.

use crate::discovery::{Category, CommandSpec};
use crate::error::{PlotError, Result};
use serde::{Deserialize, Serialize};

/// How `CommandButton::data` is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadMode {
    /// Sent as-is (UTF-8)
    #[default]
    Ascii,
    /// Hex byte pairs, e.g. `0x01 0x02` or `01,02`
    Hex,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandButton {
    pub label: String,
    pub data: String,
    #[serde(default)]
    pub mode: PayloadMode,
    /// Set for discovered commands
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

impl CommandButton {
    pub fn ascii(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
            mode: PayloadMode::Ascii,
            category: None,
        }
    }

    pub fn hex(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
            mode: PayloadMode::Hex,
            category: None,
        }
    }

    /// Bytes to write to the device
    pub fn payload(&self) -> Result<Vec<u8>> {
        match self.mode {
            PayloadMode::Ascii => Ok(self.data.as_bytes().to_vec()),
            PayloadMode::Hex => parse_hex(&self.data),
        }
    }
}

impl From<&CommandSpec> for CommandButton {
    fn from(spec: &CommandSpec) -> Self {
        Self {
            label: spec.name.clone(),
            data: format!("{}\r\n", spec.command),
            mode: PayloadMode::Ascii,
            category: Some(spec.category),
        }
    }
}

/// Parse `0x`-prefixed, space or comma separated hex pairs
fn parse_hex(data: &str) -> Result<Vec<u8>> {
    let digits: String = data
        .replace("0x", "")
        .replace("0X", "")
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();

    let invalid = || PlotError::InvalidHex {
        data: data.to_string(),
    };

    if digits.is_empty() || digits.len() % 2 != 0 {
        return Err(invalid());
    }

    digits
        .as_bytes()
        .chunks(2)
        .map(|pair| {
            std::str::from_utf8(pair)
                .ok()
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .ok_or_else(invalid)
        })
        .collect()
}

/// Buttons with a category, grouped in display order; empty groups omitted
pub fn group_by_category(buttons: &[CommandButton]) -> Vec<(Category, Vec<&CommandButton>)> {
    Category::ORDER
        .iter()
        .filter_map(|&category| {
            let group: Vec<_> = buttons
                .iter()
                .filter(|b| b.category == Some(category))
                .collect();
            (!group.is_empty()).then_some((category, group))
        })
        .collect()
}
