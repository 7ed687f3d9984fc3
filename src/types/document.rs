//! Structured documents carried by DATA packs
//!
//! A document is a JSON object. Only `action` is required; every other
//! field falls back to an empty value so that documents from older
//! producers still replay.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Default pressure when a point omits it
pub const DEFAULT_PRESSURE: f64 = 1.0;

/// Action name of stroke documents
pub const BLOCK_ACTION: &str = "block";

/// A structured document decoded from a DATA pack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub action: String,

    #[serde(default)]
    pub clientid: String,

    #[serde(default)]
    pub layer: String,

    #[serde(default)]
    pub brush: BrushInfo,

    #[serde(default)]
    pub block: Vec<BlockPoint>,
}

impl Document {
    /// Parse a document from DATA payload bytes
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Whether this document describes a stroke (case-insensitive)
    pub fn is_block(&self) -> bool {
        self.action.eq_ignore_ascii_case(BLOCK_ACTION)
    }
}

/// Brush description attached to a stroke
///
/// `name` selects the brush strategy. Everything else is passed to the
/// brush as settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrushInfo {
    #[serde(default)]
    pub name: String,

    #[serde(flatten)]
    pub settings: Map<String, Value>,
}

impl BrushInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), settings: Map::new() }
    }

    /// Add a setting, builder style
    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }
}

/// One point of a stroke
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockPoint {
    #[serde(default, deserialize_with = "coordinate")]
    pub x: i32,

    #[serde(default, deserialize_with = "coordinate")]
    pub y: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
}

impl BlockPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y, pressure: None }
    }

    pub fn with_pressure(x: i32, y: i32, pressure: f64) -> Self {
        Self { x, y, pressure: Some(pressure) }
    }

    pub fn pressure_or_default(&self) -> f64 {
        self.pressure.unwrap_or(DEFAULT_PRESSURE)
    }
}

/// Coordinates may be recorded as floats; they are rounded to the pixel grid.
fn coordinate<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() {
        return Err(serde::de::Error::custom("coordinate is not a finite number"));
    }
    Ok(value.round().clamp(i32::MIN as f64, i32::MAX as f64) as i32)
}
