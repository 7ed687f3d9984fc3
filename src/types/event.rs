//! Draw events and lifecycle notifications emitted by replay

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::BrushInfo;

/// Pixel position on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// First point of a stroke
#[derive(Debug, Clone, PartialEq)]
pub struct DrawPointEvent {
    pub point: Point,
    pub pressure: f64,
    pub brush_info: Arc<BrushInfo>,
    pub layer: Arc<str>,
    pub client_id: Arc<str>,
}

/// One segment of a stroke, chained from the previous event's end
#[derive(Debug, Clone, PartialEq)]
pub struct DrawLineEvent {
    pub start: Point,
    pub end: Point,
    pub pressure: f64,
    pub brush_info: Arc<BrushInfo>,
    pub layer: Arc<str>,
    pub client_id: Arc<str>,
}

/// A drawing instruction for the canvas consumer
#[derive(Debug, Clone, PartialEq)]
pub enum DrawEvent {
    Point(DrawPointEvent),
    Line(DrawLineEvent),
}

impl DrawEvent {
    pub fn layer(&self) -> &str {
        match self {
            DrawEvent::Point(e) => &e.layer,
            DrawEvent::Line(e) => &e.layer,
        }
    }

    pub fn client_id(&self) -> &str {
        match self {
            DrawEvent::Point(e) => &e.client_id,
            DrawEvent::Line(e) => &e.client_id,
        }
    }

    pub fn brush_info(&self) -> &BrushInfo {
        match self {
            DrawEvent::Point(e) => &e.brush_info,
            DrawEvent::Line(e) => &e.brush_info,
        }
    }

    pub fn pressure(&self) -> f64 {
        match self {
            DrawEvent::Point(e) => e.pressure,
            DrawEvent::Line(e) => e.pressure,
        }
    }
}

/// Category of a dropped packet or document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    Decompression,
    MalformedDocument,
    FrameTooLarge,
    TruncatedFrame,
}

/// Report of a recoverable decode error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

/// Everything a replay session tells its consumer, in emission order
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayEvent {
    Draw(DrawEvent),

    /// A document was dequeued and turned into draw events.
    /// `sequence` counts these notifications from zero.
    BlockParsed { sequence: u64 },

    /// A packet or document was dropped
    Diagnostic(Diagnostic),

    /// The archive is exhausted and every buffered document was drained.
    /// Emitted at most once per session.
    ArchiveParsed,
}

impl ReplayEvent {
    pub fn is_archive_parsed(&self) -> bool {
        matches!(self, ReplayEvent::ArchiveParsed)
    }
}

impl From<DrawEvent> for ReplayEvent {
    fn from(event: DrawEvent) -> Self {
        ReplayEvent::Draw(event)
    }
}
