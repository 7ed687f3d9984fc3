//! Raster canvas that consumes replayed draw events
//!
//! The canvas is one possible consumer of [`DrawEvent`]s. It keeps a
//! stack of named transparent layers, resolves a brush per client and
//! can flatten the result into a PNG.
//!
//! ```rust
//! use paintty::canvas::Canvas;
//! use paintty::types::{BrushInfo, DrawEvent, DrawPointEvent, Point};
//! use std::sync::Arc;
//!
//! let mut canvas = Canvas::new(32, 32);
//! let drawn = canvas
//!     .apply(&DrawEvent::Point(DrawPointEvent {
//!         point: Point::new(4, 4),
//!         pressure: 1.0,
//!         brush_info: Arc::new(BrushInfo::new("basicbrush")),
//!         layer: "0".into(),
//!         client_id: "c1".into(),
//!     }))
//!     .unwrap();
//! assert!(drawn);
//! ```

mod brush;
mod brushes;
mod layers;
mod raster;

pub use brush::{BASIC_FALLBACK_NAMES, Brush, BrushCache, BrushConstructor, BrushRegistry};
pub use brushes::{BasicBrush, BasicEraser, DEFAULT_WIDTH};
pub use layers::{Layer, LayerStack};
pub use raster::{StampMode, blend_over, stamp_disc, stamp_line};

use image::RgbaImage;
use std::path::Path;
use tracing::{debug, warn};

use crate::Result;
use crate::types::DrawEvent;

/// Number of layers a fresh canvas starts with
pub const DEFAULT_LAYER_COUNT: usize = 10;

/// Layered raster surface driven by draw events
pub struct Canvas {
    layers: LayerStack,
    registry: BrushRegistry,
    brushes: BrushCache,
    applied: u64,
}

impl Canvas {
    /// Canvas with layers `"0"` to `"9"` and the built-in brushes
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_registry(width, height, BrushRegistry::with_defaults())
    }

    pub fn with_registry(width: u32, height: u32, registry: BrushRegistry) -> Self {
        let mut layers = LayerStack::new(width, height);
        for index in 0..DEFAULT_LAYER_COUNT {
            layers.append(index.to_string());
        }
        Self { layers, registry, brushes: BrushCache::new(), applied: 0 }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.layers.dimensions()
    }

    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut LayerStack {
        &mut self.layers
    }

    pub fn registry_mut(&mut self) -> &mut BrushRegistry {
        &mut self.registry
    }

    /// Number of events that reached a layer
    pub fn applied(&self) -> u64 {
        self.applied
    }

    /// Draw one event.
    ///
    /// Returns `Ok(false)` when the target layer does not exist. An unknown
    /// brush name is an error and nothing is drawn.
    pub fn apply(&mut self, event: &DrawEvent) -> Result<bool> {
        let Some(layer) = self.layers.get_mut(event.layer()) else {
            debug!(layer = event.layer(), "Discarding event for missing layer");
            return Ok(false);
        };

        if matches!(event, DrawEvent::Line(_)) && !self.brushes.contains(event.client_id()) {
            warn!(client_id = event.client_id(), "Line event without a preceding point");
        }
        let brush = self.brushes.resolve(&self.registry, event.client_id(), event.brush_info())?;

        match event {
            DrawEvent::Point(e) => brush.draw_point(layer.surface_mut(), e.point, e.pressure),
            DrawEvent::Line(e) => brush.draw_line(layer.surface_mut(), e.start, e.end, e.pressure),
        }
        self.applied += 1;
        Ok(true)
    }

    /// Draw events in order, stopping at the first error
    pub fn apply_all<'a>(&mut self, events: impl IntoIterator<Item = &'a DrawEvent>) -> Result<usize> {
        let mut drawn = 0;
        for event in events {
            if self.apply(event)? {
                drawn += 1;
            }
        }
        Ok(drawn)
    }

    /// Composite every layer over white
    pub fn flatten(&self) -> RgbaImage {
        self.layers.flatten()
    }

    /// Flatten and write a PNG
    pub fn save_png(&self, path: impl AsRef<Path>) -> image::ImageResult<()> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Saving canvas");
        self.flatten().save_with_format(path, image::ImageFormat::Png)
    }
}
