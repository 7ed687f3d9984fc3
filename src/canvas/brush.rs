//! Brush capability, registry and per-client cache

use image::RgbaImage;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::debug;

use super::brushes::{BasicBrush, BasicEraser};
use crate::types::{BrushInfo, Point};
use crate::{ReplayError, Result};

/// Drawing strategy selected by brush name
pub trait Brush: Send {
    /// Name of the implementation drawing the stroke
    fn kind(&self) -> &'static str;

    /// Apply recorded settings. Unknown keys are ignored.
    fn configure(&mut self, settings: &Map<String, Value>);

    fn draw_point(&mut self, surface: &mut RgbaImage, point: Point, pressure: f64);

    fn draw_line(&mut self, surface: &mut RgbaImage, start: Point, end: Point, pressure: f64);
}

/// Builds a fresh brush instance
pub type BrushConstructor = fn() -> Box<dyn Brush>;

/// Brush names found in recordings that have no dedicated implementation.
/// They are drawn with [`BasicBrush`].
pub const BASIC_FALLBACK_NAMES: [&str; 3] = ["BinaryBrush", "SketchBrush", "MaskBased"];

/// Mapping from brush name to constructor
#[derive(Clone, Default)]
pub struct BrushRegistry {
    constructors: HashMap<String, BrushConstructor>,
}

impl BrushRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in brushes and the basic-brush fallbacks
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(BasicBrush::KIND, || Box::new(BasicBrush::default()));
        registry.register(BasicEraser::KIND, || Box::new(BasicEraser::default()));
        for name in BASIC_FALLBACK_NAMES {
            registry.register(name, || Box::new(BasicBrush::default()));
        }
        registry
    }

    /// Register a constructor; names are case-insensitive
    pub fn register(&mut self, name: &str, constructor: BrushConstructor) {
        self.constructors.insert(name.to_ascii_lowercase(), constructor);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(&name.to_ascii_lowercase())
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn Brush>> {
        self.constructors
            .get(&name.to_ascii_lowercase())
            .map(|constructor| constructor())
            .ok_or_else(|| ReplayError::UnknownBrush { name: name.to_string() })
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

struct CachedBrush {
    /// Name the brush was created for
    name: String,
    brush: Box<dyn Brush>,
}

/// The brush each client is currently drawing with
#[derive(Default)]
pub struct BrushCache {
    brushes: HashMap<String, CachedBrush>,
}

impl BrushCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, client_id: &str) -> bool {
        self.brushes.contains_key(client_id)
    }

    pub fn len(&self) -> usize {
        self.brushes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.brushes.is_empty()
    }

    /// Brush for `client_id`, configured with `info.settings`.
    ///
    /// The cached brush is reused when it was created for the same name
    /// (case-insensitive), otherwise a new one is built and replaces it.
    pub fn resolve(
        &mut self,
        registry: &BrushRegistry,
        client_id: &str,
        info: &BrushInfo,
    ) -> Result<&mut dyn Brush> {
        let fresh = |info: &BrushInfo| -> Result<CachedBrush> {
            Ok(CachedBrush { name: info.name.clone(), brush: registry.create(&info.name)? })
        };
        let cached = match self.brushes.entry(client_id.to_string()) {
            Entry::Occupied(mut entry) => {
                if !entry.get().name.eq_ignore_ascii_case(&info.name) {
                    debug!(client_id, from = %entry.get().name, to = %info.name, "Brush changed");
                    entry.insert(fresh(info)?);
                }
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(fresh(info)?),
        };
        cached.brush.configure(&info.settings);
        Ok(cached.brush.as_mut())
    }
}
