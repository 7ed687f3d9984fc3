//! Named layers composited into the final canvas

use image::{Rgba, RgbaImage};
use tracing::debug;

use super::raster::blend_over;

/// One transparent drawing surface
#[derive(Debug, Clone)]
pub struct Layer {
    name: String,
    image: RgbaImage,
    touched: bool,
}

impl Layer {
    fn new(name: String, width: u32, height: u32) -> Self {
        Self { name, image: RgbaImage::new(width, height), touched: false }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Mutable surface; marks the layer as drawn on
    pub fn surface_mut(&mut self) -> &mut RgbaImage {
        self.touched = true;
        &mut self.image
    }

    /// Whether anything has been drawn on this layer
    pub fn is_touched(&self) -> bool {
        self.touched
    }
}

/// Ordered stack of layers, bottom first
#[derive(Debug, Clone)]
pub struct LayerStack {
    width: u32,
    height: u32,
    layers: Vec<Layer>,
}

impl LayerStack {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, layers: Vec::new() }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Add a layer on top. Returns false if the name is taken.
    pub fn append(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.exists(&name) {
            return false;
        }
        debug!(layer = %name, "Layer added");
        self.layers.push(Layer::new(name, self.width, self.height));
        true
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.layers.len();
        self.layers.retain(|layer| layer.name != name);
        before != self.layers.len()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.layers.iter().any(|layer| layer.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|layer| layer.name == name)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    /// Composite all layers in order over an opaque white background
    pub fn flatten(&self) -> RgbaImage {
        let mut out = RgbaImage::from_pixel(self.width, self.height, Rgba([255, 255, 255, 255]));
        for layer in &self.layers {
            for (dst, src) in out.pixels_mut().zip(layer.image.pixels()) {
                if src.0[3] != 0 {
                    blend_over(dst, *src, 1.0);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_names_are_unique() {
        let mut stack = LayerStack::new(2, 2);
        assert!(stack.append("0"));
        assert!(!stack.append("0"));
        assert!(stack.append("1"));
        assert_eq!(stack.len(), 2);
        assert!(stack.remove("0"));
        assert!(!stack.exists("0"));
        assert!(!stack.remove("0"));
    }

    #[test]
    fn flatten_stacks_upper_layers_on_top() {
        let mut stack = LayerStack::new(1, 1);
        stack.append("bottom");
        stack.append("top");

        stack.get_mut("bottom").unwrap().surface_mut().put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        stack.get_mut("top").unwrap().surface_mut().put_pixel(0, 0, Rgba([0, 0, 255, 255]));

        assert_eq!(*stack.flatten().get_pixel(0, 0), Rgba([0, 0, 255, 255]));
        assert!(stack.get("top").unwrap().is_touched());
    }

    #[test]
    fn empty_stack_flattens_to_white() {
        let stack = LayerStack::new(3, 2);
        let flat = stack.flatten();
        assert_eq!(flat.dimensions(), (3, 2));
        assert!(flat.pixels().all(|p| *p == Rgba([255, 255, 255, 255])));
    }
}
