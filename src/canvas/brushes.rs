//! Built-in brushes

use image::{Rgba, RgbaImage};
use serde_json::{Map, Value};

use super::brush::Brush;
use super::raster::{StampMode, stamp_disc, stamp_line};
use crate::types::Point;

/// Stroke width when a brush does not specify one
pub const DEFAULT_WIDTH: f64 = 3.0;

fn read_width(settings: &Map<String, Value>) -> Option<f64> {
    settings.get("width").and_then(Value::as_f64).filter(|w| *w > 0.0)
}

fn read_channel(color: &Map<String, Value>, key: &str) -> u8 {
    color.get(key).and_then(Value::as_f64).map(|c| c.clamp(0.0, 255.0) as u8).unwrap_or(0)
}

fn read_color(settings: &Map<String, Value>) -> Option<[u8; 3]> {
    let color = settings.get("color")?.as_object()?;
    Some([read_channel(color, "red"), read_channel(color, "green"), read_channel(color, "blue")])
}

fn radius_for(width: f64, pressure: f64) -> f64 {
    (width * pressure.clamp(0.0, 1.0)) / 2.0
}

fn center(point: Point) -> (f64, f64) {
    (point.x as f64, point.y as f64)
}

/// Round solid brush; width scales with pressure
#[derive(Debug, Clone, PartialEq)]
pub struct BasicBrush {
    width: f64,
    color: [u8; 3],
    opacity: f64,
}

impl BasicBrush {
    pub const KIND: &'static str = "BasicBrush";

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn color(&self) -> Rgba<u8> {
        let [r, g, b] = self.color;
        Rgba([r, g, b, (self.opacity * 255.0).round() as u8])
    }
}

impl Default for BasicBrush {
    fn default() -> Self {
        Self { width: DEFAULT_WIDTH, color: [0, 0, 0], opacity: 1.0 }
    }
}

impl Brush for BasicBrush {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn configure(&mut self, settings: &Map<String, Value>) {
        if let Some(width) = read_width(settings) {
            self.width = width;
        }
        if let Some(color) = read_color(settings) {
            self.color = color;
        }
        if let Some(opacity) = settings.get("opacity").and_then(Value::as_f64) {
            self.opacity = opacity.clamp(0.0, 1.0);
        }
    }

    fn draw_point(&mut self, surface: &mut RgbaImage, point: Point, pressure: f64) {
        stamp_disc(surface, center(point), radius_for(self.width, pressure), StampMode::Paint(self.color()));
    }

    fn draw_line(&mut self, surface: &mut RgbaImage, start: Point, end: Point, pressure: f64) {
        stamp_line(surface, start, end, radius_for(self.width, pressure), StampMode::Paint(self.color()));
    }
}

/// Clears pixels back to transparent
#[derive(Debug, Clone, PartialEq)]
pub struct BasicEraser {
    width: f64,
}

impl BasicEraser {
    pub const KIND: &'static str = "BasicEraser";

    pub fn width(&self) -> f64 {
        self.width
    }
}

impl Default for BasicEraser {
    fn default() -> Self {
        Self { width: DEFAULT_WIDTH }
    }
}

impl Brush for BasicEraser {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn configure(&mut self, settings: &Map<String, Value>) {
        if let Some(width) = read_width(settings) {
            self.width = width;
        }
    }

    fn draw_point(&mut self, surface: &mut RgbaImage, point: Point, _pressure: f64) {
        stamp_disc(surface, center(point), self.width / 2.0, StampMode::Clear);
    }

    fn draw_line(&mut self, surface: &mut RgbaImage, start: Point, end: Point, _pressure: f64) {
        stamp_line(surface, start, end, self.width / 2.0, StampMode::Clear);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn basic_brush_reads_settings() {
        let mut brush = BasicBrush::default();
        brush.configure(&settings(json!({
            "width": 8,
            "color": {"red": 255, "green": 128, "blue": 0},
            "opacity": 0.5,
            "smoothing": true
        })));

        assert_eq!(brush.width(), 8.0);
        assert_eq!(brush.color(), Rgba([255, 128, 0, 128]));
    }

    #[test]
    fn missing_or_invalid_settings_keep_defaults() {
        let mut brush = BasicBrush::default();
        brush.configure(&settings(json!({"width": -2, "color": "blue"})));
        assert_eq!(brush, BasicBrush::default());
        assert_eq!(brush.color(), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn pressure_scales_the_stamp() {
        let mut brush = BasicBrush::default();
        brush.configure(&settings(json!({"width": 10})));

        let mut light = RgbaImage::new(20, 20);
        brush.draw_point(&mut light, Point::new(10, 10), 0.2);
        let mut heavy = RgbaImage::new(20, 20);
        brush.draw_point(&mut heavy, Point::new(10, 10), 1.0);

        let painted = |img: &RgbaImage| img.pixels().filter(|p| p.0[3] > 0).count();
        assert!(painted(&heavy) > painted(&light));
        assert!(painted(&light) > 0);
    }

    #[test]
    fn eraser_clears_a_line() {
        let mut surface = RgbaImage::from_pixel(10, 5, Rgba([0, 0, 0, 255]));
        let mut eraser = BasicEraser::default();
        eraser.draw_line(&mut surface, Point::new(1, 2), Point::new(8, 2), 1.0);

        for x in 1..=8 {
            assert_eq!(surface.get_pixel(x, 2).0[3], 0);
        }
        assert_eq!(surface.get_pixel(0, 0).0[3], 255);
    }
}
