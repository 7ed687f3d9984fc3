//! Round-stamp rasterization on RGBA surfaces

use image::{Rgba, RgbaImage};

use crate::types::Point;

/// How a stamp combines with the surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StampMode {
    /// Source-over with the given color
    Paint(Rgba<u8>),
    /// Reduce alpha towards transparent
    Clear,
}

/// Stamp a filled disc centered on `center`
pub fn stamp_disc(surface: &mut RgbaImage, center: (f64, f64), radius: f64, mode: StampMode) {
    let radius = radius.max(0.5);
    let (width, height) = surface.dimensions();
    if width == 0 || height == 0 {
        return;
    }

    let min_x = (center.0 - radius).floor().max(0.0) as u32;
    let min_y = (center.1 - radius).floor().max(0.0) as u32;
    let max_x = (center.0 + radius).ceil().min(width as f64 - 1.0);
    let max_y = (center.1 + radius).ceil().min(height as f64 - 1.0);
    if max_x < 0.0 || max_y < 0.0 {
        return;
    }
    let (max_x, max_y) = (max_x as u32, max_y as u32);

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dx = x as f64 - center.0;
            let dy = y as f64 - center.1;
            // one pixel of antialiasing at the rim
            let coverage = (radius + 0.5 - (dx * dx + dy * dy).sqrt()).clamp(0.0, 1.0);
            if coverage <= 0.0 {
                continue;
            }
            let pixel = surface.get_pixel_mut(x, y);
            match mode {
                StampMode::Paint(color) => blend_over(pixel, color, coverage),
                StampMode::Clear => {
                    let keep = 1.0 - coverage;
                    pixel.0[3] = (pixel.0[3] as f64 * keep).round() as u8;
                }
            }
        }
    }
}

/// Stamp discs along the segment from `start` to `end`.
///
/// Only the part of the segment within reach of the surface is stamped.
pub fn stamp_line(surface: &mut RgbaImage, start: Point, end: Point, radius: f64, mode: StampMode) {
    let (width, height) = surface.dimensions();
    if width == 0 || height == 0 {
        return;
    }

    let reach = radius.max(0.5) + 1.0;
    let bounds = ((-reach, -reach), (width as f64 - 1.0 + reach, height as f64 - 1.0 + reach));
    let segment = ((start.x as f64, start.y as f64), (end.x as f64, end.y as f64));
    let Some(((sx, sy), (ex, ey))) = clip_segment(segment, bounds) else {
        return;
    };

    let length = ((ex - sx).powi(2) + (ey - sy).powi(2)).sqrt();
    let spacing = (radius * 0.5).max(0.5);
    let steps = (length / spacing).ceil().max(1.0) as usize;

    for step in 0..=steps {
        let t = step as f64 / steps as f64;
        stamp_disc(surface, (sx + (ex - sx) * t, sy + (ey - sy) * t), radius, mode);
    }
}

type Segment = ((f64, f64), (f64, f64));

/// Liang-Barsky clip of `segment` to the rectangle `(min, max)`
fn clip_segment(segment: Segment, (min, max): Segment) -> Option<Segment> {
    let ((x0, y0), (x1, y1)) = segment;
    let (dx, dy) = (x1 - x0, y1 - y0);
    let (mut t0, mut t1) = (0.0f64, 1.0f64);

    for (p, q) in [(-dx, x0 - min.0), (dx, max.0 - x0), (-dy, y0 - min.1), (dy, max.1 - y0)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    Some(((x0 + dx * t0, y0 + dy * t0), (x0 + dx * t1, y0 + dy * t1)))
}

/// Source-over blend of `color` at `coverage` onto `dst`
pub fn blend_over(dst: &mut Rgba<u8>, color: Rgba<u8>, coverage: f64) {
    let sa = color.0[3] as f64 / 255.0 * coverage;
    if sa <= 0.0 {
        return;
    }
    let da = dst.0[3] as f64 / 255.0;
    let out_a = sa + da * (1.0 - sa);

    for channel in 0..3 {
        let sc = color.0[channel] as f64;
        let dc = dst.0[channel] as f64;
        dst.0[channel] = ((sc * sa + dc * da * (1.0 - sa)) / out_a).round().clamp(0.0, 255.0) as u8;
    }
    dst.0[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    #[test]
    fn disc_paints_center_and_not_far_pixels() {
        let mut img = RgbaImage::new(10, 10);
        stamp_disc(&mut img, (5.0, 5.0), 2.0, StampMode::Paint(RED));
        assert_eq!(*img.get_pixel(5, 5), RED);
        assert_eq!(img.get_pixel(0, 0).0[3], 0);
    }

    #[test]
    fn stamps_near_edges_are_clipped() {
        let mut img = RgbaImage::new(4, 4);
        stamp_disc(&mut img, (-1.0, -1.0), 2.0, StampMode::Paint(RED));
        stamp_disc(&mut img, (100.0, 100.0), 2.0, StampMode::Paint(RED));
        assert_eq!(*img.get_pixel(0, 0), RED);
    }

    #[test]
    fn line_covers_both_endpoints() {
        let mut img = RgbaImage::new(20, 5);
        stamp_line(&mut img, Point::new(1, 2), Point::new(18, 2), 1.0, StampMode::Paint(RED));
        for x in 1..=18 {
            assert_eq!(img.get_pixel(x, 2).0[3], 255, "pixel {x} not painted");
        }
    }

    #[test]
    fn far_endpoints_only_stamp_the_visible_part() {
        let mut img = RgbaImage::new(8, 8);
        let started = std::time::Instant::now();
        stamp_line(&mut img, Point::new(0, 3), Point::new(i32::MAX, 3), 1.5, StampMode::Paint(RED));
        stamp_line(&mut img, Point::new(i32::MIN, 6), Point::new(i32::MAX, 6), 1.5, StampMode::Paint(RED));
        assert!(started.elapsed() < std::time::Duration::from_secs(1));

        for x in 0..8 {
            assert_eq!(*img.get_pixel(x, 3), RED, "pixel {x} not painted");
            assert_eq!(*img.get_pixel(x, 6), RED, "pixel {x} not painted");
        }
        assert_eq!(img.get_pixel(0, 0).0[3], 0);
    }

    #[test]
    fn segments_missing_the_surface_draw_nothing() {
        let mut img = RgbaImage::new(8, 8);
        stamp_line(&mut img, Point::new(-50, -50), Point::new(i32::MAX, -50), 1.5, StampMode::Paint(RED));
        stamp_line(&mut img, Point::new(100, 0), Point::new(100, i32::MAX), 1.5, StampMode::Paint(RED));
        assert!(img.pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn clip_keeps_segments_inside_the_bounds() {
        let bounds = ((0.0, 0.0), (10.0, 10.0));
        assert_eq!(clip_segment(((2.0, 2.0), (5.0, 5.0)), bounds), Some(((2.0, 2.0), (5.0, 5.0))));
        assert_eq!(clip_segment(((-10.0, 5.0), (22.0, 5.0)), bounds), Some(((0.0, 5.0), (10.0, 5.0))));
        assert_eq!(clip_segment(((-10.0, -1.0), (20.0, -1.0)), bounds), None);
    }

    #[test]
    fn clear_erases_alpha() {
        let mut img = RgbaImage::from_pixel(5, 5, RED);
        stamp_disc(&mut img, (2.0, 2.0), 1.0, StampMode::Clear);
        assert_eq!(img.get_pixel(2, 2).0[3], 0);
        assert_eq!(img.get_pixel(0, 4).0[3], 255);
    }

    #[test]
    fn half_transparent_over_opaque_stays_opaque() {
        let mut dst = Rgba([0, 0, 255, 255]);
        blend_over(&mut dst, Rgba([255, 0, 0, 128]), 1.0);
        assert_eq!(dst.0[3], 255);
        assert!(dst.0[0] > 100 && dst.0[2] > 100);
    }
}
