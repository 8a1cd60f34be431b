//! Axis-aligned rectangles in frame pixel space.
//!
//! Both button regions and detection boxes use `Rect`. Coordinates are corner pairs
//! `(x1, y1)`-`(x2, y2)` and every edge is part of the rectangle.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Rect {
    /// Build a rectangle from two corners, normalizing the corner order.
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    /// Inclusive on all four edges.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.x1 <= x && x <= self.x2 && self.y1 <= y && y <= self.y2
    }

    pub fn width(&self) -> u32 {
        self.x2.abs_diff(self.x1)
    }

    pub fn height(&self) -> u32 {
        self.y2.abs_diff(self.y1)
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Intersection over union. Degenerate rectangles yield 0.
    pub fn iou(&self, other: &Rect) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);
        if ix2 <= ix1 || iy2 <= iy1 {
            return 0.0;
        }
        let inter = ix2.abs_diff(ix1) as u64 * iy2.abs_diff(iy1) as u64;
        let union = self.area() as u128 + other.area() as u128 - inter as u128;
        if union == 0 {
            0.0
        } else {
            (inter as f64 / union as f64) as f32
        }
    }

    /// Clamp to a `width` x `height` canvas. Returns `None` when nothing remains visible.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Rect> {
        if width == 0 || height == 0 {
            return None;
        }
        let max_x = width as i32 - 1;
        let max_y = height as i32 - 1;
        if self.x2 < 0 || self.y2 < 0 || self.x1 > max_x || self.y1 > max_y {
            return None;
        }
        Some(Rect {
            x1: self.x1.clamp(0, max_x),
            y1: self.y1.clamp(0, max_y),
            x2: self.x2.clamp(0, max_x),
            y2: self.y2.clamp(0, max_y),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_inclusive_on_every_edge() {
        let r = Rect::new(20, 20, 140, 60);
        assert!(r.contains(20, 20));
        assert!(r.contains(140, 60));
        assert!(r.contains(20, 60));
        assert!(r.contains(140, 20));
        assert!(!r.contains(19, 40));
        assert!(!r.contains(141, 40));
        assert!(!r.contains(80, 61));
    }

    #[test]
    fn new_normalizes_corner_order() {
        let r = Rect::new(140, 60, 20, 20);
        assert_eq!(r, Rect { x1: 20, y1: 20, x2: 140, y2: 60 });
    }

    #[test]
    fn iou_of_identical_and_disjoint_rects() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(20, 20, 30, 30);
        assert!((a.iou(&a) - 1.0).abs() < f32::EPSILON);
        assert_eq!(a.iou(&b), 0.0);

        let half = Rect::new(5, 0, 15, 10);
        let iou = a.iou(&half);
        assert!((iou - 50.0 / 150.0).abs() < 1e-6);
    }

    #[test]
    fn clamp_drops_offscreen_rects() {
        let r = Rect::new(-10, -10, 5, 5);
        assert_eq!(r.clamp_to(100, 100), Some(Rect::new(0, 0, 5, 5)));
        assert_eq!(Rect::new(200, 0, 300, 10).clamp_to(100, 100), None);
        assert_eq!(r.clamp_to(0, 100), None);
    }

    #[test]
    fn extents_span_the_full_i32_range() {
        let wide = Rect::new(-2_000_000_000, 0, 2_000_000_000, 10);
        assert_eq!(wide.width(), 4_000_000_000);
        let full = Rect::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX);
        assert_eq!(full.height(), u32::MAX);
        assert!((full.iou(&full) - 1.0).abs() < 1e-6);
        assert_eq!(wide.clamp_to(64, 48), Some(Rect::new(0, 0, 63, 10)));
    }
}
