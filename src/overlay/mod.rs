//! Frame compositing: detection boxes with captions, the status line, and the button bar.

mod text;

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect as PixelRect;

use crate::controls::{Button, ButtonRegistry};
use crate::detect::Detection;
use crate::geometry::Rect;

pub use text::{draw_text, text_height, text_width};

pub const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const STATUS_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const ACTIVE_BUTTON_COLOR: Rgb<u8> = Rgb([0, 200, 0]);
pub const QUIT_BUTTON_COLOR: Rgb<u8> = Rgb([200, 0, 0]);
pub const BUTTON_COLOR: Rgb<u8> = Rgb([200, 200, 200]);
pub const BORDER_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
pub const BUTTON_TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

const BOX_THICKNESS: i32 = 2;
/// Gap between a box's top edge and the bottom of its caption.
const CAPTION_OFFSET: i32 = 10;
const CAPTION_SCALE: u32 = 2;
const STATUS_X: i32 = 20;
const STATUS_Y: i32 = 70;
const STATUS_SCALE: u32 = 2;
const BUTTON_TEXT_SCALE: u32 = 2;
/// Gap between a button's bottom edge and the bottom of its label.
const BUTTON_TEXT_BOTTOM: i32 = 8;

/// Draw every matching detection. Returns how many boxes were visible on the frame.
pub fn draw_detections(img: &mut RgbImage, matches: &[&Detection]) -> usize {
    let mut drawn = 0;
    for detection in matches {
        if !stroke_rect(img, detection.bbox, BOX_THICKNESS, BOX_COLOR) {
            continue;
        }
        drawn += 1;
        let caption_top = detection
            .bbox
            .y1
            .saturating_sub(CAPTION_OFFSET + text_height(CAPTION_SCALE) as i32);
        draw_text(
            img,
            detection.bbox.x1,
            caption_top,
            &detection.caption(),
            CAPTION_SCALE,
            BOX_COLOR,
        );
    }
    drawn
}

pub fn status_caption(target: &str, count: usize) -> String {
    format!("Class: {} | Count: {}", target, count)
}

pub fn draw_status(img: &mut RgbImage, target: &str, count: usize) {
    draw_text(
        img,
        STATUS_X,
        STATUS_Y,
        &status_caption(target, count),
        STATUS_SCALE,
        STATUS_COLOR,
    );
}

/// Fill color for a button given the active target.
pub fn button_fill(button: &Button, target: &str) -> Rgb<u8> {
    if button.label == target {
        ACTIVE_BUTTON_COLOR
    } else if button.is_quit() {
        QUIT_BUTTON_COLOR
    } else {
        BUTTON_COLOR
    }
}

pub fn draw_buttons(img: &mut RgbImage, registry: &ButtonRegistry, target: &str) {
    for button in registry.iter() {
        let region = button.region;
        if let Some(rect) = to_pixel_rect(region, img.width(), img.height()) {
            draw_filled_rect_mut(img, rect, button_fill(button, target));
        }
        stroke_rect(img, region, BOX_THICKNESS, BORDER_COLOR);

        let label_w = text_width(&button.label, BUTTON_TEXT_SCALE) as i32;
        let inset = ((region.width() as i32 - label_w) / 2).max(4);
        let label_top = region.y2 - BUTTON_TEXT_BOTTOM - text_height(BUTTON_TEXT_SCALE) as i32;
        draw_text(
            img,
            region.x1 + inset,
            label_top,
            &button.label,
            BUTTON_TEXT_SCALE,
            BUTTON_TEXT_COLOR,
        );
    }
}

/// Full per-frame composite. Returns the number of detection boxes drawn.
pub fn compose(
    img: &mut RgbImage,
    matches: &[&Detection],
    target: &str,
    registry: &ButtonRegistry,
) -> usize {
    let drawn = draw_detections(img, matches);
    draw_status(img, target, matches.len());
    draw_buttons(img, registry, target);
    drawn
}

/// Outline `rect` with `thickness` nested strokes. Returns false when fully off-canvas.
///
/// Edges beyond the canvas are pulled in to just outside it, so they stay invisible and
/// line lengths stay bounded by the frame size.
fn stroke_rect(img: &mut RgbImage, rect: Rect, thickness: i32, color: Rgb<u8>) -> bool {
    if rect.clamp_to(img.width(), img.height()).is_none() {
        return false;
    }
    let max_x = img.width() as i32 - 1 + thickness;
    let max_y = img.height() as i32 - 1 + thickness;
    let rect = Rect::new(
        rect.x1.max(-thickness),
        rect.y1.max(-thickness),
        rect.x2.min(max_x),
        rect.y2.min(max_y),
    );
    for t in 0..thickness {
        let inner = Rect::new(rect.x1 + t, rect.y1 + t, rect.x2 - t, rect.y2 - t);
        if inner.x1 > inner.x2 || inner.y1 > inner.y2 {
            break;
        }
        draw_hollow_rect_mut(
            img,
            PixelRect::at(inner.x1, inner.y1).of_size(inner.width() + 1, inner.height() + 1),
            color,
        );
    }
    true
}

fn to_pixel_rect(rect: Rect, width: u32, height: u32) -> Option<PixelRect> {
    let clamped = rect.clamp_to(width, height)?;
    Some(PixelRect::at(clamped.x1, clamped.y1).of_size(clamped.width() + 1, clamped.height() + 1))
}
