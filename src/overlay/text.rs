use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgb, RgbImage};

const GLYPH_SIZE: u32 = 8;

pub fn text_width(text: &str, scale: u32) -> u32 {
    text.chars().count() as u32 * GLYPH_SIZE * scale.max(1)
}

pub fn text_height(scale: u32) -> u32 {
    GLYPH_SIZE * scale.max(1)
}

/// Draw `text` with its top-left corner at `(x, y)` using the 8x8 bitmap font.
///
/// Pixels falling outside the image are skipped. Unknown characters render as `?`.
pub fn draw_text(img: &mut RgbImage, x: i32, y: i32, text: &str, scale: u32, color: Rgb<u8>) {
    let scale = scale.max(1) as i32;
    let (w, h) = (img.width() as i32, img.height() as i32);
    let advance = GLYPH_SIZE as i32 * scale;
    let mut cursor_x = x;
    for ch in text.chars() {
        if cursor_x >= w {
            break;
        }
        let Some(glyph) = BASIC_FONTS.get(ch).or_else(|| BASIC_FONTS.get('?')) else {
            cursor_x = cursor_x.saturating_add(advance);
            continue;
        };
        for (row_idx, row) in glyph.iter().enumerate() {
            for col_idx in 0..GLYPH_SIZE as i32 {
                if (*row >> col_idx) & 1 == 0 {
                    continue;
                }
                let px = cursor_x.saturating_add(col_idx * scale);
                let py = y.saturating_add(row_idx as i32 * scale);
                for sy in 0..scale {
                    for sx in 0..scale {
                        let tx = px.saturating_add(sx);
                        let ty = py.saturating_add(sy);
                        if tx >= 0 && ty >= 0 && tx < w && ty < h {
                            img.put_pixel(tx as u32, ty as u32, color);
                        }
                    }
                }
            }
        }
        cursor_x = cursor_x.saturating_add(advance);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_metrics_scale() {
        assert_eq!(text_width("dog", 2), 48);
        assert_eq!(text_height(3), 24);
        assert_eq!(text_height(0), 8);
    }

    #[test]
    fn draws_inside_and_clips_outside() {
        let mut img = RgbImage::new(16, 16);
        let white = Rgb([255, 255, 255]);
        draw_text(&mut img, 0, 0, "A", 1, white);
        assert!(img.pixels().any(|p| *p == white));

        let mut clipped = RgbImage::new(16, 16);
        draw_text(&mut clipped, -100, -100, "A", 2, white);
        draw_text(&mut clipped, 100, 100, "A", 2, white);
        draw_text(&mut clipped, i32::MIN, i32::MIN, "edge", 2, white);
        draw_text(&mut clipped, i32::MAX - 3, 0, "edge", 2, white);
        assert!(clipped.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }
}
