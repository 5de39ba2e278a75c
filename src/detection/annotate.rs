use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::models::DetectedRegion;

/// Glyph cell size of the built-in label font
pub const GLYPH_WIDTH: u32 = 5;
pub const GLYPH_HEIGHT: u32 = 7;
/// Horizontal advance per character, including one column of spacing
const GLYPH_ADVANCE: u32 = GLYPH_WIDTH + 1;

/// Colors and geometry of the overlay
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotationStyle {
    pub outline_color: Rgb<u8>,
    pub label_color: Rgb<u8>,
    /// Outline thickness in pixels, drawn inward from the box edge
    pub thickness: u32,
    /// Gap between the label's bottom and the box's top edge
    pub label_gap: u32,
    /// Integer scale of the label font
    pub label_scale: u32,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            outline_color: Rgb([0, 255, 0]),
            label_color: Rgb([0, 0, 255]),
            thickness: 2,
            label_gap: 3,
            label_scale: 1,
        }
    }
}

/// Copy `base` and draw one outline and one size label per region
pub fn annotate(base: &RgbImage, regions: &[DetectedRegion], style: &AnnotationStyle) -> RgbImage {
    let mut canvas = base.clone();
    for region in regions {
        draw_region_outline(&mut canvas, region, style);
        draw_label(&mut canvas, region, style);
    }
    canvas
}

/// Outline spanning (x, y) to (x + w, y + h) inclusive
pub fn draw_region_outline(canvas: &mut RgbImage, region: &DetectedRegion, style: &AnnotationStyle) {
    let b = region.bbox;
    for t in 0..style.thickness.max(1) {
        let side_w = (b.width + 1).saturating_sub(2 * t);
        let side_h = (b.height + 1).saturating_sub(2 * t);
        if side_w == 0 || side_h == 0 {
            break;
        }
        let rect = Rect::at((b.x + t) as i32, (b.y + t) as i32).of_size(side_w, side_h);
        draw_hollow_rect_mut(canvas, rect, style.outline_color);
    }
}

/// Top row of a label placed above a box whose top edge is `box_top`
pub fn label_top(box_top: u32, style: &AnnotationStyle) -> u32 {
    box_top.saturating_sub(style.label_gap + GLYPH_HEIGHT * style.label_scale.max(1))
}

pub fn draw_label(canvas: &mut RgbImage, region: &DetectedRegion, style: &AnnotationStyle) {
    let top = label_top(region.bbox.y, style);
    draw_text(canvas, region.bbox.x, top, &region.label, style.label_color, style.label_scale);
}

/// Render `text` with the 5x7 bitmap font; anything off-canvas is clipped
pub fn draw_text(canvas: &mut RgbImage, x: u32, y: u32, text: &str, color: Rgb<u8>, scale: u32) {
    let scale = scale.max(1);
    let mut pen_x = x;

    for ch in text.chars() {
        if let Some(rows) = glyph(ch) {
            for (row, &bits) in rows.iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if bits & (1u8 << (GLYPH_WIDTH - 1 - col)) == 0 {
                        continue;
                    }
                    let px = pen_x + col * scale;
                    let py = y + row as u32 * scale;
                    draw_filled_rect_mut(
                        canvas,
                        Rect::at(px as i32, py as i32).of_size(scale, scale),
                        color,
                    );
                }
            }
        }
        pen_x += GLYPH_ADVANCE * scale;
    }
}

/// Rendered width of `text` at the given scale
pub fn text_width(text: &str, scale: u32) -> u32 {
    let n = text.chars().count() as u32;
    if n == 0 {
        return 0;
    }
    (n * GLYPH_ADVANCE - 1) * scale.max(1)
}

// Rows top to bottom, low 5 bits, MSB is the leftmost column.
fn glyph(ch: char) -> Option<[u8; 7]> {
    let rows = match ch {
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        ',' => [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08],
        _ => return None,
    };
    Some(rows)
}
