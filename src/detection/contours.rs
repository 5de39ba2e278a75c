use image::GrayImage;
use imageproc::contours::{BorderType, find_contours};

use crate::models::{BinaryMask, Contour, Vertex};

/// Trace the outer boundary of every top-level foreground region.
///
/// Holes and any regions nested inside holes are skipped. Contours come back
/// in raster order of their first boundary pixel. Everything outside the
/// frame counts as background, so regions touching the border are traced too.
pub fn find_external_contours(mask: &BinaryMask) -> Vec<Contour> {
    find_contours::<u32>(&pad_with_background(mask.as_gray()))
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .map(|c| {
            let chain: Vec<Vertex> = c
                .points
                .iter()
                .map(|p| Vertex {
                    x: p.x.saturating_sub(1),
                    y: p.y.saturating_sub(1),
                })
                .collect();
            Contour {
                vertices: compress_chain(&chain),
            }
        })
        .collect()
}

// One background pixel on every side; the tracer never starts an outer
// border in column 0.
fn pad_with_background(img: &GrayImage) -> GrayImage {
    let mut padded = GrayImage::new(img.width() + 2, img.height() + 2);
    image::imageops::replace(&mut padded, img, 1, 1);
    padded
}

/// Drop every vertex that continues in the same direction as the step
/// before it. The chain is treated as closed.
pub fn compress_chain(chain: &[Vertex]) -> Vec<Vertex> {
    let mut chain = chain.to_vec();
    chain.dedup();
    while chain.len() > 1 && chain.first() == chain.last() {
        chain.pop();
    }

    let n = chain.len();
    if n <= 2 {
        return chain;
    }

    (0..n)
        .filter(|&i| {
            let prev = chain[(i + n - 1) % n];
            let next = chain[(i + 1) % n];
            step(prev, chain[i]) != step(chain[i], next)
        })
        .map(|i| chain[i])
        .collect()
}

fn step(from: Vertex, to: Vertex) -> (i64, i64) {
    (
        (to.x as i64 - from.x as i64).signum(),
        (to.y as i64 - from.y as i64).signum(),
    )
}
