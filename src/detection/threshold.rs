use image::{GrayImage, Luma};
use imageproc::integral_image::{integral_image, sum_image_pixels};

use crate::error::DetectError;
use crate::models::BinaryMask;

/// Inverted adaptive mean threshold.
///
/// Each pixel is compared with the mean of the `block_size` x `block_size`
/// window around it (image borders replicated). Pixels at least `bias` levels
/// darker than that mean become foreground.
pub fn adaptive_threshold_inv(
    img: &GrayImage,
    block_size: u32,
    bias: i32,
) -> Result<BinaryMask, DetectError> {
    if block_size == 0 || block_size % 2 == 0 {
        return Err(DetectError::processing(format!(
            "threshold block size must be odd and positive, got {}",
            block_size
        )));
    }

    let means = local_means(img, block_size / 2);

    let mut mask = GrayImage::new(img.width(), img.height());
    for (x, y, pixel) in img.enumerate_pixels() {
        let threshold = means.get_pixel(x, y)[0] as i32 - bias;
        if pixel[0] as i32 <= threshold {
            mask.put_pixel(x, y, BinaryMask::FOREGROUND);
        }
    }

    Ok(BinaryMask::from_gray(mask))
}

/// Mean of the (2r+1) x (2r+1) window around every pixel, borders replicated.
/// The window sum is taken exactly and rounded once.
pub fn local_means(img: &GrayImage, radius: u32) -> GrayImage {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return GrayImage::new(width, height);
    }

    let padded = replicate_border(img, radius);
    let integral = integral_image::<_, u32>(&padded);
    let side = 2 * radius + 1;
    let area = side * side;

    GrayImage::from_fn(width, height, |x, y| {
        let sum = sum_image_pixels(&integral, x, y, x + side - 1, y + side - 1)[0];
        Luma([((sum + area / 2) / area) as u8])
    })
}

fn replicate_border(img: &GrayImage, radius: u32) -> GrayImage {
    let (width, height) = img.dimensions();
    GrayImage::from_fn(width + 2 * radius, height + 2 * radius, |x, y| {
        let sx = x.saturating_sub(radius).min(width - 1);
        let sy = y.saturating_sub(radius).min(height - 1);
        *img.get_pixel(sx, sy)
    })
}
