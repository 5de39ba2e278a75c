use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::filter::separable_filter_equal;
use imageproc::map::map_colors;

/// Convert to grayscale with BT.601 luma weights (0.299, 0.587, 0.114)
pub fn to_grayscale(img: &RgbImage) -> GrayImage {
    map_colors(img, |p: Rgb<u8>| {
        let [r, g, b] = p.0.map(u32::from);
        let luma = (299 * r + 587 * g + 114 * b + 500) / 1000;
        Luma([luma as u8])
    })
}

/// Sigma used when only the kernel size is given
pub fn sigma_for_kernel(kernel_size: u32) -> f32 {
    0.3 * ((kernel_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalized 1-D Gaussian kernel of odd length `kernel_size`.
pub fn gaussian_kernel(kernel_size: u32) -> Vec<f32> {
    let sigma = sigma_for_kernel(kernel_size);
    let center = (kernel_size / 2) as f32;
    let weights: Vec<f32> = (0..kernel_size)
        .map(|i| {
            let d = i as f32 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

/// Apply a square Gaussian blur of `kernel_size` x `kernel_size` to reduce noise
pub fn apply_blur(img: &GrayImage, kernel_size: u32) -> GrayImage {
    let kernel = gaussian_kernel(kernel_size);
    separable_filter_equal(img, &kernel)
}
