use image::{ImageFormat, RgbImage};
use std::io::Cursor;

use crate::error::DetectError;
use crate::models::{DetectedRegion, DetectionResult};

/// One `Width=<w>px, Height=<h>px` line per region, in region order
pub fn summaries(regions: &[DetectedRegion]) -> Vec<String> {
    regions.iter().map(DetectedRegion::summary).collect()
}

/// Assemble the final result. No pixel work happens here.
pub fn package(
    normalized: RgbImage,
    annotated: RgbImage,
    regions: Vec<DetectedRegion>,
) -> DetectionResult {
    DetectionResult {
        summaries: summaries(&regions),
        regions,
        normalized,
        annotated,
    }
}

/// Encode an output buffer as PNG for storage or display
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, DetectError> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| DetectError::processing(format!("failed to encode PNG: {}", e)))?;
    Ok(buffer.into_inner())
}
