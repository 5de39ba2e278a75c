use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageReader, RgbImage};
use std::io::Cursor;

use crate::error::DetectError;
use crate::models::{CANONICAL_HEIGHT, CANONICAL_WIDTH, ContentType};

/// Decode raw upload bytes into a pixel buffer.
///
/// The format is sniffed from the bytes first; the declared content type is
/// only used when sniffing finds nothing.
pub fn decode(bytes: &[u8], content_type: ContentType) -> Result<DynamicImage, DetectError> {
    if bytes.is_empty() {
        return Err(DetectError::DecodeFailure("image data is empty".to_string()));
    }

    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DetectError::DecodeFailure(e.to_string()))?;

    if reader.format().is_none() {
        if let Some(hint) = content_type.format_hint() {
            reader.set_format(hint);
        }
    }

    reader
        .decode()
        .map_err(|e| DetectError::DecodeFailure(e.to_string()))
}

/// Decode and resize to the canonical frame
pub fn normalize(bytes: &[u8], content_type: ContentType) -> Result<RgbImage, DetectError> {
    let raw = decode(bytes, content_type)?;

    if raw.width() == 0 || raw.height() == 0 {
        return Err(DetectError::processing(format!(
            "decoded image has zero size ({}x{})",
            raw.width(),
            raw.height()
        )));
    }

    tracing::debug!(
        width = raw.width(),
        height = raw.height(),
        color = ?raw.color(),
        "decoded upload"
    );

    Ok(resize_to_canonical(&raw.to_rgb8()))
}

/// Bilinear resize to 275x183. A frame that already has the canonical size
/// is returned as an unchanged copy.
pub fn resize_to_canonical(image: &RgbImage) -> RgbImage {
    if image.dimensions() == (CANONICAL_WIDTH, CANONICAL_HEIGHT) {
        return image.clone();
    }
    imageops::resize(image, CANONICAL_WIDTH, CANONICAL_HEIGHT, FilterType::Triangle)
}
