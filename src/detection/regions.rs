use crate::models::{BoundingBox, Contour, DetectedRegion};

/// Minimum size (exclusive) on both axes for a region to be reported
pub const MIN_REGION_SIZE: u32 = 5;

/// Strictly larger than `min_size` on both axes. No upper bound.
pub fn is_retained(bbox: &BoundingBox, min_size: u32) -> bool {
    bbox.width > min_size && bbox.height > min_size
}

/// Keep the bounding boxes of contours large enough to report, in contour order
pub fn filter_regions(contours: &[Contour], min_size: u32) -> Vec<DetectedRegion> {
    let regions: Vec<DetectedRegion> = contours
        .iter()
        .filter_map(Contour::bounding_box)
        .filter(|bbox| is_retained(bbox, min_size))
        .map(DetectedRegion::new)
        .collect();

    tracing::debug!(
        contours = contours.len(),
        retained = regions.len(),
        min_size,
        "filtered regions"
    );

    regions
}
