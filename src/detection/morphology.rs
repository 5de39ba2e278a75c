use imageproc::distance_transform::Norm;
use imageproc::morphology::{dilate, erode};

use crate::models::BinaryMask;

/// 3x3 all-ones structuring element
const RADIUS: u8 = 1;

/// Any foreground pixel in the 3x3 window turns the center on
pub fn dilate_once(mask: &BinaryMask) -> BinaryMask {
    BinaryMask::from_gray(dilate(mask.as_gray(), Norm::LInf, RADIUS))
}

/// Center stays on only if the whole 3x3 window is foreground.
/// Pixels outside the image never count as background.
pub fn erode_once(mask: &BinaryMask) -> BinaryMask {
    BinaryMask::from_gray(erode(mask.as_gray(), Norm::LInf, RADIUS))
}

/// Morphological closing: dilate, then erode the dilated mask
pub fn close(mask: &BinaryMask) -> BinaryMask {
    erode_once(&dilate_once(mask))
}
