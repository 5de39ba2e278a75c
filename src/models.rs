use image::{GrayImage, ImageFormat, Luma, RgbImage};
use serde::Serialize;
use std::fmt;

use crate::error::DetectError;

/// Width of the canonical working frame
pub const CANONICAL_WIDTH: u32 = 275;
/// Height of the canonical working frame
pub const CANONICAL_HEIGHT: u32 = 183;

/// Media type declared by the uploader, validated once at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Png,
    Jpeg,
    Gif,
    Bmp,
    WebP,
    Tiff,
    /// Some other `image/*` subtype; the decoder sniffs the format.
    OtherImage,
}

impl ContentType {
    /// Parse a declared media type such as `image/png; charset=binary`.
    pub fn parse(declared: &str) -> Result<Self, DetectError> {
        let essence = declared
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        let Some(subtype) = essence.strip_prefix("image/") else {
            return Err(DetectError::InvalidContentType {
                content_type: declared.to_string(),
            });
        };

        Ok(match subtype {
            "png" => ContentType::Png,
            "jpeg" | "jpg" | "pjpeg" => ContentType::Jpeg,
            "gif" => ContentType::Gif,
            "bmp" | "x-bmp" | "x-ms-bmp" => ContentType::Bmp,
            "webp" => ContentType::WebP,
            "tiff" | "tif" => ContentType::Tiff,
            "" => {
                return Err(DetectError::InvalidContentType {
                    content_type: declared.to_string(),
                });
            }
            _ => ContentType::OtherImage,
        })
    }

    /// Decoder hint, `None` means sniff from the bytes
    pub fn format_hint(&self) -> Option<ImageFormat> {
        match self {
            ContentType::Png => Some(ImageFormat::Png),
            ContentType::Jpeg => Some(ImageFormat::Jpeg),
            ContentType::Gif => Some(ImageFormat::Gif),
            ContentType::Bmp => Some(ImageFormat::Bmp),
            ContentType::WebP => Some(ImageFormat::WebP),
            ContentType::Tiff => Some(ImageFormat::Tiff),
            ContentType::OtherImage => None,
        }
    }
}

/// Single-channel mask. Foreground pixels are stored as 255 so the buffer can
/// be handed to `imageproc` directly.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryMask(GrayImage);

impl BinaryMask {
    pub const FOREGROUND: Luma<u8> = Luma([255]);
    pub const BACKGROUND: Luma<u8> = Luma([0]);

    /// Wrap a grayscale buffer, treating every non-zero pixel as foreground
    pub fn from_gray(mut image: GrayImage) -> Self {
        for pixel in image.pixels_mut() {
            if pixel[0] != 0 {
                *pixel = Self::FOREGROUND;
            }
        }
        Self(image)
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    pub fn is_foreground(&self, x: u32, y: u32) -> bool {
        self.0.get_pixel(x, y)[0] != 0
    }

    pub fn foreground_count(&self) -> usize {
        self.0.pixels().filter(|p| p[0] != 0).count()
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.0
    }

    pub fn into_gray(self) -> GrayImage {
        self.0
    }
}

/// Pixel coordinate on a contour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vertex {
    pub x: u32,
    pub y: u32,
}

/// Outer boundary of one connected foreground region, reduced to the
/// vertices where the boundary changes direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    pub vertices: Vec<Vertex>,
}

impl Contour {
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Axis-aligned bounding box, `None` for an empty contour
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let first = self.vertices.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);

        for v in &self.vertices[1..] {
            min_x = min_x.min(v.x);
            min_y = min_y.min(v.y);
            max_x = max_x.max(v.x);
            max_y = max_y.max(v.y);
        }

        Some(BoundingBox {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        })
    }
}

/// Bounding box in canonical-frame pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// One reported defect
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectedRegion {
    #[serde(flatten)]
    pub bbox: BoundingBox,
    pub label: String,
}

impl DetectedRegion {
    pub fn new(bbox: BoundingBox) -> Self {
        let label = format!("W:{}, H:{}", bbox.width, bbox.height);
        Self { bbox, label }
    }

    pub fn width(&self) -> u32 {
        self.bbox.width
    }

    pub fn height(&self) -> u32 {
        self.bbox.height
    }

    /// Summary line in the `Width=<w>px, Height=<h>px` format
    pub fn summary(&self) -> String {
        format!("Width={}px, Height={}px", self.bbox.width, self.bbox.height)
    }
}

impl fmt::Display for DetectedRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at ({}, {})", self.summary(), self.bbox.x, self.bbox.y)
    }
}

/// Everything one detection run hands back to the caller
#[derive(Debug, Clone, Serialize)]
pub struct DetectionResult {
    pub regions: Vec<DetectedRegion>,
    pub summaries: Vec<String>,
    #[serde(skip)]
    pub normalized: RgbImage,
    #[serde(skip)]
    pub annotated: RgbImage,
}

impl DetectionResult {
    pub fn has_defects(&self) -> bool {
        !self.regions.is_empty()
    }
}

/// Intermediate buffers of one run, kept only when tracing is requested
#[derive(Debug, Clone)]
pub struct StageTrace {
    pub grayscale: GrayImage,
    pub mask: BinaryMask,
    pub refined: BinaryMask,
    pub contour_count: usize,
}
