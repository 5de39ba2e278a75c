pub mod annotate;
pub mod contours;
pub mod morphology;
pub mod normalize;
pub mod preprocessing;
pub mod regions;
pub mod threshold;

use image::RgbImage;
use tracing::{debug, info};

use crate::detection::annotate::AnnotationStyle;
use crate::error::DetectError;
use crate::models::{CANONICAL_HEIGHT, CANONICAL_WIDTH, ContentType, DetectionResult, StageTrace};
use crate::report;

/// Tunable constants of the detection pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionParams {
    /// Gaussian blur kernel size (odd)
    pub blur_kernel: u32,
    /// Adaptive threshold window size (odd)
    pub block_size: u32,
    /// Levels below the local mean a pixel must reach to become foreground
    pub bias: i32,
    /// Regions must be strictly larger than this on both axes
    pub min_region_size: u32,
    pub style: AnnotationStyle,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            blur_kernel: 5,
            block_size: 11,
            bias: 2,
            min_region_size: regions::MIN_REGION_SIZE,
            style: AnnotationStyle::default(),
        }
    }
}

/// Stateless surface-defect detector.
///
/// Each call runs normalize → grayscale/blur → adaptive threshold → closing →
/// contour extraction → size filter/annotation → packaging on its own
/// buffers, so one instance can be shared freely across threads.
#[derive(Debug, Clone, Default)]
pub struct DetectionPipeline {
    params: DetectionParams,
}

impl DetectionPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(mut self, params: DetectionParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_blur_kernel(mut self, kernel_size: u32) -> Self {
        self.params.blur_kernel = kernel_size;
        self
    }

    pub fn with_block_size(mut self, block_size: u32) -> Self {
        self.params.block_size = block_size;
        self
    }

    pub fn with_bias(mut self, bias: i32) -> Self {
        self.params.bias = bias;
        self
    }

    pub fn with_min_region_size(mut self, min_size: u32) -> Self {
        self.params.min_region_size = min_size;
        self
    }

    pub fn with_style(mut self, style: AnnotationStyle) -> Self {
        self.params.style = style;
        self
    }

    pub fn params(&self) -> &DetectionParams {
        &self.params
    }

    /// Run the full pipeline on uploaded bytes and their declared media type
    pub fn detect(&self, bytes: &[u8], content_type: &str) -> Result<DetectionResult, DetectError> {
        let content_type = ContentType::parse(content_type)?;
        self.detect_with(bytes, content_type)
    }

    /// Same as [`detect`](Self::detect) with an already validated content type
    pub fn detect_with(
        &self,
        bytes: &[u8],
        content_type: ContentType,
    ) -> Result<DetectionResult, DetectError> {
        let normalized = normalize::normalize(bytes, content_type)?;
        let (result, _) = self.run(normalized, false)?;
        Ok(result)
    }

    /// Run the pipeline and also return the intermediate stage buffers
    pub fn detect_traced(
        &self,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<(DetectionResult, StageTrace), DetectError> {
        let content_type = ContentType::parse(content_type)?;
        let normalized = normalize::normalize(bytes, content_type)?;
        let (result, trace) = self.run(normalized, true)?;
        let trace = trace.ok_or_else(|| DetectError::processing("stage trace was not recorded"))?;
        Ok((result, trace))
    }

    /// Run every stage after normalization on a frame that is already 275x183
    pub fn detect_image(&self, normalized: &RgbImage) -> Result<DetectionResult, DetectError> {
        if normalized.dimensions() != (CANONICAL_WIDTH, CANONICAL_HEIGHT) {
            return Err(DetectError::processing(format!(
                "expected a {}x{} frame, got {}x{}",
                CANONICAL_WIDTH,
                CANONICAL_HEIGHT,
                normalized.width(),
                normalized.height()
            )));
        }
        let (result, _) = self.run(normalized.clone(), false)?;
        Ok(result)
    }

    fn validate(&self) -> Result<(), DetectError> {
        let p = &self.params;
        if p.blur_kernel == 0 || p.blur_kernel % 2 == 0 {
            return Err(DetectError::processing(format!(
                "blur kernel size must be odd and positive, got {}",
                p.blur_kernel
            )));
        }
        Ok(())
    }

    fn run(
        &self,
        normalized: RgbImage,
        keep_trace: bool,
    ) -> Result<(DetectionResult, Option<StageTrace>), DetectError> {
        self.validate()?;
        let p = &self.params;

        let (width, height) = normalized.dimensions();
        if width == 0 || height == 0 {
            return Err(DetectError::processing("normalized frame is empty"));
        }
        debug!(width, height, "normalized frame");

        let gray = preprocessing::to_grayscale(&normalized);
        let blurred = preprocessing::apply_blur(&gray, p.blur_kernel);
        debug!(kernel = p.blur_kernel, "grayscale and blur done");

        let mask = threshold::adaptive_threshold_inv(&blurred, p.block_size, p.bias)?;
        debug!(
            block_size = p.block_size,
            bias = p.bias,
            foreground = mask.foreground_count(),
            "adaptive threshold done"
        );

        let refined = morphology::close(&mask);
        if refined.dimensions() != (width, height) {
            return Err(DetectError::processing("refined mask does not match frame size"));
        }
        debug!(foreground = refined.foreground_count(), "closing done");

        let contours = contours::find_external_contours(&refined);
        debug!(count = contours.len(), "external contours traced");

        let detected = regions::filter_regions(&contours, p.min_region_size);
        let annotated = annotate::annotate(&normalized, &detected, &p.style);

        let trace = keep_trace.then(|| StageTrace {
            grayscale: blurred,
            mask,
            refined,
            contour_count: contours.len(),
        });

        let result = report::package(normalized, annotated, detected);
        info!(regions = result.regions.len(), "defect detection finished");

        Ok((result, trace))
    }
}
