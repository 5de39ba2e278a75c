pub mod detection;
pub mod error;
pub mod models;
pub mod report;
pub mod storage;

pub use detection::annotate::AnnotationStyle;
pub use detection::{DetectionParams, DetectionPipeline};
pub use error::{DetectError, StorageError};
pub use models::{
    BinaryMask, BoundingBox, CANONICAL_HEIGHT, CANONICAL_WIDTH, ContentType, Contour,
    DetectedRegion, DetectionResult, StageTrace, Vertex,
};
pub use storage::{FileSystemStorage, Locator, PersistedImages, Storage, StorageKey, persist_result};
