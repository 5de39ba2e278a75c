#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from defectscan for tests
pub use defectscan::{
    BinaryMask, ContentType, DetectError, DetectionPipeline, DetectionResult, Storage,
    StorageError, StorageKey,
};
