use thiserror::Error;

/// Terminal failures of one detection run.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("declared content type `{content_type}` is not an image")]
    InvalidContentType { content_type: String },

    #[error("could not decode image data: {0}")]
    DecodeFailure(String),

    #[error("processing error: {0}")]
    ProcessingError(String),
}

impl DetectError {
    pub(crate) fn processing(msg: impl Into<String>) -> Self {
        DetectError::ProcessingError(msg.into())
    }

    /// Message suitable for showing to the person who uploaded the image
    pub fn user_message(&self) -> &'static str {
        match self {
            DetectError::InvalidContentType { .. } => "Invalid file type. Please upload an image.",
            DetectError::DecodeFailure(_) => "Could not read the uploaded image file.",
            DetectError::ProcessingError(_) => "An error occurred while processing the image.",
        }
    }
}

/// Failures of the storage collaborator.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid storage key `{0}`: use only ASCII letters, digits, '-' and '_'")]
    InvalidKey(String),

    #[error("refusing to overwrite existing object `{0}`")]
    AlreadyExists(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Encode(#[from] DetectError),
}
