use serde::Serialize;
use std::fmt;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::StorageError;
use crate::models::DetectionResult;
use crate::report::encode_png;

/// Caller-supplied identifier that keeps one run's outputs apart from every
/// other run's, independent of the uploaded filename.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn new(key: impl Into<String>) -> Result<Self, StorageError> {
        let key = key.into();
        if !is_safe_name(&key, false) {
            return Err(StorageError::InvalidKey(key));
        }
        Ok(Self(key))
    }

    /// Fresh random key (UUID v4, simple form)
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a stored object can be found again
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Locator {
    pub name: String,
    pub path: PathBuf,
    pub url: String,
}

/// Persistence collaborator; the detection core never writes files itself
pub trait Storage: Send + Sync {
    fn save(&self, logical_name: &str, bytes: &[u8]) -> Result<Locator, StorageError>;

    /// Delete a previously saved object; a missing object is not an error
    fn remove(&self, logical_name: &str) -> Result<(), StorageError>;
}

/// Stores objects as files under one root directory
#[derive(Debug, Clone)]
pub struct FileSystemStorage {
    root: PathBuf,
    base_url: String,
}

impl FileSystemStorage {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            root: root.into(),
            base_url,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn url(&self, logical_name: &str) -> String {
        format!("{}{}", self.base_url, logical_name)
    }
}

impl Storage for FileSystemStorage {
    fn save(&self, logical_name: &str, bytes: &[u8]) -> Result<Locator, StorageError> {
        if !is_safe_name(logical_name, true) {
            return Err(StorageError::InvalidKey(logical_name.to_string()));
        }

        std::fs::create_dir_all(&self.root)?;
        let path = self.root.join(logical_name);

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists(logical_name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        if let Err(e) = file.write_all(bytes) {
            drop(file);
            let _ = std::fs::remove_file(&path);
            return Err(e.into());
        }

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "stored object");

        Ok(Locator {
            name: logical_name.to_string(),
            url: self.url(logical_name),
            path,
        })
    }

    fn remove(&self, logical_name: &str) -> Result<(), StorageError> {
        if !is_safe_name(logical_name, true) {
            return Err(StorageError::InvalidKey(logical_name.to_string()));
        }

        match std::fs::remove_file(self.root.join(logical_name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Locators of the two images persisted for one run
#[derive(Debug, Clone, Serialize)]
pub struct PersistedImages {
    pub resized: Locator,
    pub processed: Locator,
}

/// Save the normalized frame as `resized_<key>.png` and the annotated frame as
/// `processed_<key>.png`. Either both are stored or neither is.
pub fn persist_result(
    storage: &dyn Storage,
    key: &StorageKey,
    result: &DetectionResult,
) -> Result<PersistedImages, StorageError> {
    let resized_png = encode_png(&result.normalized)?;
    let processed_png = encode_png(&result.annotated)?;

    let resized = storage.save(&format!("resized_{}.png", key), &resized_png)?;
    let processed = match storage.save(&format!("processed_{}.png", key), &processed_png) {
        Ok(locator) => locator,
        Err(e) => {
            if let Err(cleanup) = storage.remove(&resized.name) {
                let detail = cleanup.to_string();
                tracing::warn!(name = %resized.name, error = %detail, "failed to remove partial output");
            }
            return Err(e);
        }
    };
    Ok(PersistedImages { resized, processed })
}

fn is_safe_name(name: &str, allow_dot: bool) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || (allow_dot && c == '.'))
}
