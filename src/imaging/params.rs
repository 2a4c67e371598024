//! Parameter types for encoding derivatives.
//!
//! These describe *where* and *how* a rendered image is written, leaving the
//! pixel work to [`operations`](super::operations) and the file work to the
//! [`backend`](super::backend).

use super::backend::BackendError;
use std::path::{Path, PathBuf};

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(95)
    }
}

/// Encoded file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
}

impl OutputFormat {
    /// Infer the format from a path's extension.
    pub fn from_path(path: &Path) -> Result<Self, BackendError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            other => Err(BackendError::ProcessingFailed(format!(
                "Unsupported output format: {other:?}"
            ))),
        }
    }
}

/// Full specification for writing one rendered image.
///
/// `format` is explicit rather than derived from `output` so that staged
/// writes can target a temporary name.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveParams {
    pub output: PathBuf,
    pub format: OutputFormat,
    pub quality: Quality,
}
