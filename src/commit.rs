//! Writing derivatives and publishing the terminal status.
//!
//! Workers never touch the backend's `save` or the store directly; they go
//! through a [`Commit`]. Every derivative of an item is written first and
//! [`Commit::finalize`] runs last, so `ready` is only ever published after
//! the files it vouches for exist.
//!
//! File writes and the status update are not one transaction. A crash
//! between the last write and `finalize` leaves the item `pending`.
//! Derivatives written before a failure are left on disk by both
//! implementations.

use crate::imaging::{BackendError, ImageBackend, OutputFormat, Quality, SaveParams};
use crate::store::{MetadataStore, StoreError};
use crate::types::{MediaId, ProcessingStatus};
use image::DynamicImage;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub trait Commit: Send + Sync {
    /// Encode one derivative to its final public path.
    fn write_derivative(&self, image: &DynamicImage, path: &Path) -> Result<(), BackendError>;

    /// Record the item's terminal status.
    fn finalize(&self, id: MediaId, status: ProcessingStatus) -> Result<(), StoreError>;
}

/// Writes straight to the public path.
pub struct DirectCommit {
    backend: Arc<dyn ImageBackend>,
    store: Arc<dyn MetadataStore>,
    quality: Quality,
}

impl DirectCommit {
    pub fn new(
        backend: Arc<dyn ImageBackend>,
        store: Arc<dyn MetadataStore>,
        quality: Quality,
    ) -> Self {
        Self {
            backend,
            store,
            quality,
        }
    }
}

impl Commit for DirectCommit {
    fn write_derivative(&self, image: &DynamicImage, path: &Path) -> Result<(), BackendError> {
        let params = SaveParams {
            output: path.to_path_buf(),
            format: OutputFormat::from_path(path)?,
            quality: self.quality,
        };
        self.backend.save(image, &params)
    }

    fn finalize(&self, id: MediaId, status: ProcessingStatus) -> Result<(), StoreError> {
        self.store.update_status(id, status)
    }
}

/// Writes to `<path>.partial`, then renames over the public path.
///
/// Readers see either no file or a complete one. A failed write removes its
/// partial file.
pub struct StagedCommit {
    backend: Arc<dyn ImageBackend>,
    store: Arc<dyn MetadataStore>,
    quality: Quality,
}

impl StagedCommit {
    pub fn new(
        backend: Arc<dyn ImageBackend>,
        store: Arc<dyn MetadataStore>,
        quality: Quality,
    ) -> Self {
        Self {
            backend,
            store,
            quality,
        }
    }
}

/// Temporary sibling used while a derivative is being encoded.
pub fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

impl Commit for StagedCommit {
    fn write_derivative(&self, image: &DynamicImage, path: &Path) -> Result<(), BackendError> {
        let staging = staging_path(path);
        let params = SaveParams {
            output: staging.clone(),
            format: OutputFormat::from_path(path)?,
            quality: self.quality,
        };
        if let Err(err) = self.backend.save(image, &params) {
            let _ = std::fs::remove_file(&staging);
            return Err(err);
        }
        std::fs::rename(&staging, path)?;
        Ok(())
    }

    fn finalize(&self, id: MediaId, status: ProcessingStatus) -> Result<(), StoreError> {
        self.store.update_status(id, status)
    }
}
