//! Upload-side helpers that run before an item reaches the pipeline.
//!
//! An upload handler creates a `pending` record, stores the original with
//! [`store_original`], then submits the record. New accounts get their
//! avatar family from [`seed_default_avatar`], which copies the placeholder
//! files produced once by [`render_default_avatars`] and never touches the
//! transform engine.

use crate::imaging::{self, BackendError, ImageBackend, OutputFormat, Quality, SaveParams};
use crate::paths::PathResolver;
use crate::sizes::DerivativeSpec;
use crate::types::{MediaClass, MediaId, MediaItem};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("refusing to store an empty original for {0}")]
    EmptyOriginal(MediaId),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

fn io_at(path: &Path) -> impl FnOnce(std::io::Error) -> IntakeError + '_ {
    move |source| IntakeError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Write the uploaded bytes to the item's original path.
pub fn store_original(
    resolver: &PathResolver,
    item: &MediaItem,
    bytes: &[u8],
) -> Result<PathBuf, IntakeError> {
    if bytes.is_empty() {
        return Err(IntakeError::EmptyOriginal(item.id));
    }
    let path = resolver.original_path(item);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_at(parent))?;
    }
    fs::write(&path, bytes).map_err(io_at(&path))?;
    debug!(class = %item.class, id = %item.id, bytes = bytes.len(), "original stored");
    Ok(path)
}

/// Copy the placeholder avatar family to a new account's avatar paths.
///
/// Stops at the first missing placeholder; files copied before it stay.
pub fn seed_default_avatar(
    resolver: &PathResolver,
    table: &[DerivativeSpec],
    id: MediaId,
) -> Result<Vec<PathBuf>, IntakeError> {
    let dir = resolver.class_dir(MediaClass::Avatar);
    fs::create_dir_all(&dir).map_err(io_at(&dir))?;

    table
        .iter()
        .map(|spec| {
            let from = resolver.default_avatar_path(&spec.suffix);
            let to = resolver.avatar_path(id, &spec.suffix);
            fs::copy(&from, &to).map_err(|source| {
                let path = if from.is_file() { &to } else { &from };
                io_at(path)(source)
            })?;
            Ok(to)
        })
        .collect()
}

/// Build the `default_<suffix>.jpg` family from a placeholder image.
pub fn render_default_avatars(
    backend: &dyn ImageBackend,
    resolver: &PathResolver,
    table: &[DerivativeSpec],
    source: &Path,
    quality: Quality,
) -> Result<Vec<PathBuf>, IntakeError> {
    let image = backend.decode(source)?;
    let mut written = Vec::with_capacity(table.len());

    for spec in table {
        let output = resolver.default_avatar_path(&spec.suffix);
        let rendered = imaging::render(&image, spec)?;
        backend.save(
            &rendered,
            &SaveParams {
                format: OutputFormat::from_path(&output)?,
                output: output.clone(),
                quality,
            },
        )?;
        written.push(output);
    }

    info!(count = written.len(), source = %source.display(), "default avatars rendered");
    Ok(written)
}
