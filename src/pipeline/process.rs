//! Processing a single media item.
//!
//! For each dequeued item the worker:
//!
//! ```text
//! 1. decode   <class>/<id>[_<token>]_o.jpg            (once)
//! 2. render   every DerivativeSpec of the class table, in order
//! 3. write    each derivative before rendering the next
//! ```
//!
//! The first failure aborts the rest of the table. Nothing is written when
//! the original cannot be decoded; derivatives written before a later
//! failure stay on disk. The terminal status is published by the worker
//! afterwards, never from here.

use crate::commit::Commit;
use crate::imaging::{self, BackendError, ImageBackend};
use crate::paths::PathResolver;
use crate::sizes::DerivativeSpec;
use crate::types::{MediaClass, MediaId, MediaItem, ProcessingStatus};
use image::GenericImageView;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("cannot read original {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
    #[error("cannot render {suffix}: {source}")]
    Render {
        suffix: String,
        #[source]
        source: BackendError,
    },
    #[error("cannot write {suffix} to {path}: {source}")]
    Write {
        suffix: String,
        path: PathBuf,
        #[source]
        source: BackendError,
    },
    #[error("processing task aborted: {0}")]
    Worker(String),
}

/// Progress reported by workers, for CLI output and tests.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    Started {
        class: MediaClass,
        id: MediaId,
    },
    DerivativeWritten {
        class: MediaClass,
        id: MediaId,
        suffix: String,
        width: u32,
        height: u32,
    },
    Finished {
        class: MediaClass,
        id: MediaId,
        status: ProcessingStatus,
        error: Option<String>,
    },
}

/// A derivative that made it to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDerivative {
    pub suffix: String,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Decode an item's original once and write every derivative in `table`.
pub fn process_item(
    backend: &dyn ImageBackend,
    commit: &dyn Commit,
    resolver: &PathResolver,
    table: &[DerivativeSpec],
    item: &MediaItem,
    events: Option<&Sender<ProcessEvent>>,
) -> Result<Vec<GeneratedDerivative>, ProcessError> {
    let original = resolver.original_path(item);
    let source = backend
        .decode(&original)
        .map_err(|source| ProcessError::Decode {
            path: original.clone(),
            source,
        })?;

    let mut generated = Vec::with_capacity(table.len());
    for spec in table {
        let derivative = imaging::render(&source, spec).map_err(|source| ProcessError::Render {
            suffix: spec.suffix.clone(),
            source,
        })?;

        let path = resolver.derivative_path(item, spec);
        commit
            .write_derivative(&derivative, &path)
            .map_err(|source| ProcessError::Write {
                suffix: spec.suffix.clone(),
                path: path.clone(),
                source,
            })?;

        let (width, height) = derivative.dimensions();
        debug!(class = %item.class, id = %item.id, suffix = %spec.suffix, width, height, "derivative written");
        if let Some(tx) = events {
            let _ = tx.send(ProcessEvent::DerivativeWritten {
                class: item.class,
                id: item.id,
                suffix: spec.suffix.clone(),
                width,
                height,
            });
        }
        generated.push(GeneratedDerivative {
            suffix: spec.suffix.clone(),
            path,
            width,
            height,
        });
    }

    Ok(generated)
}
