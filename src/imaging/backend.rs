//! Image I/O backend trait and shared types.
//!
//! The [`ImageBackend`] trait covers the only three places the pipeline
//! touches image files: identify, decode, and save. Resizing itself is a
//! pure function in [`operations`](super::operations), so a backend never
//! sees a [`DerivativeSpec`](crate::sizes::DerivativeSpec).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::params::SaveParams;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {message}")]
    Decode { path: PathBuf, message: String },
    #[error("Failed to encode {path}: {message}")]
    Encode { path: PathBuf, message: String },
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image I/O backends.
///
/// Backends are shared between worker tasks and run inside
/// `spawn_blocking`, hence `Send + Sync`.
pub trait ImageBackend: Send + Sync {
    /// Get image dimensions without a full decode.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Read and decode an image into memory.
    fn decode(&self, path: &Path) -> Result<DynamicImage, BackendError>;

    /// Encode `image` and write it to `params.output`.
    fn save(&self, image: &DynamicImage, params: &SaveParams) -> Result<(), BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::{OutputFormat, Quality};
    use image::{GenericImageView, RgbImage};
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Mock backend that records operations without touching the disk.
    ///
    /// `decode` yields a synthetic image of the configured size unless the
    /// path was marked missing; `save` fails for outputs containing a
    /// configured marker.
    pub struct MockBackend {
        pub source: Dimensions,
        pub missing: Mutex<HashSet<PathBuf>>,
        pub save_failure_marker: Mutex<Option<String>>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(String),
        Decode(String),
        Save {
            output: String,
            width: u32,
            height: u32,
            quality: u32,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::with_source(400, 300)
        }

        pub fn with_source(width: u32, height: u32) -> Self {
            Self {
                source: Dimensions { width, height },
                missing: Mutex::new(HashSet::new()),
                save_failure_marker: Mutex::new(None),
                operations: Mutex::new(Vec::new()),
            }
        }

        pub fn mark_missing(&self, path: impl Into<PathBuf>) {
            self.missing.lock().unwrap().insert(path.into());
        }

        pub fn fail_saves_matching(&self, marker: &str) {
            *self.save_failure_marker.lock().unwrap() = Some(marker.to_string());
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn saved_outputs(&self) -> Vec<String> {
            self.get_operations()
                .into_iter()
                .filter_map(|op| match op {
                    RecordedOp::Save { output, .. } => Some(output),
                    _ => None,
                })
                .collect()
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(path.to_string_lossy().to_string()));
            Ok(self.source)
        }

        fn decode(&self, path: &Path) -> Result<DynamicImage, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Decode(path.to_string_lossy().to_string()));

            if self.missing.lock().unwrap().contains(path) {
                return Err(BackendError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "mock: missing original",
                )));
            }
            Ok(DynamicImage::ImageRgb8(RgbImage::new(
                self.source.width,
                self.source.height,
            )))
        }

        fn save(&self, image: &DynamicImage, params: &SaveParams) -> Result<(), BackendError> {
            let output = params.output.to_string_lossy().to_string();
            let (width, height) = image.dimensions();
            self.operations.lock().unwrap().push(RecordedOp::Save {
                output: output.clone(),
                width,
                height,
                quality: params.quality.value(),
            });

            if let Some(marker) = self.save_failure_marker.lock().unwrap().as_deref() {
                if output.contains(marker) {
                    return Err(BackendError::Encode {
                        path: params.output.clone(),
                        message: "mock: disk full".into(),
                    });
                }
            }
            Ok(())
        }
    }

    #[test]
    fn mock_records_identify() {
        let backend = MockBackend::with_source(800, 600);

        let result = backend.identify(Path::new("/test/image.jpg")).unwrap();
        assert_eq!(result.width, 800);
        assert_eq!(result.height, 600);

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], RecordedOp::Identify(p) if p == "/test/image.jpg"));
    }

    #[test]
    fn mock_decode_respects_missing() {
        let backend = MockBackend::new();
        backend.mark_missing("/gone.jpg");

        assert!(backend.decode(Path::new("/gone.jpg")).is_err());
        let img = backend.decode(Path::new("/here.jpg")).unwrap();
        assert_eq!(img.dimensions(), (400, 300));
    }

    #[test]
    fn mock_records_save_and_fails_on_marker() {
        let backend = MockBackend::new();
        backend.fail_saves_matching("_f300");
        let img = DynamicImage::ImageRgb8(RgbImage::new(50, 40));

        let ok = backend.save(
            &img,
            &SaveParams {
                output: "/out/1_t50.jpg".into(),
                format: OutputFormat::Jpeg,
                quality: Quality::new(80),
            },
        );
        assert!(ok.is_ok());

        let err = backend.save(
            &img,
            &SaveParams {
                output: "/out/1_f300.jpg".into(),
                format: OutputFormat::Jpeg,
                quality: Quality::new(80),
            },
        );
        assert!(matches!(err, Err(BackendError::Encode { .. })));

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 2);
        assert!(matches!(
            &ops[0],
            RecordedOp::Save {
                width: 50,
                height: 40,
                quality: 80,
                ..
            }
        ));
    }
}
