//! The transform engine.
//!
//! [`render`] turns an already-decoded original into one derivative. It does
//! no I/O, so the caller decodes once and renders every size of a table from
//! the same in-memory image.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{
    calculate_center_crop, calculate_fill_dimensions, calculate_fit_dimensions,
};
use crate::sizes::{DerivativeSpec, ResizeMode};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &dyn ImageBackend, path: &Path) -> Result<(u32, u32)> {
    let dims = backend.identify(path)?;
    Ok((dims.width, dims.height))
}

/// Produce the derivative described by `spec` from a decoded source.
///
/// - `thumbnail`: always exactly `width × height`, center-cropped.
/// - `fit`: within `width × height`, aspect preserved, never upscaled.
pub fn render(source: &DynamicImage, spec: &DerivativeSpec) -> Result<DynamicImage> {
    let dims = source.dimensions();
    if dims.0 == 0 || dims.1 == 0 {
        return Err(BackendError::ProcessingFailed("source image is empty".into()));
    }
    if spec.width == 0 || spec.height == 0 {
        return Err(BackendError::ProcessingFailed(format!(
            "target box for {:?} is empty",
            spec.suffix
        )));
    }

    let target = (spec.width, spec.height);
    let rendered = match spec.mode {
        ResizeMode::Thumbnail => {
            let (fill_w, fill_h) = calculate_fill_dimensions(dims, target);
            let filled = source.resize_exact(fill_w, fill_h, FilterType::Lanczos3);
            let (x, y) = calculate_center_crop((fill_w, fill_h), target);
            filled.crop_imm(x, y, spec.width, spec.height)
        }
        ResizeMode::Fit => {
            let (fit_w, fit_h) = calculate_fit_dimensions(dims, target);
            if (fit_w, fit_h) == dims {
                source.clone()
            } else {
                source.resize_exact(fit_w, fit_h, FilterType::Lanczos3)
            }
        }
    };
    Ok(rendered)
}
