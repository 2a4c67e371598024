//! Pure Rust image backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::ImageReader::into_dimensions` |
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader`, format sniffed from content |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |
//!
//! Originals are stored under a `.jpg` name whatever the uploaded format,
//! so decoding never trusts the extension.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::{OutputFormat, SaveParams};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageReader};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_error(path: &Path, err: impl std::fmt::Display) -> BackendError {
    BackendError::Decode {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

fn encode_error(path: &Path, err: impl std::fmt::Display) -> BackendError {
    BackendError::Encode {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let reader = ImageReader::open(path)?.with_guessed_format()?;
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| decode_error(path, e))?;
        Ok(Dimensions { width, height })
    }

    fn decode(&self, path: &Path) -> Result<DynamicImage, BackendError> {
        ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| decode_error(path, e))
    }

    fn save(&self, image: &DynamicImage, params: &SaveParams) -> Result<(), BackendError> {
        let path = params.output.as_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)?;
        let mut writer = BufWriter::new(file);

        match params.format {
            OutputFormat::Jpeg => {
                // JPEG has no alpha channel.
                let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
                let encoder = JpegEncoder::new_with_quality(&mut writer, params.quality.value() as u8);
                rgb.write_with_encoder(encoder)
                    .map_err(|e| encode_error(path, e))?;
            }
            OutputFormat::Png => {
                let rgba = DynamicImage::ImageRgba8(image.to_rgba8());
                rgba.write_with_encoder(PngEncoder::new(&mut writer))
                    .map_err(|e| encode_error(path, e))?;
            }
        }

        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Quality;
    use crate::test_helpers::write_test_jpeg;
    use image::{GenericImageView, RgbImage};

    fn save_params(output: &Path, format: OutputFormat) -> SaveParams {
        SaveParams {
            output: output.to_path_buf(),
            format,
            quality: Quality::new(85),
        }
    }

    #[test]
    fn identify_synthetic_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        write_test_jpeg(&path, 200, 150);

        let dims = RustBackend::new().identify(&path).unwrap();
        assert_eq!(dims, Dimensions { width: 200, height: 150 });
    }

    #[test]
    fn identify_nonexistent_file_errors() {
        let result = RustBackend::new().identify(Path::new("/nonexistent/image.jpg"));
        assert!(matches!(result, Err(BackendError::Io(_))));
    }

    #[test]
    fn decode_nonexistent_file_is_io_error() {
        let result = RustBackend::new().decode(Path::new("/nonexistent/image.jpg"));
        assert!(matches!(result, Err(BackendError::Io(_))));
    }

    #[test]
    fn decode_garbage_is_decode_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("corrupt.jpg");
        std::fs::write(&path, b"definitely not an image").unwrap();

        let result = RustBackend::new().decode(&path);
        assert!(matches!(result, Err(BackendError::Decode { .. })));
    }

    #[test]
    fn decode_png_stored_under_jpg_name() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("upload_o.jpg");
        let img = DynamicImage::ImageRgb8(RgbImage::new(30, 20));
        img.save_with_format(&path, image::ImageFormat::Png).unwrap();

        let decoded = RustBackend::new().decode(&path).unwrap();
        assert_eq!(decoded.dimensions(), (30, 20));
    }

    #[test]
    fn save_jpeg_roundtrips_dimensions() {
        let tmp = tempfile::TempDir::new().unwrap();
        let output = tmp.path().join("nested/dir/out.jpg");
        let img = DynamicImage::ImageRgba8(image::RgbaImage::new(64, 48));

        let backend = RustBackend::new();
        backend
            .save(&img, &save_params(&output, OutputFormat::Jpeg))
            .unwrap();

        assert!(output.exists());
        assert_eq!(backend.identify(&output).unwrap(), Dimensions { width: 64, height: 48 });
    }

    #[test]
    fn save_png_keeps_alpha_format() {
        let tmp = tempfile::TempDir::new().unwrap();
        let output = tmp.path().join("out.png");
        let img = DynamicImage::ImageRgb8(RgbImage::new(10, 12));

        RustBackend::new()
            .save(&img, &save_params(&output, OutputFormat::Png))
            .unwrap();

        assert_eq!(
            image::ImageFormat::from_path(&output).unwrap(),
            image::ImageFormat::Png
        );
        assert_eq!(image::image_dimensions(&output).unwrap(), (10, 12));
    }

    #[test]
    fn save_into_unwritable_location_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let output = blocker.join("child.jpg");
        let img = DynamicImage::ImageRgb8(RgbImage::new(4, 4));

        let result = RustBackend::new().save(&img, &save_params(&output, OutputFormat::Jpeg));
        assert!(matches!(result, Err(BackendError::Io(_))));
    }
}
