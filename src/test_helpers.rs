//! Shared test utilities for the lightbox test suite.
//!
//! Provides fixture builders for storage roots and originals, plus assertion
//! helpers that read back what the pipeline wrote.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let resolver = PathResolver::new(tmp.path());
//! let item = photo_item(1);
//! write_original(&resolver, &item, 400, 300);
//!
//! // ... run the pipeline ...
//!
//! assert_image_dims(&resolver.derivative_path(&item, &spec), 50, 50);
//! ```

use image::{ImageEncoder, RgbImage};
use std::path::Path;

use crate::paths::PathResolver;
use crate::sizes::{DerivativeSpec, SizeTables};
use crate::types::{MediaClass, MediaId, MediaItem};

// =========================================================================
// Fixture setup
// =========================================================================

/// Write a small valid JPEG with a gradient, creating parent directories.
pub fn write_test_jpeg(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Store a synthetic original for `item` at its `o` path.
pub fn write_original(resolver: &PathResolver, item: &MediaItem, width: u32, height: u32) {
    write_test_jpeg(&resolver.original_path(item), width, height);
}

pub fn photo_item(id: i64) -> MediaItem {
    MediaItem::new_pending(MediaId(id), MediaClass::Photo)
}

pub fn avatar_item(id: i64) -> MediaItem {
    MediaItem::new_pending(MediaId(id), MediaClass::Avatar)
}

/// Two-entry tables that exercise both resize modes quickly.
pub fn small_tables() -> SizeTables {
    SizeTables {
        photo: vec![
            DerivativeSpec::thumbnail(50, 50, "t50"),
            DerivativeSpec::fit(300, 300, "f300"),
        ],
        avatar: vec![
            DerivativeSpec::thumbnail(25, 25, "25"),
            DerivativeSpec::thumbnail(50, 50, "50"),
        ],
    }
}

// =========================================================================
// Assertions
// =========================================================================

/// Assert a file decodes with exactly the given dimensions.
pub fn assert_image_dims(path: &Path, width: u32, height: u32) {
    let dims = image::image_dimensions(path)
        .unwrap_or_else(|e| panic!("{} is not a readable image: {e}", path.display()));
    assert_eq!(dims, (width, height), "dimensions of {}", path.display());
}

/// Assert that none of an item's derivatives exist on disk.
pub fn assert_no_derivatives(resolver: &PathResolver, item: &MediaItem, table: &[DerivativeSpec]) {
    for spec in table {
        let path = resolver.derivative_path(item, spec);
        assert!(!path.exists(), "unexpected derivative {}", path.display());
    }
}
