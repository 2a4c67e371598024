//! Image decoding, resizing, and encoding.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Decode** | `image::ImageReader` with content sniffing |
//! | **Thumbnail** | fill-resize (Lanczos3) + center crop |
//! | **Fit** | aspect-preserving resize (Lanczos3), never upscales |
//! | **Encode** | `JpegEncoder` (or PNG by extension) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing where and how to encode
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`] (file I/O only)
//! - **Operations**: The transform engine, pure `DynamicImage → DynamicImage`

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use operations::{get_dimensions, render};
pub use params::{OutputFormat, Quality, SaveParams};
pub use rust_backend::RustBackend;
