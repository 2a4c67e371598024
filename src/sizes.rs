//! Derivative size tables.
//!
//! Each media class has an ordered list of [`DerivativeSpec`]s. Workers walk
//! the list in order, so the order here is also the order in which files
//! appear on disk for a given item.
//!
//! ## Stock tables
//!
//! ```text
//! photo:  t50 t100 t200          (thumbnail, square)
//!         f200 f300 f500 f1000 f2000   (fit box)
//! avatar: 25 50 75 200           (thumbnail, square)
//! ```
//!
//! Tables may be overridden from `lightbox.toml` but are frozen once the
//! pipeline starts.

use crate::paths::ORIGINAL_SUFFIX;
use crate::types::MediaClass;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// A size table that cannot be written without ambiguity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SizeError {
    #[error("sizes.{0} must not be empty")]
    EmptyTable(MediaClass),
    #[error("sizes.{class}: {width}x{height} for suffix {suffix:?} must be non-zero")]
    ZeroDimension {
        class: MediaClass,
        suffix: String,
        width: u32,
        height: u32,
    },
    #[error("sizes.{class}: suffix {suffix:?} must be lowercase alphanumeric")]
    InvalidSuffix { class: MediaClass, suffix: String },
    #[error("sizes.{0}: suffix \"o\" is reserved for originals")]
    ReservedSuffix(MediaClass),
    #[error("sizes.{class}: duplicate suffix {suffix:?}")]
    DuplicateSuffix { class: MediaClass, suffix: String },
}

/// How a derivative is fitted into its target box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeMode {
    /// Center-crop to the box's aspect ratio, then scale to exactly `width × height`.
    Thumbnail,
    /// Scale to fit inside the box, preserving aspect ratio. Never crops.
    Fit,
}

impl fmt::Display for ResizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResizeMode::Thumbnail => f.write_str("thumbnail"),
            ResizeMode::Fit => f.write_str("fit"),
        }
    }
}

/// One derivative to produce for every item of a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DerivativeSpec {
    pub width: u32,
    pub height: u32,
    pub mode: ResizeMode,
    pub suffix: String,
}

impl DerivativeSpec {
    pub fn new(width: u32, height: u32, mode: ResizeMode, suffix: &str) -> Self {
        Self {
            width,
            height,
            mode,
            suffix: suffix.to_string(),
        }
    }

    pub fn thumbnail(width: u32, height: u32, suffix: &str) -> Self {
        Self::new(width, height, ResizeMode::Thumbnail, suffix)
    }

    pub fn fit(width: u32, height: u32, suffix: &str) -> Self {
        Self::new(width, height, ResizeMode::Fit, suffix)
    }
}

/// The per-class derivative tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SizeTables {
    pub photo: Vec<DerivativeSpec>,
    pub avatar: Vec<DerivativeSpec>,
}

impl Default for SizeTables {
    fn default() -> Self {
        Self {
            photo: stock_photo_sizes(),
            avatar: stock_avatar_sizes(),
        }
    }
}

impl SizeTables {
    pub fn for_class(&self, class: MediaClass) -> &[DerivativeSpec] {
        match class {
            MediaClass::Photo => &self.photo,
            MediaClass::Avatar => &self.avatar,
        }
    }

    /// Check that every table can be written without path collisions.
    ///
    /// Reports the first problem found.
    pub fn validate(&self) -> Result<(), SizeError> {
        for class in MediaClass::ALL {
            validate_table(class, self.for_class(class))?;
        }
        Ok(())
    }
}

fn validate_table(class: MediaClass, table: &[DerivativeSpec]) -> Result<(), SizeError> {
    if table.is_empty() {
        return Err(SizeError::EmptyTable(class));
    }
    let mut seen = HashSet::new();
    for spec in table {
        if spec.width == 0 || spec.height == 0 {
            return Err(SizeError::ZeroDimension {
                class,
                suffix: spec.suffix.clone(),
                width: spec.width,
                height: spec.height,
            });
        }
        let well_formed = !spec.suffix.is_empty()
            && spec
                .suffix
                .bytes()
                .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase());
        if !well_formed {
            return Err(SizeError::InvalidSuffix {
                class,
                suffix: spec.suffix.clone(),
            });
        }
        if spec.suffix == ORIGINAL_SUFFIX {
            return Err(SizeError::ReservedSuffix(class));
        }
        if !seen.insert(spec.suffix.as_str()) {
            return Err(SizeError::DuplicateSuffix {
                class,
                suffix: spec.suffix.clone(),
            });
        }
    }
    Ok(())
}

pub fn stock_photo_sizes() -> Vec<DerivativeSpec> {
    vec![
        DerivativeSpec::thumbnail(50, 50, "t50"),
        DerivativeSpec::thumbnail(100, 100, "t100"),
        DerivativeSpec::thumbnail(200, 200, "t200"),
        DerivativeSpec::fit(200, 200, "f200"),
        DerivativeSpec::fit(300, 300, "f300"),
        DerivativeSpec::fit(500, 500, "f500"),
        DerivativeSpec::fit(1000, 1000, "f1000"),
        DerivativeSpec::fit(2000, 2000, "f2000"),
    ]
}

pub fn stock_avatar_sizes() -> Vec<DerivativeSpec> {
    vec![
        DerivativeSpec::thumbnail(25, 25, "25"),
        DerivativeSpec::thumbnail(50, 50, "50"),
        DerivativeSpec::thumbnail(75, 75, "75"),
        DerivativeSpec::thumbnail(200, 200, "200"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_tables_are_valid() {
        SizeTables::default().validate().unwrap();
    }

    #[test]
    fn stock_photo_table_order() {
        let suffixes: Vec<String> = stock_photo_sizes().into_iter().map(|s| s.suffix).collect();
        assert_eq!(
            suffixes,
            ["t50", "t100", "t200", "f200", "f300", "f500", "f1000", "f2000"]
        );
    }

    #[test]
    fn avatar_table_is_all_thumbnails() {
        assert!(
            stock_avatar_sizes()
                .iter()
                .all(|s| s.mode == ResizeMode::Thumbnail && s.width == s.height)
        );
    }

    #[test]
    fn for_class_selects_table() {
        let tables = SizeTables::default();
        assert_eq!(tables.for_class(MediaClass::Photo).len(), 8);
        assert_eq!(tables.for_class(MediaClass::Avatar).len(), 4);
    }

    #[test]
    fn rejects_empty_table() {
        let tables = SizeTables {
            avatar: vec![],
            ..Default::default()
        };
        let err = tables.validate().unwrap_err();
        assert_eq!(err, SizeError::EmptyTable(MediaClass::Avatar));
        assert_eq!(err.to_string(), "sizes.avatar must not be empty");
    }

    #[test]
    fn rejects_zero_dimensions() {
        let tables = SizeTables {
            photo: vec![DerivativeSpec::fit(0, 100, "f0")],
            ..Default::default()
        };
        assert!(matches!(
            tables.validate(),
            Err(SizeError::ZeroDimension { width: 0, height: 100, .. })
        ));
    }

    #[test]
    fn rejects_reserved_original_suffix() {
        let tables = SizeTables {
            photo: vec![DerivativeSpec::fit(100, 100, "o")],
            ..Default::default()
        };
        assert_eq!(
            tables.validate(),
            Err(SizeError::ReservedSuffix(MediaClass::Photo))
        );
    }

    #[test]
    fn rejects_duplicate_suffix() {
        let tables = SizeTables {
            photo: vec![
                DerivativeSpec::fit(100, 100, "x"),
                DerivativeSpec::thumbnail(50, 50, "x"),
            ],
            ..Default::default()
        };
        assert_eq!(
            tables.validate(),
            Err(SizeError::DuplicateSuffix {
                class: MediaClass::Photo,
                suffix: "x".to_string(),
            })
        );
    }

    #[test]
    fn rejects_path_unsafe_suffix() {
        for bad in ["", "../x", "T50", "a_b"] {
            let tables = SizeTables {
                photo: vec![DerivativeSpec::fit(100, 100, bad)],
                ..Default::default()
            };
            assert!(
                matches!(tables.validate(), Err(SizeError::InvalidSuffix { .. })),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn spec_deserializes_from_toml() {
        let spec: DerivativeSpec =
            toml::from_str("width = 50\nheight = 40\nmode = \"thumbnail\"\nsuffix = \"t50\"")
                .unwrap();
        assert_eq!(spec, DerivativeSpec::thumbnail(50, 40, "t50"));
    }
}
