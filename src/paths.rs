//! On-disk layout for originals and derivatives.
//!
//! The same resolver is used by the workers (to write) and by whatever serves
//! `storage_root` over HTTP (to read), so the layout below is effectively a
//! wire format:
//!
//! ```text
//! <root>/
//! ├── photos/
//! │   ├── 42_k3v9...q1_o.jpg       # original (suffix "o")
//! │   ├── 42_k3v9...q1_t50.jpg     # derivative
//! │   └── ...
//! └── avatars/
//!     ├── default_25.jpg           # placeholder family, no identity
//!     ├── 7_o.jpg
//!     ├── 7_25.jpg
//!     └── ...
//! ```
//!
//! Avatar paths carry only the account id; the token is used for photos.

use crate::sizes::DerivativeSpec;
use crate::types::{MediaClass, MediaId, MediaItem, Token};
use std::path::{Path, PathBuf};

/// Suffix under which the uploaded original is stored.
pub const ORIGINAL_SUFFIX: &str = "o";

const PHOTOS_DIR: &str = "photos";
const AVATARS_DIR: &str = "avatars";

#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding every file for a class.
    pub fn class_dir(&self, class: MediaClass) -> PathBuf {
        self.root.join(class_dir_name(class))
    }

    /// Root-relative path, `/`-separated, suitable for embedding in URLs.
    pub fn relative_path(
        &self,
        class: MediaClass,
        id: MediaId,
        token: &Token,
        suffix: &str,
    ) -> String {
        let file = match class {
            MediaClass::Photo => format!("{id}_{token}_{suffix}.jpg"),
            MediaClass::Avatar => format!("{id}_{suffix}.jpg"),
        };
        format!("{}/{file}", class_dir_name(class))
    }

    pub fn path_for(&self, class: MediaClass, id: MediaId, token: &Token, suffix: &str) -> PathBuf {
        self.root.join(self.relative_path(class, id, token, suffix))
    }

    pub fn original_path(&self, item: &MediaItem) -> PathBuf {
        self.path_for(item.class, item.id, &item.token, ORIGINAL_SUFFIX)
    }

    pub fn derivative_path(&self, item: &MediaItem, spec: &DerivativeSpec) -> PathBuf {
        self.path_for(item.class, item.id, &item.token, &spec.suffix)
    }

    /// Avatar file for an account. Avatars are addressed by id alone.
    pub fn avatar_path(&self, id: MediaId, suffix: &str) -> PathBuf {
        self.class_dir(MediaClass::Avatar)
            .join(format!("{id}_{suffix}.jpg"))
    }

    /// Placeholder avatar for a suffix, shared by every new account.
    pub fn default_avatar_path(&self, suffix: &str) -> PathBuf {
        self.class_dir(MediaClass::Avatar)
            .join(format!("default_{suffix}.jpg"))
    }
}

fn class_dir_name(class: MediaClass) -> &'static str {
    match class {
        MediaClass::Photo => PHOTOS_DIR,
        MediaClass::Avatar => AVATARS_DIR,
    }
}
