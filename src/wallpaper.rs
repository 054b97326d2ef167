use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use serde::Serialize;

use crate::error::{Result, StoreError};
use crate::ingest::hasher;

/// A tracked file: where it was last seen, what it contains, and its tags.
///
/// `hash` is the identity; `path` is informational and may go stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Wallpaper {
    pub path: PathBuf,
    pub hash: String,
    pub tags: Vec<String>,
}

impl Wallpaper {
    /// Builds a wallpaper from a file on disk, hashing its current contents.
    pub fn new<P: AsRef<Path>>(path: P, tags: Vec<String>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(StoreError::AssetNotFound(path.display().to_string()));
        }
        let hash = hasher::calculate_hash(path)?;
        Ok(Self { path: path.to_path_buf(), hash, tags })
    }

    /// Tag names with duplicates collapsed, in lexical order.
    pub fn tag_set(&self) -> BTreeSet<&str> {
        self.tags.iter().map(String::as_str).collect()
    }
}

impl fmt::Display for Wallpaper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags: Vec<&str> = self.tag_set().into_iter().collect();
        write!(f, "{} : {}", self.path.display(), tags.join(", "))
    }
}
