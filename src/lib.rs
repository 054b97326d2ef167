//! Content-addressed tag store for wallpapers and other asset files.
//!
//! Assets are identified by the SHA-256 of their bytes, so a file keeps its
//! tags across renames as long as the store is reconciled by hash.

pub mod database;
pub mod error;
pub mod ingest;
pub mod utils;
pub mod wallpaper;

pub use database::repo::{TagStore, TagSummary};
pub use error::{Result, StoreError};
pub use utils::config::StoreConfig;
pub use wallpaper::Wallpaper;
