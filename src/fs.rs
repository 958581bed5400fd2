// ABOUTME: Thin filesystem stat helpers, an external collaborator of the framing layer
// ABOUTME: Projects std::fs::Metadata instead of reproducing the original uv_stat_t layout

use std::path::Path;
use std::time::SystemTime;

use crate::error::Result;

/// A projection of filesystem metadata, deliberately narrower than the
/// original `StatData` (device/inode/links/uid/gid/block counts): those
/// fields mirror `libuv`'s `uv_stat_t` C layout and have no idiomatic Rust
/// counterpart worth exposing when `std::fs::Metadata` already covers what
/// this crate's callers need.
#[derive(Debug, Clone, Copy)]
pub struct StatData {
    pub size: u64,
    pub is_regular_file: bool,
    pub is_directory: bool,
    pub modified: Option<SystemTime>,
}

impl From<std::fs::Metadata> for StatData {
    fn from(metadata: std::fs::Metadata) -> Self {
        Self {
            size: metadata.len(),
            is_regular_file: metadata.is_file(),
            is_directory: metadata.is_dir(),
            modified: metadata.modified().ok(),
        }
    }
}

/// Stat a path, following symlinks. Returns a transport-style error
/// (`FramedError::Transport`, wrapping `io::ErrorKind::NotFound` etc.) when
/// the path doesn't exist or isn't accessible.
pub async fn stat(path: impl AsRef<Path>) -> Result<StatData> {
    let metadata = tokio::fs::metadata(path).await?;
    Ok(StatData::from(metadata))
}

/// Stat an already-open file (the `fstat` equivalent): avoids the race
/// between checking a path and acting on it that a second `stat` call by
/// path would have.
pub async fn stat_file(file: &tokio::fs::File) -> Result<StatData> {
    let metadata = file.metadata().await?;
    Ok(StatData::from(metadata))
}
