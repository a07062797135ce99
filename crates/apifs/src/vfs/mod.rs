//! Path-level view of the remote API
//!
//! # Architecture
//!
//! - `NamespaceRouter`: the root directory, one entry per configured collection
//! - `CollectionDir`: one collection's directory, objects as files plus the
//!   `_create` pseudo-file
//! - `ExpiringCache`: TTL cache in front of the remote calls
//!
//! Both directory types implement [`ApiNode`], the six path queries a
//! filesystem bridge needs. Paths are `/`-rooted and relative to the node.

mod cache;
mod collection;
mod router;

use std::sync::Arc;

pub use cache::{ExpiringCache, DEFAULT_TTL, MAX_TTL};
pub use collection::{CollectionDir, COLLECTION_TTL};
pub use router::NamespaceRouter;

use crate::error::FsResult;

/// Reserved file name whose write creates an object
pub const CREATE_FILE: &str = "_create";

/// Path queries answered by every directory in the tree
///
/// Existence predicates answer `Ok(false)` for unknown paths; an `Err` means
/// the remote API could not be asked.
pub trait ApiNode: Send + Sync {
    /// Names directly under `path`
    fn entries(&self, path: &str) -> FsResult<Vec<String>>;

    fn is_file(&self, path: &str) -> FsResult<bool>;

    fn is_directory(&self, path: &str) -> FsResult<bool>;

    fn can_write(&self, path: &str) -> FsResult<bool>;

    fn read(&self, path: &str) -> FsResult<Arc<Vec<u8>>>;

    /// Replace the content at `path` in one shot
    fn write(&self, path: &str, content: &[u8]) -> FsResult<()>;
}

/// Normalize a path to a consistent format
///
/// Leading slash, no trailing slash, `/` for the root.
pub fn normalize_path(path: &str) -> String {
    let path = path.trim();
    if path.is_empty() || path == "/" {
        return "/".to_string();
    }

    let mut normalized = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };

    while normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }

    normalized
}

/// Split a normalized path into its first segment and the rest
///
/// The remainder keeps its leading slash and is empty when the path names
/// the first segment itself.
pub fn split_path(path: &str) -> (&str, &str) {
    let path = path.strip_prefix('/').unwrap_or(path);
    match path.find('/') {
        Some(pos) => (&path[..pos], &path[pos..]),
        None => (path, ""),
    }
}
