//! One remote collection exposed as a flat directory
//!
//! ```text
//! /            -> CU001  CU002  _create
//! /CU001       -> {"id":"CU001","email":...}
//! /_create     -> write a JSON object here to create one
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};

use super::cache::ExpiringCache;
use super::{ApiNode, CREATE_FILE};
use crate::client::{RemoteCollection, Resource};
use crate::error::{FsError, FsResult};

/// Default TTL for collection listings and object bodies
pub const COLLECTION_TTL: Duration = Duration::from_secs(60);

/// Cache key of the collection listing
const LIST_KEY: &str = "_list";

/// Directory over a single [`RemoteCollection`]
///
/// Caches the listing under `_list` and each object body under its path, both
/// with the same TTL. A successful create drops the created path and the
/// listing; the two drops are independent, so a concurrent reader may briefly
/// see one refreshed and not the other.
pub struct CollectionDir {
    remote: Arc<dyn RemoteCollection>,
    listing: ExpiringCache<Arc<Vec<Resource>>>,
    documents: ExpiringCache<Arc<Vec<u8>>>,
}

impl CollectionDir {
    pub fn new(remote: Arc<dyn RemoteCollection>, ttl: Duration) -> Self {
        Self {
            remote,
            listing: ExpiringCache::new(ttl),
            documents: ExpiringCache::new(ttl),
        }
    }

    pub fn name(&self) -> &str {
        self.remote.name()
    }

    /// Current listing, from cache when fresh
    fn list(&self) -> FsResult<Arc<Vec<Resource>>> {
        let remote = &self.remote;
        let listing = self
            .listing
            .try_get(LIST_KEY, || remote.list().map(Arc::new))?;
        Ok(listing)
    }

    /// Object id named by `/<id>`, if the path has that shape
    fn object_id(path: &str) -> Option<&str> {
        let id = path.strip_prefix('/')?;
        if id.is_empty() || id.contains('/') {
            None
        } else {
            Some(id)
        }
    }

    fn is_create_path(path: &str) -> bool {
        Self::object_id(path) == Some(CREATE_FILE)
    }
}

impl ApiNode for CollectionDir {
    fn entries(&self, _path: &str) -> FsResult<Vec<String>> {
        let listing = self.list()?;
        let mut names: Vec<String> = listing.iter().map(|r| r.id.clone()).collect();
        names.push(CREATE_FILE.to_string());
        Ok(names)
    }

    fn is_file(&self, path: &str) -> FsResult<bool> {
        if Self::is_create_path(path) {
            return Ok(true);
        }
        let Some(id) = Self::object_id(path) else {
            return Ok(false);
        };
        Ok(self.list()?.iter().any(|r| r.id == id))
    }

    fn is_directory(&self, _path: &str) -> FsResult<bool> {
        Ok(false)
    }

    fn can_write(&self, path: &str) -> FsResult<bool> {
        Ok(Self::is_create_path(path))
    }

    fn read(&self, path: &str) -> FsResult<Arc<Vec<u8>>> {
        if Self::is_create_path(path) {
            return Ok(Arc::new(Vec::new()));
        }
        let id = Self::object_id(path).ok_or_else(|| FsError::NotFound(path.to_string()))?;

        let remote = &self.remote;
        let body = self.documents.try_get(path, || {
            let resource = remote.get(id)?;
            Ok::<_, crate::client::ApiError>(Arc::new(resource.to_json_bytes()?))
        })?;
        Ok(body)
    }

    fn write(&self, path: &str, content: &[u8]) -> FsResult<()> {
        if content.is_empty() {
            return Ok(());
        }
        if !Self::is_create_path(path) {
            return Err(FsError::ReadOnly(path.to_string()));
        }

        let params: Map<String, Value> = serde_json::from_slice(content)?;
        let created = self.remote.create(params)?;
        tracing::info!(collection = %self.name(), id = %created.id, "created object");

        self.documents.invalidate(path);
        self.listing.invalidate(LIST_KEY);
        Ok(())
    }
}

impl std::fmt::Debug for CollectionDir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionDir")
            .field("name", &self.name())
            .field("listing", &self.listing)
            .field("documents", &self.documents)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::testkit::FakeCollection;

    fn setup() -> (Arc<FakeCollection>, CollectionDir) {
        let fake = Arc::new(FakeCollection::new("customers").with_resources(vec![
            Resource::new("CU1").with_field("email", "one@example.com"),
            Resource::new("CU2").with_field("email", "two@example.com"),
        ]));
        let dir = CollectionDir::new(fake.clone(), COLLECTION_TTL);
        (fake, dir)
    }

    #[test]
    fn test_entries_lists_ids_then_create() {
        let (_, dir) = setup();
        assert_eq!(dir.entries("").unwrap(), ["CU1", "CU2", "_create"]);
    }

    #[test]
    fn test_listing_is_cached() {
        let (fake, dir) = setup();
        dir.entries("").unwrap();
        dir.entries("").unwrap();
        assert!(dir.is_file("/CU1").unwrap());
        assert_eq!(fake.list_calls(), 1);
    }

    #[test]
    fn test_is_file() {
        let (_, dir) = setup();
        assert!(dir.is_file("/_create").unwrap());
        assert!(dir.is_file("/CU2").unwrap());
        assert!(!dir.is_file("/CU9").unwrap());
        assert!(!dir.is_file("").unwrap());
        assert!(!dir.is_file("/CU1/nested").unwrap());
    }

    #[test]
    fn test_is_directory_is_always_false() {
        let (_, dir) = setup();
        assert!(!dir.is_directory("").unwrap());
        assert!(!dir.is_directory("/CU1").unwrap());
    }

    #[test]
    fn test_only_create_is_writable() {
        let (_, dir) = setup();
        assert!(dir.can_write("/_create").unwrap());
        assert!(!dir.can_write("/CU1").unwrap());
        assert!(!dir.can_write("").unwrap());
    }

    #[test]
    fn test_read_create_is_empty_without_remote_call() {
        let (fake, dir) = setup();
        assert!(dir.read("/_create").unwrap().is_empty());
        assert_eq!(fake.get_calls(), 0);
    }

    #[test]
    fn test_read_object_is_cached_json() {
        let (fake, dir) = setup();

        let body = dir.read("/CU1").unwrap();
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["id"], "CU1");
        assert_eq!(value["email"], "one@example.com");

        dir.read("/CU1").unwrap();
        assert_eq!(fake.get_calls(), 1);
    }

    #[test]
    fn test_read_missing_object_is_remote_error() {
        let (_, dir) = setup();
        let err = dir.read("/CU9").unwrap_err();
        assert!(matches!(err, FsError::Remote(_)));
    }

    #[test]
    fn test_read_nested_path_is_not_found() {
        let (fake, dir) = setup();
        assert!(matches!(dir.read("/CU1/x"), Err(FsError::NotFound(_))));
        assert!(matches!(dir.read(""), Err(FsError::NotFound(_))));
        assert_eq!(fake.get_calls(), 0);
    }

    #[test]
    fn test_write_creates_and_invalidates_listing() {
        let (fake, dir) = setup();
        dir.entries("").unwrap();

        dir.write("/_create", br#"{"email":"a@example.com"}"#)
            .unwrap();

        let created = fake.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0]["email"], "a@example.com");

        let entries = dir.entries("").unwrap();
        assert_eq!(fake.list_calls(), 2);
        assert_eq!(entries.len(), 4);
    }

    #[test]
    fn test_malformed_write_makes_no_remote_call() {
        let (fake, dir) = setup();
        dir.entries("").unwrap();

        let err = dir.write("/_create", b"not-json").unwrap_err();
        assert!(matches!(err, FsError::Parse(_)));
        assert!(fake.created().is_empty());

        dir.entries("").unwrap();
        assert_eq!(fake.list_calls(), 1);
    }

    #[test]
    fn test_non_object_json_is_rejected() {
        let (fake, dir) = setup();
        assert!(matches!(
            dir.write("/_create", b"[1, 2]"),
            Err(FsError::Parse(_))
        ));
        assert!(fake.created().is_empty());
    }

    #[test]
    fn test_empty_write_is_noop() {
        let (fake, dir) = setup();
        dir.entries("").unwrap();

        dir.write("/_create", b"").unwrap();

        assert!(fake.created().is_empty());
        dir.entries("").unwrap();
        assert_eq!(fake.list_calls(), 1);
    }

    #[test]
    fn test_write_to_object_is_read_only() {
        let (fake, dir) = setup();
        let err = dir.write("/CU1", b"{}").unwrap_err();
        assert!(matches!(err, FsError::ReadOnly(_)));
        assert!(fake.created().is_empty());
    }

    #[test]
    fn test_remote_create_failure_keeps_cache() {
        let (fake, dir) = setup();
        dir.entries("").unwrap();
        fake.fail_next_create();

        let err = dir.write("/_create", b"{}").unwrap_err();
        assert!(matches!(err, FsError::Remote(_)));

        dir.entries("").unwrap();
        assert_eq!(fake.list_calls(), 1);
    }

    #[test]
    fn test_listing_expires() {
        let fake = Arc::new(FakeCollection::new("events"));
        let dir = CollectionDir::new(fake.clone(), Duration::from_millis(50));

        dir.entries("").unwrap();
        std::thread::sleep(Duration::from_millis(150));
        dir.entries("").unwrap();

        assert_eq!(fake.list_calls(), 2);
    }
}
