use std::sync::Arc;
use std::time::Duration;

use super::collection::CollectionDir;
use super::{normalize_path, split_path, ApiNode};
use crate::client::RemoteCollection;
use crate::error::{FsError, FsResult};

/// Root directory of the mount
///
/// Owns a fixed, ordered set of named directories. Every query below `/` is
/// routed by its first segment; the rest of the path is passed through
/// unchanged, empty when the query targets the directory itself.
#[derive(Default)]
pub struct NamespaceRouter {
    collections: Vec<(String, Box<dyn ApiNode>)>,
}

impl NamespaceRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one [`CollectionDir`] per remote, in the given order
    pub fn from_remotes(remotes: Vec<Arc<dyn RemoteCollection>>, ttl: Duration) -> Self {
        remotes.into_iter().fold(Self::new(), |router, remote| {
            let name = remote.name().to_string();
            router.with_node(name, CollectionDir::new(remote, ttl))
        })
    }

    /// Mount `node` at `/<name>`
    ///
    /// A later node with an already used name replaces the earlier one in place.
    pub fn with_node(mut self, name: impl Into<String>, node: impl ApiNode + 'static) -> Self {
        let name = name.into();
        let node: Box<dyn ApiNode> = Box::new(node);
        match self.collections.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = node,
            None => self.collections.push((name, node)),
        }
        self
    }

    /// Configured names, in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.collections.iter().map(|(name, _)| name.as_str())
    }

    fn node(&self, name: &str) -> Option<&dyn ApiNode> {
        self.collections
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, node)| node.as_ref())
    }

    /// Resolve a path to its directory and the remainder below it
    fn resolve<'a>(&self, path: &'a str) -> Option<(&dyn ApiNode, &'a str)> {
        let (first, rest) = split_path(path);
        self.node(first).map(|node| (node, rest))
    }

    fn resolve_or_not_found<'a>(&self, path: &'a str) -> FsResult<(&dyn ApiNode, &'a str)> {
        self.resolve(path)
            .ok_or_else(|| FsError::NotFound(path.to_string()))
    }
}

impl ApiNode for NamespaceRouter {
    fn entries(&self, path: &str) -> FsResult<Vec<String>> {
        let path = normalize_path(path);
        if path == "/" {
            return Ok(self.names().map(str::to_string).collect());
        }
        let (node, rest) = self.resolve_or_not_found(&path)?;
        node.entries(rest)
    }

    fn is_file(&self, path: &str) -> FsResult<bool> {
        let path = normalize_path(path);
        if path == "/" {
            return Ok(false);
        }
        match self.resolve(&path) {
            Some((node, rest)) => node.is_file(rest),
            None => Ok(false),
        }
    }

    fn is_directory(&self, path: &str) -> FsResult<bool> {
        let path = normalize_path(path);
        if path == "/" {
            return Ok(true);
        }
        match self.resolve(&path) {
            Some((_, "")) => Ok(true),
            Some((node, rest)) => node.is_directory(rest),
            None => Ok(false),
        }
    }

    fn can_write(&self, path: &str) -> FsResult<bool> {
        let path = normalize_path(path);
        match self.resolve(&path) {
            Some((_, "")) | None => Ok(false),
            Some((node, rest)) => node.can_write(rest),
        }
    }

    fn read(&self, path: &str) -> FsResult<Arc<Vec<u8>>> {
        let path = normalize_path(path);
        let (node, rest) = self.resolve_or_not_found(&path)?;
        node.read(rest)
    }

    fn write(&self, path: &str, content: &[u8]) -> FsResult<()> {
        let path = normalize_path(path);
        tracing::debug!(path = %path, bytes = content.len(), "write");
        let (node, rest) = self.resolve_or_not_found(&path)?;
        node.write(rest, content)
    }
}

impl std::fmt::Debug for NamespaceRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespaceRouter")
            .field("collections", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::client::Resource;
    use crate::testkit::FakeCollection;
    use crate::vfs::COLLECTION_TTL;

    fn setup() -> (Arc<FakeCollection>, Arc<FakeCollection>, NamespaceRouter) {
        let customers = Arc::new(
            FakeCollection::new("customers").with_resources(vec![Resource::new("CU1")]),
        );
        let payments = Arc::new(
            FakeCollection::new("payments").with_resources(vec![Resource::new("PM1")]),
        );
        let remotes: Vec<Arc<dyn RemoteCollection>> = vec![customers.clone(), payments.clone()];
        let router = NamespaceRouter::from_remotes(remotes, COLLECTION_TTL);
        (customers, payments, router)
    }

    #[test]
    fn test_root_entries_in_configured_order() {
        let (_, _, router) = setup();
        assert_eq!(router.entries("/").unwrap(), ["customers", "payments"]);
    }

    #[test]
    fn test_root_is_a_directory() {
        let (_, _, router) = setup();
        assert!(router.is_directory("/").unwrap());
        assert!(!router.is_file("/").unwrap());
        assert!(!router.can_write("/").unwrap());
    }

    #[test]
    fn test_collection_is_a_read_only_directory() {
        let (customers, _, router) = setup();
        assert!(router.is_directory("/customers").unwrap());
        assert!(router.is_directory("/customers/").unwrap());
        assert!(!router.is_file("/customers").unwrap());
        assert!(!router.can_write("/customers").unwrap());
        assert_eq!(customers.list_calls(), 0);
    }

    #[test]
    fn test_unknown_collection() {
        let (customers, payments, router) = setup();
        assert!(!router.is_directory("/unknown").unwrap());
        assert!(!router.is_file("/unknown").unwrap());
        assert!(!router.is_file("/unknown/CU1").unwrap());
        assert!(!router.can_write("/unknown/_create").unwrap());
        assert!(matches!(router.entries("/unknown"), Err(FsError::NotFound(_))));
        assert!(matches!(router.read("/unknown/CU1"), Err(FsError::NotFound(_))));
        assert!(matches!(
            router.write("/unknown/_create", b"{}"),
            Err(FsError::NotFound(_))
        ));
        assert_eq!(customers.list_calls() + payments.list_calls(), 0);
    }

    #[test]
    fn test_root_read_is_not_found() {
        let (_, _, router) = setup();
        assert!(matches!(router.read("/"), Err(FsError::NotFound(_))));
    }

    #[test]
    fn test_delegates_to_collection() {
        let (_, payments, router) = setup();
        assert_eq!(router.entries("/payments").unwrap(), ["PM1", "_create"]);
        assert!(router.is_file("/payments/PM1").unwrap());
        assert!(!router.is_directory("/payments/PM1").unwrap());
        assert!(router.can_write("/payments/_create").unwrap());
        assert!(!router.can_write("/payments/PM1").unwrap());
        assert_eq!(payments.list_calls(), 1);
    }

    #[test]
    fn test_write_routes_to_matching_collection() {
        let (customers, payments, router) = setup();
        router.entries("/customers").unwrap();

        router
            .write("/customers/_create", br#"{"email":"a@example.com"}"#)
            .unwrap();

        assert_eq!(customers.created().len(), 1);
        assert!(payments.created().is_empty());

        router.entries("/customers").unwrap();
        assert_eq!(customers.list_calls(), 2);
    }

    #[test]
    fn test_relative_paths_are_normalized() {
        let (_, _, router) = setup();
        assert!(router.is_directory("customers").unwrap());
        assert!(router.is_file("customers/CU1").unwrap());
    }

    #[test]
    fn test_duplicate_name_replaces_node() {
        let first = Arc::new(FakeCollection::new("events"));
        let second = Arc::new(
            FakeCollection::new("events").with_resources(vec![Resource::new("EV1")]),
        );
        let remotes: Vec<Arc<dyn RemoteCollection>> = vec![first.clone(), second];
        let router = NamespaceRouter::from_remotes(remotes, COLLECTION_TTL);

        assert_eq!(router.entries("/").unwrap(), ["events"]);
        assert_eq!(router.entries("/events").unwrap(), ["EV1", "_create"]);
        assert_eq!(first.list_calls(), 0);
    }
}
