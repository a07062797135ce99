use std::fmt::Debug;

use serde_json::{Map, Value};
use tokio::runtime::Handle;

use super::{ApiClient, ApiError, Resource};

/// The three calls a collection directory needs from the remote API
///
/// Calls block until the API answers. Errors are returned as-is; nothing is
/// retried at this layer.
pub trait RemoteCollection: Send + Sync + Debug + 'static {
    /// Collection name, e.g. `customers`
    fn name(&self) -> &str;

    fn list(&self) -> Result<Vec<Resource>, ApiError>;

    fn get(&self, id: &str) -> Result<Resource, ApiError>;

    fn create(&self, params: Map<String, Value>) -> Result<Resource, ApiError>;
}

/// [`RemoteCollection`] backed by the HTTP [`ApiClient`]
///
/// FUSE callbacks are synchronous, so each call is driven to completion on
/// the given runtime. Must not be called from inside that runtime's worker
/// threads.
#[derive(Debug, Clone)]
pub struct HttpCollection {
    name: String,
    client: ApiClient,
    runtime: Handle,
}

impl HttpCollection {
    pub fn new(name: impl Into<String>, client: ApiClient, runtime: Handle) -> Self {
        Self {
            name: name.into(),
            client,
            runtime,
        }
    }
}

impl RemoteCollection for HttpCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn list(&self) -> Result<Vec<Resource>, ApiError> {
        tracing::debug!(collection = %self.name, "listing");
        self.runtime.block_on(self.client.list(&self.name))
    }

    fn get(&self, id: &str) -> Result<Resource, ApiError> {
        tracing::debug!(collection = %self.name, id, "fetching");
        self.runtime.block_on(self.client.get(&self.name, id))
    }

    fn create(&self, params: Map<String, Value>) -> Result<Resource, ApiError> {
        tracing::debug!(collection = %self.name, "creating");
        self.runtime.block_on(self.client.create(&self.name, params))
    }
}
