//! HTTP client for the remote resource API

#[allow(clippy::module_inception)]
mod client;
mod error;
mod remote;
pub mod requests;
mod resource;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use url::Url;

pub use client::ApiClient;
pub use error::ApiError;
pub use remote::{HttpCollection, RemoteCollection};
pub use resource::Resource;

/// A request that knows how to build itself against an API base URL
pub trait ApiRequest {
    type Response: DeserializeOwned;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError>;
}
