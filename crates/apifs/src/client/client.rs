use reqwest::{header::HeaderMap, header::HeaderValue, Client};
use serde_json::{Map, Value};
use url::Url;

use super::error::ApiError;
use super::requests::{
    unwrap_resource, unwrap_resources, CreateRequest, GetRequest, ListRequest,
};
use super::resource::Resource;
use super::ApiRequest;
use crate::config::ApiConfig;

#[derive(Debug, Clone)]
pub struct ApiClient {
    pub remote: Url,
    list_limit: Option<u32>,
    client: Client,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, access_token: &str) -> Result<Self, ApiError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        default_headers.insert("Accept", HeaderValue::from_static("application/json"));
        default_headers.insert(
            "GoCardless-Version",
            HeaderValue::from_str(&config.version)
                .map_err(|_| ApiError::InvalidHeader("GoCardless-Version"))?,
        );
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", access_token))
            .map_err(|_| ApiError::InvalidHeader("Authorization"))?;
        auth.set_sensitive(true);
        default_headers.insert("Authorization", auth);

        let client = Client::builder().default_headers(default_headers).build()?;

        Ok(Self {
            remote: config.base_url()?,
            list_limit: config.list_limit,
            client,
        })
    }

    pub async fn call<T: ApiRequest>(&self, request: T) -> Result<T::Response, ApiError> {
        let request_builder = request.build_request(&self.remote, &self.client)?;
        let response = request_builder.send().await?;

        if response.status().is_success() {
            Ok(response.json::<T::Response>().await?)
        } else {
            Err(ApiError::HttpStatus(
                response.status(),
                response.text().await?,
            ))
        }
    }

    /// List the first page of a collection
    pub async fn list(&self, collection: &str) -> Result<Vec<Resource>, ApiError> {
        let request = ListRequest {
            collection: collection.to_string(),
            limit: self.list_limit,
        };
        let envelope = self.call(request).await?;
        unwrap_resources(collection, envelope)
    }

    /// Fetch a single resource by id
    pub async fn get(&self, collection: &str, id: &str) -> Result<Resource, ApiError> {
        let request = GetRequest {
            collection: collection.to_string(),
            id: id.to_string(),
        };
        let envelope = self.call(request).await?;
        unwrap_resource(collection, envelope)
    }

    /// Create a resource from raw parameters
    pub async fn create(
        &self,
        collection: &str,
        params: Map<String, Value>,
    ) -> Result<Resource, ApiError> {
        let request = CreateRequest {
            collection: collection.to_string(),
            params,
        };
        let envelope = self.call(request).await?;
        unwrap_resource(collection, envelope)
    }
}
