//! Typed requests against a collection endpoint
//!
//! Every request and response body is wrapped in an envelope object keyed by
//! the collection name, e.g. `{"customers": {...}}`.

use reqwest::{Client, RequestBuilder};
use serde_json::{Map, Value};
use url::Url;

use super::error::ApiError;
use super::resource::Resource;
use super::ApiRequest;

/// `GET /<collection>`
#[derive(Debug, Clone)]
pub struct ListRequest {
    pub collection: String,
    pub limit: Option<u32>,
}

/// `GET /<collection>/<id>`
#[derive(Debug, Clone)]
pub struct GetRequest {
    pub collection: String,
    pub id: String,
}

/// `POST /<collection>`
#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub collection: String,
    pub params: Map<String, Value>,
}

/// Raw decoded response body, still wrapped in its envelope
pub type Envelope = Map<String, Value>;

/// Build `<base>/<segments...>` with each segment percent-encoded
pub(crate) fn endpoint(base_url: &Url, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url = base_url.clone();
    url.path_segments_mut()
        .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

impl ApiRequest for ListRequest {
    type Response = Envelope;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let url = endpoint(base_url, &[&self.collection])?;
        let mut request = client.get(url);
        if let Some(limit) = self.limit {
            request = request.query(&[("limit", limit)]);
        }
        Ok(request)
    }
}

impl ApiRequest for GetRequest {
    type Response = Envelope;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let url = endpoint(base_url, &[&self.collection, &self.id])?;
        Ok(client.get(url))
    }
}

impl ApiRequest for CreateRequest {
    type Response = Envelope;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let url = endpoint(base_url, &[&self.collection])?;
        let mut body = Map::new();
        body.insert(self.collection, Value::Object(self.params));
        Ok(client.post(url).json(&body))
    }
}

/// Unwrap a single resource from `{"<collection>": {...}}`
pub fn unwrap_resource(collection: &str, mut envelope: Envelope) -> Result<Resource, ApiError> {
    let inner = envelope
        .remove(collection)
        .ok_or_else(|| ApiError::MissingEnvelope(collection.to_string()))?;
    Ok(serde_json::from_value(inner)?)
}

/// Unwrap a resource page from `{"<collection>": [...], "meta": {...}}`
pub fn unwrap_resources(collection: &str, mut envelope: Envelope) -> Result<Vec<Resource>, ApiError> {
    let inner = envelope
        .remove(collection)
        .ok_or_else(|| ApiError::MissingEnvelope(collection.to_string()))?;
    Ok(serde_json::from_value(inner)?)
}
