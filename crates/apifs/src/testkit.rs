//! In-memory remote collections for tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use reqwest::StatusCode;
use serde_json::{Map, Value};

use crate::client::{ApiError, RemoteCollection, Resource};

/// A [`RemoteCollection`] held in memory that counts every call
#[derive(Debug, Default)]
pub struct FakeCollection {
    name: String,
    resources: Mutex<Vec<Resource>>,
    created: Mutex<Vec<Map<String, Value>>>,
    list_calls: AtomicUsize,
    get_calls: AtomicUsize,
    fail_next_create: AtomicBool,
}

impl FakeCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_resources(self, resources: Vec<Resource>) -> Self {
        *self.resources.lock().unwrap() = resources;
        self
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    /// Parameters of every successful create, in call order
    pub fn created(&self) -> Vec<Map<String, Value>> {
        self.created.lock().unwrap().clone()
    }

    /// Make the next `create` answer with a server error
    pub fn fail_next_create(&self) {
        self.fail_next_create.store(true, Ordering::SeqCst);
    }
}

impl RemoteCollection for FakeCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn list(&self) -> Result<Vec<Resource>, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.resources.lock().unwrap().clone())
    }

    fn get(&self, id: &str) -> Result<Resource, ApiError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.resources
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| {
                ApiError::HttpStatus(StatusCode::NOT_FOUND, format!("{} not found", id))
            })
    }

    fn create(&self, params: Map<String, Value>) -> Result<Resource, ApiError> {
        if self.fail_next_create.swap(false, Ordering::SeqCst) {
            return Err(ApiError::HttpStatus(
                StatusCode::INTERNAL_SERVER_ERROR,
                "create failed".to_string(),
            ));
        }

        let mut resources = self.resources.lock().unwrap();
        let resource = Resource {
            id: format!("{}{}", self.name.to_uppercase(), resources.len() + 1),
            fields: params.clone(),
        };
        resources.push(resource.clone());
        self.created.lock().unwrap().push(params);
        Ok(resource)
    }
}
