//! describe one API call so it can be dispatched, queued, and replayed

use reqwest::Method;

/// A single API call in a form the dispatcher can send and the refresh
/// coordinator can hold onto and send again.
///
/// The `retried` flag records whether this request already went through one
/// refresh-and-replay cycle. A replayed request that fails the auth check a
/// second time is surfaced as an error instead of queueing again.
#[derive(Clone, Debug)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<serde_json::Value>,
    pub headers: Vec<(String, String)>,
    retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: Vec::new(),
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        let mut request = Self::new(Method::POST, path);
        request.body = Some(body);
        request
    }

    pub fn put(path: impl Into<String>, body: serde_json::Value) -> Self {
        let mut request = Self::new(Method::PUT, path);
        request.body = Some(body);
        request
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Whether this request is the replay of an earlier auth failure.
    pub fn retried(&self) -> bool {
        self.retried
    }

    /// Mark the request as a replay. Everything else about it is unchanged.
    pub(crate) fn into_retried(mut self) -> Self {
        self.retried = true;
        self
    }
}
