use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Response};
use tracing::debug;

use crate::credentials::CredentialStore;
use crate::dispatch::ApiRequest;
use crate::errors::Error;

const USER_AGENT: &str = "eventcal-client-rust-sdk/0.1.0";

/// Thin wrapper over the HTTP client.
///
/// The dispatcher resolves the request path against the base URL, attaches
/// the bearer credential currently in the store, and sends. It never looks at
/// response status beyond logging it, and it never touches refresh state;
/// that is the coordinator's job.
#[derive(Clone)]
pub struct Dispatcher {
    http: Client,
    base_url: String,
    credentials: Arc<CredentialStore>,
}

impl Dispatcher {
    pub fn new(
        base_url: String,
        credentials: Arc<CredentialStore>,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let http = Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .build()?;
        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    /// Send one request and hand back whatever response the backend produced,
    /// success or failure status alike. Only transport-level problems
    /// (connect, timeout) come back as errors.
    pub async fn dispatch(&self, request: &ApiRequest) -> Result<Response, Error> {
        let url = if request.path.starts_with('/') {
            format!("{}{}", self.base_url, request.path)
        } else {
            format!("{}/{}", self.base_url, request.path)
        };

        let mut builder = self
            .http
            .request(request.method.clone(), &url)
            .header("User-Agent", USER_AGENT);

        if let Some(token) = self.credentials.get() {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        debug!(
            method = %request.method,
            path = %request.path,
            status = %response.status(),
            retried = request.retried(),
            "dispatch.complete"
        );
        Ok(response)
    }
}
