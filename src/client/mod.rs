mod events;
mod users;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::credentials::CredentialStore;
use crate::dispatch::{ApiRequest, Dispatcher};
use crate::errors::Error;
use crate::refresh::RefreshCoordinator;

/// Client for the calendar backend.
///
/// Cheap to clone; clones share the credential store and the refresh
/// coordinator, so concurrent requests from any clone fold into the same
/// refresh cycle.
#[derive(Clone)]
pub struct CalendarClient {
    coordinator: Arc<RefreshCoordinator>,
    credentials: Arc<CredentialStore>,
    auth_retry_status: StatusCode,
}

impl CalendarClient {
    pub fn new(config: Config) -> Result<Self, Error> {
        let base_url = config.base_url()?;
        let auth_retry_status = config.auth_status()?;
        let credentials = Arc::new(CredentialStore::new());
        let dispatcher = Dispatcher::new(
            base_url,
            Arc::clone(&credentials),
            Duration::from_secs(config.timeout_secs),
        )?;
        let coordinator = Arc::new(RefreshCoordinator::new(
            dispatcher,
            Arc::clone(&credentials),
            auth_retry_status,
            config.refresh_path,
        ));
        Ok(Self {
            coordinator,
            credentials,
            auth_retry_status,
        })
    }

    /// Shared handle to the credential store.
    pub fn credentials(&self) -> Arc<CredentialStore> {
        Arc::clone(&self.credentials)
    }

    /// Drop the stored credential. The next authenticated call goes out bare
    /// and takes the refresh path if the backend rejects it.
    pub fn logout(&self) {
        self.credentials.clear();
    }

    /// Send a request through the refresh coordinator and hand back the raw
    /// response, whatever its status.
    pub async fn send(&self, request: ApiRequest) -> Result<Response, Error> {
        self.coordinator.send(request).await
    }

    pub(crate) async fn execute(&self, request: ApiRequest) -> Result<Response, Error> {
        let response = self.coordinator.send(request).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        // A response can only carry the retry status here if its replay
        // failed too; a first failure never makes it out of the coordinator.
        if status == self.auth_retry_status {
            Err(Error::Auth(format!("status={status} body='{body}'")))
        } else {
            Err(Error::Api(status, body))
        }
    }

    pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, Error> {
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
