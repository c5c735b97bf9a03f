use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use reqwest::{Response, StatusCode};
use tokio::sync::oneshot;
use tracing::warn;

use crate::credentials::CredentialStore;
use crate::dispatch::{ApiRequest, Dispatcher};
use crate::errors::Error;
use crate::telemetry::refresh::RefreshTelemetry;
use crate::types::AuthSession;

type Waiter = oneshot::Sender<Result<(), Error>>;

#[derive(Default)]
struct RefreshState {
    refreshing: bool,
    waiters: Vec<Waiter>,
}

enum RefreshRole {
    Trigger,
    Queued(oneshot::Receiver<Result<(), Error>>),
}

/// Coordinates credential refresh across concurrent requests.
///
/// When a response comes back with the configured auth-failure status, the
/// first request to see it becomes the trigger: it latches the `refreshing`
/// flag, runs one refresh call, and replays itself with the new credential.
/// Requests that fail while the flag is latched do not start refreshes of
/// their own; they park on a oneshot channel and replay (or fail) when the
/// trigger settles the cycle. However many requests fail together, the
/// backend sees exactly one refresh call.
pub struct RefreshCoordinator {
    dispatcher: Dispatcher,
    credentials: Arc<CredentialStore>,
    retry_status: StatusCode,
    refresh_path: String,
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    pub fn new(
        dispatcher: Dispatcher,
        credentials: Arc<CredentialStore>,
        retry_status: StatusCode,
        refresh_path: impl Into<String>,
    ) -> Self {
        Self {
            dispatcher,
            credentials,
            retry_status,
            refresh_path: refresh_path.into(),
            state: Mutex::new(RefreshState::default()),
        }
    }

    /// Send one request, refreshing the credential and replaying on the
    /// configured auth-failure status.
    ///
    /// Any other status passes through untouched, as does the configured
    /// status on a request that already replayed once. Transport errors
    /// propagate without touching refresh state.
    pub async fn send(&self, request: ApiRequest) -> Result<Response, Error> {
        let response = self.dispatcher.dispatch(&request).await?;
        let status = response.status();
        if status != self.retry_status || request.retried() {
            return Ok(response);
        }

        // Check-and-set must stay in one lock scope with no await in it, so
        // two failures racing here cannot both become the trigger.
        let role = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            if state.refreshing {
                let (tx, rx) = oneshot::channel();
                state.waiters.push(tx);
                RefreshRole::Queued(rx)
            } else {
                state.refreshing = true;
                RefreshRole::Trigger
            }
        };

        warn!(
            status = %status,
            path = %request.path,
            queued = matches!(role, RefreshRole::Queued(_)),
            "retry.scheduling"
        );

        match role {
            RefreshRole::Trigger => {
                let telemetry = RefreshTelemetry::new("coordinator.refresh");
                let guard = SettleGuard::new(&self.state);
                let refresh_result = self.run_refresh(&telemetry).await;
                guard.disarm();

                // Flag reset and queue drain share one lock acquisition, so a
                // failure landing in between cannot start a second refresh
                // while earlier waiters are still parked.
                let waiters = {
                    let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
                    state.refreshing = false;
                    std::mem::take(&mut state.waiters)
                };

                match refresh_result {
                    Ok(()) => {
                        telemetry.emit_release(waiters.len(), "success");
                        for waiter in waiters {
                            let _ = waiter.send(Ok(()));
                        }
                        self.dispatcher.dispatch(&request.into_retried()).await
                    }
                    Err(err) => {
                        self.credentials.clear();
                        let reason = err.to_string();
                        telemetry.emit_release(waiters.len(), "failure");
                        for waiter in waiters {
                            let _ = waiter.send(Err(Error::SessionExpired(reason.clone())));
                        }
                        Err(Error::SessionExpired(reason))
                    }
                }
            }
            RefreshRole::Queued(rx) => match rx.await {
                Ok(Ok(())) => self.dispatcher.dispatch(&request.into_retried()).await,
                Ok(Err(err)) => Err(err),
                Err(_) => Err(Error::SessionExpired(
                    "refresh settled without notifying queued request".to_string(),
                )),
            },
        }
    }

    /// Run one refresh call and install the credential it returns. On failure
    /// the caller clears the store and fails the whole batch; there is no
    /// second attempt.
    async fn run_refresh(&self, telemetry: &RefreshTelemetry) -> Result<(), Error> {
        telemetry.emit_start(SystemTime::now());
        match self.fetch_credential().await {
            Ok(token) => {
                self.credentials.set(token);
                telemetry.emit_success(SystemTime::now());
                Ok(())
            }
            Err(err) => {
                telemetry.emit_failure(&err, SystemTime::now());
                Err(err)
            }
        }
    }

    // The refresh call goes straight to the dispatcher, never through `send`,
    // so it cannot be intercepted and queued behind itself.
    async fn fetch_credential(&self) -> Result<String, Error> {
        let request = ApiRequest::get(self.refresh_path.as_str());
        let response = self.dispatcher.dispatch(&request).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(status, body));
        }
        let body = response.text().await?;
        let session: AuthSession = serde_json::from_str(&body)?;
        Ok(session.access_token)
    }
}

/// Settles the cycle if the trigger's future is dropped mid-refresh: resets
/// the flag and fails any parked waiters, so a cancelled refresh cannot leave
/// the coordinator latched with requests queued forever.
struct SettleGuard<'a> {
    state: &'a Mutex<RefreshState>,
    armed: bool,
}

impl<'a> SettleGuard<'a> {
    fn new(state: &'a Mutex<RefreshState>) -> Self {
        Self { state, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for SettleGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let waiters = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.refreshing = false;
            std::mem::take(&mut state.waiters)
        };
        for waiter in waiters {
            let _ = waiter.send(Err(Error::SessionExpired(
                "refresh aborted before settling".to_string(),
            )));
        }
    }
}
