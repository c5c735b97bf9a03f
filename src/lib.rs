mod client;
mod config;
mod credentials;
mod dispatch;
mod errors;
mod refresh;
pub mod telemetry;
mod types;

pub use client::CalendarClient;
pub use config::Config;
pub use credentials::CredentialStore;
pub use dispatch::{ApiRequest, Dispatcher};
pub use errors::Error;
pub use refresh::RefreshCoordinator;
pub use types::{AuthSession, DEFAULT_EVENT_COLOR, Event, EventDraft, User};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_builds_from_default_config() {
        let config = Config::from_values("http://localhost:5000", None, None, None);
        let client = CalendarClient::new(config).expect("client should build");
        assert!(client.credentials().get().is_none());
    }
}
