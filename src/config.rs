//! read client configuration from explicit values, a file, or the environment

use std::path::Path;

use reqwest::StatusCode;

use crate::errors::Error;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_AUTH_RETRY_STATUS: u16 = 400;
const DEFAULT_REFRESH_PATH: &str = "/api/users/refresh";

#[derive(Clone, Debug, serde::Deserialize)]
pub struct Config {
    /// Base URL of the calendar API. A bare host is promoted to https.
    pub url: String,
    /// Fixed per-call timeout applied to every outbound request.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Status code the backend uses to signal a rejected credential. The
    /// deployed backend answers 400; conventional servers use 401.
    #[serde(default = "default_auth_retry_status")]
    pub auth_retry_status: u16,
    /// Path of the identity endpoint that exchanges the session cookie for a
    /// fresh bearer token.
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_auth_retry_status() -> u16 {
    DEFAULT_AUTH_RETRY_STATUS
}

fn default_refresh_path() -> String {
    DEFAULT_REFRESH_PATH.to_string()
}

impl Config {
    pub fn from_values(
        url: impl Into<String>,
        timeout_secs: Option<u64>,
        auth_retry_status: Option<u16>,
        refresh_path: Option<String>,
    ) -> Self {
        Config {
            url: url.into(),
            timeout_secs: timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            auth_retry_status: auth_retry_status.unwrap_or(DEFAULT_AUTH_RETRY_STATUS),
            refresh_path: refresh_path.unwrap_or_else(default_refresh_path),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// # ENV Vars
    /// * `EVENTCAL_URL` - Base URL of the calendar API (required)
    /// * `EVENTCAL_TIMEOUT_SECS` - Per-call timeout in seconds
    /// * `EVENTCAL_AUTH_RETRY_STATUS` - Status code treated as "credential rejected"
    /// * `EVENTCAL_REFRESH_PATH` - Path of the refresh endpoint
    pub fn from_env() -> Result<Self, Error> {
        let url = std::env::var("EVENTCAL_URL")
            .map_err(|_| Error::Config("Missing EVENTCAL_URL env var".to_string()))?;
        let timeout_secs = match std::env::var("EVENTCAL_TIMEOUT_SECS") {
            Ok(raw) => Some(raw.parse().map_err(|_| {
                Error::Config(format!("Invalid EVENTCAL_TIMEOUT_SECS '{raw}'"))
            })?),
            Err(_) => None,
        };
        let auth_retry_status = match std::env::var("EVENTCAL_AUTH_RETRY_STATUS") {
            Ok(raw) => Some(raw.parse().map_err(|_| {
                Error::Config(format!("Invalid EVENTCAL_AUTH_RETRY_STATUS '{raw}'"))
            })?),
            Err(_) => None,
        };
        let refresh_path = std::env::var("EVENTCAL_REFRESH_PATH").ok();
        Ok(Config::from_values(
            url,
            timeout_secs,
            auth_retry_status,
            refresh_path,
        ))
    }

    /// Normalized base URL, validated before any network call is made.
    pub(crate) fn base_url(&self) -> Result<String, Error> {
        let base = if self.url.contains("://") {
            self.url.clone()
        } else {
            format!("https://{}", self.url)
        };
        let _ = reqwest::Url::parse(&base)
            .map_err(|e| Error::Config(format!("Invalid base URL '{}': {}", base, e)))?;
        Ok(base.trim_end_matches('/').to_string())
    }

    pub(crate) fn auth_status(&self) -> Result<StatusCode, Error> {
        StatusCode::from_u16(self.auth_retry_status).map_err(|_| {
            Error::Config(format!(
                "Invalid auth_retry_status '{}'",
                self.auth_retry_status
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_values_applies_defaults() {
        let config = Config::from_values("calendar.example.com", None, None, None);
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.auth_retry_status, 400);
        assert_eq!(config.refresh_path, "/api/users/refresh");
    }

    #[test]
    fn bare_host_is_promoted_to_https() {
        let config = Config::from_values("calendar.example.com", None, None, None);
        assert_eq!(config.base_url().unwrap(), "https://calendar.example.com");
    }

    #[test]
    fn explicit_scheme_and_trailing_slash_are_normalized() {
        let config = Config::from_values("http://localhost:5000/", None, None, None);
        assert_eq!(config.base_url().unwrap(), "http://localhost:5000");
    }

    #[test]
    fn unparseable_url_is_a_config_error() {
        let config = Config::from_values("http://", None, None, None);
        match config.base_url() {
            Err(Error::Config(msg)) => assert!(msg.contains("Invalid base URL")),
            other => panic!("expected Error::Config, got {:?}", other),
        }
    }

    #[test]
    fn out_of_range_status_is_a_config_error() {
        let config = Config::from_values("http://localhost:5000", None, Some(99), None);
        match config.auth_status() {
            Err(Error::Config(msg)) => assert!(msg.contains("auth_retry_status")),
            other => panic!("expected Error::Config, got {:?}", other),
        }
    }

    #[test]
    fn from_file_round_trips_json() {
        let cfg = serde_json::json!({
            "url": "http://localhost:5000",
            "auth_retry_status": 401
        });
        let mut path = std::path::PathBuf::from("target");
        std::fs::create_dir_all(&path).ok();
        path.push("eventcal-config-test.json");
        std::fs::write(&path, serde_json::to_string(&cfg).unwrap()).unwrap();

        let config = Config::from_file(&path).expect("config file should parse");
        assert_eq!(config.url, "http://localhost:5000");
        assert_eq!(config.auth_retry_status, 401);
        assert_eq!(config.timeout_secs, 10, "absent fields take defaults");
    }
}
