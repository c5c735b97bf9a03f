use serde_json::json;
use tracing::info;

use crate::client::CalendarClient;
use crate::dispatch::ApiRequest;
use crate::errors::Error;
use crate::types::{AuthSession, User, UserEnvelope};

impl CalendarClient {
    /// Create an account and store the credential the backend hands back.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, Error> {
        let request = ApiRequest::post(
            "/api/users/registration",
            json!({ "name": name, "email": email, "password": password }),
        );
        let response = self.execute(request).await?;
        let session: AuthSession = Self::decode(response).await?;
        self.credentials.set(session.access_token.clone());
        info!("registration ok: email='{}'", email);
        Ok(session)
    }

    /// Log in and store the credential the backend hands back.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, Error> {
        let request = ApiRequest::post(
            "/api/users/login",
            json!({ "email": email, "password": password }),
        );
        let response = self.execute(request).await?;
        let session: AuthSession = Self::decode(response).await?;
        self.credentials.set(session.access_token.clone());
        info!("login ok: email='{}'", email);
        Ok(session)
    }

    pub async fn current_user(&self) -> Result<User, Error> {
        let response = self.execute(ApiRequest::get("/api/users/me")).await?;
        let envelope: UserEnvelope = Self::decode(response).await?;
        Ok(envelope.user)
    }
}
