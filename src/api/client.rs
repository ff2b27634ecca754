use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::ApiError;
use crate::auth::CredentialExchange;
use crate::credentials::UserRecord;
use crate::models::user::{LoginCredentials, LoginRequest, LoginResponse};

/// Generous enough for archive uploads; the event stream uses its own client
/// settings.
const REQUEST_TIMEOUT_SECS: u64 = 1800;

pub struct PlatformClient {
    pub base_url: String,
    pub token: Option<String>,
    pub http: Client,
}

impl PlatformClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            http,
        })
    }

    pub fn authenticated(base_url: &str, user: &UserRecord) -> Result<Self, ApiError> {
        let mut client = Self::new(base_url)?;
        client.token = Some(user.auth_token.clone());
        Ok(client)
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn with_auth(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Turn a non-success response into an `ApiError`, passing others through.
    pub(crate) async fn check(resp: Response) -> Result<Response, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        debug!(%status, %body, "request failed");
        Err(ApiError::from_status(status, &body))
    }

    pub(crate) async fn json<T: DeserializeOwned>(resp: Response, what: &str) -> Result<T, ApiError> {
        let resp = Self::check(resp).await?;
        let body = resp.bytes().await?;
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse {}: {}", what, e)))
    }

    /// Exchange a login and password for a session token.
    pub async fn login(&self, login: &str, password: &str) -> Result<UserRecord, ApiError> {
        let resp = self
            .http
            .post(self.url("/v1/users/sign_in"))
            .header("Accept", "application/json")
            .json(&LoginRequest {
                user: LoginCredentials { login, password },
            })
            .send()
            .await?;

        if resp.status() == StatusCode::UNAUTHORIZED {
            return Err(ApiError::InvalidCredentials);
        }

        let session: LoginResponse = Self::json(resp, "login response").await?;
        session
            .user
            .map(UserRecord::from)
            .ok_or(ApiError::InvalidCredentials)
    }
}

impl CredentialExchange for PlatformClient {
    async fn exchange(&self, login: &str, password: &str) -> Result<UserRecord, ApiError> {
        self.login(login, password).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_construction_trims_trailing_slash() {
        let client = PlatformClient::new("https://api.example.com/").unwrap();
        assert_eq!(
            client.url("/v1/apps/web/deployments"),
            "https://api.example.com/v1/apps/web/deployments"
        );
    }

    #[test]
    fn authenticated_client_carries_token() {
        let user = UserRecord {
            username: "bob".to_string(),
            auth_token: "tk".to_string(),
        };
        let client = PlatformClient::authenticated("https://api.example.com", &user).unwrap();
        assert_eq!(client.token.as_deref(), Some("tk"));

        let request = client
            .with_auth(client.http.get(client.url("/v1/apps")))
            .build()
            .unwrap();
        assert_eq!(
            request.headers().get("authorization").unwrap(),
            "Bearer tk"
        );
    }
}
