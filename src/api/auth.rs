//! Credential exchange client for the identity API.
//!
//! Stateless request/response mapping for `POST /auth/register`,
//! `POST /auth/login` and `POST /auth/refresh`. Persisting the resulting
//! session is the caller's job, never a side effect here.

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Serialize;
use tracing::debug;

use crate::models::{AuthResponse, LoginCredentials, RegisterRequest};

use super::{ApiError, AuthError, AuthOperation};

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Seam between the session lifecycle and the network. `bearer` is the
/// currently stored access token, attached when present (some deployments
/// require auth context even on refresh).
#[async_trait]
pub trait CredentialExchange {
    async fn register(&self, payload: &RegisterRequest) -> Result<AuthResponse, AuthError>;

    async fn login(
        &self,
        credentials: &LoginCredentials,
        bearer: Option<&str>,
    ) -> Result<AuthResponse, AuthError>;

    /// Exchange a refresh token for a new session. Fails with
    /// `MissingRefreshToken` before any I/O when no token is supplied.
    async fn refresh(
        &self,
        refresh_token: Option<&str>,
        bearer: Option<&str>,
    ) -> Result<AuthResponse, AuthError>;
}

/// Identity API client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
}

impl AuthClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Reuse an existing connection pool, e.g. the task client's.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn exchange<B: Serialize + Sync>(
        &self,
        operation: AuthOperation,
        path: &str,
        body: &B,
        bearer: Option<&str>,
    ) -> Result<AuthResponse, AuthError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, ?operation, "Sending credential exchange request");

        let mut request = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request
            .json(body)
            .send()
            .await
            .map_err(|e| AuthError::classify(operation, e.into()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::classify(
                operation,
                ApiError::from_status(status, &body),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::classify(operation, ApiError::Network(e)))
    }
}

#[derive(Serialize)]
struct RefreshBody<'a> {
    #[serde(rename = "refreshToken")]
    refresh_token: &'a str,
}

#[async_trait]
impl CredentialExchange for AuthClient {
    async fn register(&self, payload: &RegisterRequest) -> Result<AuthResponse, AuthError> {
        self.exchange(AuthOperation::Register, "/auth/register", payload, None)
            .await
    }

    async fn login(
        &self,
        credentials: &LoginCredentials,
        bearer: Option<&str>,
    ) -> Result<AuthResponse, AuthError> {
        self.exchange(AuthOperation::Login, "/auth/login", credentials, bearer)
            .await
    }

    async fn refresh(
        &self,
        refresh_token: Option<&str>,
        bearer: Option<&str>,
    ) -> Result<AuthResponse, AuthError> {
        let refresh_token = refresh_token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingRefreshToken)?;

        self.exchange(
            AuthOperation::Refresh,
            "/auth/refresh",
            &RefreshBody { refresh_token },
            bearer,
        )
        .await
    }
}
