//! Task resource client.
//!
//! Thin request/response mapper over the five canonical REST operations.
//! Responses come back verbatim: no caching, no optimistic updates. The
//! bearer token is supplied by whoever wires the client up; when none is
//! held the Authorization header is omitted rather than sent empty.

use reqwest::{header, Client};
use tracing::debug;

use crate::models::{NewTask, Task, TaskPatch};

use super::ApiError;

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Task API client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct TaskClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl TaskClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            token: None,
        })
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    /// Create a client with the given token, sharing the connection pool.
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token.into()),
        }
    }

    /// Access to the underlying connection pool.
    pub fn http_client(&self) -> Client {
        self.client.clone()
    }

    fn auth_headers(&self) -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            if let Ok(value) = header::HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(header::AUTHORIZATION, value);
            }
        }
        headers
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetch all tasks visible to the current user
    pub async fn list(&self) -> Result<Vec<Task>, ApiError> {
        let response = self
            .client
            .get(self.url("/tasks"))
            .headers(self.auth_headers())
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Ok(response.json().await?)
    }

    /// Fetch a single task by id
    pub async fn get(&self, id: i64) -> Result<Task, ApiError> {
        let response = self
            .client
            .get(self.url(&format!("/tasks/{}", id)))
            .headers(self.auth_headers())
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Ok(response.json().await?)
    }

    /// Create a task; the server assigns the id
    pub async fn create(&self, task: &NewTask) -> Result<Task, ApiError> {
        debug!(title = %task.title, "Creating task");
        let response = self
            .client
            .post(self.url("/tasks"))
            .headers(self.auth_headers())
            .json(task)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Ok(response.json().await?)
    }

    /// Update a task. Unset patch fields are left untouched server-side.
    pub async fn update(&self, id: i64, patch: &TaskPatch) -> Result<Task, ApiError> {
        debug!(id, "Updating task");
        let response = self
            .client
            .put(self.url(&format!("/tasks/{}", id)))
            .headers(self.auth_headers())
            .json(patch)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Ok(response.json().await?)
    }

    /// Delete a task by id
    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        debug!(id, "Deleting task");
        let response = self
            .client
            .delete(self.url(&format!("/tasks/{}", id)))
            .headers(self.auth_headers())
            .send()
            .await?;

        Self::check_response(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_header_omitted_without_token() {
        let client = TaskClient::new("http://localhost:8080/api").unwrap();
        assert!(client.auth_headers().get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn auth_header_present_with_token() {
        let client = TaskClient::new("http://localhost:8080/api")
            .unwrap()
            .with_token("tok123");
        let headers = client.auth_headers();
        assert_eq!(
            headers.get(header::AUTHORIZATION).unwrap(),
            "Bearer tok123"
        );
    }
}
