//! HTTP transport shared by the auth and row clients

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::error::ErrorBody;

use crate::auth::SessionStore;
use crate::{ClientConfig, ClientError, ClientResult};

/// Query string pairs, e.g. `[("id", "eq.42")]`
pub type Query<'a> = &'a [(&'a str, &'a str)];

/// HTTP client for the backend
///
/// Every request carries the project key as `apikey` and a bearer token:
/// the current session's access token, or the project key when signed out.
#[derive(Debug, Clone)]
pub struct NetworkHttpClient {
    client: Client,
    base_url: String,
    api_key: String,
    sessions: SessionStore,
}

impl NetworkHttpClient {
    pub fn new(config: &ClientConfig, sessions: SessionStore) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            sessions,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    fn auth_header(&self) -> String {
        let token = self
            .sessions
            .access_token()
            .unwrap_or_else(|| self.api_key.clone());
        format!("Bearer {}", token)
    }

    fn request(&self, method: Method, path: &str, query: Query<'_>) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        tracing::debug!(%method, %url, "backend request");
        let mut req = self
            .client
            .request(method, &url)
            .header("apikey", &self.api_key)
            .header(reqwest::header::AUTHORIZATION, self.auth_header());
        if !query.is_empty() {
            req = req.query(query);
        }
        req
    }

    /// Map a non-2xx response to a `ClientError`
    async fn check(response: reqwest::Response) -> ClientResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await?;
        // Structured body first, status fallback otherwise
        if let Ok(body) = serde_json::from_str::<ErrorBody>(&text) {
            return Err(ClientError::Api {
                code: body.error_code(),
                message: body.message,
                details: body.details,
            });
        }
        match status {
            StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized(text)),
            StatusCode::FORBIDDEN => Err(ClientError::Forbidden(text)),
            StatusCode::NOT_FOUND => Err(ClientError::NotFound(text)),
            StatusCode::BAD_REQUEST => Err(ClientError::Validation(text)),
            _ => Err(ClientError::Internal(format!("{}: {}", status, text))),
        }
    }

    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let response = Self::check(response).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: Query<'_>) -> ClientResult<T> {
        let response = self.request(Method::GET, path, query).send().await?;
        Self::handle_response(response).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        query: Query<'_>,
        body: &B,
    ) -> ClientResult<T> {
        let response = self
            .request(Method::POST, path, query)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// POST without body, ignoring any response body
    pub async fn post_empty(&self, path: &str) -> ClientResult<()> {
        let response = self.request(Method::POST, path, &[]).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        query: Query<'_>,
        body: &B,
    ) -> ClientResult<T> {
        let response = self
            .request(Method::PATCH, path, query)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str, query: Query<'_>) -> ClientResult<T> {
        let response = self
            .request(Method::DELETE, path, query)
            .header("Prefer", "return=representation")
            .send()
            .await?;
        Self::handle_response(response).await
    }
}
