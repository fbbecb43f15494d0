//! Main client implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use url::Url;

use crate::error::{Error, Result};
use crate::types::{
    ApiResponse, CancelRequest, CreateRequest, Feedback, ListRequestsQuery, RequestUpdate,
};

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.hitl.sh/v1";

/// Default timeout for requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ─────────────────────────────────────────────────────────────────────────────
// LoopsApi trait
// ─────────────────────────────────────────────────────────────────────────────

/// Operations exposed by the HITL API.
///
/// Every call takes the API key to authenticate with, so a single client can
/// serve many callers concurrently.
#[async_trait]
pub trait LoopsApi: Send + Sync {
    /// `GET /test`: check that an API key is valid.
    async fn test_key(&self, api_key: &str) -> Result<ApiResponse>;

    /// `GET /loops`: list the caller's loops.
    async fn get_loops(&self, api_key: &str) -> Result<ApiResponse>;

    /// `POST /loops/{loop_id}/requests`: create a request in a loop.
    async fn create_request(
        &self,
        api_key: &str,
        loop_id: &str,
        request: &CreateRequest,
    ) -> Result<ApiResponse>;

    /// `GET /requests`: list requests.
    async fn list_requests(&self, api_key: &str, query: &ListRequestsQuery)
    -> Result<ApiResponse>;

    /// `GET /requests/{id}`: fetch one request.
    async fn get_request(&self, api_key: &str, request_id: &str) -> Result<ApiResponse>;

    /// `PUT /requests/{id}`: update a request.
    async fn update_request(
        &self,
        api_key: &str,
        request_id: &str,
        update: &RequestUpdate,
    ) -> Result<ApiResponse>;

    /// `DELETE /requests/{id}`: delete a request.
    async fn delete_request(&self, api_key: &str, request_id: &str) -> Result<ApiResponse>;

    /// `POST /requests/{id}/cancel`: cancel a request.
    async fn cancel_request(
        &self,
        api_key: &str,
        request_id: &str,
        cancel: &CancelRequest,
    ) -> Result<ApiResponse>;

    /// `POST /requests/{id}/feedback`: attach feedback to a request.
    async fn add_request_feedback(
        &self,
        api_key: &str,
        request_id: &str,
        feedback: &Feedback,
    ) -> Result<ApiResponse>;
}

// ─────────────────────────────────────────────────────────────────────────────
// HitlClient
// ─────────────────────────────────────────────────────────────────────────────

/// reqwest-backed [`LoopsApi`] implementation.
///
/// # Example
///
/// ```no_run
/// use hitl_client::{HitlClient, LoopsApi};
///
/// # async fn example() -> hitl_client::Result<()> {
/// let client = HitlClient::builder()
///     .base_url("https://api.hitl.sh/v1")
///     .build()?;
///
/// let loops = client.get_loops("hitl_live_abc").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct HitlClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl HitlClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Build a URL from path segments, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config("base_url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request and decode the API envelope.
    async fn send(
        &self,
        method: Method,
        segments: &[&str],
        api_key: &str,
        build: impl FnOnce(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
    ) -> Result<ApiResponse> {
        let url = self.url(segments)?;
        tracing::debug!(method = %method, path = %url.path(), "HITL API request");

        let request = self
            .inner
            .http
            .request(method, url)
            .bearer_auth(api_key)
            .timeout(self.inner.timeout);
        let response = build(request).send().await?;
        Self::handle_response(response).await
    }

    /// Decode a response, turning non-2xx statuses and error envelopes into [`Error::Api`].
    async fn handle_response(response: reqwest::Response) -> Result<ApiResponse> {
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ApiResponse>(&body)
                .ok()
                .map(|envelope| envelope.msg)
                .filter(|msg| !msg.is_empty())
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
                });
            return Err(Error::api(status.as_u16(), message));
        }

        let envelope: ApiResponse = serde_json::from_slice(&body)?;
        if envelope.error {
            let message = if envelope.msg.is_empty() {
                "API reported an error".to_string()
            } else {
                envelope.msg
            };
            return Err(Error::api(status.as_u16(), message));
        }
        Ok(envelope)
    }
}

#[async_trait]
impl LoopsApi for HitlClient {
    async fn test_key(&self, api_key: &str) -> Result<ApiResponse> {
        self.send(Method::GET, &["test"], api_key, |r| r).await
    }

    async fn get_loops(&self, api_key: &str) -> Result<ApiResponse> {
        self.send(Method::GET, &["loops"], api_key, |r| r).await
    }

    async fn create_request(
        &self,
        api_key: &str,
        loop_id: &str,
        request: &CreateRequest,
    ) -> Result<ApiResponse> {
        self.send(
            Method::POST,
            &["loops", loop_id, "requests"],
            api_key,
            |r| r.json(request),
        )
        .await
    }

    async fn list_requests(
        &self,
        api_key: &str,
        query: &ListRequestsQuery,
    ) -> Result<ApiResponse> {
        self.send(Method::GET, &["requests"], api_key, |r| r.query(query))
            .await
    }

    async fn get_request(&self, api_key: &str, request_id: &str) -> Result<ApiResponse> {
        self.send(Method::GET, &["requests", request_id], api_key, |r| r)
            .await
    }

    async fn update_request(
        &self,
        api_key: &str,
        request_id: &str,
        update: &RequestUpdate,
    ) -> Result<ApiResponse> {
        self.send(Method::PUT, &["requests", request_id], api_key, |r| {
            r.json(update)
        })
        .await
    }

    async fn delete_request(&self, api_key: &str, request_id: &str) -> Result<ApiResponse> {
        self.send(Method::DELETE, &["requests", request_id], api_key, |r| r)
            .await
    }

    async fn cancel_request(
        &self,
        api_key: &str,
        request_id: &str,
        cancel: &CancelRequest,
    ) -> Result<ApiResponse> {
        self.send(
            Method::POST,
            &["requests", request_id, "cancel"],
            api_key,
            |r| r.json(cancel),
        )
        .await
    }

    async fn add_request_feedback(
        &self,
        api_key: &str,
        request_id: &str,
        feedback: &Feedback,
    ) -> Result<ApiResponse> {
        self.send(
            Method::POST,
            &["requests", request_id, "feedback"],
            api_key,
            |r| r.json(feedback),
        )
        .await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for creating a [`HitlClient`].
#[derive(Debug)]
pub struct ClientBuilder {
    base_url: String,
    timeout: Duration,
    user_agent: Option<String>,
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
        }
    }

    /// Set the API base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<HitlClient> {
        let base_url = Url::parse(&self.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "base_url '{}' cannot be used as a base",
                self.base_url
            )));
        }

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("hitl-client/{}", env!("CARGO_PKG_VERSION")));

        let http = reqwest::Client::builder().user_agent(user_agent).build()?;

        Ok(HitlClient {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                timeout: self.timeout,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
