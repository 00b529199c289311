//! Ghumly API client implementation

use crate::{config::ApiConfig, error::ApiError};
use ghumly_runtime::metrics::ApiClientMetrics;
use ghumly_runtime::retry::retry_with_predicate;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Instant;

/// Typed client for the Ghumly backend API.
///
/// Cheap to clone. Credentials are injected with [`ApiClient::with_token`];
/// there is no ambient global session. Reads are retried per the configured
/// policy, mutations are never retried.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    config: ApiConfig,
    token: Option<String>,
}

impl ApiClient {
    /// Create a client configured from `GHUMLY_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be resolved (see
    /// [`ApiConfig::from_env`]) or the HTTP client cannot be built.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::new(ApiConfig::from_env()?)
    }

    /// Create a client with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ClientBuild`] if the underlying HTTP client cannot
    /// be constructed.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(concat!("ghumly-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            config,
            token: None,
        })
    }

    /// Attach a bearer token; subsequent calls go out authenticated.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Drop the bearer token; subsequent calls go out unauthenticated.
    #[must_use]
    pub fn clear_token(mut self) -> Self {
        self.token = None;
        self
    }

    /// The bearer token currently attached, if any.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// The configuration this client was built with.
    #[must_use]
    pub const fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Build a request with base URL, per-class timeout and credentials applied.
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.config.base_url, path);
        let timeout = if method == Method::GET {
            self.config.read_timeout
        } else {
            self.config.mutation_timeout
        };

        let mut builder = self.client.request(method, url).timeout(timeout);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// GET with the configured read-retry policy applied.
    pub(crate) async fn get<T>(&self, path: &str, endpoint: &'static str) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        self.get_with_query::<T, ()>(path, None, endpoint).await
    }

    /// GET with query parameters and the configured read-retry policy applied.
    pub(crate) async fn get_with_query<T, Q>(
        &self,
        path: &str,
        query: Option<&Q>,
        endpoint: &'static str,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized + Sync,
    {
        let started = Instant::now();
        let mut attempt = 0usize;

        let result = retry_with_predicate(
            self.config.read_retry.clone(),
            || {
                if attempt > 0 {
                    ApiClientMetrics::record_retry(endpoint);
                }
                attempt += 1;

                let mut builder = self.request(Method::GET, path);
                if let Some(query) = query {
                    builder = builder.query(query);
                }
                Self::send_request(builder)
            },
            ApiError::is_retryable_read,
        )
        .await;

        Self::record(endpoint, &result, started);
        result
    }

    /// POST a JSON body. Mutations are never retried.
    pub(crate) async fn post<B, T>(
        &self,
        path: &str,
        body: &B,
        endpoint: &'static str,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::POST, path).json(body);
        Self::execute(builder, endpoint).await
    }

    /// PUT a JSON body. Mutations are never retried.
    pub(crate) async fn put<B, T>(
        &self,
        path: &str,
        body: &B,
        endpoint: &'static str,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::PUT, path).json(body);
        Self::execute(builder, endpoint).await
    }

    /// DELETE. Mutations are never retried.
    pub(crate) async fn delete<T>(&self, path: &str, endpoint: &'static str) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let builder = self.request(Method::DELETE, path);
        Self::execute(builder, endpoint).await
    }

    /// Execute a prepared request exactly once, recording metrics.
    pub(crate) async fn execute<T>(
        builder: RequestBuilder,
        endpoint: &'static str,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let started = Instant::now();
        let result = Self::send_request(builder).await;
        Self::record(endpoint, &result, started);
        result
    }

    async fn send_request<T>(builder: RequestBuilder) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let response = builder.send().await?;
        let status = response.status();

        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| ApiError::ResponseParse(e.to_string()));
        }

        match status {
            StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
            StatusCode::TOO_MANY_REQUESTS => Err(ApiError::RateLimited),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(ApiError::Request {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }

    fn record<T>(endpoint: &'static str, result: &Result<T, ApiError>, started: Instant) {
        match result {
            Ok(_) => {
                ApiClientMetrics::record_request(endpoint, "success", started.elapsed());
                tracing::debug!(endpoint, "API request succeeded");
            }
            Err(err) => {
                ApiClientMetrics::record_request(endpoint, err.outcome_label(), started.elapsed());
                tracing::warn!(endpoint, error = %err, "API request failed");
            }
        }
    }
}
