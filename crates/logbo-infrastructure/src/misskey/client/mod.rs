mod api_call;
mod gateway;

use anyhow::{Context, Result};
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio::time::sleep;
use url::Url;

use crate::config::{RetryConfig, TimeoutConfig};

const USER_AGENT: &str = concat!("logbo/", env!("CARGO_PKG_VERSION"));

/// Failure reported by the instance itself (non-2xx response).
#[derive(Debug, thiserror::Error)]
#[error("{endpoint} returned {status}: {message}")]
pub struct ApiError {
    pub endpoint: String,
    pub status: StatusCode,
    pub code: String,
    pub message: String,
}

/// Misskey HTTP API client authenticated with the bot's token.
pub struct MisskeyClient {
    pub(super) client: Client,
    pub(super) origin: Url,
    pub(super) token: String,
    pub(super) retry_config: RetryConfig,
}

impl MisskeyClient {
    pub fn new(origin: &str, token: &str) -> Result<Self> {
        Self::with_timeouts(origin, token, &TimeoutConfig::default())
    }

    pub fn with_timeouts(origin: &str, token: &str, timeouts: &TimeoutConfig) -> Result<Self> {
        let origin = Url::parse(origin).with_context(|| format!("Invalid origin URL: {}", origin))?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeouts.http_request)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            origin,
            token: token.to_string(),
            retry_config: timeouts.read_retry.clone(),
        })
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub(super) fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
        self.origin
            .join(&format!("api/{}", endpoint))
            .with_context(|| format!("Invalid endpoint: {}", endpoint))
    }

    /// Execute an idempotent request with retry logic
    ///
    /// Retries on:
    /// - Network errors (connection failures, timeouts)
    /// - 5xx server errors
    /// - 429 Too Many Requests
    ///
    /// Mutating calls must not go through here: a retried `notes/create`
    /// after a lost response would post twice.
    pub(super) async fn execute_with_retry<F, Fut, T>(
        &self,
        operation_name: &str,
        mut request_fn: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        let mut backoff_ms = self.retry_config.initial_backoff_ms;

        loop {
            attempt += 1;

            match request_fn().await {
                Ok(response) => {
                    if attempt > 1 {
                        debug!("{} succeeded after {} attempts", operation_name, attempt);
                    }
                    return Ok(response);
                }
                Err(e) => {
                    let should_retry =
                        attempt <= self.retry_config.max_retries && is_retryable_error(&e);

                    if !should_retry {
                        return Err(e);
                    }

                    warn!(
                        "{} failed (attempt {}/{}): {}. Retrying in {}ms...",
                        operation_name, attempt, self.retry_config.max_retries, e, backoff_ms
                    );
                    sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms = self.retry_config.next_backoff(backoff_ms);
                }
            }
        }
    }
}

fn is_retryable_error(error: &anyhow::Error) -> bool {
    if let Some(api_err) = error.downcast_ref::<ApiError>() {
        return api_err.status.is_server_error()
            || api_err.status == StatusCode::TOO_MANY_REQUESTS;
    }

    if let Some(reqwest_err) = error.downcast_ref::<reqwest::Error>() {
        if reqwest_err.is_connect() || reqwest_err.is_timeout() || reqwest_err.is_request() {
            return true;
        }

        if let Some(status) = reqwest_err.status() {
            return status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS;
        }
    }

    false
}
