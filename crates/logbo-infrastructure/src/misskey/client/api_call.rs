use anyhow::{Context, Result};
use log::debug;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::ApiError;
use crate::misskey::types::ApiErrorEnvelope;

impl super::MisskeyClient {
    /// POST an endpoint once and decode the JSON response.
    pub(super) async fn post_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: Value,
    ) -> Result<T> {
        let response = self.send(endpoint, body).await?;

        response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to decode {} response", endpoint))
    }

    /// POST an endpoint once, ignoring any response body.
    pub(super) async fn post_unit(&self, endpoint: &str, body: Value) -> Result<()> {
        self.send(endpoint, body).await?;
        Ok(())
    }

    async fn send(&self, endpoint: &str, body: Value) -> Result<reqwest::Response> {
        let url = self.endpoint_url(endpoint)?;
        let body = self.authorize(body);

        debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to call {}", endpoint))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        Err(api_error(endpoint, status, &text).into())
    }

    /// The API takes the access token as the `i` field of the JSON body.
    fn authorize(&self, body: Value) -> Value {
        let mut body = match body {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        body.insert("i".to_string(), Value::String(self.token.clone()));
        Value::Object(body)
    }
}

fn api_error(endpoint: &str, status: StatusCode, text: &str) -> ApiError {
    match serde_json::from_str::<ApiErrorEnvelope>(text) {
        Ok(envelope) => ApiError {
            endpoint: endpoint.to_string(),
            status,
            code: envelope.error.code,
            message: envelope.error.message,
        },
        Err(_) => ApiError {
            endpoint: endpoint.to_string(),
            status,
            code: String::new(),
            message: text.chars().take(200).collect(),
        },
    }
}
