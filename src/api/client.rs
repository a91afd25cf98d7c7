use crate::config::Config;
use crate::error::{CommandError, TransportError};
use crate::types::{
    BootLogs, ChatRequest, ClearSessionResponse, ModelSwitchRequest, ModelSwitchResponse,
    SessionUsage,
};
use crate::util::is_local_endpoint_url;
use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use std::pin::Pin;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// Everything the client needs from the AIDA backend.
#[async_trait]
pub trait Backend: Send + Sync {
    /// `POST /chat`; the body is an NDJSON stream of records.
    async fn open_chat(&self, query: &str) -> Result<ByteStream, TransportError>;

    /// `GET /boot_logs`.
    async fn boot_logs(&self) -> anyhow::Result<Vec<String>>;

    /// `GET /session/usage`.
    async fn session_usage(&self) -> anyhow::Result<SessionUsage>;

    /// `POST /config/model`; returns the model now active.
    async fn switch_model(&self, model_id: &str) -> Result<String, CommandError>;

    /// `POST /session/clear`; returns the server's confirmation text.
    async fn clear_session(&self) -> Result<String, CommandError>;
}

#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    config: Config,
}

impl BackendClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            config: config.clone(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        let url = self.config.endpoint(path);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|error| map_request_error(error, &url))?
            .error_for_status()
            .map_err(|error| map_request_error(error, &url))?;
        Ok(response.json::<T>().await?)
    }

    async fn post_command<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, CommandError> {
        let url = self.config.endpoint(path);
        let mut request = self.http.post(&url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|source| CommandError::Request {
            url: url.clone(),
            source,
        })?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|source| CommandError::Request {
                url: url.clone(),
                source,
            })?;

        // Error bodies still carry `{"error": ...}`, so parse before judging status.
        match serde_json::from_str::<T>(&text) {
            Ok(parsed) => Ok(parsed),
            Err(_) if !status.is_success() => Err(CommandError::Status {
                url,
                status: status.as_u16(),
            }),
            Err(err) => Err(CommandError::Rejected(format!(
                "unexpected response from {url}: {err}"
            ))),
        }
    }
}

#[async_trait]
impl Backend for BackendClient {
    async fn open_chat(&self, query: &str) -> Result<ByteStream, TransportError> {
        let url = self.config.endpoint("/chat");
        tracing::debug!(%url, query_len = query.len(), "opening chat stream");

        let response = self
            .http
            .post(&url)
            .header("content-type", "application/json")
            .json(&ChatRequest { query })
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let stream = response
            .bytes_stream()
            .map(move |item| {
                item.map_err(|source| TransportError::Body {
                    url: url.clone(),
                    source,
                })
            });
        Ok(Box::pin(stream))
    }

    async fn boot_logs(&self) -> anyhow::Result<Vec<String>> {
        let logs: BootLogs = self.get_json("/boot_logs").await?;
        Ok(logs.logs)
    }

    async fn session_usage(&self) -> anyhow::Result<SessionUsage> {
        self.get_json("/session/usage").await
    }

    async fn switch_model(&self, model_id: &str) -> Result<String, CommandError> {
        let body = serde_json::to_value(ModelSwitchRequest { model_id }).ok();
        match self.post_command::<ModelSwitchResponse>("/config/model", body).await? {
            ModelSwitchResponse::Switched {
                status,
                current_model,
            } if status == "ok" => Ok(current_model),
            ModelSwitchResponse::Switched { status, .. } => Err(CommandError::Rejected(format!(
                "model switch returned status '{status}'"
            ))),
            ModelSwitchResponse::Failed { error } => Err(CommandError::Rejected(error)),
        }
    }

    async fn clear_session(&self) -> Result<String, CommandError> {
        match self
            .post_command::<ClearSessionResponse>("/session/clear", None)
            .await?
        {
            ClearSessionResponse::Cleared { message } => Ok(message),
            ClearSessionResponse::Failed { error } => Err(CommandError::Rejected(error)),
        }
    }
}

fn map_request_error(error: reqwest::Error, request_url: &str) -> anyhow::Error {
    if error.is_connect() && is_local_endpoint_url(request_url) {
        return anyhow::anyhow!(
            "cannot reach local backend '{}': {}. Start the AIDA server or update AIDA_URL.",
            request_url,
            error
        );
    }
    if error.is_connect() {
        return anyhow::anyhow!("cannot reach backend '{}': {}", request_url, error);
    }
    if let Some(status) = error.status() {
        return anyhow::anyhow!("backend '{}' returned HTTP {}", request_url, status);
    }
    anyhow::anyhow!("request to '{}' failed: {}", request_url, error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_backend_is_a_transport_error() {
        let config = Config {
            backend_url: "http://127.0.0.1:1".to_string(),
            ..Config::default()
        };
        let client = BackendClient::new(&config);
        let result = client.open_chat("hello").await;
        assert!(matches!(result, Err(TransportError::Request { .. })));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_a_command_error() {
        let config = Config {
            backend_url: "http://127.0.0.1:1".to_string(),
            ..Config::default()
        };
        let client = BackendClient::new(&config);
        let result = client.clear_session().await;
        assert!(matches!(result, Err(CommandError::Request { .. })));
    }
}
