//! HTTP client for the agent service
//!
//! Low-level calls against `/status` and `/chat`. Every call carries a
//! bounded timeout; connection failures come back as `AgentUnreachable`.

use crate::agent::protocol::{AgentMetrics, AgentStatus, ChatRequest};
use crate::errors::{ConsoleError, Result};
use crate::metrics::LiveMetrics;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Request/response transport used by the chat session
#[async_trait]
pub trait AgentTransport: Send + Sync {
    /// Send one chat request and return the raw response body
    async fn send_chat(&self, request: &ChatRequest) -> Result<String>;

    /// Endpoint description for diagnostics
    fn endpoint(&self) -> String;
}

/// HTTP client for the agent service
pub struct AgentClient {
    client: Client,
    base_url: String,
    health_timeout: Duration,
    chat_timeout: Duration,
}

impl AgentClient {
    /// Create a new agent client
    ///
    /// # Arguments
    /// * `base_url` - e.g. `http://127.0.0.1:8888`
    /// * `health_timeout` - applied to `/status`
    /// * `chat_timeout` - applied to `/chat`
    pub fn new(base_url: String, health_timeout: Duration, chat_timeout: Duration) -> Self {
        // Per-request timeouts are set below; the builder only fixes connect time
        let client = Client::builder()
            .connect_timeout(health_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            health_timeout,
            chat_timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch `GET /status`
    pub async fn status(&self) -> Result<AgentStatus> {
        let url = format!("{}/status", self.base_url);

        let response = self
            .client
            .get(&url)
            .timeout(self.health_timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e, self.health_timeout))?;

        if !response.status().is_success() {
            return Err(ConsoleError::AgentUnreachable {
                endpoint: url,
                reason: format!("status {}", response.status()),
            });
        }

        response
            .json::<AgentStatus>()
            .await
            .map_err(|e| ConsoleError::MalformedResponse(format!("status body: {}", e)))
    }

    /// Lightweight reachability check
    pub async fn is_available(&self) -> bool {
        self.status().await.is_ok()
    }

    fn transport_error(&self, err: reqwest::Error, limit: Duration) -> ConsoleError {
        if err.is_timeout() {
            ConsoleError::Timeout {
                duration_ms: limit.as_millis() as u64,
            }
        } else {
            ConsoleError::AgentUnreachable {
                endpoint: self.base_url.clone(),
                reason: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl AgentTransport for AgentClient {
    async fn send_chat(&self, request: &ChatRequest) -> Result<String> {
        let url = format!("{}/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .timeout(self.chat_timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e, self.chat_timeout))?;

        if !response.status().is_success() {
            return Err(ConsoleError::AgentUnreachable {
                endpoint: url,
                reason: format!("status {}", response.status()),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e, self.chat_timeout))?;

        if body.trim().is_empty() {
            return Err(ConsoleError::MalformedResponse("empty response body".to_string()));
        }

        Ok(body)
    }

    fn endpoint(&self) -> String {
        self.base_url.clone()
    }
}

#[async_trait]
impl LiveMetrics for AgentClient {
    async fn current_metrics(&self) -> Result<AgentMetrics> {
        self.status()
            .await?
            .ccce
            .ok_or_else(|| ConsoleError::MalformedResponse("status has no ccce block".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> AgentClient {
        AgentClient::new(
            url.to_string(),
            Duration::from_millis(500),
            Duration::from_millis(500),
        )
    }

    #[test]
    fn test_client_creation() {
        let client = client("http://127.0.0.1:8888/");
        assert_eq!(client.base_url(), "http://127.0.0.1:8888");
        assert_eq!(client.endpoint(), "http://127.0.0.1:8888");
    }

    #[tokio::test]
    async fn test_closed_port_is_unreachable() {
        // Bind then drop to get a port nobody listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = client(&format!("http://127.0.0.1:{}", port));
        assert!(!client.is_available().await);

        let err = client
            .send_chat(&ChatRequest::new("hi", "aura"))
            .await
            .unwrap_err();
        assert!(!err.is_fatal());
    }
}
