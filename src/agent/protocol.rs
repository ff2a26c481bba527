//! Wire types for the agent service HTTP API
//!
//! `POST /chat` takes `{message, agent}` and answers `{response, ccce?}`.
//! `GET /status` answers the agent's status block. Every field except
//! `response` is optional.

use crate::errors::{ConsoleError, Result};
use crate::metrics::MetricReading;
use serde::{Deserialize, Serialize};

/// Chat request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub agent: String,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, agent: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            agent: agent.into(),
        }
    }
}

/// CCCE block as reported by the agent service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentMetrics {
    #[serde(default)]
    pub phi: Option<f64>,
    #[serde(default)]
    pub lambda: Option<f64>,
    #[serde(default)]
    pub gamma: Option<f64>,
    #[serde(default)]
    pub xi: Option<f64>,
    #[serde(default)]
    pub conscious: Option<bool>,
}

impl AgentMetrics {
    /// Convert to a reading when phi, lambda and gamma are all present.
    ///
    /// The service's own `xi` is ignored; negentropy is re-derived.
    pub fn to_reading(&self) -> Option<Result<MetricReading>> {
        match (self.phi, self.lambda, self.gamma) {
            (Some(phi), Some(lambda), Some(gamma)) => {
                Some(MetricReading::live(phi, lambda, gamma))
            }
            _ => None,
        }
    }

    /// Values for display; absent fields render as 0
    pub fn phi_or_zero(&self) -> f64 {
        self.phi.unwrap_or(0.0)
    }

    pub fn lambda_or_zero(&self) -> f64 {
        self.lambda.unwrap_or(0.0)
    }

    pub fn gamma_or_zero(&self) -> f64 {
        self.gamma.unwrap_or(0.0)
    }

    pub fn xi_or_zero(&self) -> f64 {
        self.xi.unwrap_or(0.0)
    }
}

/// Chat response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default)]
    pub ccce: Option<AgentMetrics>,
}

/// `GET /status` body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentStatus {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub ccce: Option<AgentMetrics>,
    #[serde(default)]
    pub knowledge_entries: Option<u64>,
    #[serde(default)]
    pub conversation_turns: Option<u64>,
}

/// Reply extracted from a delivered response
#[derive(Debug, Clone, PartialEq)]
pub enum AgentReply {
    /// Body parsed into a reply and optional metrics
    Parsed {
        text: String,
        metrics: Option<AgentMetrics>,
    },
    /// Body could not be parsed; shown verbatim
    Raw(String),
}

impl AgentReply {
    /// Parse a raw response body, falling back to the raw text
    pub fn from_body(body: &str) -> Self {
        match parse_chat_response(body) {
            Ok(parsed) => AgentReply::Parsed {
                text: parsed.response,
                metrics: parsed.ccce,
            },
            Err(e) => {
                tracing::debug!(error = %e, "agent reply not structured, showing raw body");
                AgentReply::Raw(body.to_string())
            }
        }
    }

    pub fn text(&self) -> &str {
        match self {
            AgentReply::Parsed { text, .. } => text,
            AgentReply::Raw(raw) => raw,
        }
    }

    pub fn metrics(&self) -> Option<&AgentMetrics> {
        match self {
            AgentReply::Parsed { metrics, .. } => metrics.as_ref(),
            AgentReply::Raw(_) => None,
        }
    }
}

/// Strictly parse a chat response body
pub fn parse_chat_response(body: &str) -> Result<ChatResponse> {
    serde_json::from_str::<ChatResponse>(body)
        .map_err(|e| ConsoleError::MalformedResponse(format!("{}", e)))
}
