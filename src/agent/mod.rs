//! Agent service integration
//!
//! HTTP client, wire protocol, lazy-start launcher and the chat session
//! state machine.

pub mod client;
pub mod launcher;
pub mod protocol;
pub mod session;
pub mod state;

pub use client::{AgentClient, AgentTransport};
pub use launcher::{ProcessLauncher, ServiceLauncher};
pub use protocol::{AgentMetrics, AgentReply, AgentStatus, ChatRequest, ChatResponse};
pub use session::{
    ChatExchange, ChatObserver, ChatSession, ExchangeOutcome, InputSource, SessionSummary,
    EXIT_SENTINEL,
};
pub use state::{SessionEvent, SessionState};
