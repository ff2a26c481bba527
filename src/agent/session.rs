//! Interactive chat session against the agent service
//!
//! The loop is driven by [`SessionState`]: each state decides the next
//! action and the transition table decides where it leads. An unreachable
//! service is started lazily and the identical request is retried once.

use crate::agent::client::AgentTransport;
use crate::agent::launcher::ServiceLauncher;
use crate::agent::protocol::{AgentReply, ChatRequest};
use crate::agent::state::{SessionEvent, SessionState};
use crate::errors::{ConsoleError, Result};
use std::time::Duration;

/// Reserved input that ends the loop (exact, case-sensitive match)
pub const EXIT_SENTINEL: &str = "exit";

/// Line-oriented input for the chat loop
pub trait InputSource {
    /// `Ok(None)` on end of input
    fn next_line(&mut self) -> Result<Option<String>>;
}

/// Receives session progress for rendering
pub trait ChatObserver {
    fn on_exchange(&mut self, exchange: &ChatExchange);

    fn lazy_start_began(&mut self, _delay: Duration) {}

    fn lazy_start_ended(&mut self, _launched: bool) {}
}

/// Result of one request/response exchange
#[derive(Debug, Clone, PartialEq)]
pub enum ExchangeOutcome {
    Delivered {
        reply: AgentReply,
        attempts: u32,
        lazy_started: bool,
    },
    Failed {
        error: String,
        attempts: u32,
    },
}

impl ExchangeOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            ExchangeOutcome::Delivered { attempts, .. } | ExchangeOutcome::Failed { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, ExchangeOutcome::Delivered { .. })
    }
}

/// A request and what became of it
#[derive(Debug, Clone, PartialEq)]
pub struct ChatExchange {
    pub request: ChatRequest,
    pub outcome: ExchangeOutcome,
}

/// Totals for a finished loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub delivered: usize,
    pub failed: usize,
}

impl SessionSummary {
    fn record(&mut self, exchange: &ChatExchange) {
        if exchange.outcome.is_delivered() {
            self.delivered += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn exchanges(&self) -> usize {
        self.delivered + self.failed
    }
}

/// Owns one chat loop
pub struct ChatSession<T, L> {
    transport: T,
    launcher: L,
    agent: String,
    startup_delay: Duration,
    state: SessionState,
}

impl<T, L> ChatSession<T, L>
where
    T: AgentTransport,
    L: ServiceLauncher,
{
    pub fn new(transport: T, launcher: L, agent: impl Into<String>, startup_delay: Duration) -> Self {
        Self {
            transport,
            launcher,
            agent: agent.into(),
            startup_delay,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn fire(&mut self, event: SessionEvent) -> Result<()> {
        let next = self.state.transition(event)?;
        tracing::trace!(from = ?self.state, to = ?next, ?event, "chat session transition");
        self.state = next;
        Ok(())
    }

    /// Run the loop until the sentinel or end of input.
    ///
    /// Failed exchanges are rendered and the loop continues.
    pub async fn run<I, O>(&mut self, input: &mut I, observer: &mut O) -> Result<SessionSummary>
    where
        I: InputSource + ?Sized,
        O: ChatObserver + ?Sized,
    {
        if self.state == SessionState::Idle {
            self.fire(SessionEvent::Start)?;
        }

        let mut summary = SessionSummary::default();

        while !self.state.is_terminal() {
            let line = match input.next_line()? {
                Some(line) => line,
                None => {
                    tracing::debug!("end of input, leaving chat");
                    break;
                }
            };

            // Checked before any network call
            if line == EXIT_SENTINEL {
                self.fire(SessionEvent::Sentinel)?;
                break;
            }

            if line.trim().is_empty() {
                self.fire(SessionEvent::EmptyInput)?;
                continue;
            }

            let exchange = self.send(line, &mut *observer).await?;
            summary.record(&exchange);
        }

        Ok(summary)
    }

    /// Perform one exchange and return to `AwaitInput`
    pub async fn send<O>(&mut self, message: impl Into<String>, observer: &mut O) -> Result<ChatExchange>
    where
        O: ChatObserver + ?Sized,
    {
        if self.state == SessionState::Idle {
            self.fire(SessionEvent::Start)?;
        }

        let request = ChatRequest::new(message, self.agent.clone());
        self.fire(SessionEvent::Submit)?;

        let outcome = self.drive(&request, &mut *observer).await?;
        let exchange = ChatExchange { request, outcome };

        observer.on_exchange(&exchange);
        self.fire(SessionEvent::Rendered)?;

        Ok(exchange)
    }

    async fn drive<O>(&mut self, request: &ChatRequest, observer: &mut O) -> Result<ExchangeOutcome>
    where
        O: ChatObserver + ?Sized,
    {
        let mut attempts = 0u32;
        let mut lazy_started = false;
        let mut body: Option<String> = None;
        let mut last_error: Option<String> = None;

        loop {
            match self.state {
                state if state.is_requesting() => {
                    attempts += 1;
                    match self.transport.send_chat(request).await {
                        Ok(text) => {
                            body = Some(text);
                            self.fire(SessionEvent::RequestSucceeded)?;
                        }
                        Err(e) => {
                            tracing::debug!(attempt = attempts, error = %e, "chat request failed");
                            last_error = Some(e.to_string());
                            self.fire(SessionEvent::RequestFailed)?;
                        }
                    }
                }
                SessionState::Unreachable => {
                    observer.lazy_start_began(self.startup_delay);
                    match self.launcher.launch() {
                        Ok(()) => {
                            tokio::time::sleep(self.startup_delay).await;
                            observer.lazy_start_ended(true);
                            lazy_started = true;
                            self.fire(SessionEvent::ServiceLaunched)?;
                        }
                        Err(e) => {
                            observer.lazy_start_ended(false);
                            tracing::warn!(error = %e, "could not start agent service");
                            last_error = Some(format!("could not start agent service: {}", e));
                            self.fire(SessionEvent::LaunchFailed)?;
                        }
                    }
                }
                SessionState::Delivered => {
                    let body = body.take().unwrap_or_default();
                    return Ok(ExchangeOutcome::Delivered {
                        reply: AgentReply::from_body(&body),
                        attempts,
                        lazy_started,
                    });
                }
                SessionState::Failed => {
                    return Ok(ExchangeOutcome::Failed {
                        error: last_error
                            .take()
                            .unwrap_or_else(|| format!("no response from {}", self.transport.endpoint())),
                        attempts,
                    });
                }
                other => {
                    return Err(ConsoleError::InvalidTransition {
                        from: format!("{:?}", other),
                        to: "(exchange)".to_string(),
                        reason: "exchange driven outside a request state".to_string(),
                    });
                }
            }
        }
    }
}
