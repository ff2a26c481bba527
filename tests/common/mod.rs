//! Shared fixtures for integration tests: an agent service stand-in that
//! only answers once launched, scripted chat input and a recording observer.

#![allow(dead_code)]

use httpmock::{Method::POST, MockServer};
use sovereign::agent::{ChatExchange, ChatObserver, InputSource, ServiceLauncher};
use sovereign::Result;
use std::collections::VecDeque;
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A localhost port with nothing listening on it
pub fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Launcher that starts answering `POST /chat` on `server` when launched.
///
/// Until then the server rejects every request with 404.
pub struct ServeOnLaunch<'a> {
    pub server: &'a MockServer,
    pub body: String,
    pub launches: Arc<AtomicUsize>,
}

impl<'a> ServeOnLaunch<'a> {
    pub fn new(server: &'a MockServer, body: impl Into<String>) -> Self {
        Self {
            server,
            body: body.into(),
            launches: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl ServiceLauncher for ServeOnLaunch<'_> {
    fn launch(&self) -> Result<()> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        self.server.mock(|when, then| {
            when.method(POST).path("/chat");
            then.status(200)
                .header("content-type", "application/json")
                .body(&self.body);
        });
        Ok(())
    }
}

/// Launcher that never brings anything up
#[derive(Default)]
pub struct InertLauncher {
    pub launches: Arc<AtomicUsize>,
}

impl ServiceLauncher for InertLauncher {
    fn launch(&self) -> Result<()> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Fixed sequence of chat lines, then end of input
pub struct ScriptedInput(pub VecDeque<String>);

impl ScriptedInput {
    pub fn new(lines: &[&str]) -> Self {
        Self(lines.iter().map(|l| l.to_string()).collect())
    }
}

impl InputSource for ScriptedInput {
    fn next_line(&mut self) -> Result<Option<String>> {
        Ok(self.0.pop_front())
    }
}

/// Keeps every finished exchange
#[derive(Default)]
pub struct Recorder {
    pub exchanges: Vec<ChatExchange>,
    pub lazy_starts: usize,
}

impl ChatObserver for Recorder {
    fn on_exchange(&mut self, exchange: &ChatExchange) {
        self.exchanges.push(exchange.clone());
    }

    fn lazy_start_began(&mut self, _delay: std::time::Duration) {
        self.lazy_starts += 1;
    }
}
