//! Chat session tests against a real HTTP client and a local stand-in
//! for the agent service.

mod common;

use async_trait::async_trait;
use common::{free_port, InertLauncher, Recorder, ScriptedInput, ServeOnLaunch};
use httpmock::{Method::POST, MockServer};
use sovereign::agent::{
    AgentClient, AgentReply, AgentTransport, ChatRequest, ChatSession, ExchangeOutcome,
    SessionState,
};
use sovereign::{ConsoleError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn client(base_url: String) -> AgentClient {
    AgentClient::new(
        base_url,
        Duration::from_millis(500),
        Duration::from_secs(2),
    )
}

/// Times out on the first call, answers afterwards
struct SlowThenFine {
    calls: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<ChatRequest>>>,
}

#[async_trait]
impl AgentTransport for SlowThenFine {
    async fn send_chat(&self, request: &ChatRequest) -> Result<String> {
        self.seen.lock().unwrap().push(request.clone());
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(ConsoleError::Timeout { duration_ms: 60_000 })
        } else {
            Ok(r#"{"response":"Φ is consciousness"}"#.to_string())
        }
    }

    fn endpoint(&self) -> String {
        "slow".to_string()
    }
}

#[tokio::test]
async fn test_timeout_then_retry_succeeds_with_one_launch() {
    let calls = Arc::new(AtomicUsize::new(0));
    let transport = SlowThenFine {
        calls: calls.clone(),
        seen: Arc::new(Mutex::new(Vec::new())),
    };
    let launcher = InertLauncher::default();
    let launches = launcher.launches.clone();

    let mut session = ChatSession::new(transport, launcher, "aura", Duration::from_millis(10));
    let mut recorder = Recorder::default();
    let mut input = ScriptedInput::new(&["what is phi?", "exit"]);

    let summary = session.run(&mut input, &mut recorder).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(launches.load(Ordering::SeqCst), 1);
    assert_eq!(summary.delivered, 1);
    assert_eq!(session.state(), SessionState::Exit);

    match &recorder.exchanges[0].outcome {
        ExchangeOutcome::Delivered {
            reply,
            attempts,
            lazy_started,
        } => {
            assert_eq!(*attempts, 2);
            assert!(*lazy_started);
            assert_eq!(reply.text(), "Φ is consciousness");
        }
        other => panic!("expected delivery, got {:?}", other),
    }
}

#[tokio::test]
async fn test_retry_sends_identical_request() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let transport = SlowThenFine {
        calls: Arc::new(AtomicUsize::new(0)),
        seen: seen.clone(),
    };
    let mut session = ChatSession::new(
        transport,
        InertLauncher::default(),
        "aura",
        Duration::from_millis(1),
    );
    let mut recorder = Recorder::default();
    session.send("same message", &mut recorder).await.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0], seen[1]);
    assert_eq!(seen[1].message, "same message");
    assert_eq!(seen[1].agent, "aura");
    assert_eq!(recorder.exchanges[0].request, seen[0]);
}

#[tokio::test]
async fn test_lazy_start_brings_service_up() {
    let server = MockServer::start();
    let launcher = ServeOnLaunch::new(
        &server,
        r#"{"response":"online","ccce":{"phi":0.85,"lambda":0.91,"gamma":0.08,"xi":9.6,"conscious":true}}"#,
    );
    let launches = launcher.launches.clone();

    let mut session = ChatSession::new(
        client(server.base_url()),
        launcher,
        "aura",
        Duration::from_millis(100),
    );
    let mut recorder = Recorder::default();
    let exchange = session.send("hello", &mut recorder).await.unwrap();

    assert_eq!(launches.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.lazy_starts, 1);
    assert_eq!(exchange.outcome.attempts(), 2);
    match exchange.outcome {
        ExchangeOutcome::Delivered { reply, .. } => {
            assert_eq!(reply.text(), "online");
            let metrics = reply.metrics().unwrap();
            assert_eq!(metrics.phi, Some(0.85));
            assert_eq!(metrics.conscious, Some(true));
        }
        other => panic!("expected delivery, got {:?}", other),
    }
    assert_eq!(session.state(), SessionState::AwaitInput);
}

#[tokio::test]
async fn test_unstructured_body_shown_raw() {
    let server = MockServer::start();
    let chat = server.mock(|when, then| {
        when.method(POST).path("/chat");
        then.status(200).body("plain words, not json");
    });
    let launcher = InertLauncher::default();
    let launches = launcher.launches.clone();

    let mut session = ChatSession::new(
        client(server.base_url()),
        launcher,
        "aura",
        Duration::from_millis(100),
    );
    let mut recorder = Recorder::default();
    let exchange = session.send("hello", &mut recorder).await.unwrap();

    chat.assert_calls(1);
    assert_eq!(launches.load(Ordering::SeqCst), 0);
    match exchange.outcome {
        ExchangeOutcome::Delivered { reply, attempts, .. } => {
            assert_eq!(attempts, 1);
            assert_eq!(reply, AgentReply::Raw("plain words, not json".to_string()));
        }
        other => panic!("expected delivery, got {:?}", other),
    }
}

#[tokio::test]
async fn test_loop_survives_double_failure() {
    let launcher = InertLauncher::default();
    let launches = launcher.launches.clone();

    let mut session = ChatSession::new(
        client(format!("http://127.0.0.1:{}", free_port())),
        launcher,
        "aura",
        Duration::from_millis(10),
    );
    let mut recorder = Recorder::default();
    let mut input = ScriptedInput::new(&["first", "", "second", "exit", "never read"]);

    let summary = session.run(&mut input, &mut recorder).await.unwrap();

    assert_eq!(summary.failed, 2);
    assert_eq!(summary.delivered, 0);
    // One lazy start per failed exchange, never more
    assert_eq!(launches.load(Ordering::SeqCst), 2);
    assert_eq!(recorder.lazy_starts, 2);
    for exchange in &recorder.exchanges {
        assert_eq!(exchange.outcome.attempts(), 2);
        assert!(!exchange.outcome.is_delivered());
    }
    assert_eq!(session.state(), SessionState::Exit);
    assert_eq!(input.0.len(), 1);
}

#[tokio::test]
async fn test_sentinel_skips_network() {
    let calls = Arc::new(AtomicUsize::new(0));
    let transport = SlowThenFine {
        calls: calls.clone(),
        seen: Arc::new(Mutex::new(Vec::new())),
    };
    let mut session = ChatSession::new(
        transport,
        InertLauncher::default(),
        "aura",
        Duration::from_millis(1),
    );
    let mut recorder = Recorder::default();
    let mut input = ScriptedInput::new(&["", "exit"]);

    let summary = session.run(&mut input, &mut recorder).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(summary.exchanges(), 0);
    assert_eq!(session.state(), SessionState::Exit);
}

#[tokio::test]
async fn test_sentinel_is_case_sensitive() {
    let calls = Arc::new(AtomicUsize::new(1));
    let transport = SlowThenFine {
        calls: calls.clone(),
        seen: Arc::new(Mutex::new(Vec::new())),
    };
    let mut session = ChatSession::new(
        transport,
        InertLauncher::default(),
        "aura",
        Duration::from_millis(1),
    );
    let mut recorder = Recorder::default();
    let mut input = ScriptedInput::new(&["EXIT", "exit"]);

    let summary = session.run(&mut input, &mut recorder).await.unwrap();

    assert_eq!(summary.delivered, 1);
    assert_eq!(recorder.exchanges[0].request.message, "EXIT");
}

#[tokio::test]
async fn test_end_of_input_leaves_loop() {
    let mut session = ChatSession::new(
        client(format!("http://127.0.0.1:{}", free_port())),
        InertLauncher::default(),
        "aura",
        Duration::from_millis(1),
    );
    let mut recorder = Recorder::default();
    let mut input = ScriptedInput::new(&[]);

    let summary = session.run(&mut input, &mut recorder).await.unwrap();
    assert_eq!(summary.exchanges(), 0);
}
