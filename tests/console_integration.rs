//! End-to-end command handling with every external subsystem absent

use httpmock::{Method::GET, MockServer};
use sovereign::cli::{Route, TrainAction};
use sovereign::compliance::ComplianceEvaluator;
use sovereign::execution::{EXIT_FAILURE, EXIT_OK, MODELFILE_NAME};
use sovereign::metrics::{MetricReading, MetricsEngine, ReadingSource};
use sovereign::training::{collect_stats, TrainingFilePattern};
use sovereign::{Config, ConsoleError, Console};
use std::fs;
use tempfile::TempDir;

fn config_in(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.agent.port = 1;
    config.agent.health_timeout_ms = 200;
    config.runtime.binary = "sovereign-no-such-runtime".to_string();
    config.device.bridge_binary = "sovereign-no-such-bridge".to_string();
    config.store.training_dir = dir.path().join("training").display().to_string();
    config.paths.agents_dir = dir.path().join("agents").display().to_string();
    config.collaborators.writer = "sovereign-no-such-writer".to_string();
    config
}

fn seed_store(dir: &TempDir) {
    let store = dir.path().join("training");
    fs::create_dir_all(&store).unwrap();
    fs::write(
        store.join("alpha_training.json"),
        r#"[{"instruction":"a","response":"b"},{"instruction":"c","response":"d"}]"#,
    )
    .unwrap();
    fs::write(
        store.join("beta_training.jsonl"),
        "{\"instruction\":\"What is CCCE?\",\"response\":\"Four metrics.\"}\n\
         {\"instruction\":\"What is Xi?\",\"response\":\"Negentropy.\"}\n\
         {\"instruction\":\"What is Gamma?\",\"response\":\"Decoherence.\"}\n",
    )
    .unwrap();
    fs::write(store.join("broken_training.json"), "{not json").unwrap();
    fs::write(store.join("notes.txt"), "not training data").unwrap();
}

#[test]
fn test_dispatch_routes() {
    assert_eq!(
        Route::parse(Some("train"), None).unwrap(),
        Route::parse(Some("train"), Some("list")).unwrap()
    );
    assert_eq!(
        Route::parse(Some("train"), Some("nonsense")).unwrap(),
        Route::Train(TrainAction::List)
    );
    assert!(matches!(
        Route::parse(Some("frobnicate"), None),
        Err(ConsoleError::Usage(_))
    ));
}

#[tokio::test]
async fn test_offline_commands_exit_zero() {
    let dir = TempDir::new().unwrap();
    let console = Console::new(config_in(&dir)).with_seed(Some(11));

    for route in [
        Route::Help,
        Route::Status,
        Route::Ccce,
        Route::Qslice,
        Route::parse(Some("agent"), None).unwrap(),
        Route::parse(Some("mesh"), None).unwrap(),
        Route::Writer,
    ] {
        let code = console.execute(route, &[]).await.unwrap();
        assert_eq!(code, EXIT_OK, "{:?}", route);
    }
}

#[tokio::test]
async fn test_offline_metrics_are_simulated_and_never_gate() {
    let dir = TempDir::new().unwrap();
    let console = Console::new(config_in(&dir)).with_seed(Some(3));

    let reading = console.reading().await.unwrap();
    assert_eq!(reading.source(), ReadingSource::Simulated);

    let report = ComplianceEvaluator::default().evaluate(&reading);
    // Every simulated reading lands well above the pass mark
    assert!(report.is_certified());
    assert!(!report.gates_release());
}

#[test]
fn test_reference_reading() {
    let engine = MetricsEngine::new();
    let reading = MetricReading::live(0.91, 0.82, 0.085).unwrap();
    let verdict = engine.evaluate(&reading);

    assert!((reading.negentropy() - 8.78).abs() < 0.01);
    assert!(verdict.all_passed());

    let report = ComplianceEvaluator::new(engine).evaluate(&reading);
    assert!(report.is_certified());
    assert!(report.gates_release());
}

#[tokio::test]
async fn test_invalid_live_metric_exit_codes() {
    let server = MockServer::start();
    let status = server.mock(|when, then| {
        when.method(GET).path("/status");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"model":"aura","ccce":{"phi":0.91,"lambda":0.82,"gamma":0.0}}"#);
    });

    let dir = TempDir::new().unwrap();
    let mut config = config_in(&dir);
    config.agent.port = server.port();
    config.agent.health_timeout_ms = 2_000;
    let console = Console::new(config).with_seed(Some(5));

    assert!(matches!(
        console.reading().await,
        Err(ConsoleError::InvalidMetric { .. })
    ));

    // Reported by status without failing it; fatal for the metric commands
    assert_eq!(console.execute(Route::Status, &[]).await.unwrap(), EXIT_OK);
    assert_eq!(console.execute(Route::Ccce, &[]).await.unwrap(), EXIT_FAILURE);
    assert_eq!(console.execute(Route::Qslice, &[]).await.unwrap(), EXIT_FAILURE);
    status.assert_calls(5);
}

#[tokio::test]
async fn test_unrunnable_collaborator_exits_zero() {
    let dir = TempDir::new().unwrap();
    let mut config = config_in(&dir);
    // Exists, but is a directory and cannot be executed
    config.collaborators.writer = dir.path().display().to_string();
    let console = Console::new(config);

    let code = console
        .execute(Route::Writer, &["draft".to_string()])
        .await
        .unwrap();
    assert_eq!(code, EXIT_OK);
}

#[test]
fn test_invalid_metric_is_fatal() {
    let err = MetricReading::live(0.91, 0.82, 0.0).unwrap_err();
    assert!(matches!(err, ConsoleError::InvalidMetric { .. }));
    assert!(err.is_fatal());
    assert_ne!(EXIT_OK, EXIT_FAILURE);
}

#[test]
fn test_train_commands_over_store() {
    let dir = TempDir::new().unwrap();
    seed_store(&dir);
    let console = Console::new(config_in(&dir));

    let pattern = TrainingFilePattern::new("training", vec!["json".into(), "jsonl".into()]);
    let stats = collect_stats(&dir.path().join("training"), &pattern).unwrap();
    assert_eq!(stats.files.len(), 3);
    assert_eq!(stats.total_records(), 5);
    assert_eq!(stats.unknown_files(), 1);

    for action in [TrainAction::List, TrainAction::Stats] {
        let code = tokio_test::block_on(console.execute(Route::Train(action), &[])).unwrap();
        assert_eq!(code, EXIT_OK);
    }
}

#[test]
fn test_train_ollama_writes_modelfile() {
    let dir = TempDir::new().unwrap();
    seed_store(&dir);
    let console = Console::new(config_in(&dir));

    let code =
        tokio_test::block_on(console.execute(Route::Train(TrainAction::Ollama), &[])).unwrap();
    assert_eq!(code, EXIT_OK);

    let modelfile = fs::read_to_string(dir.path().join("agents").join(MODELFILE_NAME)).unwrap();
    assert!(modelfile.contains("FROM phi3:mini"));
    assert!(modelfile.contains("Q: What is CCCE?\nA: Four metrics."));
    assert!(modelfile.contains("Q: What is Gamma?"));
}

#[test]
fn test_config_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        "[agent]\nport = 9999\nname = \"nova\"\n\n[store]\ntraining_dir = \"/srv/training\"\n",
    )
    .unwrap();

    let config = Config::load(Some(path)).unwrap();
    assert_eq!(config.agent.port, 9999);
    assert_eq!(config.agent.name, "nova");
    assert_eq!(config.agent.host, "127.0.0.1");
    assert_eq!(config.runtime.binary, "ollama");
    assert_eq!(config.agent_url(), "http://127.0.0.1:9999");
}
