//! Command execution shared by the binary and the integration tests
//!
//! [`Console`] owns the loaded configuration and turns a [`Route`] into
//! terminal output and a process exit code.

use crate::agent::{AgentClient, ChatSession, ProcessLauncher, ServiceLauncher};
use crate::cli::{AgentAction, MeshAction, Route, TrainAction};
use crate::compliance::ComplianceEvaluator;
use crate::config::Config;
use crate::errors::{ConsoleError, Result};
use crate::metrics::{acquire_reading, MetricReading, MetricsEngine};
use crate::repl::display::{
    render_agent_info, render_compliance, render_device, render_metric_failure, render_metrics,
    render_status, render_training_list, render_training_stats, ChatDisplay,
};
use crate::repl::InputHandler;
use crate::status::{
    AgentServiceProbe, DataStoreProbe, DeviceProbe, Probe, RuntimeProbe, StatusAggregator,
    StatusReport, Subsystem, SubsystemHealth,
};
use crate::training::{collect_stats, list_training_files, write_modelfile, TrainingFilePattern};
use anyhow::Context;
use colored::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io;
use std::time::Duration;

/// Message sent by `agent test`
pub const PROBE_MESSAGE: &str = "What is CCCE?";

/// File name of the generated Modelfile inside the agents directory
pub const MODELFILE_NAME: &str = "Modelfile.aura";

/// Process exit code for a handled command
pub type ExitCode = i32;

pub const EXIT_OK: ExitCode = 0;
pub const EXIT_FAILURE: ExitCode = 1;

/// Executes routed commands against one configuration
pub struct Console {
    config: Config,
    engine: MetricsEngine,
    seed: Option<u64>,
}

impl Console {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            engine: MetricsEngine::new(),
            seed: None,
        }
    }

    /// Fix the seed of the simulated metrics source
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    fn client(&self) -> AgentClient {
        AgentClient::new(
            self.config.agent_url(),
            self.config.health_timeout(),
            self.config.chat_timeout(),
        )
    }

    fn launcher(&self) -> ProcessLauncher {
        ProcessLauncher::new(
            self.config.agent.python.clone(),
            self.config.server_script(),
            self.config.agent.port,
        )
    }

    fn pattern(&self) -> TrainingFilePattern {
        TrainingFilePattern::new(
            self.config.store.name_contains.clone(),
            self.config.store.extensions.clone(),
        )
    }

    fn device_probe(&self) -> DeviceProbe {
        DeviceProbe::new(
            self.config.device.bridge_binary.clone(),
            self.config.device.companion_package.clone(),
            Duration::from_millis(self.config.device.probe_timeout_ms),
        )
    }

    /// Aggregator wired to the configured subsystems
    pub fn status_aggregator(&self) -> StatusAggregator {
        StatusAggregator::new(
            Box::new(RuntimeProbe::new(
                self.config.runtime.binary.clone(),
                Duration::from_millis(self.config.runtime.probe_timeout_ms),
            )),
            Box::new(DataStoreProbe::new(self.config.training_dir(), self.pattern())),
            Box::new(AgentServiceProbe::new(self.client())),
            Box::new(self.device_probe()),
        )
    }

    pub async fn status_report(&self) -> StatusReport {
        self.status_aggregator().collect().await
    }

    /// Live reading from the agent service, else a simulated one
    pub async fn reading(&self) -> Result<MetricReading> {
        let client = self.client();
        let mut rng = self.rng();
        acquire_reading(&client, &self.engine, &mut rng).await
    }

    /// Run one routed command and return its exit code
    pub async fn execute(&self, route: Route, forward: &[String]) -> anyhow::Result<ExitCode> {
        tracing::debug!(?route, "executing command");

        match route {
            Route::Help => {
                print!("{}", crate::cli::usage());
                Ok(EXIT_OK)
            }
            Route::Status => self.run_status().await,
            Route::Ccce => self.run_ccce().await,
            Route::Qslice => self.run_qslice().await,
            Route::Agent(AgentAction::Info) => self.run_agent_info().await,
            Route::Agent(AgentAction::Test) => self.run_agent_test().await,
            Route::Chat => self.run_chat().await,
            Route::Train(action) => self.run_train(action),
            Route::Server => self.run_server().await,
            Route::Mesh(MeshAction::Status) => self.run_mesh_status().await,
            Route::Mesh(MeshAction::Sync) => {
                let program = self.config.collaborators.mesh_sync.clone();
                run_collaborator(&program, forward).await
            }
            Route::Writer => {
                let program = self.config.collaborators.writer.clone();
                run_collaborator(&program, forward).await
            }
            Route::Unified => {
                let program = self.config.collaborators.unified.clone();
                run_collaborator(&program, forward).await
            }
        }
    }

    async fn run_status(&self) -> anyhow::Result<ExitCode> {
        let report = self.status_report().await;
        println!("{}", render_status(&report));

        match self.reading().await {
            Ok(reading) => println!("{}", render_metrics(&self.engine.evaluate(&reading))),
            Err(e) => eprintln!("{}", render_metric_failure(&e)),
        }

        Ok(EXIT_OK)
    }

    async fn run_ccce(&self) -> anyhow::Result<ExitCode> {
        match self.reading().await {
            Ok(reading) => {
                println!("{}", render_metrics(&self.engine.evaluate(&reading)));
                Ok(EXIT_OK)
            }
            Err(e) => metric_failure(e),
        }
    }

    async fn run_qslice(&self) -> anyhow::Result<ExitCode> {
        match self.reading().await {
            Ok(reading) => {
                let evaluator = ComplianceEvaluator::new(self.engine.clone());
                let report = evaluator.evaluate(&reading);
                tracing::info!(
                    score = report.score,
                    verdict = report.verdict.label(),
                    source = report.source.label(),
                    "compliance evaluated"
                );
                println!("{}", render_compliance(&report));
                Ok(EXIT_OK)
            }
            Err(e) => metric_failure(e),
        }
    }

    async fn run_agent_info(&self) -> anyhow::Result<ExitCode> {
        let client = self.client();
        let status = match client.status().await {
            Ok(status) => Some(status),
            Err(e) => {
                tracing::debug!(error = %e, "agent status unavailable");
                None
            }
        };
        println!("{}", render_agent_info(client.base_url(), status.as_ref()));
        Ok(EXIT_OK)
    }

    fn chat_session(&self) -> ChatSession<AgentClient, ProcessLauncher> {
        ChatSession::new(
            self.client(),
            self.launcher(),
            self.config.agent.name.clone(),
            self.config.startup_delay(),
        )
    }

    async fn run_agent_test(&self) -> anyhow::Result<ExitCode> {
        let mut session = self.chat_session();
        let mut display = ChatDisplay::new(self.config.agent.name.clone());

        println!("{} {}", "you:".bold(), PROBE_MESSAGE);
        match session.send(PROBE_MESSAGE, &mut display).await {
            Ok(exchange) if !exchange.outcome.is_delivered() => {
                tracing::warn!(attempts = exchange.outcome.attempts(), "agent test failed");
            }
            Ok(_) => {}
            Err(e) => report_failure(&anyhow::Error::new(e).context("agent test exchange")),
        }
        Ok(EXIT_OK)
    }

    async fn run_chat(&self) -> anyhow::Result<ExitCode> {
        let mut input = match InputHandler::with_history(self.config.history_file()) {
            Ok(input) => input,
            Err(e) => {
                report_failure(&anyhow::Error::new(e).context("failed to initialize chat prompt"));
                return Ok(EXIT_OK);
            }
        };
        let mut display = ChatDisplay::new(self.config.agent.name.clone());
        display.show_banner(&self.config.agent.name, &self.config.agent_url());

        let mut session = self.chat_session();
        let summary = match session.run(&mut input, &mut display).await {
            Ok(summary) => summary,
            Err(e) => {
                report_failure(&anyhow::Error::new(e).context("chat session ended"));
                return Ok(EXIT_OK);
            }
        };

        if let Err(e) = input.save_history() {
            tracing::warn!(error = %e, "chat history not saved");
        }

        println!(
            "{}",
            format!(
                "Session ended: {} delivered, {} failed",
                summary.delivered, summary.failed
            )
            .dimmed()
        );
        Ok(EXIT_OK)
    }

    fn run_train(&self, action: TrainAction) -> anyhow::Result<ExitCode> {
        let dir = self.config.training_dir();
        if !dir.is_dir() {
            println!(
                "{} {}",
                "Training directory not found:".yellow(),
                dir.display()
            );
            return Ok(EXIT_OK);
        }

        let outcome = match action {
            TrainAction::List => list_training_files(&dir, &self.pattern())
                .map(|files| print!("{}", render_training_list(&files)))
                .with_context(|| format!("reading {}", dir.display())),
            TrainAction::Stats => collect_stats(&dir, &self.pattern())
                .map(|stats| print!("{}", render_training_stats(&stats)))
                .with_context(|| format!("reading {}", dir.display())),
            TrainAction::Ollama => {
                let output = self.config.agents_dir().join(MODELFILE_NAME);
                let written = write_modelfile(&dir, &self.pattern(), &output)
                    .map(|pairs| {
                        println!(
                            "{} {} ({} knowledge pairs)",
                            "✓".green(),
                            output.display(),
                            pairs
                        );
                        println!(
                            "Create the model with: {} create {} -f {}",
                            self.config.runtime.binary,
                            self.config.agent.name,
                            output.display()
                        );
                    })
                    .with_context(|| format!("writing {}", output.display()));
                written
            }
        };

        if let Err(e) = outcome {
            report_failure(&e);
        }
        Ok(EXIT_OK)
    }

    async fn run_server(&self) -> anyhow::Result<ExitCode> {
        let client = self.client();
        if client.is_available().await {
            println!("Agent service already running at {}", client.base_url());
            return Ok(EXIT_OK);
        }

        match self.launcher().launch() {
            Ok(()) => println!(
                "{} Agent service starting on {}",
                "✓".green(),
                client.base_url()
            ),
            Err(e) => eprintln!("{} {}", "✗".red(), e),
        }
        Ok(EXIT_OK)
    }

    async fn run_mesh_status(&self) -> anyhow::Result<ExitCode> {
        let health =
            SubsystemHealth::from_result(Subsystem::PeerDevice, self.device_probe().probe().await);
        println!("{}", render_device(&health));
        Ok(EXIT_OK)
    }
}

/// Print a handler error that does not change the exit code
fn report_failure(error: &anyhow::Error) {
    tracing::debug!(error = ?error, "command failed");
    eprintln!("{} {:#}", "✗".red(), error);
}

fn metric_failure(error: ConsoleError) -> anyhow::Result<ExitCode> {
    eprintln!("{}", render_metric_failure(&error));
    if error.is_fatal() {
        Ok(EXIT_FAILURE)
    } else {
        Ok(EXIT_OK)
    }
}

/// Run an external collaborator program with the terminal attached.
///
/// A missing or unrunnable program is reported, not treated as a failure.
pub async fn run_collaborator(program: &str, args: &[String]) -> anyhow::Result<ExitCode> {
    tracing::debug!(program, ?args, "launching collaborator");

    match tokio::process::Command::new(program).args(args).status().await {
        Ok(status) => {
            if !status.success() {
                tracing::warn!(program, code = ?status.code(), "collaborator exited with failure");
            }
            Ok(EXIT_OK)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            println!("{} {} is not available", "!".yellow(), program);
            Ok(EXIT_OK)
        }
        Err(e) => {
            report_failure(&anyhow::Error::new(e).context(format!("failed to run {}", program)));
            Ok(EXIT_OK)
        }
    }
}
