//! Command routing
//!
//! Maps the `command [subcommand]` tokens onto exactly one [`Route`].
//! Unknown commands are usage errors; unknown subcommands fall back to the
//! command's default.

use crate::errors::{ConsoleError, Result};

/// Actions under `agent`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentAction {
    Info,
    Test,
}

/// Actions under `train`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainAction {
    List,
    Stats,
    Ollama,
}

/// Actions under `mesh`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshAction {
    Status,
    Sync,
}

/// Resolved command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Help,
    Status,
    Ccce,
    Qslice,
    Agent(AgentAction),
    Chat,
    Train(TrainAction),
    Server,
    Mesh(MeshAction),
    Writer,
    Unified,
}

/// Top-level command names, in usage order
pub const COMMANDS: [&str; 11] = [
    "status", "ccce", "qslice", "agent", "chat", "train", "server", "mesh", "writer", "unified",
    "help",
];

impl Route {
    /// Resolve command tokens into a route
    pub fn parse(command: Option<&str>, subcommand: Option<&str>) -> Result<Route> {
        let Some(command) = command else {
            return Ok(Route::Help);
        };

        let route = match command {
            "help" | "--help" | "-h" => Route::Help,
            "status" => Route::Status,
            "ccce" => Route::Ccce,
            "qslice" => Route::Qslice,
            "chat" => Route::Chat,
            "server" => Route::Server,
            "writer" => Route::Writer,
            "unified" => Route::Unified,
            "agent" => Route::Agent(match subcommand {
                Some("test") => AgentAction::Test,
                other => {
                    log_fallback(command, other, "info");
                    AgentAction::Info
                }
            }),
            "train" => Route::Train(match subcommand {
                Some("stats") => TrainAction::Stats,
                Some("ollama") => TrainAction::Ollama,
                other => {
                    log_fallback(command, other, "list");
                    TrainAction::List
                }
            }),
            "mesh" => Route::Mesh(match subcommand {
                Some("sync") => MeshAction::Sync,
                other => {
                    log_fallback(command, other, "status");
                    MeshAction::Status
                }
            }),
            unknown => {
                return Err(ConsoleError::Usage(unknown.to_string()));
            }
        };

        Ok(route)
    }

    /// Whether the route reads the configuration file; help never does
    pub fn needs_config(&self) -> bool {
        !matches!(self, Route::Help)
    }

    /// Whether the route hands its subcommand and trailing args to an external program
    pub fn forwards_args(&self) -> bool {
        matches!(self, Route::Writer | Route::Unified | Route::Mesh(MeshAction::Sync))
    }
}

fn log_fallback(command: &str, given: Option<&str>, default: &str) {
    match given {
        None => {}
        Some(sub) if sub == default => {}
        Some(sub) => tracing::debug!(
            command,
            subcommand = sub,
            fallback = default,
            "unknown subcommand, using default"
        ),
    }
}

/// Usage text
pub fn usage() -> String {
    let entries = [
        ("status", "Show runtime, data store, agent service and device health"),
        ("ccce", "Show CCCE consciousness metrics"),
        ("qslice", "Run the Q-SLICE compliance check"),
        ("agent [info|test]", "Show agent service info or send a test message"),
        ("chat", "Interactive chat with the agent (type 'exit' to leave)"),
        ("train [list|stats|ollama]", "Inspect training data or write the Modelfile"),
        ("server", "Start the agent service in the background"),
        ("mesh [status|sync]", "Device mesh status or synchronisation"),
        ("writer", "Launch the writer collaborator"),
        ("unified", "Launch the unified collaborator"),
        ("help", "Show this help"),
    ];

    let mut text = String::from("Usage: sovereign [OPTIONS] <COMMAND> [SUBCOMMAND] [ARGS...]\n\nCommands:\n");
    for (name, about) in entries {
        text.push_str(&format!("  {:<28} {}\n", name, about));
    }
    text.push_str(
        "\nOptions:\n  --host <HOST>      Agent service host\n  --port <PORT>      Agent service port\n  -c, --config <FILE>  Configuration file\n  --seed <N>         Seed for simulated metrics\n  -v, -vv            More logging\n  -q                 Errors only\n",
    );
    text
}
