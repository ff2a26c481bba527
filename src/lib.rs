//! Sovereign - command console for a local agent stack
//!
//! Reports subsystem health, derives and checks CCCE metrics, evaluates
//! Q-SLICE compliance and runs an interactive chat session against the
//! agent service, starting it on demand.
//!
//! # Architecture
//!
//! - **metrics** / **compliance**: pure derivations over a reading
//! - **status**: four probes aggregated into a fixed-order report
//! - **agent**: HTTP client, lazy-start launcher and the chat state machine
//! - **training**: training data store and Modelfile output
//! - **cli** / **execution**: routing and per-command handlers

pub mod errors;
pub mod config;
pub mod telemetry;

pub use errors::{ConsoleError, Result};

pub mod metrics;
pub mod compliance;
pub mod status;
pub mod agent;
pub mod training;

pub mod cli;
pub mod repl;
pub mod execution;

pub use config::Config;
pub use execution::Console;
