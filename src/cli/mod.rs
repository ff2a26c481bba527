//! CLI module for the Sovereign console
//!
//! Argument parsing and command routing.

pub mod args;
pub mod dispatch;

pub use args::{Args, Verbosity};
pub use dispatch::{usage, AgentAction, MeshAction, Route, TrainAction};
