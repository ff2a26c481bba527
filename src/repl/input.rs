//! Chat prompt using rustyline
//!
//! Provides line editing and persistent history for the chat loop.

use crate::agent::session::InputSource;
use crate::errors::{ConsoleError, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io;
use std::path::PathBuf;

/// Prompt shown before each chat line
pub const PROMPT: &str = "sovereign> ";

fn readline_error(err: ReadlineError) -> ConsoleError {
    match err {
        ReadlineError::Io(e) => ConsoleError::IoError(e),
        other => ConsoleError::IoError(io::Error::new(io::ErrorKind::Other, other.to_string())),
    }
}

/// Input handler managing the readline interface and its history
pub struct InputHandler {
    editor: DefaultEditor,
    history_path: PathBuf,
}

impl InputHandler {
    /// Create input handler with persistent history
    pub fn with_history(history_file: PathBuf) -> Result<Self> {
        let mut editor = DefaultEditor::new().map_err(readline_error)?;

        if history_file.exists() {
            if let Err(e) = editor.load_history(&history_file) {
                tracing::debug!(error = %e, path = %history_file.display(), "history not loaded");
            }
        }

        Ok(InputHandler {
            editor,
            history_path: history_file,
        })
    }

    /// Save history to disk, creating its directory if needed
    pub fn save_history(&mut self) -> Result<()> {
        if let Some(parent) = self.history_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.editor
            .save_history(&self.history_path)
            .map_err(readline_error)?;
        Ok(())
    }
}

impl InputSource for InputHandler {
    /// Ctrl-C yields an empty line so the loop simply re-prompts;
    /// Ctrl-D ends input.
    fn next_line(&mut self) -> Result<Option<String>> {
        match self.editor.readline(PROMPT) {
            Ok(line) => {
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    let _ = self.editor.add_history_entry(trimmed);
                }
                Ok(Some(trimmed.to_string()))
            }
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(readline_error(err)),
        }
    }
}
