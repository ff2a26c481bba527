//! Lazy start of the agent service
//!
//! The service is spawned detached: the console never waits on, monitors
//! or kills it.

use crate::config::DEFAULT_AGENT_PORT;
use crate::errors::{ConsoleError, Result};
use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Environment variable carrying the expected listening port
pub const AGENT_PORT_ENV: &str = "SOVEREIGN_AGENT_PORT";

/// Starts the agent service on demand
pub trait ServiceLauncher: Send + Sync {
    fn launch(&self) -> Result<()>;
}

/// Spawns `<python> <server_script>` as an independent background process
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    python: String,
    server_script: PathBuf,
    port: u16,
}

impl ProcessLauncher {
    pub fn new(python: String, server_script: PathBuf, port: u16) -> Self {
        Self {
            python,
            server_script,
            port,
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.python);
        cmd.arg(&self.server_script)
            .arg("--port")
            .arg(self.port.to_string())
            .env(AGENT_PORT_ENV, self.port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        if let Some(dir) = self.server_script.parent() {
            if dir.is_dir() {
                cmd.current_dir(dir);
            }
        }

        // Own process group so a Ctrl-C in the console does not reach it
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        cmd
    }
}

impl ServiceLauncher for ProcessLauncher {
    fn launch(&self) -> Result<()> {
        if !self.server_script.exists() {
            return Err(ConsoleError::IoError(io::Error::new(
                io::ErrorKind::NotFound,
                format!("agent server script not found: {}", self.server_script.display()),
            )));
        }

        if self.port != DEFAULT_AGENT_PORT {
            tracing::warn!(
                port = self.port,
                default = DEFAULT_AGENT_PORT,
                "agent service started on a non-default port; the server script must honour --port"
            );
        }

        let child = self.command().spawn()?;
        tracing::info!(
            pid = child.id(),
            port = self.port,
            script = %self.server_script.display(),
            "agent service spawned"
        );
        // Dropping the handle leaves the process running
        drop(child);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_script_is_reported() {
        let launcher = ProcessLauncher::new(
            "python3".to_string(),
            PathBuf::from("/nonexistent/agent_server.py"),
            8888,
        );
        let err = launcher.launch().unwrap_err();
        assert!(err.to_string().contains("agent_server.py"));
    }

    #[test]
    fn test_command_carries_port() {
        let launcher = ProcessLauncher::new(
            "python3".to_string(),
            PathBuf::from("/tmp/agent_server.py"),
            9123,
        );
        let cmd = launcher.command();
        let port = cmd
            .get_envs()
            .find(|(k, _)| *k == AGENT_PORT_ENV)
            .and_then(|(_, v)| v)
            .map(|v| v.to_string_lossy().to_string());
        assert_eq!(port.as_deref(), Some("9123"));
        assert_eq!(cmd.get_program(), "python3");

        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().to_string())
            .collect();
        assert_eq!(args, vec!["/tmp/agent_server.py", "--port", "9123"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_launch_spawns_detached() {
        let dir = tempfile::TempDir::new().unwrap();
        let script = dir.path().join("agent_server.sh");
        std::fs::write(&script, "exit 0\n").unwrap();

        let launcher = ProcessLauncher::new("sh".to_string(), script, 8888);
        assert!(launcher.launch().is_ok());
    }
}
