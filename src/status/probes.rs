//! Concrete subsystem probes
//!
//! External tools run with a timeout and `kill_on_drop`, so a hung tool
//! never outlives its probe.

use crate::agent::AgentClient;
use crate::errors::{ConsoleError, Result};
use crate::status::{HealthDetail, Probe, ProbeReport};
use crate::training::{list_training_files, TrainingFilePattern};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Run an external tool and return its stdout when it exits successfully
pub async fn run_tool(binary: &str, args: &[&str], limit: Duration) -> Result<String> {
    let mut cmd = Command::new(binary);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    match timeout(limit, cmd.output()).await {
        Ok(Ok(output)) if output.status.success() => {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        }
        Ok(Ok(output)) => Err(ConsoleError::ProbeFailed {
            probe: binary.to_string(),
            reason: format!(
                "exited with {}: {}",
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        }),
        Ok(Err(e)) => Err(ConsoleError::ProbeFailed {
            probe: binary.to_string(),
            reason: format!("not invocable: {}", e),
        }),
        Err(_) => Err(ConsoleError::Timeout {
            duration_ms: limit.as_millis() as u64,
        }),
    }
}

/// Count models in `ollama list` output (header line, then one model per line)
pub fn parse_model_count(stdout: &str) -> usize {
    stdout
        .lines()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .count()
}

/// Serials of attached devices in `adb devices` output
pub fn parse_devices(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter(|line| !line.starts_with("List of devices") && !line.starts_with('*'))
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some(serial), Some("device")) => Some(serial.to_string()),
                _ => None,
            }
        })
        .collect()
}

/// Whether `pm list packages` output lists exactly this package
pub fn package_listed(stdout: &str, package: &str) -> bool {
    stdout
        .lines()
        .filter_map(|line| line.trim().strip_prefix("package:"))
        .any(|name| name == package)
}

/// Model runtime presence and model count
pub struct RuntimeProbe {
    binary: String,
    timeout: Duration,
}

impl RuntimeProbe {
    pub fn new(binary: String, timeout: Duration) -> Self {
        Self { binary, timeout }
    }
}

#[async_trait]
impl Probe for RuntimeProbe {
    async fn probe(&self) -> Result<ProbeReport> {
        let stdout = run_tool(&self.binary, &["list"], self.timeout).await?;
        Ok(ProbeReport::present(Some(HealthDetail::Count {
            label: "models",
            value: parse_model_count(&stdout),
        })))
    }
}

/// Training files present in the store directory
pub struct DataStoreProbe {
    dir: PathBuf,
    pattern: TrainingFilePattern,
}

impl DataStoreProbe {
    pub fn new(dir: PathBuf, pattern: TrainingFilePattern) -> Self {
        Self { dir, pattern }
    }
}

#[async_trait]
impl Probe for DataStoreProbe {
    async fn probe(&self) -> Result<ProbeReport> {
        if !self.dir.is_dir() {
            return Ok(ProbeReport::absent(format!(
                "{} not found",
                self.dir.display()
            )));
        }

        let files = list_training_files(&self.dir, &self.pattern)?;
        let report = ProbeReport::present(Some(HealthDetail::Count {
            label: "files",
            value: files.len(),
        }));

        Ok(if files.is_empty() {
            report.with_note("no training files")
        } else {
            report
        })
    }
}

/// Agent service health endpoint
pub struct AgentServiceProbe {
    client: AgentClient,
}

impl AgentServiceProbe {
    pub fn new(client: AgentClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Probe for AgentServiceProbe {
    async fn probe(&self) -> Result<ProbeReport> {
        let status = self.client.status().await?;
        let report = ProbeReport::present(status.model.map(HealthDetail::Identifier));

        Ok(match status.conversation_turns {
            Some(turns) => report.with_note(format!("{} turns", turns)),
            None => report,
        })
    }
}

/// Attached peer device and its companion package
pub struct DeviceProbe {
    bridge: String,
    companion_package: String,
    timeout: Duration,
}

impl DeviceProbe {
    pub fn new(bridge: String, companion_package: String, timeout: Duration) -> Self {
        Self {
            bridge,
            companion_package,
            timeout,
        }
    }
}

#[async_trait]
impl Probe for DeviceProbe {
    async fn probe(&self) -> Result<ProbeReport> {
        let stdout = run_tool(&self.bridge, &["devices"], self.timeout).await?;
        let Some(serial) = parse_devices(&stdout).into_iter().next() else {
            return Ok(ProbeReport::absent("no device connected"));
        };

        let report = ProbeReport::present(Some(HealthDetail::Identifier(serial.clone())));

        let companion = run_tool(
            &self.bridge,
            &[
                "-s",
                serial.as_str(),
                "shell",
                "pm",
                "list",
                "packages",
                self.companion_package.as_str(),
            ],
            self.timeout,
        )
        .await;

        Ok(match companion {
            Ok(out) if package_listed(&out, &self.companion_package) => {
                report.with_note(format!("{} installed", self.companion_package))
            }
            Ok(_) => report.with_note(format!("{} missing", self.companion_package)),
            Err(e) => {
                tracing::debug!(error = %e, "companion package query failed");
                report.with_note("companion package unknown")
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_model_count() {
        let out = "NAME            ID            SIZE    MODIFIED\n\
                   aura:latest     abc123        2.2 GB  2 days ago\n\
                   phi3:mini       def456        2.2 GB  3 days ago\n";
        assert_eq!(parse_model_count(out), 2);
        assert_eq!(parse_model_count("NAME ID SIZE MODIFIED\n"), 0);
        assert_eq!(parse_model_count(""), 0);
    }

    #[test]
    fn test_parse_devices() {
        let out = "* daemon started successfully\nList of devices attached\n\
                   emulator-5554\tdevice\nR58M\tunauthorized\n\n";
        assert_eq!(parse_devices(out), vec!["emulator-5554".to_string()]);
        assert!(parse_devices("List of devices attached\n\n").is_empty());
    }

    #[test]
    fn test_package_listed_exact() {
        let out = "package:com.termux\npackage:com.termux.api\n";
        assert!(package_listed(out, "com.termux"));
        assert!(package_listed(out, "com.termux.api"));
        assert!(!package_listed(out, "com.term"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_error() {
        let probe = RuntimeProbe::new(
            "sovereign-no-such-binary".to_string(),
            Duration::from_secs(1),
        );
        assert!(probe.probe().await.is_err());
    }

    #[tokio::test]
    async fn test_missing_store_is_absent() {
        let probe = DataStoreProbe::new(
            PathBuf::from("/nonexistent/sovereign/training"),
            TrainingFilePattern::new("training", vec!["json".to_string()]),
        );
        let report = probe.probe().await.unwrap();
        assert!(!report.reachable);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_tool_timeout() {
        let err = run_tool("sleep", &["5"], Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, ConsoleError::Timeout { .. }));
    }
}
