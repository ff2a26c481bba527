//! Status aggregation for the external subsystems
//!
//! Four independent probes run in a fixed order. Each probe result is a
//! `Result`; the aggregator folds errors and timeouts into
//! `reachable = false`, so a report always carries exactly four records.

pub mod probes;

use crate::errors::{ConsoleError, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

pub use probes::{AgentServiceProbe, DataStoreProbe, DeviceProbe, RuntimeProbe};

/// Probed subsystems, in probe order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Subsystem {
    Runtime,
    DataStore,
    AgentService,
    PeerDevice,
}

impl Subsystem {
    pub const ORDER: [Subsystem; 4] = [
        Subsystem::Runtime,
        Subsystem::DataStore,
        Subsystem::AgentService,
        Subsystem::PeerDevice,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Subsystem::Runtime => "Model runtime",
            Subsystem::DataStore => "Training data",
            Subsystem::AgentService => "Agent service",
            Subsystem::PeerDevice => "Peer device",
        }
    }
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Optional count or identifier attached to a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum HealthDetail {
    Count { label: &'static str, value: usize },
    Identifier(String),
}

impl fmt::Display for HealthDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthDetail::Count { label, value } => write!(f, "{} {}", value, label),
            HealthDetail::Identifier(id) => f.write_str(id),
        }
    }
}

/// What a probe found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub reachable: bool,
    pub detail: Option<HealthDetail>,
    pub note: Option<String>,
}

impl ProbeReport {
    pub fn present(detail: Option<HealthDetail>) -> Self {
        Self {
            reachable: true,
            detail,
            note: None,
        }
    }

    pub fn absent(note: impl Into<String>) -> Self {
        Self {
            reachable: false,
            detail: None,
            note: Some(note.into()),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// One record per probed subsystem
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubsystemHealth {
    pub subsystem: Subsystem,
    pub reachable: bool,
    pub detail: Option<HealthDetail>,
    pub note: Option<String>,
}

impl SubsystemHealth {
    pub fn from_result(subsystem: Subsystem, result: Result<ProbeReport>) -> Self {
        match result {
            Ok(report) => Self {
                subsystem,
                reachable: report.reachable,
                detail: report.detail,
                note: report.note,
            },
            Err(e) => Self {
                subsystem,
                reachable: false,
                detail: None,
                note: Some(e.to_string()),
            },
        }
    }
}

/// A single presence/reachability check
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self) -> Result<ProbeReport>;
}

/// Composite report; the array length fixes the record count
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub records: [SubsystemHealth; 4],
}

impl StatusReport {
    pub fn get(&self, subsystem: Subsystem) -> &SubsystemHealth {
        // Records are stored in Subsystem::ORDER
        let index = Subsystem::ORDER
            .iter()
            .position(|s| *s == subsystem)
            .unwrap_or(0);
        &self.records[index]
    }

    pub fn reachable_count(&self) -> usize {
        self.records.iter().filter(|r| r.reachable).count()
    }
}

/// Runs the four probes
pub struct StatusAggregator {
    runtime: Box<dyn Probe>,
    data_store: Box<dyn Probe>,
    agent_service: Box<dyn Probe>,
    peer_device: Box<dyn Probe>,
    probe_timeout: Duration,
}

impl StatusAggregator {
    pub fn new(
        runtime: Box<dyn Probe>,
        data_store: Box<dyn Probe>,
        agent_service: Box<dyn Probe>,
        peer_device: Box<dyn Probe>,
    ) -> Self {
        Self {
            runtime,
            data_store,
            agent_service,
            peer_device,
            probe_timeout: Duration::from_secs(10),
        }
    }

    /// Upper bound applied around every probe, on top of the probe's own timeouts
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    async fn run_probe(&self, subsystem: Subsystem, probe: &dyn Probe) -> SubsystemHealth {
        let result = match tokio::time::timeout(self.probe_timeout, probe.probe()).await {
            Ok(result) => result,
            Err(_) => Err(ConsoleError::Timeout {
                duration_ms: self.probe_timeout.as_millis() as u64,
            }),
        };

        if let Err(e) = &result {
            tracing::debug!(%subsystem, error = %e, "probe failed");
        }

        SubsystemHealth::from_result(subsystem, result)
    }

    /// Probe every subsystem in order. Never fails.
    pub async fn collect(&self) -> StatusReport {
        let runtime = self.run_probe(Subsystem::Runtime, self.runtime.as_ref()).await;
        let data_store = self.run_probe(Subsystem::DataStore, self.data_store.as_ref()).await;
        let agent_service = self
            .run_probe(Subsystem::AgentService, self.agent_service.as_ref())
            .await;
        let peer_device = self.run_probe(Subsystem::PeerDevice, self.peer_device.as_ref()).await;

        StatusReport {
            records: [runtime, data_store, agent_service, peer_device],
        }
    }
}
