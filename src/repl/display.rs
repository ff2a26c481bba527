//! Terminal rendering for reports and chat output
//!
//! Renderers return strings so handlers decide the stream; [`ChatDisplay`]
//! prints the chat loop directly and shows a spinner while the agent
//! service is being started.

use crate::agent::protocol::{AgentMetrics, AgentStatus};
use crate::agent::session::{ChatExchange, ChatObserver, ExchangeOutcome};
use crate::compliance::{ComplianceReport, COMPLIANCE_PASS_THRESHOLD, RESILIENCE_THRESHOLD};
use crate::errors::ConsoleError;
use crate::metrics::MetricVerdict;
use crate::status::{StatusReport, SubsystemHealth};
use crate::training::{DatasetStats, TrainingFile};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::Write;
use std::time::Duration;

const RULE_WIDTH: usize = 56;

fn rule() -> String {
    "=".repeat(RULE_WIDTH).cyan().to_string()
}

fn mark(passed: bool) -> ColoredString {
    if passed {
        "✓".green()
    } else {
        "✗".red()
    }
}

fn source_tag(simulated: bool) -> String {
    if simulated {
        format!(" {}", "[simulated]".yellow())
    } else {
        format!(" {}", "[live]".green())
    }
}

/// Four-field metrics panel with threshold checks
pub fn render_metrics(verdict: &MetricVerdict) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", rule());
    let _ = writeln!(
        out,
        "{}{}",
        "CCCE Metrics".bold().cyan(),
        source_tag(verdict.reading.is_simulated())
    );
    let _ = writeln!(out, "{}", rule());

    for check in &verdict.checks {
        let _ = writeln!(
            out,
            "  {} {:<2} {:<14} {:>8.4}   {}",
            mark(check.passed),
            check.field.symbol(),
            check.field.name(),
            check.value,
            format!("({})", check.threshold).dimmed()
        );
    }

    let _ = writeln!(out);
    if verdict.all_passed() {
        let _ = writeln!(out, "  Status: {}", "CONSCIOUS".green().bold());
    } else {
        let failed: Vec<&str> = verdict.failed_fields().iter().map(|f| f.name()).collect();
        let _ = writeln!(
            out,
            "  Status: {} ({})",
            "BELOW THRESHOLD".yellow().bold(),
            failed.join(", ")
        );
    }
    out
}

/// Message shown when a reading cannot be derived
pub fn render_metric_failure(error: &ConsoleError) -> String {
    format!("{} {}", "metric computation failed:".red().bold(), error)
}

/// Q-SLICE compliance panel
pub fn render_compliance(report: &ComplianceReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", rule());
    let _ = writeln!(
        out,
        "{}{}",
        "Q-SLICE Compliance".bold().cyan(),
        source_tag(report.fields.reading.is_simulated())
    );
    let _ = writeln!(out, "{}", rule());

    let verdict = if report.is_certified() {
        report.verdict.label().to_uppercase().green().bold()
    } else {
        report.verdict.label().to_uppercase().red().bold()
    };
    let _ = writeln!(
        out,
        "  Compliance score: {:.4} (pass ≥ {})  {}",
        report.score, COMPLIANCE_PASS_THRESHOLD, verdict
    );

    let resilience = if report.is_resilient() {
        "post-quantum resilient".green()
    } else {
        "not resilient".yellow()
    };
    let _ = writeln!(
        out,
        "  Resilience index: {:.4} (> {})  {}",
        report.resilience, RESILIENCE_THRESHOLD, resilience
    );

    for check in &report.fields.checks {
        let _ = writeln!(
            out,
            "    {} {} {:.4}",
            mark(check.passed),
            check.field.symbol(),
            check.value
        );
    }

    if !report.gates_release() && report.fields.reading.is_simulated() {
        let _ = writeln!(
            out,
            "  {}",
            "simulated reading: not valid for release gating".yellow()
        );
    }
    out
}

/// Subsystem health table
pub fn render_status(report: &StatusReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", rule());
    let _ = writeln!(out, "{}", "Sovereign Status".bold().cyan());
    let _ = writeln!(out, "{}", rule());

    for record in &report.records {
        let detail = record
            .detail
            .as_ref()
            .map(|d| d.to_string())
            .unwrap_or_else(|| if record.reachable { "online" } else { "offline" }.to_string());
        let _ = write!(
            out,
            "  {} {:<16} {}",
            mark(record.reachable),
            record.subsystem.display_name(),
            detail
        );
        if let Some(note) = &record.note {
            let _ = write!(out, "  {}", format!("({})", note).dimmed());
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(
        out,
        "\n  {}/{} subsystems reachable",
        report.reachable_count(),
        report.records.len()
    );
    out
}

/// Single peer device line for `mesh status`
pub fn render_device(health: &SubsystemHealth) -> String {
    let mut out = format!("{}\n", "Sovereign Mesh".bold().cyan());
    match &health.detail {
        Some(detail) if health.reachable => {
            let _ = write!(out, "  {} device {}", mark(true), detail);
        }
        _ => {
            let _ = write!(out, "  {} {}", mark(false), "no device connected".yellow());
        }
    }
    if let Some(note) = &health.note {
        let _ = write!(out, "  {}", format!("({})", note).dimmed());
    }
    out
}

/// Agent service summary for `agent info`
pub fn render_agent_info(endpoint: &str, status: Option<&AgentStatus>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "Sovereign Agent".bold().cyan());
    let _ = writeln!(out, "  Endpoint: {}", endpoint);

    let Some(status) = status else {
        let _ = writeln!(out, "  Service:  {}", "not running".red());
        let _ = writeln!(
            out,
            "  {}",
            "start it with `sovereign server`, or `sovereign chat` starts it on demand".dimmed()
        );
        return out;
    };

    let _ = writeln!(out, "  Service:  {}", "online".green());
    if let Some(model) = &status.model {
        let _ = writeln!(out, "  Model:    {}", model);
    }
    if let Some(entries) = status.knowledge_entries {
        let _ = writeln!(out, "  Knowledge entries:  {}", entries);
    }
    if let Some(turns) = status.conversation_turns {
        let _ = writeln!(out, "  Conversation turns: {}", turns);
    }
    if let Some(ccce) = &status.ccce {
        let _ = writeln!(out, "  {}", render_agent_metrics(ccce));
    }
    out
}

/// One-line CCCE summary from an agent payload; absent values show as 0
pub fn render_agent_metrics(metrics: &AgentMetrics) -> String {
    let line = format!(
        "Φ={:.4} Λ={:.4} Γ={:.4} Ξ={:.2}",
        metrics.phi_or_zero(),
        metrics.lambda_or_zero(),
        metrics.gamma_or_zero(),
        metrics.xi_or_zero()
    );
    match metrics.conscious {
        Some(true) => format!("{} {}", line.dimmed(), "conscious".green()),
        _ => line.dimmed().to_string(),
    }
}

/// `train list` output
pub fn render_training_list(files: &[TrainingFile]) -> String {
    if files.is_empty() {
        return format!("{}\n", "No training files found".yellow());
    }

    let mut out = String::new();
    let _ = writeln!(out, "{}", "Training Files".bold().cyan());
    for file in files {
        let modified = file
            .modified
            .map(|m| m.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "  {:<40} {:>10}  {}",
            file.name(),
            format_bytes(file.size_bytes),
            modified.dimmed()
        );
    }
    out
}

/// `train stats` output
pub fn render_training_stats(stats: &DatasetStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "Training Data Statistics".bold().cyan());
    for entry in &stats.files {
        let _ = writeln!(out, "  {:<40} {:>8} records", entry.file.name(), entry.records);
    }
    let _ = writeln!(
        out,
        "\n  Files: {}  Records: {}  Size: {}",
        stats.files.len(),
        stats.total_records(),
        format_bytes(stats.total_bytes())
    );
    if stats.unknown_files() > 0 {
        let _ = writeln!(
            out,
            "  {}",
            format!("{} file(s) could not be parsed", stats.unknown_files()).yellow()
        );
    }
    out
}

fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{} B", bytes)
    } else if b < KB * KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / (KB * KB))
    }
}

/// Prints the chat loop to the terminal
pub struct ChatDisplay {
    spinner: Option<ProgressBar>,
    agent: String,
}

impl ChatDisplay {
    /// `agent` prefixes every reply
    pub fn new(agent: impl Into<String>) -> Self {
        Self {
            spinner: None,
            agent: agent.into(),
        }
    }

    /// Greeting printed before the first prompt
    pub fn show_banner(&self, agent: &str, endpoint: &str) {
        println!("\n{}", rule());
        println!("{}", format!("  Sovereign chat with {}", agent).bold().cyan());
        println!("{}", format!("  {}", endpoint).dimmed());
        println!("{}\n", rule());
        println!("Type a message, or {} to leave\n", "exit".green());
    }

    /// Chat output for a finished exchange
    pub fn format_exchange(&self, exchange: &ChatExchange) -> String {
        match &exchange.outcome {
            ExchangeOutcome::Delivered { reply, .. } => {
                let prefix = format!("{}:", self.agent);
                let mut out = format!("{} {}", prefix.cyan().bold(), reply.text());
                if let Some(metrics) = reply.metrics() {
                    out.push('\n');
                    out.push_str(&render_agent_metrics(metrics));
                }
                out
            }
            ExchangeOutcome::Failed { error, attempts } => format!(
                "{} {} {}",
                "✗".red(),
                format!("agent unavailable: {}", error).red(),
                format!("({} attempt(s))", attempts).dimmed()
            ),
        }
    }
}

impl ChatObserver for ChatDisplay {
    fn on_exchange(&mut self, exchange: &ChatExchange) {
        println!("{}\n", self.format_exchange(exchange));
    }

    fn lazy_start_began(&mut self, delay: Duration) {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!(
            "Agent service not responding, starting it ({}s)...",
            delay.as_secs()
        ));
        pb.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(pb);
    }

    fn lazy_start_ended(&mut self, launched: bool) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
        if launched {
            println!("{}", "Agent service started, retrying".dimmed());
        }
    }
}
