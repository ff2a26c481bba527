//! Q-SLICE compliance evaluation
//!
//! Pure functions over a [`MetricReading`]: no I/O, no clock, no randomness.

use crate::metrics::{MetricReading, MetricVerdict, MetricsEngine, ReadingSource};
use serde::Serialize;

/// Inclusive pass mark for the composite compliance score
pub const COMPLIANCE_PASS_THRESHOLD: f64 = 0.65;

/// Negentropy is divided by this before entering the compliance mean.
/// Independent of the dashboard negentropy threshold.
pub const COMPLIANCE_NEGENTROPY_SCALE: f64 = 15.0;

/// Cap applied to the scaled negentropy term
pub const COMPLIANCE_NEGENTROPY_CAP: f64 = 1.0;

/// Resilience index `(ΛΦ)/(1+Γ)` must exceed this to be post-quantum resilient
pub const RESILIENCE_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ComplianceVerdict {
    Certified,
    NonCompliant,
}

impl ComplianceVerdict {
    pub fn classify(score: f64) -> Self {
        if score >= COMPLIANCE_PASS_THRESHOLD {
            ComplianceVerdict::Certified
        } else {
            ComplianceVerdict::NonCompliant
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ComplianceVerdict::Certified => "certified",
            ComplianceVerdict::NonCompliant => "non-compliant",
        }
    }
}

/// Full compliance result, including the per-field checks that explain it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceReport {
    pub score: f64,
    pub verdict: ComplianceVerdict,
    pub fields: MetricVerdict,
    pub resilience: f64,
    pub source: ReadingSource,
}

impl ComplianceReport {
    pub fn is_certified(&self) -> bool {
        self.verdict == ComplianceVerdict::Certified
    }

    pub fn is_resilient(&self) -> bool {
        self.resilience > RESILIENCE_THRESHOLD
    }

    /// Only a certified live reading may gate a real system
    pub fn gates_release(&self) -> bool {
        self.is_certified() && self.source == ReadingSource::Live
    }
}

/// Composite compliance score: mean of four normalized terms
pub fn compliance_score(reading: &MetricReading) -> f64 {
    let negentropy_term =
        (reading.negentropy() / COMPLIANCE_NEGENTROPY_SCALE).min(COMPLIANCE_NEGENTROPY_CAP);

    (reading.consciousness() + reading.coherence() + (1.0 - reading.decoherence()) + negentropy_term)
        / 4.0
}

/// Resilience index `(coherence × consciousness) / (1 + decoherence)`
pub fn resilience_score(reading: &MetricReading) -> f64 {
    (reading.coherence() * reading.consciousness()) / (1.0 + reading.decoherence())
}

#[derive(Debug, Clone, Default)]
pub struct ComplianceEvaluator {
    engine: MetricsEngine,
}

impl ComplianceEvaluator {
    pub fn new(engine: MetricsEngine) -> Self {
        Self { engine }
    }

    pub fn evaluate(&self, reading: &MetricReading) -> ComplianceReport {
        let score = compliance_score(reading);
        ComplianceReport {
            score,
            verdict: ComplianceVerdict::classify(score),
            fields: self.engine.evaluate(reading),
            resilience: resilience_score(reading),
            source: reading.source(),
        }
    }
}
