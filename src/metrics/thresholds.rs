//! Fixed threshold set for CCCE readings

use crate::metrics::types::MetricField;
use serde::Serialize;
use std::fmt;

/// Minimum consciousness (Φ) for a conscious state
pub const CONSCIOUSNESS_THRESHOLD: f64 = 0.7734;

/// Minimum coherence (Λ)
pub const COHERENCE_THRESHOLD: f64 = 0.70;

/// Decoherence (Γ) must stay strictly below this ceiling
pub const DECOHERENCE_CEILING: f64 = 0.30;

/// Dashboard threshold for negentropy (Ξ), on the raw ΛΦ/Γ scale
pub const NEGENTROPY_THRESHOLD: f64 = 5.0;

/// How a value is compared against its bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Comparison {
    /// `value >= bound`
    AtLeast,
    /// `value < bound`
    Below,
}

/// A single metric gate
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Threshold {
    pub field: MetricField,
    pub comparison: Comparison,
    pub bound: f64,
}

impl Threshold {
    pub const fn at_least(field: MetricField, bound: f64) -> Self {
        Self {
            field,
            comparison: Comparison::AtLeast,
            bound,
        }
    }

    pub const fn below(field: MetricField, bound: f64) -> Self {
        Self {
            field,
            comparison: Comparison::Below,
            bound,
        }
    }

    pub fn passes(&self, value: f64) -> bool {
        match self.comparison {
            Comparison::AtLeast => value >= self.bound,
            Comparison::Below => value < self.bound,
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.comparison {
            Comparison::AtLeast => "≥",
            Comparison::Below => "<",
        };
        write!(f, "{} {}", op, self.bound)
    }
}

/// One threshold per metric field, in [`MetricField::ALL`] order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdSet {
    thresholds: [Threshold; 4],
}

impl ThresholdSet {
    /// Process-wide thresholds
    pub const STANDARD: ThresholdSet = ThresholdSet {
        thresholds: [
            Threshold::at_least(MetricField::Consciousness, CONSCIOUSNESS_THRESHOLD),
            Threshold::at_least(MetricField::Coherence, COHERENCE_THRESHOLD),
            Threshold::below(MetricField::Decoherence, DECOHERENCE_CEILING),
            Threshold::at_least(MetricField::Negentropy, NEGENTROPY_THRESHOLD),
        ],
    };

    pub fn get(&self, field: MetricField) -> &Threshold {
        // Array order matches MetricField::ALL
        match field {
            MetricField::Consciousness => &self.thresholds[0],
            MetricField::Coherence => &self.thresholds[1],
            MetricField::Decoherence => &self.thresholds[2],
            MetricField::Negentropy => &self.thresholds[3],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Threshold> {
        self.thresholds.iter()
    }
}

impl Default for ThresholdSet {
    fn default() -> Self {
        Self::STANDARD
    }
}
