//! Metrics engine: threshold classification and the simulated source

use crate::errors::Result;
use crate::metrics::thresholds::{Threshold, ThresholdSet};
use crate::metrics::types::{MetricField, MetricReading, ReadingSource};
use rand::Rng;
use serde::Serialize;
use std::ops::RangeInclusive;

/// Simulated consciousness range
pub const SIM_CONSCIOUSNESS: RangeInclusive<f64> = 0.80..=0.90;

/// Simulated coherence range
pub const SIM_COHERENCE: RangeInclusive<f64> = 0.87..=0.95;

/// Simulated decoherence is `SIM_DECOHERENCE_BASE - U[0, SIM_DECOHERENCE_SPREAD]`
pub const SIM_DECOHERENCE_BASE: f64 = 0.09;
pub const SIM_DECOHERENCE_SPREAD: f64 = 0.03;

/// Outcome of one field against its threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldCheck {
    pub field: MetricField,
    pub value: f64,
    pub threshold: Threshold,
    pub passed: bool,
}

/// Structured verdict for a reading
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricVerdict {
    pub reading: MetricReading,
    /// In `MetricField::ALL` order
    pub checks: Vec<FieldCheck>,
}

impl MetricVerdict {
    pub fn check(&self, field: MetricField) -> Option<&FieldCheck> {
        self.checks.iter().find(|c| c.field == field)
    }

    pub fn passed(&self, field: MetricField) -> bool {
        self.check(field).map(|c| c.passed).unwrap_or(false)
    }

    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn negentropy(&self) -> f64 {
        self.reading.negentropy()
    }

    pub fn negentropy_passed(&self) -> bool {
        self.passed(MetricField::Negentropy)
    }

    pub fn failed_fields(&self) -> Vec<MetricField> {
        self.checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| c.field)
            .collect()
    }
}

/// Derives and classifies CCCE readings
#[derive(Debug, Clone, Default)]
pub struct MetricsEngine {
    thresholds: ThresholdSet,
}

impl MetricsEngine {
    pub fn new() -> Self {
        Self {
            thresholds: ThresholdSet::STANDARD,
        }
    }

    /// Classify every field of a reading
    pub fn evaluate(&self, reading: &MetricReading) -> MetricVerdict {
        let checks = MetricField::ALL
            .iter()
            .map(|&field| {
                let threshold = *self.thresholds.get(field);
                let value = reading.value(field);
                FieldCheck {
                    field,
                    value,
                    threshold,
                    passed: threshold.passes(value),
                }
            })
            .collect();

        MetricVerdict {
            reading: *reading,
            checks,
        }
    }

    /// Build a reading from raw values and classify it.
    ///
    /// Fails with `InvalidMetric` when decoherence is not strictly positive.
    pub fn assess(
        &self,
        consciousness: f64,
        coherence: f64,
        decoherence: f64,
        source: ReadingSource,
    ) -> Result<MetricVerdict> {
        let reading = MetricReading::new(consciousness, coherence, decoherence, source)?;
        Ok(self.evaluate(&reading))
    }

    /// Draw a simulated reading from the supplied random source
    pub fn simulate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<MetricReading> {
        let consciousness = rng.gen_range(SIM_CONSCIOUSNESS);
        let coherence = rng.gen_range(SIM_COHERENCE);
        let decoherence = SIM_DECOHERENCE_BASE - rng.gen_range(0.0..=SIM_DECOHERENCE_SPREAD);

        MetricReading::new(consciousness, coherence, decoherence, ReadingSource::Simulated)
    }
}
