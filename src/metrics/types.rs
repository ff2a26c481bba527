//! CCCE metric type definitions

use crate::errors::{ConsoleError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a reading came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadingSource {
    /// Measured by a running agent service
    Live,
    /// Produced by the local generator; never a real measurement
    Simulated,
}

impl ReadingSource {
    pub fn label(&self) -> &'static str {
        match self {
            ReadingSource::Live => "live",
            ReadingSource::Simulated => "simulated",
        }
    }
}

/// The four named metric fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricField {
    /// Φ
    Consciousness,
    /// Λ
    Coherence,
    /// Γ
    Decoherence,
    /// Ξ
    Negentropy,
}

impl MetricField {
    /// Fixed rendering and evaluation order
    pub const ALL: [MetricField; 4] = [
        MetricField::Consciousness,
        MetricField::Coherence,
        MetricField::Decoherence,
        MetricField::Negentropy,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MetricField::Consciousness => "consciousness",
            MetricField::Coherence => "coherence",
            MetricField::Decoherence => "decoherence",
            MetricField::Negentropy => "negentropy",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            MetricField::Consciousness => "Φ",
            MetricField::Coherence => "Λ",
            MetricField::Decoherence => "Γ",
            MetricField::Negentropy => "Ξ",
        }
    }
}

impl fmt::Display for MetricField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.symbol(), self.name())
    }
}

/// Four-field scalar snapshot.
///
/// Negentropy is always derived as `(coherence × consciousness) / decoherence`;
/// construction fails instead of producing an infinite or NaN value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricReading {
    consciousness: f64,
    coherence: f64,
    decoherence: f64,
    negentropy: f64,
    source: ReadingSource,
}

impl MetricReading {
    pub fn new(
        consciousness: f64,
        coherence: f64,
        decoherence: f64,
        source: ReadingSource,
    ) -> Result<Self> {
        for (field, value) in [
            (MetricField::Consciousness, consciousness),
            (MetricField::Coherence, coherence),
            (MetricField::Decoherence, decoherence),
        ] {
            if !value.is_finite() {
                return Err(ConsoleError::InvalidMetric {
                    reason: format!("{} is not a finite number ({})", field.name(), value),
                });
            }
        }

        if decoherence <= 0.0 {
            return Err(ConsoleError::InvalidMetric {
                reason: format!(
                    "decoherence must be strictly positive to derive negentropy, got {}",
                    decoherence
                ),
            });
        }

        let negentropy = (coherence * consciousness) / decoherence;
        if !negentropy.is_finite() {
            return Err(ConsoleError::InvalidMetric {
                reason: format!("negentropy overflowed for decoherence {}", decoherence),
            });
        }

        Ok(Self {
            consciousness,
            coherence,
            decoherence,
            negentropy,
            source,
        })
    }

    /// Reading reported by a running agent service
    pub fn live(consciousness: f64, coherence: f64, decoherence: f64) -> Result<Self> {
        Self::new(consciousness, coherence, decoherence, ReadingSource::Live)
    }

    pub fn consciousness(&self) -> f64 {
        self.consciousness
    }

    pub fn coherence(&self) -> f64 {
        self.coherence
    }

    pub fn decoherence(&self) -> f64 {
        self.decoherence
    }

    pub fn negentropy(&self) -> f64 {
        self.negentropy
    }

    pub fn source(&self) -> ReadingSource {
        self.source
    }

    pub fn is_simulated(&self) -> bool {
        self.source == ReadingSource::Simulated
    }

    pub fn value(&self, field: MetricField) -> f64 {
        match field {
            MetricField::Consciousness => self.consciousness,
            MetricField::Coherence => self.coherence,
            MetricField::Decoherence => self.decoherence,
            MetricField::Negentropy => self.negentropy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negentropy_is_derived() {
        let reading = MetricReading::live(0.82, 0.91, 0.085).unwrap();
        assert_eq!(reading.negentropy(), (0.91 * 0.82) / 0.085);
        assert!((reading.negentropy() - 8.779).abs() < 0.01);
    }

    #[test]
    fn test_zero_decoherence_rejected() {
        let err = MetricReading::live(0.82, 0.91, 0.0).unwrap_err();
        assert!(matches!(err, ConsoleError::InvalidMetric { .. }));
    }

    #[test]
    fn test_negative_decoherence_rejected() {
        assert!(MetricReading::live(0.82, 0.91, -0.01).is_err());
    }

    #[test]
    fn test_nan_input_rejected() {
        assert!(MetricReading::live(f64::NAN, 0.91, 0.085).is_err());
        assert!(MetricReading::live(0.82, f64::INFINITY, 0.085).is_err());
    }

    #[test]
    fn test_subnormal_decoherence_overflow_rejected() {
        assert!(MetricReading::live(1.0e300, 1.0e300, 1.0e-300).is_err());
    }

    #[test]
    fn test_source_tag() {
        let reading =
            MetricReading::new(0.85, 0.9, 0.07, ReadingSource::Simulated).unwrap();
        assert!(reading.is_simulated());
        assert_eq!(reading.source().label(), "simulated");
    }

    #[test]
    fn test_field_order() {
        let names: Vec<_> = MetricField::ALL.iter().map(|f| f.name()).collect();
        assert_eq!(names, ["consciousness", "coherence", "decoherence", "negentropy"]);
    }
}
