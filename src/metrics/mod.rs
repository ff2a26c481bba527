//! CCCE metrics
//!
//! Readings, the fixed threshold set, the classification engine and the
//! live/simulated source.

pub mod engine;
pub mod source;
pub mod thresholds;
pub mod types;

pub use engine::{FieldCheck, MetricVerdict, MetricsEngine};
pub use source::{acquire_reading, LiveMetrics};
pub use thresholds::{Comparison, Threshold, ThresholdSet};
pub use types::{MetricField, MetricReading, ReadingSource};
