//! Metrics source: live measurement with a simulated fallback

use crate::agent::protocol::AgentMetrics;
use crate::errors::Result;
use crate::metrics::engine::MetricsEngine;
use crate::metrics::types::MetricReading;
use async_trait::async_trait;
use rand::Rng;

/// Anything that can report the agent's current CCCE metrics
#[async_trait]
pub trait LiveMetrics: Send + Sync {
    async fn current_metrics(&self) -> Result<AgentMetrics>;
}

/// Acquire a reading, preferring the live source.
///
/// An unreachable service or a metrics block without phi/lambda/gamma falls
/// back to simulation. A live block that carries a non-positive gamma is an
/// invalid metric and is returned as an error rather than replaced.
pub async fn acquire_reading<L, R>(
    live: &L,
    engine: &MetricsEngine,
    rng: &mut R,
) -> Result<MetricReading>
where
    L: LiveMetrics + ?Sized,
    R: Rng + ?Sized,
{
    match live.current_metrics().await {
        Ok(metrics) => match metrics.to_reading() {
            Some(reading) => {
                let reading = reading?;
                tracing::debug!(negentropy = reading.negentropy(), "using live metrics");
                return Ok(reading);
            }
            None => {
                tracing::debug!("live metrics incomplete, falling back to simulation");
            }
        },
        Err(e) => {
            tracing::debug!(error = %e, "live metrics unavailable, falling back to simulation");
        }
    }

    engine.simulate(rng)
}
