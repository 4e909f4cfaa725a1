//! Explicit process context (DESIGN NOTE "Registry + global singletons →
//! explicit process context").
//!
//! Bundles the process-wide, read-mostly collaborators (circuit breakers,
//! cost estimator) so graph runs and the orchestrator receive them by
//! injection instead of reaching for module-level globals. This is what
//! lets tests swap in fresh instances per test instead of sharing mutable
//! global state.

use std::sync::Arc;

use crate::circuit_breaker::CircuitBreakerRegistry;
use crate::cost::CostEstimator;

/// Process-wide, injectable context shared by the graph runner, the tool
/// executor, and the multi-agent orchestrator.
#[derive(Clone)]
pub struct ProcessContext {
    pub circuit_breakers: CircuitBreakerRegistry,
    pub cost_estimator: Arc<CostEstimator>,
}

impl ProcessContext {
    pub fn new() -> Self {
        Self { circuit_breakers: CircuitBreakerRegistry::new(), cost_estimator: Arc::new(CostEstimator::default()) }
    }

    pub fn with_cost_estimator(cost_estimator: CostEstimator) -> Self {
        Self { circuit_breakers: CircuitBreakerRegistry::new(), cost_estimator: Arc::new(cost_estimator) }
    }
}

impl Default for ProcessContext {
    fn default() -> Self {
        Self::new()
    }
}
