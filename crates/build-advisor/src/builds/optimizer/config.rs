use std::time::Duration;

use crate::builds::diversity::PriceTierBoundaries;

/// Tuning knobs for one optimizer instance.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerConfig {
    /// Alternatives kept per slot after diversity re-ranking.
    pub shortlist_size: usize,
    /// Candidates requested per slot from retrieval (topped up from the catalog).
    pub pool_size: usize,
    pub diversity_factor: f64,
    pub explanation_timeout: Duration,
    pub price_tiers: PriceTierBoundaries,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            shortlist_size: 5,
            pool_size: 20,
            diversity_factor: 0.3,
            explanation_timeout: Duration::from_millis(5000),
            price_tiers: PriceTierBoundaries::default(),
        }
    }
}
