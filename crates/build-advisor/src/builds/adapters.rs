use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::compatibility::CompatibilityIssue;
use super::domain::{Build, Component, ComponentId, ComponentType, RecommendationCandidate};
use super::requirements::RequirementProfile;

/// Inclusive price bounds applied to a search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    pub fn contains(&self, price: f64) -> bool {
        price >= self.min && price <= self.max
    }
}

/// Parameters for one semantic search against a single slot.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub query: String,
    pub component_type: ComponentType,
    pub limit: usize,
    pub exclude_ids: HashSet<ComponentId>,
    pub price_range: Option<PriceRange>,
}

/// Semantic similarity search over the component catalog.
pub trait RetrievalAdapter: Send + Sync {
    fn search(&self, query: &SearchQuery) -> Result<Vec<RecommendationCandidate>, RetrievalError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("search backend unavailable: {0}")]
    Unavailable(String),
}

/// Relational catalog listing, used to top up thin search results.
pub trait CatalogAdapter: Send + Sync {
    /// Components of one type, most expensive first.
    fn list(
        &self,
        component_type: ComponentType,
        excluding: &HashSet<ComponentId>,
        limit: usize,
    ) -> Result<Vec<Component>, CatalogError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

/// Everything the explanation generator gets to see.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplanationRequest {
    pub current: Build,
    pub recommended: Build,
    pub profile: RequirementProfile,
    pub issues: Vec<CompatibilityIssue>,
}

/// Free-text rationale generator (typically a language-model call).
pub trait ExplanationAdapter: Send + Sync {
    fn explain(&self, request: &ExplanationRequest) -> Result<String, ExplanationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ExplanationError {
    #[error("explanation backend failed: {0}")]
    Backend(String),
    #[error("explanation timed out after {0} ms")]
    TimedOut(u128),
}
