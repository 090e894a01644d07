//! PC build recommendation engine.
//!
//! Retrieval, catalog and explanation backends sit behind the traits in
//! [`adapters`]; everything else here is deterministic and synchronous apart
//! from the orchestrator's fan-out and its time-bounded explanation call.

pub mod adapters;
pub mod advisor;
pub mod compatibility;
pub mod diversity;
pub mod domain;
pub mod normalizer;
pub mod optimizer;
pub mod requirements;
pub mod router;

#[cfg(test)]
mod tests;

pub use adapters::{
    CatalogAdapter, CatalogError, ExplanationAdapter, ExplanationError, ExplanationRequest,
    PriceRange, RetrievalAdapter, RetrievalError, SearchQuery,
};
pub use advisor::{advise, ComponentSuggestion, SuggestionKind};
pub use compatibility::{repair, validate, CompatibilityIssue, IssueKind, RepairReport};
pub use diversity::{DiversitySelector, PriceTier, PriceTierBoundaries};
pub use domain::{
    attributes, AttributeValue, Build, CandidateSource, ChangeReason, Component, ComponentId,
    ComponentType, RecommendationCandidate, SlotChange, UnknownComponentType,
};
pub use normalizer::{normalize_form_factor, normalize_socket, sockets_compatible, FormFactor};
pub use optimizer::{
    BuildFlag, BuildOptimizer, ExplanationSource, FlagKind, OptimizationOutcome,
    OptimizationRequest, OptimizerConfig,
};
pub use requirements::{
    build_profile, PurposeKind, RequirementProfile, RequirementStatus, Shortfall, Threshold,
    ThresholdLevel,
};
pub use router::build_router;
