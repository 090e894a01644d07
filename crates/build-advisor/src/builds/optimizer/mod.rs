//! Build optimization pipeline.
//!
//! One run walks a fixed sequence of stages: fetch candidate pools for every
//! slot, re-rank them into diverse shortlists, fill empty slots, enforce the
//! purpose thresholds, validate and repair compatibility, then ask for an
//! explanation. Adapter failures degrade the result through [`BuildFlag`]s
//! instead of failing the call.

mod config;
mod enforce;
mod explain;
mod outcome;

pub use config::OptimizerConfig;
pub use outcome::{
    BuildFlag, ExplanationSource, FlagKind, OptimizationOutcome, OptimizationRequest,
};

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use self::enforce::{
    apply_storage_preference, enforce_requirements, fill_empty_slots, requirement_flags, Ledger,
    Pools,
};
use super::adapters::{
    CatalogAdapter, ExplanationAdapter, ExplanationRequest, PriceRange, RetrievalAdapter,
    SearchQuery,
};
use super::advisor::{advise, ComponentSuggestion};
use super::compatibility::{repair, validate};
use super::diversity::DiversitySelector;
use super::domain::{Build, ComponentId, ComponentType, RecommendationCandidate};
use super::requirements::build_profile;

/// Orchestrates one optimization run over injected adapters.
pub struct BuildOptimizer<R, C, E> {
    retrieval: Arc<R>,
    catalog: Arc<C>,
    explainer: Arc<E>,
    selector: DiversitySelector,
    config: OptimizerConfig,
}

impl<R, C, E> BuildOptimizer<R, C, E>
where
    R: RetrievalAdapter + 'static,
    C: CatalogAdapter + 'static,
    E: ExplanationAdapter + 'static,
{
    pub fn new(
        retrieval: Arc<R>,
        catalog: Arc<C>,
        explainer: Arc<E>,
        config: OptimizerConfig,
    ) -> Self {
        Self {
            retrieval,
            catalog,
            explainer,
            selector: DiversitySelector::new(config.price_tiers),
            config,
        }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub async fn optimize(&self, request: OptimizationRequest) -> OptimizationOutcome {
        let OptimizationRequest {
            purpose,
            current_build,
            price_ranges,
        } = request;
        let profile = build_profile(&purpose);
        info!(
            purpose = %purpose,
            kind = profile.kind.label(),
            supplied = current_build.len(),
            "optimizing build"
        );

        let (pools, mut flags) = self
            .fetch_pools(&purpose, &current_build, &price_ranges)
            .await;

        let mut build = current_build.clone();
        build.purpose = purpose.clone();
        let mut ledger = Ledger::default();

        let shortlists = self.shortlists(&pools, &build);
        fill_empty_slots(&mut build, &shortlists, &mut ledger);
        enforce_requirements(&mut build, &profile, &pools, &mut ledger);
        apply_storage_preference(&mut build, &profile, &pools, &mut ledger);

        let issues = validate(&build);
        let issues = if issues.is_empty() {
            issues
        } else {
            debug!(count = issues.len(), "repairing compatibility issues");
            let report = repair(&build, &issues, &pools, &profile);
            build = report.build;
            ledger.changes.extend(report.changes);
            ledger.notes.extend(report.notes);
            validate(&build)
        };

        flags.extend(requirement_flags(&build, &profile));
        flags.extend(issues.iter().map(|issue| {
            BuildFlag::new(
                FlagKind::CompatibilityUnresolved,
                issue.slots.first().copied(),
                issue.message.clone(),
            )
        }));

        let alternatives = self.shortlists(&pools, &build);

        let explanation = explain::explain(
            Arc::clone(&self.explainer),
            ExplanationRequest {
                current: current_build,
                recommended: build.clone(),
                profile: profile.clone(),
                issues: issues.clone(),
            },
            &ledger.changes,
            self.config.explanation_timeout,
        )
        .await;
        flags.extend(explanation.flag);

        info!(
            changes = ledger.changes.len(),
            unresolved = issues.len(),
            flags = flags.len(),
            "build optimized"
        );

        OptimizationOutcome {
            purpose,
            profile,
            build,
            alternatives,
            changes: ledger.changes,
            notes: ledger.notes,
            issues,
            flags,
            explanation: explanation.text,
            explanation_source: explanation.source,
            generated_at: Utc::now(),
        }
    }

    /// Advisory review of `build`, with the cheapest catalog component that
    /// would resolve each slot-level suggestion attached where one exists.
    pub async fn advise(&self, build: Build) -> Vec<ComponentSuggestion> {
        let catalog = Arc::clone(&self.catalog);
        let limit = self.config.pool_size;
        let task = tokio::task::spawn_blocking(move || {
            let mut suggestions = advise(&build);
            for suggestion in &mut suggestions {
                let Some(slot) = suggestion.slot else {
                    continue;
                };
                let excluding: HashSet<ComponentId> =
                    build.get(slot).map(|c| c.id.clone()).into_iter().collect();
                match catalog.list(slot, &excluding, limit) {
                    Ok(components) => {
                        suggestion.suggested_component_id = components
                            .iter()
                            .filter(|candidate| suggestion.accepts(&build, candidate))
                            .min_by(|left, right| left.price.total_cmp(&right.price))
                            .map(|candidate| candidate.id.clone());
                    }
                    Err(err) => warn!(slot = %slot, error = %err, "catalog listing failed"),
                }
            }
            suggestions
        });

        match task.await {
            Ok(suggestions) => suggestions,
            Err(join_error) => {
                warn!(error = %join_error, "advice task aborted");
                Vec::new()
            }
        }
    }

    /// Fetch one pool per slot in parallel on the blocking pool.
    async fn fetch_pools(
        &self,
        purpose: &str,
        current: &Build,
        price_ranges: &BTreeMap<ComponentType, PriceRange>,
    ) -> (Pools, Vec<BuildFlag>) {
        let exclude_ids: HashSet<ComponentId> =
            current.components().map(|component| component.id.clone()).collect();

        let tasks: Vec<_> = ComponentType::ordered()
            .into_iter()
            .map(|slot| {
                let query = SearchQuery {
                    query: search_text(purpose, slot, current),
                    component_type: slot,
                    limit: self.config.pool_size,
                    exclude_ids: exclude_ids.clone(),
                    price_range: price_ranges.get(&slot).copied(),
                };
                let retrieval = Arc::clone(&self.retrieval);
                let catalog = Arc::clone(&self.catalog);
                let task = tokio::task::spawn_blocking(move || {
                    fetch_pool(&*retrieval, &*catalog, &query)
                });
                (slot, task)
            })
            .collect();

        let mut pools = Pools::new();
        let mut flags = Vec::new();
        for (slot, task) in tasks {
            match task.await {
                Ok(fetch) => {
                    flags.extend(fetch.flags);
                    pools.insert(slot, fetch.candidates);
                }
                Err(join_error) => {
                    warn!(slot = %slot, error = %join_error, "pool fetch aborted");
                    flags.push(BuildFlag::new(
                        FlagKind::RetrievalUnavailable,
                        Some(slot),
                        join_error.to_string(),
                    ));
                    pools.insert(slot, Vec::new());
                }
            }
        }
        (pools, flags)
    }

    fn shortlists(&self, pools: &Pools, build: &Build) -> Pools {
        pools
            .iter()
            .map(|(slot, pool)| {
                let current: HashSet<ComponentId> =
                    build.get(*slot).map(|c| c.id.clone()).into_iter().collect();
                let shortlist = self.selector.select(
                    pool,
                    self.config.shortlist_size,
                    &current,
                    self.config.diversity_factor,
                );
                (*slot, shortlist)
            })
            .collect()
    }
}

struct PoolFetch {
    candidates: Vec<RecommendationCandidate>,
    flags: Vec<BuildFlag>,
}

/// Search, then top up from the catalog when the search came back short.
fn fetch_pool<R, C>(retrieval: &R, catalog: &C, query: &SearchQuery) -> PoolFetch
where
    R: RetrievalAdapter + ?Sized,
    C: CatalogAdapter + ?Sized,
{
    let slot = query.component_type;
    let mut flags = Vec::new();
    let in_range = |price: f64| query.price_range.map_or(true, |range| range.contains(price));

    let mut candidates = match retrieval.search(query) {
        Ok(candidates) => candidates,
        Err(err) => {
            warn!(slot = %slot, error = %err, "search failed; falling back to catalog");
            flags.push(BuildFlag::new(
                FlagKind::RetrievalUnavailable,
                Some(slot),
                err.to_string(),
            ));
            Vec::new()
        }
    };

    let mut seen: HashSet<ComponentId> = query.exclude_ids.clone();
    candidates.retain(|candidate| {
        candidate.component.component_type == slot
            && in_range(candidate.component.price)
            && seen.insert(candidate.id().clone())
    });
    candidates.truncate(query.limit);

    if candidates.len() < query.limit {
        let shortfall = query.limit - candidates.len();
        debug!(slot = %slot, found = candidates.len(), "topping up pool from catalog");
        match catalog.list(slot, &seen, shortfall) {
            Ok(components) => candidates.extend(
                components
                    .into_iter()
                    .filter(|component| component.component_type == slot)
                    .filter(|component| in_range(component.price))
                    .filter(|component| seen.insert(component.id.clone()))
                    .take(shortfall)
                    .map(RecommendationCandidate::catalog_fallback),
            ),
            Err(err) => {
                warn!(slot = %slot, error = %err, "catalog listing failed");
                flags.push(BuildFlag::new(
                    FlagKind::RetrievalUnavailable,
                    Some(slot),
                    err.to_string(),
                ));
            }
        }
    }

    PoolFetch { candidates, flags }
}

fn search_text(purpose: &str, slot: ComponentType, current: &Build) -> String {
    let hint = match slot {
        ComponentType::Gpu => " with power requirements in mind",
        ComponentType::Motherboard => " with matching socket and form factor",
        ComponentType::Ram => " with sufficient capacity",
        ComponentType::Psu => " with adequate wattage",
        ComponentType::Case => " with a compatible form factor",
        _ => "",
    };
    match current.get(slot) {
        Some(component) => format!(
            "{slot} for a {purpose} PC build{hint}, similar to {} {}",
            component.brand, component.name
        ),
        None => format!("{slot} for a {purpose} PC build{hint}"),
    }
}
