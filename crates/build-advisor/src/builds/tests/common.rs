use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use axum::response::Response;
use serde_json::Value;

use crate::builds::adapters::{
    CatalogAdapter, CatalogError, ExplanationAdapter, ExplanationError, ExplanationRequest,
    RetrievalAdapter, RetrievalError, SearchQuery,
};
use crate::builds::domain::{
    attributes, Build, Component, ComponentId, ComponentType, RecommendationCandidate,
};
use crate::builds::optimizer::{BuildOptimizer, OptimizerConfig};

pub(super) fn cpu(id: &str, socket: &str, cores: f64, price: f64) -> Component {
    Component::new(id, ComponentType::Cpu, format!("CPU {id}"), "AMD", price)
        .with_attribute(attributes::SOCKET, socket)
        .with_attribute(attributes::CORES, cores)
}

pub(super) fn intel_cpu(id: &str, socket: &str, price: f64) -> Component {
    Component::new(id, ComponentType::Cpu, format!("Core {id}"), "Intel", price)
        .with_attribute(attributes::SOCKET, socket)
        .with_attribute(attributes::CORES, 8.0)
}

pub(super) fn board(id: &str, socket: &str, form_factor: &str, price: f64) -> Component {
    Component::new(id, ComponentType::Motherboard, format!("Board {id}"), "ASUS", price)
        .with_attribute(attributes::SOCKET, socket)
        .with_attribute(attributes::FORM_FACTOR, form_factor)
}

pub(super) fn gpu(id: &str, brand: &str, memory_gb: f64, price: f64) -> Component {
    Component::new(id, ComponentType::Gpu, format!("GPU {id}"), brand, price)
        .with_attribute(attributes::MEMORY_GB, memory_gb)
}

pub(super) fn psu(id: &str, watts: f64, price: f64) -> Component {
    Component::new(id, ComponentType::Psu, format!("PSU {id}"), "Corsair", price)
        .with_attribute(attributes::WATTAGE, watts)
}

pub(super) fn ram(id: &str, capacity_gb: f64, price: f64) -> Component {
    Component::new(id, ComponentType::Ram, format!("RAM {id}"), "Kingston", price)
        .with_attribute(attributes::CAPACITY_GB, capacity_gb)
}

pub(super) fn case(id: &str, form_factor: &str, price: f64) -> Component {
    Component::new(id, ComponentType::Case, format!("Case {id}"), "Fractal", price)
        .with_attribute(attributes::FORM_FACTOR, form_factor)
}

pub(super) fn storage(id: &str, kind: &str, price: f64) -> Component {
    Component::new(id, ComponentType::Storage, format!("Drive {id}"), "Samsung", price)
        .with_attribute(attributes::STORAGE_TYPE, kind)
}

pub(super) fn cooler(id: &str, price: f64) -> Component {
    Component::new(id, ComponentType::Cooler, format!("Cooler {id}"), "Noctua", price)
}

pub(super) fn candidate(component: Component, similarity: f64) -> RecommendationCandidate {
    RecommendationCandidate::search(component, similarity)
}

pub(super) fn pools(
    entries: Vec<(Component, f64)>,
) -> BTreeMap<ComponentType, Vec<RecommendationCandidate>> {
    let mut pools: BTreeMap<ComponentType, Vec<RecommendationCandidate>> = BTreeMap::new();
    for (component, similarity) in entries {
        pools
            .entry(component.component_type)
            .or_default()
            .push(candidate(component, similarity));
    }
    pools
}

pub(super) fn ids(build: &Build) -> Vec<(ComponentType, String)> {
    ComponentType::ordered()
        .into_iter()
        .filter_map(|slot| build.get(slot).map(|c| (slot, c.id.0.clone())))
        .collect()
}

pub(super) fn slot_id(build: &Build, slot: ComponentType) -> Option<&str> {
    build.get(slot).map(|component| component.id.0.as_str())
}

/// Serves fixed per-slot pools and records every query it sees.
#[derive(Default, Clone)]
pub(super) struct PoolRetrieval {
    pools: BTreeMap<ComponentType, Vec<RecommendationCandidate>>,
    queries: Arc<Mutex<Vec<SearchQuery>>>,
}

impl PoolRetrieval {
    pub(super) fn new(entries: Vec<(Component, f64)>) -> Self {
        Self {
            pools: pools(entries),
            queries: Arc::default(),
        }
    }

    pub(super) fn queries(&self) -> Vec<SearchQuery> {
        self.queries.lock().expect("query mutex poisoned").clone()
    }
}

impl RetrievalAdapter for PoolRetrieval {
    fn search(&self, query: &SearchQuery) -> Result<Vec<RecommendationCandidate>, RetrievalError> {
        self.queries
            .lock()
            .expect("query mutex poisoned")
            .push(query.clone());
        Ok(self
            .pools
            .get(&query.component_type)
            .map(|pool| {
                pool.iter()
                    .filter(|candidate| !query.exclude_ids.contains(candidate.id()))
                    .filter(|candidate| {
                        query
                            .price_range
                            .map_or(true, |range| range.contains(candidate.component.price))
                    })
                    .take(query.limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

pub(super) struct FailingRetrieval;

impl RetrievalAdapter for FailingRetrieval {
    fn search(&self, _query: &SearchQuery) -> Result<Vec<RecommendationCandidate>, RetrievalError> {
        Err(RetrievalError::Unavailable("vector store offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryCatalog {
    components: Vec<Component>,
}

impl MemoryCatalog {
    pub(super) fn new(components: Vec<Component>) -> Self {
        Self { components }
    }
}

impl CatalogAdapter for MemoryCatalog {
    fn list(
        &self,
        component_type: ComponentType,
        excluding: &HashSet<ComponentId>,
        limit: usize,
    ) -> Result<Vec<Component>, CatalogError> {
        let mut matches: Vec<Component> = self
            .components
            .iter()
            .filter(|c| c.component_type == component_type && !excluding.contains(&c.id))
            .cloned()
            .collect();
        matches.sort_by(|left, right| right.price.total_cmp(&left.price));
        matches.truncate(limit);
        Ok(matches)
    }
}

pub(super) struct FailingCatalog;

impl CatalogAdapter for FailingCatalog {
    fn list(
        &self,
        _component_type: ComponentType,
        _excluding: &HashSet<ComponentId>,
        _limit: usize,
    ) -> Result<Vec<Component>, CatalogError> {
        Err(CatalogError::Unavailable("database offline".to_string()))
    }
}

pub(super) struct StaticExplainer(pub(super) &'static str);

impl ExplanationAdapter for StaticExplainer {
    fn explain(&self, _request: &ExplanationRequest) -> Result<String, ExplanationError> {
        Ok(self.0.to_string())
    }
}

pub(super) struct FailingExplainer;

impl ExplanationAdapter for FailingExplainer {
    fn explain(&self, _request: &ExplanationRequest) -> Result<String, ExplanationError> {
        Err(ExplanationError::Backend("model quota exceeded".to_string()))
    }
}

pub(super) struct SlowExplainer(pub(super) Duration);

impl ExplanationAdapter for SlowExplainer {
    fn explain(&self, _request: &ExplanationRequest) -> Result<String, ExplanationError> {
        thread::sleep(self.0);
        Ok("too late".to_string())
    }
}

pub(super) fn test_config() -> OptimizerConfig {
    OptimizerConfig {
        explanation_timeout: Duration::from_millis(200),
        ..OptimizerConfig::default()
    }
}

pub(super) fn optimizer<R, C, E>(retrieval: R, catalog: C, explainer: E) -> BuildOptimizer<R, C, E>
where
    R: RetrievalAdapter + 'static,
    C: CatalogAdapter + 'static,
    E: ExplanationAdapter + 'static,
{
    BuildOptimizer::new(
        Arc::new(retrieval),
        Arc::new(catalog),
        Arc::new(explainer),
        test_config(),
    )
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
