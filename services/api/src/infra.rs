use std::collections::HashSet;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use build_advisor::builds::{
    BuildOptimizer, CatalogAdapter, CatalogError, Component, ComponentId, ComponentType,
    ExplanationAdapter, ExplanationError, ExplanationRequest, OptimizerConfig,
    RecommendationCandidate, RetrievalAdapter, RetrievalError, SearchQuery,
};
use build_advisor::catalog::{CatalogImportError, CatalogImporter};
use build_advisor::config::CatalogConfig;
use metrics_exporter_prometheus::PrometheusHandle;

pub(crate) type ServiceOptimizer =
    BuildOptimizer<InMemoryCatalog, InMemoryCatalog, TemplateExplainer>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// CSV-backed catalog serving both keyword search and price-ordered listing.
#[derive(Debug, Default, Clone)]
pub(crate) struct InMemoryCatalog {
    components: Arc<Vec<Component>>,
}

impl InMemoryCatalog {
    pub(crate) fn new(components: Vec<Component>) -> Self {
        Self {
            components: Arc::new(components),
        }
    }

    pub(crate) fn load(config: &CatalogConfig) -> Result<Self, CatalogImportError> {
        let components = match &config.csv_path {
            Some(path) => CatalogImporter::from_path(path)?,
            None => CatalogImporter::bundled()?,
        };
        Ok(Self::new(components))
    }

    pub(crate) fn get(&self, id: &str) -> Option<&Component> {
        self.components.iter().find(|component| component.id.0 == id)
    }

    pub(crate) fn len(&self) -> usize {
        self.components.len()
    }

    fn of_type<'a>(
        &'a self,
        component_type: ComponentType,
        excluding: &'a HashSet<ComponentId>,
    ) -> impl Iterator<Item = &'a Component> + 'a {
        self.components.iter().filter(move |component| {
            component.component_type == component_type && !excluding.contains(&component.id)
        })
    }
}

impl RetrievalAdapter for InMemoryCatalog {
    /// Share of a component's name and brand tokens that appear in the query.
    fn search(&self, query: &SearchQuery) -> Result<Vec<RecommendationCandidate>, RetrievalError> {
        let wanted = tokens(&query.query);
        let mut hits: Vec<RecommendationCandidate> = self
            .of_type(query.component_type, &query.exclude_ids)
            .filter(|component| {
                query
                    .price_range
                    .map_or(true, |range| range.contains(component.price))
            })
            .filter_map(|component| {
                let own = tokens(&format!("{} {}", component.brand, component.name));
                if own.is_empty() {
                    return None;
                }
                let overlap = own.intersection(&wanted).count();
                (overlap > 0).then(|| {
                    RecommendationCandidate::search(
                        component.clone(),
                        overlap as f64 / own.len() as f64,
                    )
                })
            })
            .collect();

        hits.sort_by(|left, right| {
            right
                .similarity
                .total_cmp(&left.similarity)
                .then(right.component.price.total_cmp(&left.component.price))
        });
        hits.truncate(query.limit);
        Ok(hits)
    }
}

impl CatalogAdapter for InMemoryCatalog {
    fn list(
        &self,
        component_type: ComponentType,
        excluding: &HashSet<ComponentId>,
        limit: usize,
    ) -> Result<Vec<Component>, CatalogError> {
        let mut listed: Vec<Component> = self.of_type(component_type, excluding).cloned().collect();
        listed.sort_by(|left, right| right.price.total_cmp(&left.price));
        listed.truncate(limit);
        Ok(listed)
    }
}

fn tokens(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.len() >= 2)
        .map(str::to_lowercase)
        .collect()
}

/// Local explainer that describes the recommendation without a language model.
#[derive(Debug, Default, Clone)]
pub(crate) struct TemplateExplainer;

impl ExplanationAdapter for TemplateExplainer {
    fn explain(&self, request: &ExplanationRequest) -> Result<String, ExplanationError> {
        let mut lines = vec![format!(
            "This build targets {} and costs {:.0} in total.",
            request.profile.kind.label(),
            request.recommended.total_price()
        )];

        for slot in ComponentType::ordered() {
            let before = request.current.get(slot);
            let after = request.recommended.get(slot);
            match (before, after) {
                (Some(old), Some(new)) if old.id != new.id => lines.push(format!(
                    "{slot}: {} {} replaces {} {}.",
                    new.brand, new.name, old.brand, old.name
                )),
                (None, Some(new)) => {
                    lines.push(format!("{slot}: added {} {}.", new.brand, new.name))
                }
                _ => {}
            }
        }

        if request.issues.is_empty() {
            lines.push("All parts are compatible with each other.".to_string());
        } else {
            lines.extend(
                request
                    .issues
                    .iter()
                    .map(|issue| format!("Still open: {}.", issue.message)),
            );
        }

        Ok(lines.join(" "))
    }
}

pub(crate) fn build_optimizer(
    catalog: InMemoryCatalog,
    config: OptimizerConfig,
) -> ServiceOptimizer {
    let catalog = Arc::new(catalog);
    BuildOptimizer::new(
        Arc::clone(&catalog),
        catalog,
        Arc::new(TemplateExplainer),
        config,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use build_advisor::builds::PriceRange;

    fn catalog() -> InMemoryCatalog {
        InMemoryCatalog::load(&CatalogConfig::default()).expect("bundled catalog")
    }

    fn query(text: &str, component_type: ComponentType) -> SearchQuery {
        SearchQuery {
            query: text.to_string(),
            component_type,
            limit: 5,
            exclude_ids: HashSet::new(),
            price_range: None,
        }
    }

    #[test]
    fn search_ranks_name_overlap_first() {
        let hits = catalog()
            .search(&query("GPU similar to NVIDIA GeForce RTX 4060 8GB", ComponentType::Gpu))
            .expect("search succeeds");

        assert!(!hits.is_empty());
        assert_eq!(hits[0].id().0, "gpu-4060");
        assert!(hits
            .iter()
            .all(|hit| hit.component.component_type == ComponentType::Gpu));
        assert!(hits.windows(2).all(|pair| pair[0].similarity >= pair[1].similarity));
    }

    #[test]
    fn search_honours_exclusions_and_price_range() {
        let mut request = query("NVIDIA GeForce RTX", ComponentType::Gpu);
        request.exclude_ids.insert(ComponentId("gpu-4090".to_string()));
        request.price_range = Some(PriceRange {
            min: 5000.0,
            max: 15000.0,
        });

        let hits = catalog().search(&request).expect("search succeeds");

        let ids: Vec<&str> = hits.iter().map(|hit| hit.id().0.as_str()).collect();
        assert_eq!(ids, vec!["gpu-4080s", "gpu-4070s"]);
    }

    #[test]
    fn listing_is_most_expensive_first() {
        let listed = catalog()
            .list(ComponentType::Psu, &HashSet::new(), 2)
            .expect("list succeeds");
        let ids: Vec<&str> = listed.iter().map(|c| c.id.0.as_str()).collect();
        assert_eq!(ids, vec!["psu-1000", "psu-850"]);
    }
}
