use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::domain::{ComponentId, RecommendationCandidate};

const BRAND_BONUS: f64 = 0.4;
const TIER_BONUS: f64 = 0.3;
const TIE_BREAK_WEIGHT: f64 = 0.01;
const DEFAULT_DIVERSITY_FACTOR: f64 = 0.3;

/// Coarse price bucket used only for diversity scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PriceTier {
    Budget,
    MidRange,
    HighEnd,
    Premium,
}

impl PriceTier {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Budget => "budget",
            Self::MidRange => "mid-range",
            Self::HighEnd => "high-end",
            Self::Premium => "premium",
        }
    }
}

/// Exclusive upper bounds for the lower three tiers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceTierBoundaries {
    pub budget_below: f64,
    pub mid_range_below: f64,
    pub high_end_below: f64,
}

impl Default for PriceTierBoundaries {
    fn default() -> Self {
        Self {
            budget_below: 1000.0,
            mid_range_below: 3000.0,
            high_end_below: 6000.0,
        }
    }
}

impl PriceTierBoundaries {
    pub fn tier(&self, price: f64) -> PriceTier {
        if price < self.budget_below {
            PriceTier::Budget
        } else if price < self.mid_range_below {
            PriceTier::MidRange
        } else if price < self.high_end_below {
            PriceTier::HighEnd
        } else {
            PriceTier::Premium
        }
    }
}

/// Greedy re-ranker that keeps the best match and spreads the rest of the
/// shortlist across brands and price tiers.
#[derive(Debug, Clone, Default)]
pub struct DiversitySelector {
    tiers: PriceTierBoundaries,
}

impl DiversitySelector {
    pub fn new(tiers: PriceTierBoundaries) -> Self {
        Self { tiers }
    }

    pub fn tiers(&self) -> &PriceTierBoundaries {
        &self.tiers
    }

    pub fn select(
        &self,
        candidates: &[RecommendationCandidate],
        n: usize,
        exclude_ids: &HashSet<ComponentId>,
        diversity_factor: f64,
    ) -> Vec<RecommendationCandidate> {
        let factor = sanitize_factor(diversity_factor);

        let mut seen = HashSet::new();
        let pool: Vec<&RecommendationCandidate> = candidates
            .iter()
            .filter(|candidate| !exclude_ids.contains(candidate.id()))
            .filter(|candidate| seen.insert(candidate.id().clone()))
            .collect();

        if pool.len() <= n {
            return pool.into_iter().cloned().collect();
        }
        if n == 0 {
            return Vec::new();
        }

        let total = pool.len();
        let mut remaining: Vec<(usize, &RecommendationCandidate)> =
            pool.into_iter().enumerate().collect();

        let seed_position = remaining
            .iter()
            .enumerate()
            .fold(0, |best, (position, (_, candidate))| {
                if candidate.similarity > remaining[best].1.similarity {
                    position
                } else {
                    best
                }
            });
        let (_, seed) = remaining.remove(seed_position);

        let mut brands: HashSet<String> = HashSet::new();
        let mut tiers: HashSet<PriceTier> = HashSet::new();
        let mut chosen = Vec::with_capacity(n);
        self.record(seed, &mut brands, &mut tiers);
        chosen.push(seed.clone());

        while chosen.len() < n && !remaining.is_empty() {
            let mut best_position = 0;
            let mut best_score = f64::NEG_INFINITY;
            for (position, (rank, candidate)) in remaining.iter().enumerate() {
                let diversity = self.diversity(candidate, *rank, total, &brands, &tiers);
                let score = (1.0 - factor) * candidate.similarity + factor * diversity;
                if score > best_score {
                    best_score = score;
                    best_position = position;
                }
            }

            let (_, picked) = remaining.remove(best_position);
            self.record(picked, &mut brands, &mut tiers);
            chosen.push(picked.clone());
        }

        chosen
    }

    fn diversity(
        &self,
        candidate: &RecommendationCandidate,
        rank: usize,
        total: usize,
        brands: &HashSet<String>,
        tiers: &HashSet<PriceTier>,
    ) -> f64 {
        let mut score = 0.0;
        if !brands.contains(&brand_key(candidate)) {
            score += BRAND_BONUS;
        }
        if !tiers.contains(&self.tiers.tier(candidate.component.price)) {
            score += TIER_BONUS;
        }
        // Earlier input rank wins near-ties; replaces random jitter.
        score + TIE_BREAK_WEIGHT * (1.0 - rank as f64 / total as f64)
    }

    fn record(
        &self,
        candidate: &RecommendationCandidate,
        brands: &mut HashSet<String>,
        tiers: &mut HashSet<PriceTier>,
    ) {
        brands.insert(brand_key(candidate));
        tiers.insert(self.tiers.tier(candidate.component.price));
    }
}

fn brand_key(candidate: &RecommendationCandidate) -> String {
    candidate.component.brand.trim().to_lowercase()
}

fn sanitize_factor(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        DEFAULT_DIVERSITY_FACTOR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_boundaries_are_exclusive() {
        let tiers = PriceTierBoundaries::default();
        assert_eq!(tiers.tier(999.0), PriceTier::Budget);
        assert_eq!(tiers.tier(1000.0), PriceTier::MidRange);
        assert_eq!(tiers.tier(2999.0), PriceTier::MidRange);
        assert_eq!(tiers.tier(3000.0), PriceTier::HighEnd);
        assert_eq!(tiers.tier(6000.0), PriceTier::Premium);
    }

    #[test]
    fn custom_boundaries_shift_tiers() {
        let tiers = PriceTierBoundaries {
            budget_below: 100.0,
            mid_range_below: 300.0,
            high_end_below: 600.0,
        };
        assert_eq!(tiers.tier(250.0), PriceTier::MidRange);
        assert_eq!(tiers.tier(999.0), PriceTier::Premium);
    }

    #[test]
    fn non_finite_factor_uses_default() {
        assert_eq!(sanitize_factor(f64::NAN), DEFAULT_DIVERSITY_FACTOR);
        assert_eq!(sanitize_factor(3.0), 1.0);
        assert_eq!(sanitize_factor(-1.0), 0.0);
    }
}
