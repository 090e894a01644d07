use std::collections::BTreeMap;

use tracing::{debug, info};

use super::outcome::{BuildFlag, FlagKind};
use crate::builds::domain::{
    Build, ChangeReason, Component, ComponentType, RecommendationCandidate, SlotChange,
};
use crate::builds::requirements::{RequirementProfile, RequirementStatus, ThresholdLevel};

pub(crate) type Pools = BTreeMap<ComponentType, Vec<RecommendationCandidate>>;

/// Substitutions and notes accumulated while shaping the build.
#[derive(Debug, Default)]
pub(crate) struct Ledger {
    pub changes: Vec<SlotChange>,
    pub notes: Vec<String>,
}

impl Ledger {
    fn substitute(
        &mut self,
        build: &mut Build,
        replacement: &Component,
        reason: ChangeReason,
        note: String,
    ) {
        let slot = replacement.component_type;
        let previous = build.place(replacement.clone());
        info!(slot = %slot, replacement = %replacement.id, reason = ?reason, "slot updated");
        self.notes.push(note.clone());
        self.changes.push(SlotChange {
            slot,
            previous: previous.map(|old| old.id),
            replacement: replacement.id.clone(),
            reason,
            note,
        });
    }
}

/// Highest-similarity candidates first; ties keep pool order.
pub(crate) fn ranked(pool: &[RecommendationCandidate]) -> Vec<&RecommendationCandidate> {
    let mut ranked: Vec<&RecommendationCandidate> = pool.iter().collect();
    ranked.sort_by(|left, right| right.similarity.total_cmp(&left.similarity));
    ranked
}

/// Put the top shortlist entry into every empty slot.
pub(crate) fn fill_empty_slots(build: &mut Build, shortlists: &Pools, ledger: &mut Ledger) {
    for slot in build.missing_slots() {
        let Some(best) = shortlists.get(&slot).and_then(|shortlist| shortlist.first()) else {
            debug!(slot = %slot, "no candidate to fill empty slot");
            continue;
        };
        let note = format!(
            "Added {} {} to the empty {} slot",
            best.component.brand, best.component.name, slot
        );
        ledger.substitute(build, &best.component, ChangeReason::Filled, note);
    }
}

/// Swap out components that fall below the purpose thresholds. The best
/// candidate meeting the full minimum wins; failing that, one meeting the
/// acceptable minimum; otherwise the component is kept and flagged later.
pub(crate) fn enforce_requirements(
    build: &mut Build,
    profile: &RequirementProfile,
    pools: &Pools,
    ledger: &mut Ledger,
) {
    for slot in ComponentType::ordered() {
        if profile.thresholds_for(slot).is_none() {
            continue;
        }
        let Some(current) = build.get(slot).cloned() else {
            continue;
        };
        let shortfalls = match profile.status(&current) {
            RequirementStatus::Met => continue,
            RequirementStatus::Relaxed(shortfalls) | RequirementStatus::Unmet(shortfalls) => {
                shortfalls
            }
        };
        let reasons = shortfalls
            .iter()
            .map(|shortfall| shortfall.describe())
            .collect::<Vec<_>>()
            .join(", ");

        let candidates = ranked(pools.get(&slot).map(Vec::as_slice).unwrap_or(&[]));
        let best_at = |level: ThresholdLevel| {
            candidates
                .iter()
                .find(|candidate| {
                    candidate.component.id != current.id
                        && profile.satisfied_by(&candidate.component, level)
                })
                .map(|candidate| &candidate.component)
        };

        if let Some(replacement) = best_at(ThresholdLevel::Minimum) {
            let note = format!(
                "Replaced {} {} ({}) with {} for {}",
                slot,
                current.name,
                reasons,
                replacement.name,
                profile.kind.label()
            );
            ledger.substitute(build, replacement, ChangeReason::Requirement, note);
            continue;
        }

        match profile.status(&current) {
            RequirementStatus::Relaxed(_) => {
                ledger.notes.push(format!(
                    "Kept {} {}: {} but within the acceptable minimum",
                    slot, current.name, reasons
                ));
            }
            _ => {
                if let Some(replacement) = best_at(ThresholdLevel::Acceptable) {
                    let note = format!(
                        "Replaced {} {} ({}) with {}, which meets the relaxed minimum",
                        slot, current.name, reasons, replacement.name
                    );
                    ledger.substitute(build, replacement, ChangeReason::Requirement, note);
                } else {
                    debug!(slot = %slot, "no candidate meets the requirement");
                }
            }
        }
    }
}

/// Prefer solid-state storage when the profile asks for it.
pub(crate) fn apply_storage_preference(
    build: &mut Build,
    profile: &RequirementProfile,
    pools: &Pools,
    ledger: &mut Ledger,
) {
    if !profile.prefers_solid_state_storage {
        return;
    }
    let Some(current) = build.get(ComponentType::Storage).cloned() else {
        return;
    };
    if current.is_solid_state() {
        return;
    }

    let pool = pools
        .get(&ComponentType::Storage)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    let replacement = ranked(pool)
        .into_iter()
        .map(|candidate| &candidate.component)
        .find(|candidate| candidate.is_solid_state());

    match replacement {
        Some(replacement) => {
            let note = format!(
                "Replaced storage {} with SSD {} for faster project load times",
                current.name, replacement.name
            );
            ledger.substitute(build, replacement, ChangeReason::Preference, note);
        }
        None => ledger.notes.push(format!(
            "Storage {} is not an SSD and no SSD candidate was available",
            current.name
        )),
    }
}

/// Flag every empty slot and every component still below its hard floor.
pub(crate) fn requirement_flags(build: &Build, profile: &RequirementProfile) -> Vec<BuildFlag> {
    ComponentType::ordered()
        .into_iter()
        .filter_map(|slot| match build.get(slot) {
            None => Some(BuildFlag::new(
                FlagKind::RequirementUnmet,
                Some(slot),
                format!("no {slot} candidate was available"),
            )),
            Some(component) => match profile.status(component) {
                RequirementStatus::Unmet(shortfalls) => Some(BuildFlag::new(
                    FlagKind::RequirementUnmet,
                    Some(slot),
                    format!(
                        "{} does not meet {} requirements: {}",
                        component.name,
                        profile.kind.label(),
                        shortfalls
                            .iter()
                            .map(|shortfall| shortfall.describe())
                            .collect::<Vec<_>>()
                            .join(", ")
                    ),
                )),
                _ => None,
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builds::domain::attributes;
    use crate::builds::requirements::build_profile;

    fn gpu(id: &str, memory: f64) -> Component {
        Component::new(id, ComponentType::Gpu, format!("GPU {id}"), "NVIDIA", 4000.0)
            .with_attribute(attributes::MEMORY_GB, memory)
    }

    fn ram(id: &str, capacity: f64) -> Component {
        Component::new(id, ComponentType::Ram, format!("RAM {id}"), "Corsair", 900.0)
            .with_attribute(attributes::CAPACITY_GB, capacity)
    }

    fn pools(entries: Vec<(Component, f64)>) -> Pools {
        let mut pools = Pools::new();
        for (component, similarity) in entries {
            pools
                .entry(component.component_type)
                .or_default()
                .push(RecommendationCandidate::search(component, similarity));
        }
        pools
    }

    #[test]
    fn picks_highest_similarity_candidate_meeting_minimum() {
        let profile = build_profile("4K gaming");
        let mut build = Build::new("4K gaming").with(gpu("small", 8.0));
        let pools = pools(vec![
            (gpu("mid", 10.0), 0.9),
            (gpu("a", 12.0), 0.5),
            (gpu("b", 16.0), 0.7),
        ]);
        let mut ledger = Ledger::default();

        enforce_requirements(&mut build, &profile, &pools, &mut ledger);

        assert_eq!(build.get(ComponentType::Gpu).map(|c| c.id.0.as_str()), Some("b"));
        assert_eq!(ledger.changes.len(), 1);
        assert_eq!(ledger.changes[0].reason, ChangeReason::Requirement);
    }

    #[test]
    fn relaxed_component_is_kept_when_nothing_better_exists() {
        let profile = build_profile("4K gaming");
        let mut build = Build::new("4K gaming").with(ram("sixteen", 16.0));
        let pools = pools(vec![(ram("eight", 8.0), 0.9)]);
        let mut ledger = Ledger::default();

        enforce_requirements(&mut build, &profile, &pools, &mut ledger);

        assert_eq!(build.get(ComponentType::Ram).map(|c| c.id.0.as_str()), Some("sixteen"));
        assert!(ledger.changes.is_empty());
        assert!(ledger.notes[0].contains("acceptable minimum"));
        assert!(requirement_flags(&build, &profile)
            .iter()
            .all(|flag| flag.slot != Some(ComponentType::Ram)));
    }

    #[test]
    fn acceptable_candidate_replaces_an_unmet_component() {
        let profile = build_profile("4K gaming");
        let mut build = Build::new("4K gaming").with(ram("eight", 8.0));
        let pools = pools(vec![(ram("sixteen", 16.0), 0.4)]);
        let mut ledger = Ledger::default();

        enforce_requirements(&mut build, &profile, &pools, &mut ledger);

        assert_eq!(build.get(ComponentType::Ram).map(|c| c.id.0.as_str()), Some("sixteen"));
        assert!(ledger.notes[0].contains("relaxed minimum"));
    }

    #[test]
    fn unmet_component_without_candidates_is_flagged() {
        let profile = build_profile("4K gaming");
        let mut build = Build::new("4K gaming").with(gpu("small", 8.0));
        let mut ledger = Ledger::default();

        enforce_requirements(&mut build, &profile, &Pools::new(), &mut ledger);

        let flags = requirement_flags(&build, &profile);
        assert!(flags.iter().any(|flag| flag.kind == FlagKind::RequirementUnmet
            && flag.slot == Some(ComponentType::Gpu)));
        // every other slot is empty
        assert_eq!(flags.len(), 8);
    }

    #[test]
    fn storage_preference_swaps_hdd_for_ssd() {
        let profile = build_profile("video editing");
        let hdd = Component::new("hdd", ComponentType::Storage, "Barracuda 4TB", "Seagate", 800.0)
            .with_attribute(attributes::STORAGE_TYPE, "HDD");
        let ssd = Component::new("ssd", ComponentType::Storage, "990 Pro 2TB", "Samsung", 1900.0)
            .with_attribute(attributes::STORAGE_TYPE, "NVMe SSD");
        let mut build = Build::new("video editing").with(hdd);
        let mut ledger = Ledger::default();

        apply_storage_preference(&mut build, &profile, &pools(vec![(ssd, 0.2)]), &mut ledger);

        assert_eq!(build.get(ComponentType::Storage).map(|c| c.id.0.as_str()), Some("ssd"));
        assert_eq!(ledger.changes[0].reason, ChangeReason::Preference);
    }
}
