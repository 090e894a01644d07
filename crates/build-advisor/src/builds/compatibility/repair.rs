use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};

use super::validator::{case_fits_board, check, required_psu_watts};
use super::{CompatibilityIssue, IssueKind};
use crate::builds::domain::{
    Build, ChangeReason, Component, ComponentType, RecommendationCandidate, SlotChange,
};
use crate::builds::normalizer::sockets_compatible;
use crate::builds::requirements::{RequirementProfile, ThresholdLevel};

/// Result of a bounded repair pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepairReport {
    pub build: Build,
    pub notes: Vec<String>,
    pub changes: Vec<SlotChange>,
    pub unresolved: Vec<CompatibilityIssue>,
}

/// Substitute components from the pools to clear the reported issues.
///
/// Each issue kind gets exactly one attempt, socket first, then form factor,
/// then power. Before an attempt the rule is re-checked against the build as
/// repaired so far, so an earlier substitution can retire a later issue. The
/// input build is never modified.
///
/// Replacements that meet `profile` at its full minimum are preferred over
/// those meeting only the acceptable floor, which beat everything else.
pub fn repair(
    build: &Build,
    issues: &[CompatibilityIssue],
    pools: &BTreeMap<ComponentType, Vec<RecommendationCandidate>>,
    profile: &RequirementProfile,
) -> RepairReport {
    let mut kinds: Vec<IssueKind> = issues.iter().map(|issue| issue.kind).collect();
    kinds.sort();
    kinds.dedup();

    let mut repairer = Repairer {
        build: build.clone(),
        pools,
        profile,
        notes: Vec::new(),
        changes: Vec::new(),
    };
    let mut unresolved = Vec::new();

    for kind in kinds {
        let Some(issue) = check(kind, &repairer.build) else {
            repairer
                .notes
                .push(format!("{} cleared by an earlier substitution", kind.label()));
            continue;
        };

        let fixed = match kind {
            IssueKind::Socket => repairer.fix_socket(),
            IssueKind::FormFactor => repairer.fix_form_factor(),
            IssueKind::Power => repairer.fix_power(),
        };

        if !fixed {
            debug!(kind = kind.label(), "no repair candidate available");
            repairer.notes.push(format!(
                "Could not resolve {}: {}",
                kind.label(),
                issue.message
            ));
            unresolved.push(issue);
        }
    }

    RepairReport {
        build: repairer.build,
        notes: repairer.notes,
        changes: repairer.changes,
        unresolved,
    }
}

struct Repairer<'a> {
    build: Build,
    pools: &'a BTreeMap<ComponentType, Vec<RecommendationCandidate>>,
    profile: &'a RequirementProfile,
    notes: Vec<String>,
    changes: Vec<SlotChange>,
}

impl<'a> Repairer<'a> {
    fn pool(&self, slot: ComponentType) -> impl Iterator<Item = &'a Component> + 'a {
        self.pools
            .get(&slot)
            .map(|candidates| candidates.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(|candidate| &candidate.component)
    }

    /// 0 meets the full minimum, 1 the acceptable floor, 2 neither.
    fn requirement_rank(&self, candidate: &Component) -> u8 {
        if self.profile.satisfied_by(candidate, ThresholdLevel::Minimum) {
            0
        } else if self.profile.satisfied_by(candidate, ThresholdLevel::Acceptable) {
            1
        } else {
            2
        }
    }

    /// Pool entries of `slot` passing `keep`, best requirement rank first.
    /// Pool order is kept within a rank.
    fn ranked_pool(
        &self,
        slot: ComponentType,
        keep: impl Fn(&Component) -> bool,
    ) -> Vec<&'a Component> {
        let mut candidates: Vec<&'a Component> =
            self.pool(slot).filter(|candidate| keep(candidate)).collect();
        candidates.sort_by_key(|candidate| self.requirement_rank(candidate));
        candidates
    }

    fn current(&self, slot: ComponentType) -> Option<Component> {
        self.build.get(slot).cloned()
    }

    fn substitute(&mut self, replacement: &Component, kind: IssueKind) {
        let slot = replacement.component_type;
        let previous = self.build.place(replacement.clone());
        let note = match &previous {
            Some(old) => format!(
                "Replaced {} {} with {} to fix {}",
                slot,
                old.name,
                replacement.name,
                kind.label()
            ),
            None => format!("Added {} {} to fix {}", slot, replacement.name, kind.label()),
        };
        info!(slot = %slot, replacement = %replacement.id, "compatibility repair");
        self.notes.push(note.clone());
        self.changes.push(SlotChange {
            slot,
            previous: previous.map(|old| old.id),
            replacement: replacement.id.clone(),
            reason: ChangeReason::Repair,
            note,
        });
    }

    fn fits_current_case(&self, board: &Component) -> bool {
        match self.build.get(ComponentType::Case) {
            Some(case) => case_fits_board(case, board).unwrap_or(true),
            None => true,
        }
    }

    fn fix_socket(&mut self) -> bool {
        let (Some(cpu), Some(board)) = (
            self.current(ComponentType::Cpu),
            self.current(ComponentType::Motherboard),
        ) else {
            return false;
        };

        let preferred = self
            .pool(ComponentType::Motherboard)
            .filter(|candidate| candidate.id != board.id && socket_match(&cpu, candidate))
            .min_by_key(|candidate| {
                (
                    self.requirement_rank(candidate),
                    !self.fits_current_case(candidate),
                )
            });
        if let Some(replacement) = preferred {
            self.substitute(replacement, IssueKind::Socket);
            return true;
        }

        let cpu_replacement = self
            .ranked_pool(ComponentType::Cpu, |candidate| {
                candidate.id != cpu.id && socket_match(candidate, &board)
            })
            .into_iter()
            .next();
        if let Some(replacement) = cpu_replacement {
            self.substitute(replacement, IssueKind::Socket);
            return true;
        }

        let boards = self.ranked_pool(ComponentType::Motherboard, |_| true);
        let pair = self
            .ranked_pool(ComponentType::Cpu, |_| true)
            .into_iter()
            .find_map(|cpu_candidate| {
                boards
                    .iter()
                    .find(|board_candidate| socket_match(cpu_candidate, board_candidate))
                    .map(|board_candidate| (cpu_candidate, *board_candidate))
            });
        if let Some((cpu_replacement, board_replacement)) = pair {
            self.substitute(cpu_replacement, IssueKind::Socket);
            self.substitute(board_replacement, IssueKind::Socket);
            return true;
        }

        false
    }

    fn fix_form_factor(&mut self) -> bool {
        let (Some(case), Some(board)) = (
            self.current(ComponentType::Case),
            self.current(ComponentType::Motherboard),
        ) else {
            return false;
        };

        let case_replacement = self.pool(ComponentType::Case).find(|candidate| {
            candidate.id != case.id && case_fits_board(candidate, &board) == Some(true)
        });
        if let Some(replacement) = case_replacement {
            self.substitute(replacement, IssueKind::FormFactor);
            return true;
        }

        let cpu = self.current(ComponentType::Cpu);
        let board_replacement = self.pool(ComponentType::Motherboard).find(|candidate| {
            candidate.id != board.id
                && case_fits_board(&case, candidate) == Some(true)
                && keeps_socket_fix(cpu.as_ref(), candidate)
        });
        if let Some(replacement) = board_replacement {
            self.substitute(replacement, IssueKind::FormFactor);
            return true;
        }

        false
    }

    fn fix_power(&mut self) -> bool {
        let Some(required) = required_psu_watts(&self.build) else {
            return false;
        };

        let cheapest_sufficient = self
            .pool(ComponentType::Psu)
            .filter_map(|candidate| {
                candidate
                    .wattage()
                    .filter(|watts| *watts >= required)
                    .map(|watts| (watts, candidate))
            })
            .min_by(|(left_watts, left), (right_watts, right)| {
                self.requirement_rank(left)
                    .cmp(&self.requirement_rank(right))
                    .then(left_watts.total_cmp(right_watts))
                    .then(left.price.total_cmp(&right.price))
            })
            .map(|(_, candidate)| candidate);

        match cheapest_sufficient {
            Some(replacement) => {
                self.substitute(replacement, IssueKind::Power);
                true
            }
            None => false,
        }
    }
}

fn socket_match(cpu: &Component, board: &Component) -> bool {
    match (cpu.socket(), board.socket()) {
        (Some(cpu_socket), Some(board_socket)) => sockets_compatible(cpu_socket, board_socket),
        _ => false,
    }
}

/// A replacement board must not undo socket compatibility with the CPU.
fn keeps_socket_fix(cpu: Option<&Component>, board: &Component) -> bool {
    match cpu {
        Some(cpu) if cpu.socket().is_some() => socket_match(cpu, board),
        _ => true,
    }
}
