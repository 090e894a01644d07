use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::builds::adapters::PriceRange;
use crate::builds::compatibility::CompatibilityIssue;
use crate::builds::domain::{Build, ComponentType, RecommendationCandidate, SlotChange};
use crate::builds::requirements::RequirementProfile;

/// Inbound optimization request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRequest {
    pub purpose: String,
    #[serde(default)]
    pub current_build: Build,
    /// Optional per-slot price bounds forwarded to retrieval.
    #[serde(default)]
    pub price_ranges: BTreeMap<ComponentType, PriceRange>,
}

impl OptimizationRequest {
    pub fn new(purpose: impl Into<String>, current_build: Build) -> Self {
        Self {
            purpose: purpose.into(),
            current_build,
            price_ranges: BTreeMap::new(),
        }
    }
}

/// Degraded states surfaced to the caller instead of raised as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    RequirementUnmet,
    CompatibilityUnresolved,
    RetrievalUnavailable,
    ExplanationUnavailable,
}

impl FlagKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::RequirementUnmet => "requirement unmet",
            Self::CompatibilityUnresolved => "compatibility unresolved",
            Self::RetrievalUnavailable => "retrieval unavailable",
            Self::ExplanationUnavailable => "explanation unavailable",
        }
    }
}

/// A "still not perfect" marker on the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildFlag {
    pub kind: FlagKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<ComponentType>,
    pub message: String,
}

impl BuildFlag {
    pub fn new(kind: FlagKind, slot: Option<ComponentType>, message: impl Into<String>) -> Self {
        Self {
            kind,
            slot,
            message: message.into(),
        }
    }
}

impl fmt::Display for BuildFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.slot {
            Some(slot) => write!(f, "{} ({}): {}", self.kind.label(), slot, self.message),
            None => write!(f, "{}: {}", self.kind.label(), self.message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplanationSource {
    Generated,
    Fallback,
}

/// Everything one optimization run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationOutcome {
    pub purpose: String,
    pub profile: RequirementProfile,
    pub build: Build,
    /// Diverse shortlist per slot, best match first.
    pub alternatives: BTreeMap<ComponentType, Vec<RecommendationCandidate>>,
    pub changes: Vec<SlotChange>,
    pub notes: Vec<String>,
    /// Compatibility issues still present in `build`.
    pub issues: Vec<CompatibilityIssue>,
    pub flags: Vec<BuildFlag>,
    pub explanation: String,
    pub explanation_source: ExplanationSource,
    pub generated_at: DateTime<Utc>,
}

impl OptimizationOutcome {
    pub fn unresolved_flags(&self) -> Vec<String> {
        self.flags.iter().map(ToString::to_string).collect()
    }

    pub fn flags_for(&self, slot: ComponentType) -> impl Iterator<Item = &BuildFlag> {
        self.flags
            .iter()
            .filter(move |flag| flag.slot == Some(slot))
    }

    pub fn has_flag(&self, kind: FlagKind, slot: Option<ComponentType>) -> bool {
        self.flags
            .iter()
            .any(|flag| flag.kind == kind && flag.slot == slot)
    }

    /// True when every slot is filled, compatible, and meets its thresholds.
    pub fn is_compliant(&self) -> bool {
        !self.flags.iter().any(|flag| {
            matches!(
                flag.kind,
                FlagKind::RequirementUnmet | FlagKind::CompatibilityUnresolved
            )
        })
    }
}
