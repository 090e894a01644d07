use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{attributes, Component, ComponentType};

/// Purpose classes recognised by the keyword rules, most specific first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurposeKind {
    UhdGaming,
    QhdGaming,
    Gaming,
    ContentCreation,
    MachineLearning,
    Development,
    General,
}

impl PurposeKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::UhdGaming => "4K gaming",
            Self::QhdGaming => "1440p gaming",
            Self::Gaming => "gaming",
            Self::ContentCreation => "video editing & rendering",
            Self::MachineLearning => "machine learning",
            Self::Development => "software development",
            Self::General => "general use",
        }
    }

    pub const fn is_gaming(self) -> bool {
        matches!(self, Self::UhdGaming | Self::QhdGaming | Self::Gaming)
    }

    fn classify(purpose: &str) -> Self {
        let lowered = purpose.to_lowercase();
        let has = |needle: &str| lowered.contains(needle);

        if has("4k") && has("gaming") {
            Self::UhdGaming
        } else if has("1440p") && has("gaming") {
            Self::QhdGaming
        } else if has("gaming") {
            Self::Gaming
        } else if has("video") || has("editing") || has("rendering") {
            Self::ContentCreation
        } else if has("machine learning") {
            Self::MachineLearning
        } else if has("development")
            || has("programming")
            || has("utveckla")
            || has("programmera")
        {
            Self::Development
        } else {
            Self::General
        }
    }
}

/// Minimum value for one attribute. `acceptable_minimum` is a lower bar used
/// only when nothing in the pools reaches `minimum`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub minimum: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceptable_minimum: Option<f64>,
}

impl Threshold {
    pub const fn at_least(minimum: f64) -> Self {
        Self {
            minimum,
            acceptable_minimum: None,
        }
    }

    pub const fn preferring(minimum: f64, acceptable_minimum: f64) -> Self {
        Self {
            minimum,
            acceptable_minimum: Some(acceptable_minimum),
        }
    }

    fn floor(&self) -> f64 {
        self.acceptable_minimum.unwrap_or(self.minimum)
    }
}

/// Which bar a candidate is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdLevel {
    Minimum,
    Acceptable,
}

/// A single attribute falling short of its threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shortfall {
    pub attribute: String,
    pub required: f64,
    pub actual: f64,
}

impl Shortfall {
    pub fn describe(&self) -> String {
        format!(
            "{} {} below required {}",
            self.attribute, self.actual, self.required
        )
    }
}

/// Outcome of checking a placed component against its slot's thresholds.
#[derive(Debug, Clone, PartialEq)]
pub enum RequirementStatus {
    Met,
    /// Below the preferred minimum but above the acceptable one.
    Relaxed(Vec<Shortfall>),
    Unmet(Vec<Shortfall>),
}

/// Minimum thresholds implied by a stated purpose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementProfile {
    pub purpose: String,
    pub kind: PurposeKind,
    pub thresholds: BTreeMap<ComponentType, BTreeMap<String, Threshold>>,
    pub prefers_solid_state_storage: bool,
}

impl RequirementProfile {
    pub fn thresholds_for(&self, slot: ComponentType) -> Option<&BTreeMap<String, Threshold>> {
        self.thresholds.get(&slot).filter(|rules| !rules.is_empty())
    }

    pub fn threshold(&self, slot: ComponentType, attribute: &str) -> Option<Threshold> {
        self.thresholds.get(&slot)?.get(attribute).copied()
    }

    /// Check a placed component. Attributes that cannot be read are skipped
    /// rather than counted as zero.
    pub fn status(&self, component: &Component) -> RequirementStatus {
        let Some(rules) = self.thresholds_for(component.component_type) else {
            return RequirementStatus::Met;
        };

        let mut relaxed = Vec::new();
        let mut unmet = Vec::new();
        for (attribute, threshold) in rules {
            let Some(actual) = component.numeric(attribute) else {
                continue;
            };
            if actual >= threshold.minimum {
                continue;
            }
            let shortfall = Shortfall {
                attribute: attribute.clone(),
                required: threshold.minimum,
                actual,
            };
            if actual >= threshold.floor() {
                relaxed.push(shortfall);
            } else {
                unmet.push(shortfall);
            }
        }

        if !unmet.is_empty() {
            RequirementStatus::Unmet(unmet)
        } else if !relaxed.is_empty() {
            RequirementStatus::Relaxed(relaxed)
        } else {
            RequirementStatus::Met
        }
    }

    /// Whether a replacement candidate provably satisfies every threshold of
    /// its slot at the given level. Unknown values disqualify a replacement.
    pub fn satisfied_by(&self, component: &Component, level: ThresholdLevel) -> bool {
        let Some(rules) = self.thresholds_for(component.component_type) else {
            return true;
        };

        rules.iter().all(|(attribute, threshold)| {
            let bar = match level {
                ThresholdLevel::Minimum => threshold.minimum,
                ThresholdLevel::Acceptable => threshold.floor(),
            };
            component
                .numeric(attribute)
                .map(|actual| actual >= bar)
                .unwrap_or(false)
        })
    }
}

/// Map a free-text purpose onto its requirement profile. Unrecognised
/// purposes fall through to the general-use profile.
pub fn build_profile(purpose: &str) -> RequirementProfile {
    let kind = PurposeKind::classify(purpose);
    let mut thresholds: BTreeMap<ComponentType, BTreeMap<String, Threshold>> = BTreeMap::new();
    let mut require = |slot: ComponentType, attribute: &str, threshold: Threshold| {
        thresholds
            .entry(slot)
            .or_default()
            .insert(attribute.to_string(), threshold);
    };

    match kind {
        PurposeKind::UhdGaming => {
            require(
                ComponentType::Gpu,
                attributes::MEMORY_GB,
                Threshold::at_least(12.0),
            );
            require(ComponentType::Cpu, attributes::CORES, Threshold::at_least(8.0));
            require(
                ComponentType::Ram,
                attributes::CAPACITY_GB,
                Threshold::preferring(32.0, 16.0),
            );
            require(
                ComponentType::Psu,
                attributes::WATTAGE,
                Threshold::at_least(850.0),
            );
        }
        PurposeKind::QhdGaming => {
            require(
                ComponentType::Gpu,
                attributes::MEMORY_GB,
                Threshold::preferring(8.0, 6.0),
            );
            require(ComponentType::Cpu, attributes::CORES, Threshold::at_least(6.0));
            require(
                ComponentType::Ram,
                attributes::CAPACITY_GB,
                Threshold::at_least(16.0),
            );
            require(
                ComponentType::Psu,
                attributes::WATTAGE,
                Threshold::at_least(650.0),
            );
        }
        PurposeKind::Gaming => {
            require(
                ComponentType::Gpu,
                attributes::MEMORY_GB,
                Threshold::at_least(6.0),
            );
            require(
                ComponentType::Ram,
                attributes::CAPACITY_GB,
                Threshold::at_least(16.0),
            );
        }
        PurposeKind::ContentCreation | PurposeKind::MachineLearning => {
            require(
                ComponentType::Ram,
                attributes::CAPACITY_GB,
                Threshold::at_least(32.0),
            );
        }
        PurposeKind::Development => {
            require(
                ComponentType::Ram,
                attributes::CAPACITY_GB,
                Threshold::at_least(16.0),
            );
        }
        PurposeKind::General => {
            require(
                ComponentType::Ram,
                attributes::CAPACITY_GB,
                Threshold::at_least(8.0),
            );
        }
    }

    RequirementProfile {
        purpose: purpose.to_string(),
        kind,
        thresholds,
        prefers_solid_state_storage: kind == PurposeKind::ContentCreation,
    }
}
