use serde::{Deserialize, Serialize};

use super::compatibility::required_psu_watts;
use super::domain::{attributes, Build, Component, ComponentId, ComponentType};
use super::normalizer::sockets_compatible;
use super::requirements::{build_profile, RequirementProfile};

const GPU_BUDGET_RATIO: f64 = 1.5;
const COMPLETE_CORE_PARTS: usize = 5;

/// Which advisory rule produced a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum SuggestionKind {
    MissingComponent,
    GpuBudgetBalance { cpu_price: f64 },
    GpuMemory { required_gb: f64 },
    PsuHeadroom { required_watts: f64 },
    SolidStateStorage,
    RamCapacity { required_gb: f64 },
    MissingCooler,
    Incomplete,
    Complete,
}

/// One piece of advice about a user-assembled build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSuggestion {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<ComponentType>,
    pub kind: SuggestionKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_component_id: Option<ComponentId>,
}

impl ComponentSuggestion {
    fn new(slot: Option<ComponentType>, kind: SuggestionKind, message: impl Into<String>) -> Self {
        Self {
            slot,
            kind,
            message: message.into(),
            suggested_component_id: None,
        }
    }

    /// Whether `candidate` would resolve this suggestion within `build`.
    pub fn accepts(&self, build: &Build, candidate: &Component) -> bool {
        if Some(candidate.component_type) != self.slot {
            return false;
        }
        match self.kind {
            SuggestionKind::MissingComponent => fits_missing_slot(build, candidate),
            SuggestionKind::GpuBudgetBalance { cpu_price } => {
                candidate.price * GPU_BUDGET_RATIO >= cpu_price
            }
            SuggestionKind::GpuMemory { required_gb } => {
                candidate.memory_gb().is_some_and(|memory| memory >= required_gb)
            }
            SuggestionKind::PsuHeadroom { required_watts } => {
                candidate.wattage().is_some_and(|watts| watts >= required_watts)
            }
            SuggestionKind::SolidStateStorage => candidate.is_solid_state(),
            SuggestionKind::RamCapacity { required_gb } => {
                candidate.capacity_gb().is_some_and(|capacity| capacity >= required_gb)
            }
            SuggestionKind::MissingCooler => true,
            SuggestionKind::Incomplete | SuggestionKind::Complete => false,
        }
    }
}

/// Review a build without changing it.
pub fn advise(build: &Build) -> Vec<ComponentSuggestion> {
    let profile = build_profile(&build.purpose);
    let mut suggestions = Vec::new();

    for slot in [
        ComponentType::Cpu,
        ComponentType::Motherboard,
        ComponentType::Ram,
        ComponentType::Psu,
    ] {
        if build.get(slot).is_none() {
            suggestions.push(ComponentSuggestion::new(
                Some(slot),
                SuggestionKind::MissingComponent,
                missing_message(slot),
            ));
        }
    }

    if profile.kind.is_gaming() {
        gpu_suggestions(build, &profile, &mut suggestions);
    }

    if let (Some(required), Some(available)) = (
        required_psu_watts(build),
        build.get(ComponentType::Psu).and_then(Component::wattage),
    ) {
        if available < required {
            suggestions.push(ComponentSuggestion::new(
                Some(ComponentType::Psu),
                SuggestionKind::PsuHeadroom {
                    required_watts: required,
                },
                format!(
                    "Your {available:.0}W power supply may be too weak for this system. At least {required:.0}W is recommended."
                ),
            ));
        }
    }

    if let Some(storage) = build.get(ComponentType::Storage) {
        if !storage.is_solid_state() {
            suggestions.push(ComponentSuggestion::new(
                Some(ComponentType::Storage),
                SuggestionKind::SolidStateStorage,
                "Use an SSD for the operating system and programs; keep a hard drive for bulk data.",
            ));
        }
    }

    if let (Some(ram), Some(threshold)) = (
        build.get(ComponentType::Ram),
        profile.threshold(ComponentType::Ram, attributes::CAPACITY_GB),
    ) {
        if let Some(capacity) = ram.capacity_gb().filter(|capacity| *capacity < threshold.minimum) {
            suggestions.push(ComponentSuggestion::new(
                Some(ComponentType::Ram),
                SuggestionKind::RamCapacity {
                    required_gb: threshold.minimum,
                },
                format!(
                    "{} calls for at least {:.0}GB of RAM; the current choice has {:.0}GB.",
                    capitalized(profile.kind.label()),
                    threshold.minimum,
                    capacity
                ),
            ));
        }
    }

    if build.get(ComponentType::Cpu).is_some() && build.get(ComponentType::Cooler).is_none() {
        suggestions.push(ComponentSuggestion::new(
            Some(ComponentType::Cooler),
            SuggestionKind::MissingCooler,
            "A CPU cooler is recommended for sustained performance and processor lifespan.",
        ));
    }

    if suggestions.is_empty() {
        let core_parts = build
            .components()
            .filter(|component| component.component_type != ComponentType::Cooler)
            .count();
        suggestions.push(if core_parts < COMPLETE_CORE_PARTS {
            ComponentSuggestion::new(
                None,
                SuggestionKind::Incomplete,
                "The build is incomplete. Keep adding components for a complete system.",
            )
        } else {
            ComponentSuggestion::new(
                None,
                SuggestionKind::Complete,
                "The build looks balanced and complete. All key components are selected and compatible.",
            )
        });
    }

    suggestions
}

fn gpu_suggestions(
    build: &Build,
    profile: &RequirementProfile,
    suggestions: &mut Vec<ComponentSuggestion>,
) {
    let Some(gpu) = build.get(ComponentType::Gpu) else {
        return;
    };

    if let Some(cpu) = build.get(ComponentType::Cpu) {
        if cpu.price > gpu.price * GPU_BUDGET_RATIO {
            suggestions.push(ComponentSuggestion::new(
                Some(ComponentType::Gpu),
                SuggestionKind::GpuBudgetBalance {
                    cpu_price: cpu.price,
                },
                "For gaming, spend more on the graphics card than on the processor. Consider a stronger GPU or a cheaper CPU.",
            ));
        }
    }

    let (Some(memory), Some(threshold)) = (
        gpu.memory_gb(),
        profile.threshold(ComponentType::Gpu, attributes::MEMORY_GB),
    ) else {
        return;
    };
    if memory < threshold.minimum {
        suggestions.push(ComponentSuggestion::new(
            Some(ComponentType::Gpu),
            SuggestionKind::GpuMemory {
                required_gb: threshold.minimum,
            },
            format!(
                "{} calls for a graphics card with at least {:.0}GB of memory; the current card has {:.0}GB.",
                capitalized(profile.kind.label()),
                threshold.minimum,
                memory
            ),
        ));
    }
}

fn missing_message(slot: ComponentType) -> &'static str {
    match slot {
        ComponentType::Cpu => "Every computer needs a processor. Pick one based on what the build is for.",
        ComponentType::Motherboard => "Choose a motherboard with the same socket as the processor.",
        ComponentType::Ram => "Every computer needs memory. At least 16GB is recommended for modern systems.",
        ComponentType::Psu => "A power supply is required. Make sure it has enough wattage for every component.",
        _ => "This slot is empty.",
    }
}

/// A replacement for an empty slot must not introduce a socket clash.
fn fits_missing_slot(build: &Build, candidate: &Component) -> bool {
    let partner = match candidate.component_type {
        ComponentType::Cpu => build.get(ComponentType::Motherboard),
        ComponentType::Motherboard => build.get(ComponentType::Cpu),
        ComponentType::Psu => {
            return match required_psu_watts(build) {
                Some(required) => candidate.wattage().is_some_and(|watts| watts >= required),
                None => true,
            };
        }
        _ => None,
    };
    match (partner.and_then(Component::socket), candidate.socket()) {
        (Some(partner_socket), Some(socket)) => sockets_compatible(partner_socket, socket),
        (Some(_), None) => false,
        _ => true,
    }
}

fn capitalized(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
