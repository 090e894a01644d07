use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::normalizer::{self, FormFactor};

/// Attribute keys shared by catalog rows, search metadata, and the rule tables.
pub mod attributes {
    pub const SOCKET: &str = "socket";
    pub const CORES: &str = "cores";
    pub const MEMORY_GB: &str = "memory_gb";
    pub const RECOMMENDED_WATTAGE: &str = "recommended_wattage";
    pub const WATTAGE: &str = "wattage";
    pub const CAPACITY_GB: &str = "capacity_gb";
    pub const FORM_FACTOR: &str = "form_factor";
    pub const SPEED_MHZ: &str = "speed_mhz";
    pub const STORAGE_TYPE: &str = "storage_type";
}

/// The eight slots of a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    Cpu,
    Gpu,
    Motherboard,
    Ram,
    Psu,
    Case,
    Storage,
    Cooler,
}

impl ComponentType {
    pub const fn ordered() -> [Self; 8] {
        [
            Self::Cpu,
            Self::Gpu,
            Self::Motherboard,
            Self::Ram,
            Self::Psu,
            Self::Case,
            Self::Storage,
            Self::Cooler,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Cpu => "CPU",
            Self::Gpu => "GPU",
            Self::Motherboard => "Motherboard",
            Self::Ram => "RAM",
            Self::Psu => "PSU",
            Self::Case => "Case",
            Self::Storage => "Storage",
            Self::Cooler => "Cooler",
        }
    }

    /// Unit token used when a numeric attribute arrives as text ("16 GB", "850W").
    fn unit_for(attribute: &str) -> &'static str {
        match attribute {
            attributes::MEMORY_GB | attributes::CAPACITY_GB => "gb",
            attributes::WATTAGE | attributes::RECOMMENDED_WATTAGE => "w",
            attributes::SPEED_MHZ => "mhz",
            _ => "",
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown component type '{0}'")]
pub struct UnknownComponentType(pub String);

impl FromStr for ComponentType {
    type Err = UnknownComponentType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cpu" | "processor" => Ok(Self::Cpu),
            "gpu" | "graphics" | "graphics card" => Ok(Self::Gpu),
            "motherboard" | "mb" => Ok(Self::Motherboard),
            "ram" | "memory" => Ok(Self::Ram),
            "psu" | "power supply" => Ok(Self::Psu),
            "case" | "chassis" => Ok(Self::Case),
            "storage" | "ssd" | "hdd" => Ok(Self::Storage),
            "cooler" | "cpu-cooler" | "cpu cooler" => Ok(Self::Cooler),
            _ => Err(UnknownComponentType(value.to_string())),
        }
    }
}

/// Catalog identifier for a component.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComponentId(pub String);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw attribute value as delivered by the catalog or the search metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Number(f64),
    Text(String),
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// A single catalog part. Immutable for the duration of an optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: ComponentId,
    pub component_type: ComponentType,
    pub name: String,
    pub brand: String,
    pub price: f64,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl Component {
    pub fn new(
        id: impl Into<String>,
        component_type: ComponentType,
        name: impl Into<String>,
        brand: impl Into<String>,
        price: f64,
    ) -> Self {
        Self {
            id: ComponentId(id.into()),
            component_type,
            name: name.into(),
            brand: brand.into(),
            price,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.attributes.get(key)? {
            AttributeValue::Text(text) if !text.trim().is_empty() => Some(text.as_str()),
            _ => None,
        }
    }

    /// Numeric view of an attribute; text values go through the quantity parser.
    pub fn numeric(&self, key: &str) -> Option<f64> {
        match self.attributes.get(key)? {
            AttributeValue::Number(value) if value.is_finite() => Some(*value),
            AttributeValue::Number(_) => None,
            AttributeValue::Text(raw) => {
                normalizer::extract_quantity(raw, ComponentType::unit_for(key))
            }
        }
    }

    pub fn socket(&self) -> Option<&str> {
        self.text(attributes::SOCKET)
    }

    pub fn form_factor(&self) -> Option<FormFactor> {
        self.text(attributes::FORM_FACTOR)
            .map(normalizer::normalize_form_factor)
    }

    pub fn cores(&self) -> Option<f64> {
        self.numeric(attributes::CORES)
    }

    pub fn memory_gb(&self) -> Option<f64> {
        self.numeric(attributes::MEMORY_GB)
    }

    pub fn recommended_wattage(&self) -> Option<f64> {
        self.numeric(attributes::RECOMMENDED_WATTAGE)
    }

    pub fn wattage(&self) -> Option<f64> {
        self.numeric(attributes::WATTAGE)
    }

    pub fn capacity_gb(&self) -> Option<f64> {
        self.numeric(attributes::CAPACITY_GB)
    }

    /// True when the storage type or name marks the drive as SSD/NVMe.
    pub fn is_solid_state(&self) -> bool {
        let marker = |value: &str| {
            let lowered = value.to_ascii_lowercase();
            lowered.contains("ssd") || lowered.contains("nvme")
        };
        self.text(attributes::STORAGE_TYPE).map(marker).unwrap_or(false) || marker(&self.name)
    }
}

/// Where a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    Search,
    CatalogFallback,
}

/// A component paired with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationCandidate {
    pub component: Component,
    pub similarity: f64,
    pub source: CandidateSource,
}

impl RecommendationCandidate {
    pub fn search(component: Component, similarity: f64) -> Self {
        Self {
            component,
            similarity: clamp_similarity(similarity),
            source: CandidateSource::Search,
        }
    }

    pub fn catalog_fallback(component: Component) -> Self {
        Self {
            component,
            similarity: 0.0,
            source: CandidateSource::CatalogFallback,
        }
    }

    pub fn id(&self) -> &ComponentId {
        &self.component.id
    }
}

fn clamp_similarity(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// One component per slot plus the stated purpose.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BuildPayload")]
pub struct Build {
    pub purpose: String,
    slots: BTreeMap<ComponentType, Component>,
}

#[derive(Deserialize)]
struct BuildPayload {
    #[serde(default)]
    purpose: String,
    #[serde(default)]
    slots: BTreeMap<ComponentType, Component>,
}

impl TryFrom<BuildPayload> for Build {
    type Error = String;

    fn try_from(payload: BuildPayload) -> Result<Self, Self::Error> {
        for (slot, component) in &payload.slots {
            if *slot != component.component_type {
                return Err(format!(
                    "component {} is a {} but was placed in the {} slot",
                    component.id, component.component_type, slot
                ));
            }
        }
        Ok(Self {
            purpose: payload.purpose,
            slots: payload.slots,
        })
    }
}

impl Build {
    pub fn new(purpose: impl Into<String>) -> Self {
        Self {
            purpose: purpose.into(),
            slots: BTreeMap::new(),
        }
    }

    /// Builder-style insert keyed by the component's own type.
    pub fn with(mut self, component: Component) -> Self {
        self.place(component);
        self
    }

    pub fn get(&self, slot: ComponentType) -> Option<&Component> {
        self.slots.get(&slot)
    }

    /// Place a component into its slot, returning whatever it displaced.
    pub fn place(&mut self, component: Component) -> Option<Component> {
        self.slots.insert(component.component_type, component)
    }

    pub fn remove(&mut self, slot: ComponentType) -> Option<Component> {
        self.slots.remove(&slot)
    }

    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.slots.values()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn missing_slots(&self) -> Vec<ComponentType> {
        ComponentType::ordered()
            .into_iter()
            .filter(|slot| !self.slots.contains_key(slot))
            .collect()
    }

    pub fn total_price(&self) -> f64 {
        self.slots.values().map(|component| component.price).sum()
    }
}

/// Why a slot ended up with a different component than the caller supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeReason {
    Filled,
    Requirement,
    Preference,
    Repair,
}

/// Audit entry for a single substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotChange {
    pub slot: ComponentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<ComponentId>,
    pub replacement: ComponentId,
    pub reason: ChangeReason,
    pub note: String,
}
