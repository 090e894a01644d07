use std::io::Read;

use serde::{Deserialize, Deserializer};

use super::CatalogImportError;
use crate::builds::domain::{attributes, AttributeValue, Component, ComponentType};
use crate::builds::normalizer::parse_price;

/// Attribute columns, in file order.
const ATTRIBUTE_COLUMNS: [&str; 9] = [
    attributes::SOCKET,
    attributes::CORES,
    attributes::MEMORY_GB,
    attributes::RECOMMENDED_WATTAGE,
    attributes::WATTAGE,
    attributes::CAPACITY_GB,
    attributes::FORM_FACTOR,
    attributes::SPEED_MHZ,
    attributes::STORAGE_TYPE,
];

pub(crate) fn parse_components<R: Read>(reader: R) -> Result<Vec<Component>, CatalogImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let mut components = Vec::new();

    for (index, record) in csv_reader.records().enumerate() {
        let record = record?;
        let row = record
            .position()
            .map(|position| position.line())
            .unwrap_or(index as u64 + 2);
        let parsed: CatalogRow = record
            .deserialize(Some(&headers))
            .map_err(|source| CatalogImportError::Row { row, source })?;
        components.push(parsed.into_component(row)?);
    }

    Ok(components)
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    id: String,
    #[serde(rename = "type")]
    component_type: String,
    name: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    brand: Option<String>,
    price: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    socket: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    cores: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    memory_gb: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    recommended_wattage: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    wattage: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    capacity_gb: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    form_factor: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    speed_mhz: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    storage_type: Option<String>,
}

impl CatalogRow {
    fn into_component(self, row: u64) -> Result<Component, CatalogImportError> {
        if self.id.trim().is_empty() {
            return Err(CatalogImportError::MissingField { row, field: "id" });
        }
        if self.name.trim().is_empty() {
            return Err(CatalogImportError::MissingField { row, field: "name" });
        }
        let component_type: ComponentType =
            self.component_type
                .parse()
                .map_err(|_| CatalogImportError::UnknownType {
                    row,
                    value: self.component_type.clone(),
                })?;
        let price = parse_price(&self.price).ok_or_else(|| CatalogImportError::InvalidPrice {
            row,
            value: self.price.clone(),
        })?;

        let values = [
            self.socket,
            self.cores,
            self.memory_gb,
            self.recommended_wattage,
            self.wattage,
            self.capacity_gb,
            self.form_factor,
            self.speed_mhz,
            self.storage_type,
        ];
        let mut component = Component::new(
            self.id,
            component_type,
            self.name,
            self.brand.unwrap_or_default(),
            price,
        );
        for (key, value) in ATTRIBUTE_COLUMNS.into_iter().zip(values) {
            if let Some(raw) = value {
                component = component.with_attribute(key, attribute_value(key, raw));
            }
        }
        Ok(component)
    }
}

/// Plain numbers become numeric attributes; everything else stays text and is
/// parsed lazily by the component accessors.
fn attribute_value(key: &str, raw: String) -> AttributeValue {
    let textual = key == attributes::SOCKET
        || key == attributes::FORM_FACTOR
        || key == attributes::STORAGE_TYPE;
    match raw.parse::<f64>() {
        Ok(number) if !textual && number.is_finite() => AttributeValue::Number(number),
        _ => AttributeValue::Text(raw),
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
