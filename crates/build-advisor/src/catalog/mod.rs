//! CSV component catalog import.

mod parser;

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use tracing::info;

use crate::builds::domain::Component;

#[derive(Debug, thiserror::Error)]
pub enum CatalogImportError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid catalog CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: {source}")]
    Row { row: u64, source: csv::Error },
    #[error("row {row}: missing {field}")]
    MissingField { row: u64, field: &'static str },
    #[error("row {row}: unknown component type {value:?}")]
    UnknownType { row: u64, value: String },
    #[error("row {row}: unparseable price {value:?}")]
    InvalidPrice { row: u64, value: String },
    #[error("row {row}: duplicate component id {id}")]
    DuplicateId { row: u64, id: String },
}

/// Sample catalog shipped with the crate, used when no CSV path is configured.
pub const BUNDLED_CSV: &str = include_str!("../../data/components.csv");

pub struct CatalogImporter;

impl CatalogImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Component>, CatalogImportError> {
        let file = std::fs::File::open(path.as_ref())?;
        let components = Self::from_reader(file)?;
        info!(
            path = %path.as_ref().display(),
            components = components.len(),
            "catalog loaded"
        );
        Ok(components)
    }

    pub fn bundled() -> Result<Vec<Component>, CatalogImportError> {
        Self::from_reader(BUNDLED_CSV.as_bytes())
    }

    /// Parse a catalog. Empty cells become absent attributes; ids must be unique.
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Component>, CatalogImportError> {
        let components = parser::parse_components(reader)?;

        let mut seen = HashSet::new();
        for (index, component) in components.iter().enumerate() {
            if !seen.insert(&component.id) {
                return Err(CatalogImportError::DuplicateId {
                    row: index as u64 + 2,
                    id: component.id.0.clone(),
                });
            }
        }

        Ok(components)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builds::domain::{AttributeValue, ComponentType};
    use crate::builds::normalizer::FormFactor;

    const HEADER: &str = "id,type,name,brand,price,socket,cores,memory_gb,recommended_wattage,wattage,capacity_gb,form_factor,speed_mhz,storage_type\n";

    fn import(rows: &str) -> Result<Vec<Component>, CatalogImportError> {
        CatalogImporter::from_reader(format!("{HEADER}{rows}").as_bytes())
    }

    #[test]
    fn parses_typed_rows() {
        let components = import(
            "cpu-1,cpu,Ryzen 7 7800X3D,AMD,4 490 kr,Socket AM5,8,,,,,,,\n\
             gpu-1,gpu,RTX 4070,NVIDIA,6490,,,12 GB,200,,,,,\n\
             mb-1,motherboard,B650M Pro,MSI,1690,AM5,,,,,,Micro ATX,,\n",
        )
        .expect("catalog parses");

        assert_eq!(components.len(), 3);
        let cpu = &components[0];
        assert_eq!(cpu.component_type, ComponentType::Cpu);
        assert_eq!(cpu.price, 4490.0);
        assert_eq!(cpu.socket(), Some("Socket AM5"));
        assert_eq!(cpu.cores(), Some(8.0));
        assert!(cpu.memory_gb().is_none());

        let gpu = &components[1];
        assert_eq!(
            gpu.attributes.get("memory_gb"),
            Some(&AttributeValue::Text("12 GB".to_string()))
        );
        assert_eq!(gpu.memory_gb(), Some(12.0));
        assert_eq!(gpu.recommended_wattage(), Some(200.0));

        assert_eq!(components[2].form_factor(), Some(FormFactor::MicroAtx));
    }

    #[test]
    fn unknown_type_names_the_row() {
        let err = import("cpu-1,cpu,Ryzen,AMD,100,,,,,,,,,\nmon-1,monitor,Screen,LG,900,,,,,,,,,\n")
            .expect_err("monitor is not a slot");
        assert!(matches!(err, CatalogImportError::UnknownType { row: 3, .. }));
    }

    #[test]
    fn bad_price_is_rejected() {
        let err = import("cpu-1,cpu,Ryzen,AMD,call us,,,,,,,,,\n").expect_err("price required");
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = import("a,cpu,One,AMD,100,,,,,,,,,\na,gpu,Two,AMD,100,,,,,,,,,\n")
            .expect_err("duplicate id");
        assert!(matches!(err, CatalogImportError::DuplicateId { row: 3, .. }));
    }
}
