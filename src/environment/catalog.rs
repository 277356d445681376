use std::{collections::BTreeSet, fs, path::Path};

use indexmap::IndexMap;
use serde::Deserialize;

use crate::{
    environment::EnvironmentRegistry,
    error::Result,
    format::{PerScheme, Scheme},
};

/// Placeholder used by the catalog for a missing identifier
const NULL_IDENTIFIER: &str = "NULL";

/// One environment of an environment/format catalog export
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogEntry {
    environment_name: String,
    #[serde(default)]
    default_save_parameters: Vec<CatalogFormat>,
    #[serde(default)]
    open_parameters: Vec<CatalogFormat>,
    #[serde(default)]
    other_save_parameters: Vec<CatalogFormat>,
    #[serde(default)]
    export_parameters: Vec<CatalogFormat>,
}

#[derive(Debug, Clone, Deserialize)]
struct CatalogFormat {
    #[serde(rename = "matchedFormatQID", default)]
    qid: Option<String>,
    #[serde(rename = "matchedFormatPronomID", default)]
    pronom: Option<String>,
}

impl CatalogEntry {
    /// Identifiers of every parameter list, per scheme
    fn readable(&self) -> PerScheme<BTreeSet<String>> {
        let mut readable: PerScheme<BTreeSet<String>> = PerScheme::default();
        let lists = [
            &self.default_save_parameters,
            &self.open_parameters,
            &self.other_save_parameters,
            &self.export_parameters,
        ];
        for format in lists.into_iter().flatten() {
            if let Some(qid) = format.qid.as_deref().filter(|q| *q != NULL_IDENTIFIER) {
                readable.wikidata.insert(qid.to_string());
            }
            if let Some(puid) = format.pronom.as_deref() {
                // PUID は空白を除去してから比較
                let puid: String = puid.chars().filter(|c| *c != ' ').collect();
                if puid != NULL_IDENTIFIER {
                    readable.pronom.insert(puid);
                }
            }
        }
        readable
    }
}

impl EnvironmentRegistry {
    /// Import an environment/format catalog
    ///
    /// The catalog maps arbitrary keys to `{environmentName, ...Parameters}`.
    /// Each listed environment gets exactly the formats of its parameter lists,
    /// replacing whatever it could read before. Returns the number of entries.
    pub fn import_format_catalog(&mut self, raw: &str) -> Result<usize> {
        let catalog: IndexMap<String, CatalogEntry> = serde_json::from_str(raw)?;
        for entry in catalog.values() {
            let readable = entry.readable();
            for scheme in Scheme::ALL {
                self.set_readable(&entry.environment_name, scheme, readable[scheme].clone());
            }
        }
        log::info!("imported {} environments from format catalog", catalog.len());
        Ok(catalog.len())
    }

    pub fn import_format_catalog_file(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let bytes = fs::read(path.as_ref())?;
        self.import_format_catalog(&String::from_utf8_lossy(&bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"{
        "1": {
            "environmentName": "Windows 98 / Office 97",
            "openParameters": [
                {"matchedFormatQID": "Q2195", "matchedFormatPronomID": "fmt/ 40"},
                {"matchedFormatQID": "NULL", "matchedFormatPronomID": "x-fmt/ 44"}
            ],
            "exportParameters": [
                {"matchedFormatQID": "Q42332", "matchedFormatPronomID": "NULL"}
            ]
        },
        "2": {
            "environmentName": "Mac OS 9",
            "defaultSaveParameters": [
                {"matchedFormatQID": "Q1", "matchedFormatPronomID": "fmt/1"}
            ]
        }
    }"#;

    #[test]
    fn catalog_entries_are_imported_per_scheme() {
        let mut reg = EnvironmentRegistry::new();
        assert_eq!(reg.import_format_catalog(CATALOG).unwrap(), 2);
        let win = reg.get("Windows 98 / Office 97").unwrap();
        assert_eq!(win.id, 0);
        assert_eq!(win.readable.wikidata, BTreeSet::from(["Q2195".to_string(), "Q42332".to_string()]));
        assert_eq!(win.readable.pronom, BTreeSet::from(["fmt/40".to_string(), "x-fmt/44".to_string()]));
        assert_eq!(reg.get("Mac OS 9").unwrap().id, 1);
    }

    #[test]
    fn catalog_replaces_previous_formats() {
        let mut reg = EnvironmentRegistry::new();
        reg.add_readable("Mac OS 9", Scheme::Pronom, ["fmt/999"]);
        reg.import_format_catalog(CATALOG).unwrap();
        let mac = reg.get("Mac OS 9").unwrap();
        assert_eq!(mac.id, 0);
        assert_eq!(mac.readable.pronom, BTreeSet::from(["fmt/1".to_string()]));
    }

    #[test]
    fn malformed_catalog_is_rejected() {
        let mut reg = EnvironmentRegistry::new();
        assert!(reg.import_format_catalog(r#"{"1": {"openParameters": []}}"#).is_err());
        assert!(reg.is_empty());
    }
}
