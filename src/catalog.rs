//! Scanner catalog: descriptor records and selection.

use crate::error::{DragnetError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default catalog compiled into the binary.
const BUILTIN_CATALOG: &str = include_str!("../scanners.toml");

/// Static description of one external scanner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerDescriptor {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub categories: Vec<String>,
    /// Shell command template with `{target}`, `{assets}`, and `{output}`
    /// placeholders.
    pub cmd: String,
    #[serde(default)]
    pub default: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Catalog {
    pub scanners: Vec<ScannerDescriptor>,
}

impl Catalog {
    pub fn builtin() -> Self {
        toml::from_str(BUILTIN_CATALOG).expect("Invalid built-in scanner catalog")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| DragnetError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| DragnetError::ParseCatalog {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Category vocabulary of this catalog: uppercased, deduplicated,
    /// sorted.
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = self
            .scanners
            .iter()
            .flat_map(|scanner| scanner.categories.iter().map(|c| c.to_uppercase()))
            .collect();
        categories.sort();
        categories.dedup();
        categories
    }

    /// Resolve scanner and category selections against the catalog.
    ///
    /// Without an explicit scanner list, descriptors flagged `default`
    /// are selected. `all` selects everything; unknown scanner names are
    /// a validation error. The scanner set is then intersected with the
    /// selected categories.
    pub fn select(
        &self,
        scanners: Option<&str>,
        categories: Option<&str>,
    ) -> Result<Vec<ScannerDescriptor>> {
        let known_categories = self.categories();

        let selected_categories: Vec<String> = match categories {
            None => known_categories.clone(),
            Some(list) => {
                let requested: Vec<String> =
                    split_list(list).iter().map(|c| c.to_uppercase()).collect();
                if requested.iter().any(|c| c == "ALL") {
                    known_categories.clone()
                } else {
                    requested
                        .into_iter()
                        .filter(|c| known_categories.contains(c))
                        .collect()
                }
            }
        };
        if selected_categories.is_empty() {
            return Err(DragnetError::Usage(format!(
                "CATEGORIES must be one or more of '{}', or 'all'",
                known_categories.join("', '")
            )));
        }

        let selected_names: Vec<String> = match scanners {
            None => self
                .scanners
                .iter()
                .filter(|scanner| scanner.default)
                .map(|scanner| scanner.name.clone())
                .collect(),
            Some(list) => {
                let requested = split_list(list);
                if requested.iter().any(|name| name == "all") {
                    self.scanners.iter().map(|s| s.name.clone()).collect()
                } else {
                    let unknown: Vec<String> = requested
                        .iter()
                        .filter(|name| !self.scanners.iter().any(|s| &s.name == *name))
                        .cloned()
                        .collect();
                    match unknown.len() {
                        0 => requested,
                        1 => {
                            return Err(DragnetError::Usage(format!(
                                "Unknown scanner: {}",
                                unknown[0]
                            )));
                        }
                        _ => {
                            return Err(DragnetError::Usage(format!(
                                "Unknown scanners: {}",
                                unknown.join(", ")
                            )));
                        }
                    }
                }
            }
        };

        let selected: Vec<ScannerDescriptor> = self
            .scanners
            .iter()
            .filter(|scanner| selected_names.iter().any(|name| name == &scanner.name))
            .filter(|scanner| {
                scanner
                    .categories
                    .iter()
                    .any(|c| selected_categories.iter().any(|sel| sel.eq_ignore_ascii_case(c)))
            })
            .cloned()
            .collect();

        if selected.is_empty() {
            return Err(DragnetError::Usage(
                "No available scanners selected.".to_string(),
            ));
        }
        Ok(selected)
    }
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}
