//! Token catalog
//!
//! The fixed company→token table, loaded from configuration at startup and used to seed the
//! token store. Nothing in the lifecycle depends on specific company or token names.

use std::{fs, path::Path};

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Deserialize;
use thiserror::Error;

use crate::{ids::TokenId, items::RequestItem};

/// Catalog loading and lookup errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// IO error reading the catalog file
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("failed to parse catalog YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// The catalog defines no tokens
    #[error("catalog defines no tokens")]
    Empty,

    /// A company or token id is blank
    #[error("catalog entry {index} has a blank {field}")]
    BlankField {
        /// Position of the entry in the file
        index: usize,

        /// Name of the blank field
        field: &'static str,
    },

    /// Two entries share a company
    #[error("company {0:?} appears more than once in the catalog")]
    DuplicateCompany(String),

    /// Two entries share a token id
    #[error("token {0} appears more than once in the catalog")]
    DuplicateToken(TokenId),

    /// A company was asked for that the catalog does not know
    #[error("company {0:?} is not in the catalog")]
    UnknownCompany(String),
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    tokens: Vec<CatalogEntry>,
}

/// One company and the token that signs for it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogEntry {
    /// Company display name
    pub company: String,

    /// Token identifier
    pub token_id: TokenId,

    /// Optional free-text description of the device
    #[serde(default)]
    pub description: Option<String>,
}

impl CatalogEntry {
    /// Description stored with the token, derived from the company when not configured.
    #[must_use]
    pub fn description(&self) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| format!("Token for {}", self.company))
    }
}

/// Validated company→token catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    by_company: FxHashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog from entries.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty catalog, blank fields, or duplicate companies or tokens.
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self, CatalogError> {
        if entries.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut by_company = FxHashMap::default();
        let mut tokens = FxHashSet::default();

        for (index, entry) in entries.iter().enumerate() {
            if entry.company.trim().is_empty() {
                return Err(CatalogError::BlankField {
                    index,
                    field: "company",
                });
            }

            if entry.token_id.as_str().trim().is_empty() {
                return Err(CatalogError::BlankField {
                    index,
                    field: "token_id",
                });
            }

            if by_company.insert(entry.company.clone(), index).is_some() {
                return Err(CatalogError::DuplicateCompany(entry.company.clone()));
            }

            if !tokens.insert(entry.token_id.clone()) {
                return Err(CatalogError::DuplicateToken(entry.token_id.clone()));
            }
        }

        Ok(Self {
            entries,
            by_company,
        })
    }

    /// Parse a catalog from YAML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or the catalog is invalid.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_norway::from_str(yaml)?;

        Self::new(file.tokens)
    }

    /// Load a catalog from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or the catalog is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml_str(&contents)
    }

    /// All entries in file order.
    #[must_use]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Token for a company, if the catalog knows it.
    #[must_use]
    pub fn token_for(&self, company: &str) -> Option<&TokenId> {
        self.by_company
            .get(company)
            .and_then(|&index| self.entries.get(index))
            .map(|entry| &entry.token_id)
    }

    /// Turn a list of companies into request items.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownCompany`] for the first company not in the catalog.
    pub fn resolve<S: AsRef<str>>(&self, companies: &[S]) -> Result<Vec<RequestItem>, CatalogError> {
        companies
            .iter()
            .map(|company| {
                let company = company.as_ref();

                self.token_for(company)
                    .map(|token_id| RequestItem::new(company, token_id.clone()))
                    .ok_or_else(|| CatalogError::UnknownCompany(company.to_string()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    const YAML: &str = r"
tokens:
  - company: Northwind Grain
    token_id: KEY-01
  - company: Harbor Elevator
    token_id: KEY-02
    description: Rutoken in the blue case
";

    #[test]
    fn parses_entries_in_file_order() -> TestResult {
        let catalog = Catalog::from_yaml_str(YAML)?;

        let ids: Vec<&str> = catalog
            .entries()
            .iter()
            .map(|entry| entry.token_id.as_str())
            .collect();

        assert_eq!(ids, ["KEY-01", "KEY-02"]);

        Ok(())
    }

    #[test]
    fn description_defaults_to_company() -> TestResult {
        let catalog = Catalog::from_yaml_str(YAML)?;

        let descriptions: Vec<String> =
            catalog.entries().iter().map(CatalogEntry::description).collect();

        assert_eq!(
            descriptions,
            ["Token for Northwind Grain", "Rutoken in the blue case"]
        );

        Ok(())
    }

    #[test]
    fn resolves_companies_to_items() -> TestResult {
        let catalog = Catalog::from_yaml_str(YAML)?;

        let items = catalog.resolve(&["Harbor Elevator", "Northwind Grain"])?;

        assert_eq!(
            items,
            [
                RequestItem::new("Harbor Elevator", "KEY-02"),
                RequestItem::new("Northwind Grain", "KEY-01"),
            ]
        );

        Ok(())
    }

    #[test]
    fn unknown_company_is_an_error() -> TestResult {
        let catalog = Catalog::from_yaml_str(YAML)?;

        let result = catalog.resolve(&["Nobody Ltd"]);

        assert!(
            matches!(result, Err(CatalogError::UnknownCompany(ref name)) if name == "Nobody Ltd"),
            "expected UnknownCompany, got {result:?}"
        );

        Ok(())
    }

    #[test]
    fn duplicate_token_is_rejected() {
        let yaml = r"
tokens:
  - company: A
    token_id: KEY-01
  - company: B
    token_id: KEY-01
";

        let result = Catalog::from_yaml_str(yaml);

        assert!(
            matches!(result, Err(CatalogError::DuplicateToken(ref id)) if id.as_str() == "KEY-01"),
            "expected DuplicateToken, got {result:?}"
        );
    }

    #[test]
    fn duplicate_company_is_rejected() {
        let yaml = r"
tokens:
  - company: A
    token_id: KEY-01
  - company: A
    token_id: KEY-02
";

        assert!(matches!(
            Catalog::from_yaml_str(yaml),
            Err(CatalogError::DuplicateCompany(_))
        ));
    }

    #[test]
    fn blank_token_id_is_rejected() {
        let yaml = r#"
tokens:
  - company: A
    token_id: " "
"#;

        assert!(matches!(
            Catalog::from_yaml_str(yaml),
            Err(CatalogError::BlankField {
                index: 0,
                field: "token_id"
            })
        ));
    }

    #[test]
    fn empty_catalog_is_rejected() {
        assert!(matches!(
            Catalog::from_yaml_str("tokens: []"),
            Err(CatalogError::Empty)
        ));
    }
}
