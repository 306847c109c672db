//! Resource table model
//!
//! A module's `resources.json` lists every resource entry with its values per
//! configuration. File-based values point at entries under `res/`; the splitters
//! move values (and the files they reference) between splits.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::targeting::{DensityBucket, language_of_locale};

/// Numeric resource identifier (`0xPPTTEEEE`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub u32);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// Resource table of one module
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTable {
    pub package: String,
    #[serde(default)]
    pub entries: Vec<ResourceEntry>,
}

/// One resource with all of its configuration-specific values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceEntry {
    pub id: ResourceId,
    #[serde(rename = "type")]
    pub type_name: String,
    pub name: String,
    #[serde(default)]
    pub values: Vec<ResourceValue>,
}

/// Value of a resource for one configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceValue {
    /// Android qualifier string, empty for the default configuration
    #[serde(default)]
    pub config: String,
    #[serde(flatten)]
    pub item: ResourceItem,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceItem {
    /// Value stored in a file of the module, e.g. `res/drawable-hdpi/icon.png`
    File { file: String },
    /// Inline value
    Text { text: String },
}

impl ResourceValue {
    pub fn file(&self) -> Option<&str> {
        match &self.item {
            ResourceItem::File { file } => Some(file),
            ResourceItem::Text { .. } => None,
        }
    }

    pub fn qualifiers(&self) -> ResourceConfig {
        ResourceConfig::parse(&self.config)
    }
}

impl ResourceEntry {
    /// `type/name` form used by manifest references and pinning lists
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.type_name, self.name)
    }
}

/// Density qualifier of a configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DensityQualifier {
    Bucket(DensityBucket),
    /// `anydpi`: scalable resources, never density-split
    Any,
    /// `nodpi`: never scaled, never density-split
    NoDpi,
}

/// Parsed Android configuration qualifiers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceConfig {
    /// Locale qualifier as written, e.g. `fr-rCA` or `b+sr+Latn`
    pub locale: Option<String>,
    pub density: Option<DensityQualifier>,
    /// Every other qualifier, kept verbatim
    pub others: Vec<String>,
}

/// Short qualifiers that look like language codes but are not
const NON_LOCALE_QUALIFIERS: [&str; 1] = ["car"];

impl ResourceConfig {
    pub fn parse(qualifiers: &str) -> Self {
        let mut config = ResourceConfig::default();
        let tokens: Vec<&str> = qualifiers.split('-').filter(|t| !t.is_empty()).collect();
        let mut i = 0;
        while i < tokens.len() {
            let token = tokens[i];
            if token.starts_with("b+") && config.locale.is_none() {
                config.locale = Some(token.to_string());
            } else if config.locale.is_none() && is_language_token(token) {
                let region = tokens
                    .get(i + 1)
                    .filter(|next| is_region_token(next))
                    .copied();
                match region {
                    Some(region) => {
                        config.locale = Some(format!("{token}-{region}"));
                        i += 1;
                    }
                    None => config.locale = Some(token.to_string()),
                }
            } else if token == "anydpi" {
                config.density = Some(DensityQualifier::Any);
            } else if token == "nodpi" {
                config.density = Some(DensityQualifier::NoDpi);
            } else if let Some(bucket) = DensityBucket::from_name(token) {
                config.density = Some(DensityQualifier::Bucket(bucket));
            } else {
                config.others.push(token.to_string());
            }
            i += 1;
        }
        config
    }

    pub fn language(&self) -> Option<String> {
        self.locale.as_deref().and_then(language_of_locale)
    }

    pub fn density_bucket(&self) -> Option<DensityBucket> {
        match self.density {
            Some(DensityQualifier::Bucket(bucket)) => Some(bucket),
            _ => None,
        }
    }
}

fn is_language_token(token: &str) -> bool {
    (2..=3).contains(&token.len())
        && token.chars().all(|c| c.is_ascii_lowercase())
        && !NON_LOCALE_QUALIFIERS.contains(&token)
}

fn is_region_token(token: &str) -> bool {
    token.len() == 3
        && token.starts_with('r')
        && token[1..].chars().all(|c| c.is_ascii_uppercase())
}

impl ResourceTable {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of values over all entries
    pub fn value_count(&self) -> usize {
        self.entries.iter().map(|e| e.values.len()).sum()
    }

    pub fn find(&self, id: ResourceId) -> Option<&ResourceEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn find_by_name(&self, qualified_name: &str) -> Option<&ResourceEntry> {
        self.entries
            .iter()
            .find(|e| e.qualified_name() == qualified_name)
    }

    /// Keeps the values for which `keep` holds; entries left without values are dropped
    #[must_use]
    pub fn filter(&self, keep: impl Fn(&ResourceEntry, &ResourceValue) -> bool) -> ResourceTable {
        let entries = self
            .entries
            .iter()
            .filter_map(|entry| {
                let values: Vec<ResourceValue> = entry
                    .values
                    .iter()
                    .filter(|value| keep(entry, value))
                    .cloned()
                    .collect();
                (!values.is_empty()).then(|| ResourceEntry {
                    values,
                    ..entry.clone()
                })
            })
            .collect();
        ResourceTable {
            package: self.package.clone(),
            entries,
        }
    }

    /// Merges `other` into this table, combining values of entries with the same id
    pub fn merge(&mut self, other: &ResourceTable) {
        if self.package.is_empty() {
            self.package = other.package.clone();
        }
        let mut index: BTreeMap<ResourceId, usize> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id, i))
            .collect();
        for entry in &other.entries {
            match index.get(&entry.id) {
                Some(&i) => {
                    let existing = &mut self.entries[i];
                    for value in &entry.values {
                        if !existing.values.contains(value) {
                            existing.values.push(value.clone());
                        }
                    }
                }
                None => {
                    index.insert(entry.id, self.entries.len());
                    self.entries.push(entry.clone());
                }
            }
        }
        self.entries.sort_by_key(|e| e.id);
    }

    /// Files referenced by file-based values
    pub fn referenced_files(&self) -> BTreeSet<String> {
        self.entries
            .iter()
            .flat_map(|e| e.values.iter())
            .filter_map(ResourceValue::file)
            .map(str::to_string)
            .collect()
    }
}
