//! Splitting by language
//!
//! Locale-qualified resource values and `#lang_` asset directories move to
//! the split of their language. Values without a locale stay in the master.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::module::{BundleModule, ModuleEntry};
use crate::domain::resource::{ResourceEntry, ResourceValue};
use crate::domain::split::ModuleSplit;
use crate::domain::targeting::{SplitDimension, Targeting, ValueTargeting};
use crate::splitters::{
    DimensionSplitter, Partition, PinnedResources, resource_files, retain_referenced_resources,
};

pub struct LanguageSplitter<'a> {
    module: &'a BundleModule,
    pinned: &'a PinnedResources,
}

impl<'a> LanguageSplitter<'a> {
    pub fn new(module: &'a BundleModule, pinned: &'a PinnedResources) -> Self {
        Self { module, pinned }
    }

    fn asset_language(&self, path: &str) -> Option<String> {
        let targeting = self.module.asset_targeting(path)?;
        targeting.language.as_ref()?.value().cloned()
    }
}

fn value_language(value: &ResourceValue) -> Option<String> {
    value.qualifiers().language()
}

impl DimensionSplitter for LanguageSplitter<'_> {
    fn dimension(&self) -> SplitDimension {
        SplitDimension::Language
    }

    fn split(&self, mut master: ModuleSplit) -> Partition {
        let table = master.resource_table.clone();
        let movable = |entry: &ResourceEntry, value: &ResourceValue| {
            !self.pinned.is_pinned(entry) && value_language(value).is_some()
        };

        let mut languages: BTreeSet<String> = table
            .iter()
            .flat_map(|t| t.entries.iter())
            .flat_map(|entry| entry.values.iter().filter(move |v| movable(entry, v)))
            .filter_map(value_language)
            .collect();

        let mut assets: BTreeMap<String, BTreeMap<String, ModuleEntry>> = BTreeMap::new();
        for (path, entry) in &master.entries {
            if let Some(language) = self.asset_language(path) {
                assets
                    .entry(language)
                    .or_default()
                    .insert(path.clone(), entry.clone());
            }
        }
        languages.extend(assets.keys().cloned());
        if languages.is_empty() {
            return Partition::unchanged(master);
        }

        let splits = languages
            .iter()
            .map(|language| {
                let split_table = table.as_ref().map(|t| {
                    t.filter(|entry, value| {
                        movable(entry, value) && value_language(value).as_ref() == Some(language)
                    })
                });
                let mut entries = split_table
                    .as_ref()
                    .map(|t| resource_files(&master.entries, t))
                    .unwrap_or_default();
                entries.extend(assets.remove(language).unwrap_or_default());
                let targeting = Targeting {
                    language: Some(ValueTargeting::among(language.clone(), &languages)),
                    ..Targeting::default()
                };
                master.config_split(targeting, entries, split_table)
            })
            .collect();

        master
            .entries
            .retain(|path, _| self.asset_language(path).is_none());
        if let Some(table) = &table {
            let master_table = table.filter(|entry, value| !movable(entry, value));
            retain_referenced_resources(&mut master.entries, Some(&master_table));
            master.resource_table = Some(master_table);
        }
        Partition { master, splits }
    }
}
