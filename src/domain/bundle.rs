//! App Bundle domain type
//!
//! An [`AppBundle`] is the in-memory form of an `.aab` archive: its modules,
//! its `BundleConfig.json` and the opaque files under `BUNDLE-METADATA/`.
//! Once constructed it is never mutated; transformations produce new values.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::config::{BUNDLE_CONFIG_PATH, BundleConfig};
use crate::domain::module::{BundleModule, ModuleName};
use crate::domain::targeting::Abi;
use crate::error::{Result, bundle};
use crate::resolver::{DependencyGraph, build_dependency_list, topological_sort};

pub const METADATA_DIRECTORY: &str = "BUNDLE-METADATA";

/// An Android App Bundle
#[derive(Debug, Clone)]
pub struct AppBundle {
    pub modules: BTreeMap<ModuleName, BundleModule>,
    pub config: BundleConfig,
    /// Files under `BUNDLE-METADATA/`, keyed by path relative to that directory
    pub metadata: BTreeMap<String, Arc<[u8]>>,
}

impl AppBundle {
    /// Assemble a bundle from already parsed modules
    pub fn new(
        modules: impl IntoIterator<Item = BundleModule>,
        config: BundleConfig,
        metadata: BTreeMap<String, Arc<[u8]>>,
    ) -> Result<Self> {
        let mut by_name = BTreeMap::new();
        for module in modules {
            let name = module.name.clone();
            if by_name.insert(name.clone(), module).is_some() {
                return Err(bundle::invalid(format!(
                    "Module '{name}' is present more than once in the bundle."
                )));
            }
        }
        Ok(Self {
            modules: by_name,
            config,
            metadata,
        })
    }

    /// Build a bundle from the flat list of archive entries
    ///
    /// Entries are grouped by their first path component: `BundleConfig.json`,
    /// `BUNDLE-METADATA/...` or `<module>/...`.
    pub fn from_entries(entries: BTreeMap<String, Arc<[u8]>>) -> Result<Self> {
        let mut config = None;
        let mut metadata = BTreeMap::new();
        let mut module_files: BTreeMap<String, BTreeMap<String, Arc<[u8]>>> = BTreeMap::new();

        for (path, content) in entries {
            if path == BUNDLE_CONFIG_PATH {
                let json = std::str::from_utf8(&content).map_err(|_| {
                    bundle::invalid(format!("'{BUNDLE_CONFIG_PATH}' is not valid UTF-8."))
                })?;
                config = Some(BundleConfig::from_json(json)?);
                continue;
            }
            let Some((top, rest)) = path.split_once('/') else {
                return Err(bundle::invalid(format!(
                    "Unexpected file '{path}' at the root of the bundle."
                )));
            };
            if rest.is_empty() {
                continue;
            }
            if top == METADATA_DIRECTORY {
                metadata.insert(rest.to_string(), content);
            } else {
                module_files
                    .entry(top.to_string())
                    .or_default()
                    .insert(rest.to_string(), content);
            }
        }

        let config = config.ok_or_else(|| {
            bundle::invalid(format!(
                "The bundle is missing the mandatory file '{BUNDLE_CONFIG_PATH}'."
            ))
        })?;

        let modules = module_files
            .into_iter()
            .map(|(name, files)| BundleModule::from_files(ModuleName::new(name)?, files))
            .collect::<Result<Vec<_>>>()?;

        Self::new(modules, config, metadata)
    }

    /// Flatten the bundle back into archive entries
    pub fn to_entries(&self) -> Result<BTreeMap<String, Arc<[u8]>>> {
        let mut entries: BTreeMap<String, Arc<[u8]>> = BTreeMap::new();
        entries.insert(
            BUNDLE_CONFIG_PATH.to_string(),
            Arc::from(self.config.to_json()?.into_bytes()),
        );
        for (path, content) in &self.metadata {
            entries.insert(format!("{METADATA_DIRECTORY}/{path}"), Arc::clone(content));
        }
        for module in self.modules.values() {
            for (path, content) in module.to_files()? {
                entries.insert(format!("{}/{path}", module.name), content);
            }
        }
        Ok(entries)
    }

    pub fn base_module(&self) -> Result<&BundleModule> {
        self.modules
            .get(&ModuleName::base())
            .ok_or_else(|| bundle::invalid("The bundle does not contain a 'base' module."))
    }

    pub fn module(&self, name: &str) -> Option<&BundleModule> {
        self.modules.values().find(|m| m.name.as_str() == name)
    }

    pub fn package_name(&self) -> Result<&str> {
        Ok(&self.base_module()?.manifest.package)
    }

    /// Minimum SDK version declared by the base module
    pub fn min_sdk(&self) -> Result<u32> {
        Ok(self.base_module()?.manifest.min_sdk)
    }

    /// Maximum SDK version declared by the base module, if any
    pub fn max_sdk(&self) -> Result<Option<u32>> {
        Ok(self.base_module()?.manifest.max_sdk)
    }

    /// ABIs of native libraries over all modules
    pub fn native_abis(&self) -> BTreeSet<Abi> {
        self.modules
            .values()
            .flat_map(BundleModule::native_abis)
            .collect()
    }

    pub fn has_native_libraries(&self) -> bool {
        self.modules.values().any(BundleModule::has_native_libraries)
    }

    pub fn has_dex(&self) -> bool {
        self.modules.values().any(BundleModule::has_dex)
    }

    pub fn dependency_graph(&self) -> DependencyGraph {
        build_dependency_list(&self.modules)
    }

    /// Modules ordered so that dependencies come before their dependents
    pub fn modules_in_dependency_order(&self) -> Result<Vec<&BundleModule>> {
        let order = topological_sort(&self.dependency_graph())?;
        Ok(order.iter().filter_map(|name| self.module(name)).collect())
    }

    /// Modules merged into standalone and universal APKs
    pub fn fused_modules(&self) -> Vec<&BundleModule> {
        self.modules
            .values()
            .filter(|m| m.is_fused() && m.is_install_time())
            .collect()
    }
}
