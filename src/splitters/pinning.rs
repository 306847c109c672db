//! Resources kept in master splits
//!
//! Resources listed in `master_resources` and the resources the manifest
//! needs at install time (application icon and label) keep every value in the
//! master split, whatever the configuration.

use std::collections::BTreeSet;

use crate::config::BundleConfig;
use crate::domain::manifest::AndroidManifest;
use crate::domain::resource::{ResourceEntry, ResourceId};

#[derive(Debug, Clone, Default)]
pub struct PinnedResources {
    ids: BTreeSet<ResourceId>,
    names: BTreeSet<String>,
}

impl PinnedResources {
    pub fn new(config: &BundleConfig, manifest: &AndroidManifest) -> Self {
        let ids = config.master_resources.resource_ids.iter().copied().collect();
        let names = config
            .master_resources
            .resource_names
            .iter()
            .cloned()
            .chain(manifest.referenced_resources().into_iter().map(str::to_string))
            .collect();
        Self { ids, names }
    }

    pub fn is_pinned(&self, entry: &ResourceEntry) -> bool {
        self.ids.contains(&entry.id) || self.names.contains(&entry.qualified_name())
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty() && self.names.is_empty()
    }
}
