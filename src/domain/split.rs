//! Generated APK units
//!
//! A [`ModuleSplit`] is everything needed to serialize one APK: its entries,
//! its slice of the resource table, the manifest it is rendered from and the
//! targeting that decides which devices receive it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::manifest::{AndroidManifest, ApkManifestAttributes};
use crate::domain::module::{BundleModule, ModuleEntry, ModuleName};
use crate::domain::resource::ResourceTable;
use crate::domain::targeting::Targeting;

/// Suffix of the split serving devices that support none of the texture formats
pub const OTHER_TEXTURE_SUFFIX: &str = "other_tcf";

/// Kind of APK a split becomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitType {
    /// Split APK for devices that support split installs
    Split,
    /// Self-contained APK for pre-L devices
    Standalone,
    /// Single APK holding every configuration
    Universal,
    /// Split APK served as an instant app
    Instant,
    /// Fused APK preinstalled on a system image
    System,
}

/// A generated partial APK
#[derive(Debug, Clone)]
pub struct ModuleSplit {
    pub module: ModuleName,
    pub split_type: SplitType,
    pub is_master: bool,
    pub apk_targeting: Targeting,
    pub variant_targeting: Targeting,
    /// Entries keyed by module-relative path
    pub entries: BTreeMap<String, ModuleEntry>,
    pub resource_table: Option<ResourceTable>,
    pub manifest: AndroidManifest,
    /// Native libraries are stored uncompressed and loaded in place
    pub native_libs_uncompressed: bool,
}

impl ModuleSplit {
    /// Master split holding the whole module
    pub fn master_of(module: &BundleModule, split_type: SplitType) -> Self {
        Self {
            module: module.name.clone(),
            split_type,
            is_master: true,
            apk_targeting: Targeting::default(),
            variant_targeting: Targeting::default(),
            entries: module.entries.clone(),
            resource_table: module.resource_table.clone(),
            manifest: module.manifest.clone(),
            native_libs_uncompressed: false,
        }
    }

    /// Config split of the same module with the given entries and table
    pub fn config_split(
        &self,
        apk_targeting: Targeting,
        entries: BTreeMap<String, ModuleEntry>,
        resource_table: Option<ResourceTable>,
    ) -> Self {
        Self {
            module: self.module.clone(),
            split_type: self.split_type,
            is_master: false,
            apk_targeting,
            variant_targeting: self.variant_targeting.clone(),
            entries,
            resource_table: resource_table.filter(|t| !t.is_empty()),
            manifest: self.manifest.clone(),
            native_libs_uncompressed: self.native_libs_uncompressed,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.resource_table.as_ref().is_none_or(ResourceTable::is_empty)
    }

    /// Name fragment describing the targeted configuration
    ///
    /// `master` for master splits, otherwise the targeted values in dimension
    /// order joined with `_`, e.g. `arm64_v8a`, `xhdpi`, `fr`, `astc`.
    pub fn suffix(&self) -> String {
        if self.is_master && self.apk_targeting.dimensions().is_empty() {
            return "master".to_string();
        }
        let mut parts = Vec::new();
        if let Some(abi) = &self.apk_targeting.abi {
            parts.extend(abi.values.iter().map(|a| a.split_suffix()));
        }
        if let Some(density) = &self.apk_targeting.screen_density {
            parts.extend(density.values.iter().map(|d| d.as_str().to_string()));
        }
        if let Some(language) = &self.apk_targeting.language {
            parts.extend(language.values.iter().cloned());
        }
        if let Some(texture) = &self.apk_targeting.texture_compression_format {
            if texture.values.is_empty() {
                parts.push(OTHER_TEXTURE_SUFFIX.to_string());
            }
            parts.extend(texture.values.iter().map(|t| t.as_str().to_string()));
        }
        if parts.is_empty() {
            "master".to_string()
        } else {
            parts.join("_")
        }
    }

    /// Value of the manifest `split` attribute
    ///
    /// The base master has none; a feature master is named after its module;
    /// config splits are `config.<suffix>` (base) or `<module>.config.<suffix>`.
    pub fn split_id(&self) -> Option<String> {
        if !matches!(self.split_type, SplitType::Split | SplitType::Instant) {
            return None;
        }
        match (self.is_master, self.module.is_base()) {
            (true, true) => None,
            (true, false) => Some(self.module.to_string()),
            (false, true) => Some(format!("config.{}", self.suffix())),
            (false, false) => Some(format!("{}.config.{}", self.module, self.suffix())),
        }
    }

    /// Split-specific manifest attributes
    pub fn manifest_attributes(&self) -> ApkManifestAttributes {
        let is_split = matches!(self.split_type, SplitType::Split | SplitType::Instant);
        let has_native = self.entries.keys().any(|p| p.starts_with("lib/"));
        ApkManifestAttributes {
            split_id: self.split_id(),
            config_for_split: (is_split && !self.is_master && !self.module.is_base())
                .then(|| self.module.to_string()),
            is_feature_split: is_split && self.is_master && !self.module.is_base(),
            extract_native_libs: (has_native && self.native_libs_uncompressed).then_some(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::targeting::{Abi, DensityBucket, ValueTargeting};

    fn split(module: &str, is_master: bool, targeting: Targeting) -> ModuleSplit {
        ModuleSplit {
            module: ModuleName::new(module).unwrap(),
            split_type: SplitType::Split,
            is_master,
            apk_targeting: targeting,
            variant_targeting: Targeting::default(),
            entries: BTreeMap::new(),
            resource_table: None,
            manifest: AndroidManifest::default(),
            native_libs_uncompressed: false,
        }
    }

    #[test]
    fn test_master_suffix_and_split_id() {
        let base = split("base", true, Targeting::default());
        assert_eq!(base.suffix(), "master");
        assert_eq!(base.split_id(), None);

        let feature = split("camera", true, Targeting::default());
        assert_eq!(feature.split_id().as_deref(), Some("camera"));
        assert!(feature.manifest_attributes().is_feature_split);
    }

    #[test]
    fn test_config_split_naming() {
        let base = split("base", false, Targeting::abi(Abi::Arm64V8a));
        assert_eq!(base.suffix(), "arm64_v8a");
        assert_eq!(base.split_id().as_deref(), Some("config.arm64_v8a"));

        let feature = split("camera", false, Targeting::language("fr"));
        assert_eq!(feature.split_id().as_deref(), Some("camera.config.fr"));
        assert_eq!(
            feature.manifest_attributes().config_for_split.as_deref(),
            Some("camera")
        );
    }

    #[test]
    fn test_combined_suffix_follows_dimension_order() {
        let targeting = Targeting {
            screen_density: Some(ValueTargeting::single(DensityBucket::Hdpi)),
            ..Targeting::abi(Abi::X86)
        };
        let standalone = ModuleSplit {
            split_type: SplitType::Standalone,
            ..split("base", true, targeting)
        };
        assert_eq!(standalone.suffix(), "x86_hdpi");
        assert_eq!(standalone.split_id(), None);
    }

    #[test]
    fn test_empty_split() {
        assert!(split("base", false, Targeting::default()).is_empty());
    }
}
