//! APK Set table of contents
//!
//! `toc.json` at the root of an APK Set describes every generated APK:
//! variants (keyed by SDK/ABI/density targeting), one APK set per module
//! inside each variant, and the path, targeting and digest of each APK.

use serde::{Deserialize, Serialize};

use crate::config::bundle::BundletoolInfo;
use crate::domain::manifest::Delivery;
use crate::domain::module::{BASE_MODULE_NAME, BundleModule};
use crate::domain::split::SplitType;
use crate::domain::targeting::{Targeting, TextureCompressionFormat};
use crate::error::Result;

pub const TOC_PATH: &str = "toc.json";

/// Table of contents of an APK Set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildApksResult {
    #[serde(default)]
    pub bundletool: BundletoolInfo,
    pub package_name: String,
    #[serde(default)]
    pub variants: Vec<Variant>,
    /// Texture format served to devices supporting none of the offered ones
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_texture_format: Option<TextureCompressionFormat>,
}

/// APKs for one slice of the device space
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub number: u32,
    #[serde(default)]
    pub targeting: Targeting,
    #[serde(default)]
    pub apk_sets: Vec<ApkSet>,
}

/// APKs of one module within a variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApkSet {
    pub module: ModuleMetadata,
    #[serde(default)]
    pub apks: Vec<ApkDescription>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleMetadata {
    pub name: String,
    pub delivery: Delivery,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub instant: bool,
}

/// One APK file of the set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApkDescription {
    /// Path inside the APK Set, e.g. `splits/base-master.apk`
    pub path: String,
    #[serde(default)]
    pub targeting: Targeting,
    pub kind: SplitType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_id: Option<String>,
    #[serde(default)]
    pub is_master: bool,
    /// `blake3:<hex>` digest of the APK bytes
    pub digest: String,
    pub size: u64,
}

impl BuildApksResult {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn variant(&self, number: u32) -> Option<&Variant> {
        self.variants.iter().find(|v| v.number == number)
    }

    /// Every APK of every variant, in table order
    pub fn apks(&self) -> impl Iterator<Item = &ApkDescription> {
        self.variants
            .iter()
            .flat_map(|v| v.apk_sets.iter())
            .flat_map(|set| set.apks.iter())
    }
}

impl From<&BundleModule> for ModuleMetadata {
    fn from(module: &BundleModule) -> Self {
        Self {
            name: module.name.to_string(),
            delivery: module.delivery(),
            dependencies: module.dependencies().to_vec(),
            instant: module.manifest.instant,
        }
    }
}

impl ModuleMetadata {
    pub fn is_install_time(&self) -> bool {
        self.name == BASE_MODULE_NAME || self.delivery == Delivery::InstallTime
    }
}

impl Variant {
    pub fn apk_set(&self, module: &str) -> Option<&ApkSet> {
        self.apk_sets.iter().find(|set| set.module.name == module)
    }
}
