//! Bundle module model
//!
//! A module is a named slice of the app (`base` or a feature) with its own
//! manifest, optional resource table, code, assets and native libraries.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::manifest::{AndroidManifest, Delivery};
use crate::domain::resource::ResourceTable;
use crate::domain::targeting::{Abi, Targeting, ValueTargeting, parse_path_targeting};
use crate::error::{Result, bundle};

pub const BASE_MODULE_NAME: &str = "base";
pub const MANIFEST_PATH: &str = "manifest/AndroidManifest.xml";
pub const RESOURCE_TABLE_PATH: &str = "resources.json";
pub const NATIVE_CONFIG_PATH: &str = "native.json";
pub const ASSETS_CONFIG_PATH: &str = "assets.json";

/// Validated module name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleName(String);

impl ModuleName {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let valid = !name.is_empty()
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            && name.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
        if !valid {
            return Err(bundle::invalid(format!(
                "Module names must start with a letter and contain only letters, digits and \
                 underscores, found '{name}'."
            )));
        }
        Ok(Self(name))
    }

    pub fn base() -> Self {
        Self(BASE_MODULE_NAME.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_base(&self) -> bool {
        self.0 == BASE_MODULE_NAME
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One file of a module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleEntry {
    /// Path relative to the module root, e.g. `lib/x86/libfoo.so`
    pub path: String,
    pub content: Arc<[u8]>,
    /// Always stored without compression in generated APKs
    pub force_uncompressed: bool,
}

impl ModuleEntry {
    pub fn new(path: impl Into<String>, content: impl Into<Arc<[u8]>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            force_uncompressed: false,
        }
    }

    pub fn kind(&self) -> Option<EntryKind> {
        EntryKind::of(&self.path)
    }

    /// Copy of this entry stored under another path
    #[must_use]
    pub fn moved_to(&self, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..self.clone()
        }
    }
}

/// Top-level directory an entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Dex,
    Resource,
    Asset,
    NativeLibrary,
    Root,
}

impl EntryKind {
    pub fn of(path: &str) -> Option<EntryKind> {
        let (dir, _) = path.split_once('/')?;
        match dir {
            "dex" => Some(EntryKind::Dex),
            "res" => Some(EntryKind::Resource),
            "assets" => Some(EntryKind::Asset),
            "lib" => Some(EntryKind::NativeLibrary),
            "root" => Some(EntryKind::Root),
            _ => None,
        }
    }
}

/// Maps a module-relative path to the path it gets inside an APK
pub fn apk_path(module_path: &str) -> Option<String> {
    match EntryKind::of(module_path)? {
        EntryKind::Dex => module_path.strip_prefix("dex/").map(str::to_string),
        EntryKind::Root => module_path.strip_prefix("root/").map(str::to_string),
        EntryKind::Resource | EntryKind::Asset | EntryKind::NativeLibrary => {
            Some(module_path.to_string())
        }
    }
}

/// ABI of a `lib/<abi>/...` path
pub fn abi_of_path(path: &str) -> Option<Abi> {
    let rest = path.strip_prefix("lib/")?;
    let (dir, _) = rest.split_once('/')?;
    Abi::from_name(dir)
}

/// Targeting attached to one directory of the module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetedDirectory {
    pub path: String,
    pub targeting: Targeting,
}

/// Contents of `native.json` / `assets.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryTargetingConfig {
    #[serde(default)]
    pub directory: Vec<TargetedDirectory>,
}

impl DirectoryTargetingConfig {
    /// Targeting of the directory that directly contains `path`
    pub fn targeting_of(&self, path: &str) -> Option<&Targeting> {
        let parent = path.rsplit_once('/').map(|(dir, _)| dir)?;
        self.directory
            .iter()
            .find(|d| d.path == parent)
            .map(|d| &d.targeting)
    }
}

/// A module of an App Bundle
#[derive(Debug, Clone)]
pub struct BundleModule {
    pub name: ModuleName,
    pub manifest: AndroidManifest,
    pub resource_table: Option<ResourceTable>,
    pub native_config: Option<DirectoryTargetingConfig>,
    pub assets_config: Option<DirectoryTargetingConfig>,
    /// Content entries keyed by module-relative path
    pub entries: BTreeMap<String, ModuleEntry>,
    /// Manifest and metadata files exactly as read
    pub source_files: BTreeMap<String, Arc<[u8]>>,
}

fn utf8<'a>(module: &ModuleName, path: &str, bytes: &'a [u8]) -> Result<&'a str> {
    std::str::from_utf8(bytes).map_err(|_| {
        bundle::invalid(format!(
            "File '{path}' of module '{module}' is not valid UTF-8."
        ))
    })
}

fn parse_json<T: serde::de::DeserializeOwned>(
    module: &ModuleName,
    path: &str,
    bytes: &[u8],
) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| {
        bundle::invalid(format!(
            "Could not parse '{path}' of module '{module}': {e}"
        ))
    })
}

fn is_metadata_file(path: &str) -> bool {
    matches!(
        path,
        MANIFEST_PATH | RESOURCE_TABLE_PATH | NATIVE_CONFIG_PATH | ASSETS_CONFIG_PATH
    )
}

impl BundleModule {
    /// Build a module from its files (paths relative to the module root)
    pub fn from_files(name: ModuleName, files: BTreeMap<String, Arc<[u8]>>) -> Result<Self> {
        let mut manifest = None;
        let mut resource_table = None;
        let mut native_config = None;
        let mut assets_config = None;
        let mut entries = BTreeMap::new();
        let mut source_files = BTreeMap::new();

        for (path, content) in files {
            if is_metadata_file(&path) {
                source_files.insert(path.clone(), Arc::clone(&content));
            }
            match path.as_str() {
                MANIFEST_PATH => {
                    let xml = utf8(&name, &path, &content)?;
                    manifest = Some(AndroidManifest::parse(xml)?);
                }
                RESOURCE_TABLE_PATH => {
                    resource_table = Some(parse_json(&name, &path, &content)?);
                }
                NATIVE_CONFIG_PATH => native_config = Some(parse_json(&name, &path, &content)?),
                ASSETS_CONFIG_PATH => assets_config = Some(parse_json(&name, &path, &content)?),
                _ => {
                    entries.insert(path.clone(), ModuleEntry::new(path, content));
                }
            }
        }

        let manifest = manifest.ok_or_else(|| {
            bundle::invalid(format!(
                "Module '{name}' is missing mandatory file '{MANIFEST_PATH}'."
            ))
        })?;

        let mut module = Self {
            name,
            manifest,
            resource_table,
            native_config,
            assets_config,
            entries,
            source_files,
        };
        if module.native_config.is_none() {
            module.native_config = module.derive_native_config();
        }
        if module.assets_config.is_none() {
            module.assets_config = module.derive_assets_config();
        }
        Ok(module)
    }

    fn derive_native_config(&self) -> Option<DirectoryTargetingConfig> {
        let abis: BTreeSet<Abi> = self.entries.keys().filter_map(|p| abi_of_path(p)).collect();
        if abis.is_empty() {
            return None;
        }
        let directory = abis
            .into_iter()
            .map(|abi| TargetedDirectory {
                path: format!("lib/{abi}"),
                targeting: Targeting::abi(abi),
            })
            .collect();
        Some(DirectoryTargetingConfig { directory })
    }

    fn derive_assets_config(&self) -> Option<DirectoryTargetingConfig> {
        let dirs: BTreeSet<&str> = self
            .entries
            .keys()
            .filter(|p| p.starts_with("assets/"))
            .filter_map(|p| p.rsplit_once('/').map(|(dir, _)| dir))
            .collect();
        let directory: Vec<TargetedDirectory> = dirs
            .into_iter()
            .filter_map(|dir| {
                let (_, targeting) = parse_path_targeting(dir);
                (!targeting.is_empty()).then(|| TargetedDirectory {
                    path: dir.to_string(),
                    targeting,
                })
            })
            .collect();
        (!directory.is_empty()).then_some(DirectoryTargetingConfig { directory })
    }

    /// Files of the module as stored in a bundle, metadata included
    pub fn to_files(&self) -> Result<BTreeMap<String, Arc<[u8]>>> {
        let mut files = self.source_files.clone();
        if !files.contains_key(MANIFEST_PATH) {
            return Err(bundle::invalid(format!(
                "Module '{}' has no source manifest.",
                self.name
            )));
        }
        for (path, entry) in &self.entries {
            files.insert(path.clone(), Arc::clone(&entry.content));
        }
        Ok(files)
    }

    pub fn is_base(&self) -> bool {
        self.name.is_base()
    }

    pub fn delivery(&self) -> Delivery {
        self.manifest.delivery
    }

    /// Whether the module is merged into standalone and universal APKs
    pub fn is_fused(&self) -> bool {
        self.is_base() || self.manifest.fusing_include == Some(true)
    }

    pub fn is_install_time(&self) -> bool {
        self.is_base() || self.manifest.delivery == Delivery::InstallTime
    }

    pub fn dependencies(&self) -> &[String] {
        &self.manifest.uses_splits
    }

    /// ABIs declared by the native configuration
    pub fn native_abis(&self) -> BTreeSet<Abi> {
        self.native_config
            .iter()
            .flat_map(|c| c.directory.iter())
            .filter_map(|d| d.targeting.abi.as_ref())
            .flat_map(|t: &ValueTargeting<Abi>| t.values.iter().copied())
            .collect()
    }

    pub fn has_native_libraries(&self) -> bool {
        self.entries.keys().any(|p| p.starts_with("lib/"))
    }

    pub fn has_dex(&self) -> bool {
        self.entries.keys().any(|p| p.starts_with("dex/"))
    }

    /// Targeting of the asset directory containing `path`
    pub fn asset_targeting(&self, path: &str) -> Option<&Targeting> {
        self.assets_config.as_ref()?.targeting_of(path)
    }
}
