//! Test fixtures for building in-memory bundles.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_fixtures::{BundleFixture, ModuleFixture};
//!
//! let bundle = BundleFixture::new()
//!     .base(|m| m.file("lib/x86/libfoo.so", b"so"))
//!     .module("camera", ModuleFixture::new().on_demand())
//!     .build();
//! ```

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

use crate::config::{BUNDLE_CONFIG_PATH, BundleConfig};
use crate::domain::bundle::AppBundle;
use crate::domain::module::{MANIFEST_PATH, RESOURCE_TABLE_PATH};
use crate::domain::resource::{
    ResourceEntry, ResourceId, ResourceItem, ResourceTable, ResourceValue,
};

pub const PACKAGE: &str = "com.example.app";

/// One module of a [`BundleFixture`]
#[derive(Debug, Clone, Default)]
pub struct ModuleFixture {
    min_sdk: Option<u32>,
    max_sdk: Option<u32>,
    on_demand: bool,
    instant: bool,
    fusing: Option<bool>,
    uses_splits: Vec<String>,
    icon: Option<String>,
    files: BTreeMap<String, Vec<u8>>,
    resource_table: Option<ResourceTable>,
}

impl ModuleFixture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn min_sdk(mut self, sdk: u32) -> Self {
        self.min_sdk = Some(sdk);
        self
    }

    #[must_use]
    pub fn max_sdk(mut self, sdk: u32) -> Self {
        self.max_sdk = Some(sdk);
        self
    }

    #[must_use]
    pub fn on_demand(mut self) -> Self {
        self.on_demand = true;
        self
    }

    #[must_use]
    pub fn instant(mut self) -> Self {
        self.instant = true;
        self
    }

    #[must_use]
    pub fn fusing(mut self, include: bool) -> Self {
        self.fusing = Some(include);
        self
    }

    #[must_use]
    pub fn uses_split(mut self, module: &str) -> Self {
        self.uses_splits.push(module.to_string());
        self
    }

    /// `type/name` reference used as the application icon
    #[must_use]
    pub fn icon(mut self, reference: &str) -> Self {
        self.icon = Some(reference.to_string());
        self
    }

    #[must_use]
    pub fn file(mut self, path: &str, content: &[u8]) -> Self {
        self.files.insert(path.to_string(), content.to_vec());
        self
    }

    /// Adds the resource table and a file for every file-based value
    #[must_use]
    pub fn resources(mut self, table: ResourceTable) -> Self {
        for file in table.referenced_files() {
            let content = format!("content of {file}").into_bytes();
            self.files.entry(file).or_insert(content);
        }
        self.resource_table = Some(table);
        self
    }

    pub fn manifest_xml(&self) -> String {
        let mut xml = format!(
            r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android" xmlns:dist="http://schemas.android.com/apk/distribution" package="{PACKAGE}">"#
        );
        let mut uses_sdk = String::new();
        if let Some(min) = self.min_sdk {
            let _ = write!(uses_sdk, r#" android:minSdkVersion="{min}""#);
        }
        if let Some(max) = self.max_sdk {
            let _ = write!(uses_sdk, r#" android:maxSdkVersion="{max}""#);
        }
        if !uses_sdk.is_empty() {
            let _ = write!(xml, "<uses-sdk{uses_sdk}/>");
        }
        let _ = write!(
            xml,
            r#"<dist:module dist:instant="{}"><dist:delivery>{}</dist:delivery>"#,
            self.instant,
            if self.on_demand {
                "<dist:on-demand/>"
            } else {
                "<dist:install-time/>"
            }
        );
        if let Some(include) = self.fusing {
            let _ = write!(xml, r#"<dist:fusing dist:include="{include}"/>"#);
        }
        xml.push_str("</dist:module>");
        for dependency in &self.uses_splits {
            let _ = write!(xml, r#"<uses-split android:name="{dependency}"/>"#);
        }
        match &self.icon {
            Some(icon) => {
                let _ = write!(xml, r#"<application android:icon="@{icon}"/>"#);
            }
            None => xml.push_str("<application/>"),
        }
        xml.push_str("</manifest>");
        xml
    }

    /// Module-relative files, including the manifest and resource table
    pub fn files(&self) -> BTreeMap<String, Arc<[u8]>> {
        let mut files: BTreeMap<String, Arc<[u8]>> = self
            .files
            .iter()
            .map(|(path, content)| (path.clone(), Arc::from(content.as_slice())))
            .collect();
        files.insert(
            MANIFEST_PATH.to_string(),
            Arc::from(self.manifest_xml().into_bytes()),
        );
        if let Some(table) = &self.resource_table {
            let json = serde_json::to_vec(table).expect("resource table serializes");
            files.insert(RESOURCE_TABLE_PATH.to_string(), Arc::from(json));
        }
        files
    }

    fn entries(&self, name: &str) -> BTreeMap<String, Arc<[u8]>> {
        self.files()
            .into_iter()
            .map(|(path, content)| (format!("{name}/{path}"), content))
            .collect()
    }
}

/// In-memory bundle builder
#[derive(Debug, Clone)]
pub struct BundleFixture {
    config: BundleConfig,
    modules: BTreeMap<String, ModuleFixture>,
    metadata: BTreeMap<String, Vec<u8>>,
}

impl Default for BundleFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl BundleFixture {
    /// A bundle with a `base` module holding one dex file, min SDK 21
    #[must_use]
    pub fn new() -> Self {
        let base = ModuleFixture::new()
            .min_sdk(21)
            .file("dex/classes.dex", b"dex");
        Self {
            config: BundleConfig::default(),
            modules: BTreeMap::from([("base".to_string(), base)]),
            metadata: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn config(mut self, config: BundleConfig) -> Self {
        self.config = config;
        self
    }

    /// Modify the base module
    #[must_use]
    pub fn base(mut self, change: impl FnOnce(ModuleFixture) -> ModuleFixture) -> Self {
        let base = self.modules.remove("base").unwrap_or_default();
        self.modules.insert("base".to_string(), change(base));
        self
    }

    #[must_use]
    pub fn module(mut self, name: &str, module: ModuleFixture) -> Self {
        self.modules.insert(name.to_string(), module);
        self
    }

    #[must_use]
    pub fn metadata(mut self, path: &str, content: &[u8]) -> Self {
        self.metadata.insert(path.to_string(), content.to_vec());
        self
    }

    /// Archive entries of the bundle
    pub fn entries(&self) -> BTreeMap<String, Arc<[u8]>> {
        let mut entries = BTreeMap::new();
        let config = self.config.to_json().expect("bundle config serializes");
        entries.insert(
            BUNDLE_CONFIG_PATH.to_string(),
            Arc::from(config.into_bytes()),
        );
        for (path, content) in &self.metadata {
            entries.insert(
                format!("BUNDLE-METADATA/{path}"),
                Arc::from(content.as_slice()),
            );
        }
        for (name, module) in &self.modules {
            entries.extend(module.entries(name));
        }
        entries
    }

    /// # Panics
    ///
    /// Panics if the fixture does not describe a parsable bundle.
    pub fn build(&self) -> AppBundle {
        AppBundle::from_entries(self.entries()).expect("fixture bundle parses")
    }
}

/// Resource entry whose values are files, given as `(config, file)` pairs
pub fn file_entry(id: u32, type_name: &str, name: &str, values: &[(&str, &str)]) -> ResourceEntry {
    ResourceEntry {
        id: ResourceId(id),
        type_name: type_name.to_string(),
        name: name.to_string(),
        values: values
            .iter()
            .map(|(config, file)| ResourceValue {
                config: (*config).to_string(),
                item: ResourceItem::File {
                    file: (*file).to_string(),
                },
            })
            .collect(),
    }
}

/// Resource entry with inline values, given as `(config, text)` pairs
pub fn text_entry(id: u32, type_name: &str, name: &str, values: &[(&str, &str)]) -> ResourceEntry {
    ResourceEntry {
        id: ResourceId(id),
        type_name: type_name.to_string(),
        name: name.to_string(),
        values: values
            .iter()
            .map(|(config, text)| ResourceValue {
                config: (*config).to_string(),
                item: ResourceItem::Text {
                    text: (*text).to_string(),
                },
            })
            .collect(),
    }
}

pub fn resource_table(entries: Vec<ResourceEntry>) -> ResourceTable {
    ResourceTable {
        package: PACKAGE.to_string(),
        entries,
    }
}

/// Drawable `icon` with ldpi and hdpi variants and no default
pub fn ldpi_hdpi_icon() -> ResourceTable {
    resource_table(vec![file_entry(
        0x7f01_0001,
        "drawable",
        "icon",
        &[
            ("ldpi", "res/drawable-ldpi/icon.png"),
            ("hdpi", "res/drawable-hdpi/icon.png"),
        ],
    )])
}
