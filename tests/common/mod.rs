//! Common test utilities for bundletool integration tests

use std::fmt::Write as _;
use std::path::PathBuf;

use bundletool::io::zip::{ZipEntry, write_archive_bytes};
use tempfile::TempDir;

pub const PACKAGE: &str = "com.example.app";

/// Drawable `icon` with a default, an ldpi and an xhdpi value
#[allow(dead_code)]
pub const ICON_RESOURCES: &str = r#"{
  "package": "com.example.app",
  "entries": [
    {
      "id": 2130771969,
      "type": "drawable",
      "name": "icon",
      "values": [
        {"config": "", "file": "res/drawable/icon.png"},
        {"config": "ldpi", "file": "res/drawable-ldpi/icon.png"},
        {"config": "xhdpi", "file": "res/drawable-xhdpi/icon.png"}
      ]
    }
  ]
}"#;

/// A test workspace for integration tests
#[allow(dead_code)]
pub struct TestWorkspace {
    /// Temporary directory
    pub temp: TempDir,
    /// Path to workspace root
    pub path: PathBuf,
}

#[allow(dead_code)]
impl TestWorkspace {
    /// Create a new test workspace
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        Self { temp, path }
    }

    /// Absolute path of a workspace-relative path
    pub fn path_of(&self, path: &str) -> PathBuf {
        self.path.join(path)
    }

    /// Write a file in workspace
    pub fn write_file(&self, path: &str, content: &[u8]) -> PathBuf {
        let file_path = self.path.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    /// Read a file from workspace
    pub fn read_file(&self, path: &str) -> Vec<u8> {
        std::fs::read(self.path.join(path)).expect("Failed to read file")
    }

    /// Check if a file exists in workspace
    pub fn file_exists(&self, path: &str) -> bool {
        self.path.join(path).exists()
    }

    /// Write a device spec JSON file
    pub fn write_device_spec(&self, name: &str, json: &str) -> PathBuf {
        self.write_file(name, json.as_bytes())
    }

    /// Write `bundle` as an `.aab` archive
    pub fn write_bundle(&self, name: &str, bundle: &TestBundle) -> PathBuf {
        self.write_file(name, &bundle.zip_bytes(false))
    }

    /// Write `module` as a module directory named `name`
    pub fn write_module_dir(&self, name: &str, module: &TestModule) -> PathBuf {
        for (path, content) in module.files() {
            self.write_file(&format!("{name}/{path}"), &content);
        }
        self.path.join(name)
    }

    /// Write `module` as a module zip named `<name>.zip`
    pub fn write_module_zip(&self, name: &str, module: &TestModule) -> PathBuf {
        let entries: Vec<ZipEntry> = module
            .files()
            .into_iter()
            .map(|(path, content)| ZipEntry::new(path, content, true))
            .collect();
        let bytes = write_archive_bytes(&entries).expect("Failed to write module zip");
        self.write_file(&format!("{name}.zip"), &bytes)
    }

    /// Get path to bundletool binary
    pub fn bundletool_bin() -> PathBuf {
        PathBuf::from(env!("CARGO_BIN_EXE_bundletool"))
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// One module of a [`TestBundle`]
#[derive(Debug, Clone, Default)]
pub struct TestModule {
    min_sdk: Option<u32>,
    max_sdk: Option<u32>,
    on_demand: bool,
    instant: bool,
    uses_splits: Vec<String>,
    files: Vec<(String, Vec<u8>)>,
}

#[allow(dead_code)]
impl TestModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_sdk(mut self, sdk: u32) -> Self {
        self.min_sdk = Some(sdk);
        self
    }

    pub fn max_sdk(mut self, sdk: u32) -> Self {
        self.max_sdk = Some(sdk);
        self
    }

    pub fn on_demand(mut self) -> Self {
        self.on_demand = true;
        self
    }

    pub fn instant(mut self) -> Self {
        self.instant = true;
        self
    }

    pub fn uses_split(mut self, module: &str) -> Self {
        self.uses_splits.push(module.to_string());
        self
    }

    pub fn file(mut self, path: &str, content: &[u8]) -> Self {
        self.files.push((path.to_string(), content.to_vec()));
        self
    }

    /// Adds `resources.json` and a file for every value of [`ICON_RESOURCES`]
    pub fn icon_resources(self) -> Self {
        self.file("resources.json", ICON_RESOURCES.as_bytes())
            .file("res/drawable/icon.png", b"default icon")
            .file("res/drawable-ldpi/icon.png", b"ldpi icon")
            .file("res/drawable-xhdpi/icon.png", b"xhdpi icon")
    }

    pub fn manifest_xml(&self) -> String {
        let mut xml = format!(
            r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android" xmlns:dist="http://schemas.android.com/apk/distribution" package="{PACKAGE}">"#
        );
        let min = self.min_sdk.map(|v| format!(r#" android:minSdkVersion="{v}""#));
        let max = self.max_sdk.map(|v| format!(r#" android:maxSdkVersion="{v}""#));
        if min.is_some() || max.is_some() {
            let _ = write!(
                xml,
                "<uses-sdk{}{}/>",
                min.unwrap_or_default(),
                max.unwrap_or_default()
            );
        }
        let delivery = if self.on_demand {
            "<dist:on-demand/>"
        } else {
            "<dist:install-time/>"
        };
        let _ = write!(
            xml,
            r#"<dist:module dist:instant="{}"><dist:delivery>{delivery}</dist:delivery></dist:module>"#,
            self.instant
        );
        for dependency in &self.uses_splits {
            let _ = write!(xml, r#"<uses-split android:name="{dependency}"/>"#);
        }
        xml.push_str("<application/></manifest>");
        xml
    }

    /// Module-relative files, manifest first
    pub fn files(&self) -> Vec<(String, Vec<u8>)> {
        let mut files = vec![(
            "manifest/AndroidManifest.xml".to_string(),
            self.manifest_xml().into_bytes(),
        )];
        files.extend(self.files.iter().cloned());
        files
    }
}

/// Bundle written straight to a zip, without going through the library model
#[derive(Debug, Clone)]
pub struct TestBundle {
    config: String,
    modules: Vec<(String, TestModule)>,
}

impl Default for TestBundle {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
impl TestBundle {
    /// A bundle with a `base` module holding one dex file, min SDK 21
    pub fn new() -> Self {
        Self {
            config: "{}".to_string(),
            modules: vec![(
                "base".to_string(),
                TestModule::new().min_sdk(21).file("dex/classes.dex", b"dex"),
            )],
        }
    }

    /// `BundleConfig.json` contents
    pub fn config(mut self, json: &str) -> Self {
        self.config = json.to_string();
        self
    }

    /// Modify the base module
    pub fn base(mut self, change: impl FnOnce(TestModule) -> TestModule) -> Self {
        if let Some((_, base)) = self.modules.iter_mut().find(|(name, _)| name == "base") {
            *base = change(std::mem::take(base));
        }
        self
    }

    pub fn module(mut self, name: &str, module: TestModule) -> Self {
        self.modules.push((name.to_string(), module));
        self
    }

    /// Archive entries in declaration order
    pub fn entries(&self) -> Vec<(String, Vec<u8>)> {
        let mut entries = vec![(
            "BundleConfig.json".to_string(),
            self.config.clone().into_bytes(),
        )];
        for (name, module) in &self.modules {
            entries.extend(
                module
                    .files()
                    .into_iter()
                    .map(|(path, content)| (format!("{name}/{path}"), content)),
            );
        }
        entries
    }

    /// Zip the bundle, optionally with its entries in reverse order
    pub fn zip_bytes(&self, reversed: bool) -> Vec<u8> {
        let mut entries: Vec<ZipEntry> = self
            .entries()
            .into_iter()
            .map(|(path, content)| ZipEntry::new(path, content, true))
            .collect();
        if reversed {
            entries.reverse();
        }
        write_archive_bytes(&entries).expect("Failed to write bundle zip")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_file_operations() {
        let workspace = TestWorkspace::new();
        workspace.write_file("test/file.txt", b"hello");
        assert!(workspace.file_exists("test/file.txt"));
        assert_eq!(workspace.read_file("test/file.txt"), b"hello");
    }

    #[test]
    fn test_bundle_entries_start_with_config() {
        let entries = TestBundle::new().module("maps", TestModule::new().on_demand()).entries();
        assert_eq!(entries[0].0, "BundleConfig.json");
        assert!(
            entries
                .iter()
                .any(|(path, _)| path == "maps/manifest/AndroidManifest.xml")
        );
    }
}
