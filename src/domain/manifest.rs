//! AndroidManifest.xml model
//!
//! Only the attributes the splitting engine consumes are modeled: package and
//! SDK range, module delivery/fusing/instant flags, `uses-split` dependencies and
//! the application icon/label references that must stay in master splits.

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use serde::{Deserialize, Serialize};

use crate::error::{BundletoolError, Result};

const ANDROID_NS: &str = "http://schemas.android.com/apk/res/android";
const DIST_NS: &str = "http://schemas.android.com/apk/distribution";

/// How a module reaches the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Delivery {
    #[default]
    InstallTime,
    OnDemand,
}

/// Parsed module manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AndroidManifest {
    pub package: String,
    pub version_code: Option<u32>,
    pub min_sdk: u32,
    pub max_sdk: Option<u32>,
    pub target_sdk: Option<u32>,
    pub delivery: Delivery,
    pub instant: bool,
    /// `dist:fusing dist:include`; `None` when the manifest does not say
    pub fusing_include: Option<bool>,
    pub uses_splits: Vec<String>,
    /// Resource reference of the application icon, e.g. `drawable/icon`
    pub icon: Option<String>,
    /// Resource reference of the application label, e.g. `string/app_name`
    pub label: Option<String>,
    pub has_code: bool,
}

impl Default for AndroidManifest {
    fn default() -> Self {
        Self {
            package: String::new(),
            version_code: None,
            min_sdk: 1,
            max_sdk: None,
            target_sdk: None,
            delivery: Delivery::InstallTime,
            instant: false,
            fusing_include: None,
            uses_splits: Vec::new(),
            icon: None,
            label: None,
            has_code: true,
        }
    }
}

/// Split-specific attributes written into a generated APK's manifest
#[derive(Debug, Clone, Default)]
pub struct ApkManifestAttributes {
    /// `split` attribute; `None` for the base master and standalone APKs
    pub split_id: Option<String>,
    /// Feature module a configuration split belongs to
    pub config_for_split: Option<String>,
    pub is_feature_split: bool,
    /// `android:extractNativeLibs`; `None` leaves the platform default
    pub extract_native_libs: Option<bool>,
}

fn parse_error(reason: impl ToString) -> BundletoolError {
    BundletoolError::ParseFailed {
        what: "AndroidManifest.xml".to_string(),
        reason: reason.to_string(),
    }
}

fn parse_u32(name: &str, value: &str) -> Result<u32> {
    value
        .trim()
        .parse()
        .map_err(|_| parse_error(format!("attribute '{name}' is not an integer: '{value}'")))
}

fn parse_bool(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

/// Turns `@drawable/icon` into `drawable/icon`; plain strings are not references
fn resource_reference(value: &str) -> Option<String> {
    value
        .strip_prefix('@')
        .filter(|rest| rest.contains('/'))
        .map(str::to_string)
}

fn attributes(element: &BytesStart<'_>) -> Result<Vec<(String, String)>> {
    let mut attrs = Vec::new();
    for attr in element.attributes() {
        let attr = attr.map_err(parse_error)?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value().map_err(parse_error)?.into_owned();
        attrs.push((key, value));
    }
    Ok(attrs)
}

impl AndroidManifest {
    /// Parse a manifest from its XML text
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut manifest = AndroidManifest::default();
        let mut saw_manifest = false;

        loop {
            let event = reader.read_event().map_err(parse_error)?;
            match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    let attrs = attributes(e)?;
                    if name == "manifest" {
                        saw_manifest = true;
                    }
                    manifest.apply_element(&name, &attrs)?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !saw_manifest {
            return Err(parse_error("missing <manifest> root element"));
        }
        if manifest.package.is_empty() {
            return Err(parse_error("<manifest> has no 'package' attribute"));
        }
        Ok(manifest)
    }

    fn apply_element(&mut self, element: &str, attrs: &[(String, String)]) -> Result<()> {
        for (key, value) in attrs {
            match (element, key.as_str()) {
                ("manifest", "package") => self.package = value.clone(),
                ("manifest", "versionCode") => {
                    self.version_code = Some(parse_u32(key, value)?);
                }
                ("uses-sdk", "minSdkVersion") => self.min_sdk = parse_u32(key, value)?,
                ("uses-sdk", "maxSdkVersion") => self.max_sdk = Some(parse_u32(key, value)?),
                ("uses-sdk", "targetSdkVersion") => {
                    self.target_sdk = Some(parse_u32(key, value)?);
                }
                ("module", "onDemand") if parse_bool(value) => {
                    self.delivery = Delivery::OnDemand;
                }
                ("module", "instant") => self.instant = parse_bool(value),
                ("fusing", "include") => self.fusing_include = Some(parse_bool(value)),
                ("uses-split", "name") => self.uses_splits.push(value.clone()),
                ("application", "icon") => self.icon = resource_reference(value),
                ("application", "label") => self.label = resource_reference(value),
                ("application", "hasCode") => self.has_code = parse_bool(value),
                _ => {}
            }
        }
        match element {
            "on-demand" => self.delivery = Delivery::OnDemand,
            "install-time" => self.delivery = Delivery::InstallTime,
            _ => {}
        }
        Ok(())
    }

    /// Resource references the manifest needs at install time
    pub fn referenced_resources(&self) -> Vec<&str> {
        self.icon
            .iter()
            .chain(self.label.iter())
            .map(String::as_str)
            .collect()
    }

    /// Render the manifest of one generated APK
    pub fn render(&self, apk: &ApkManifestAttributes) -> Result<Vec<u8>> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .map_err(write_error)?;

        let version_code = self.version_code.map(|v| v.to_string());
        let mut root = BytesStart::new("manifest");
        root.push_attribute(("xmlns:android", ANDROID_NS));
        root.push_attribute(("xmlns:dist", DIST_NS));
        root.push_attribute(("package", self.package.as_str()));
        if let Some(code) = version_code.as_deref() {
            root.push_attribute(("android:versionCode", code));
        }
        if let Some(split) = apk.split_id.as_deref() {
            root.push_attribute(("split", split));
        }
        if let Some(parent) = apk.config_for_split.as_deref() {
            root.push_attribute(("configForSplit", parent));
        }
        if apk.is_feature_split {
            root.push_attribute(("android:isFeatureSplit", "true"));
        }
        writer.write_event(Event::Start(root)).map_err(write_error)?;

        let min_sdk = self.min_sdk.to_string();
        let max_sdk = self.max_sdk.map(|v| v.to_string());
        let target_sdk = self.target_sdk.map(|v| v.to_string());
        let mut uses_sdk = BytesStart::new("uses-sdk");
        uses_sdk.push_attribute(("android:minSdkVersion", min_sdk.as_str()));
        if let Some(max) = max_sdk.as_deref() {
            uses_sdk.push_attribute(("android:maxSdkVersion", max));
        }
        if let Some(target) = target_sdk.as_deref() {
            uses_sdk.push_attribute(("android:targetSdkVersion", target));
        }
        writer.write_event(Event::Empty(uses_sdk)).map_err(write_error)?;

        for dependency in &self.uses_splits {
            let mut uses_split = BytesStart::new("uses-split");
            uses_split.push_attribute(("android:name", dependency.as_str()));
            writer
                .write_event(Event::Empty(uses_split))
                .map_err(write_error)?;
        }

        let icon = self.icon.as_ref().map(|r| format!("@{r}"));
        let label = self.label.as_ref().map(|r| format!("@{r}"));
        let mut application = BytesStart::new("application");
        application.push_attribute(("android:hasCode", bool_str(self.has_code)));
        if let Some(extract) = apk.extract_native_libs {
            application.push_attribute(("android:extractNativeLibs", bool_str(extract)));
        }
        if let Some(icon) = icon.as_deref() {
            application.push_attribute(("android:icon", icon));
        }
        if let Some(label) = label.as_deref() {
            application.push_attribute(("android:label", label));
        }
        writer
            .write_event(Event::Empty(application))
            .map_err(write_error)?;

        writer
            .write_event(Event::End(BytesEnd::new("manifest")))
            .map_err(write_error)?;

        Ok(writer.into_inner())
    }
}

fn write_error(e: impl std::fmt::Display) -> BundletoolError {
    BundletoolError::Io {
        message: format!("failed to render manifest: {e}"),
    }
}

fn bool_str(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}
