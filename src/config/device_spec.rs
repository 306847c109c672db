//! Device specification (`--device-spec`) data structures
//!
//! A device spec describes the configuration of one target device. Every field
//! is optional; a missing dimension means the device's value is unknown and
//! the dimension is not used for matching.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::targeting::{Abi, DensityBucket, TextureCompressionFormat, language_of_locale};
use crate::error::{Result, command, fs};

/// Configuration of a target device
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdk_version: Option<u32>,

    /// ABIs in order of preference
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supported_abis: Vec<Abi>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supported_locales: Vec<String>,

    /// Screen density in dpi; a bucket name such as `"xhdpi"` is accepted too
    #[serde(
        default,
        deserialize_with = "deserialize_density",
        skip_serializing_if = "Option::is_none"
    )]
    pub screen_density: Option<u32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gl_extensions: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub device_features: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DensityValue {
    Dpi(u32),
    Name(String),
}

fn deserialize_density<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<DensityValue> = Option::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(DensityValue::Dpi(dpi)) => Ok(Some(dpi)),
        Some(DensityValue::Name(name)) => DensityBucket::from_name(&name)
            .map(|bucket| Some(bucket.dpi()))
            .ok_or_else(|| serde::de::Error::custom(format!("unknown screen density '{name}'"))),
    }
}

impl DeviceSpec {
    /// Parse a device spec from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let spec: Self = serde_json::from_str(json)
            .map_err(|e| command::invalid(format!("Invalid device spec: {e}")))?;
        spec.validate()?;
        Ok(spec)
    }

    /// Load a device spec file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(fs::not_found(path));
        }
        let content = std::fs::read_to_string(path).map_err(|e| fs::read_failed(path, e))?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Rejects specs no real device can have
    pub fn validate(&self) -> Result<()> {
        if self.sdk_version == Some(0) {
            return Err(command::invalid("Device spec SDK version must be positive."));
        }
        if self.screen_density == Some(0) {
            return Err(command::invalid(
                "Device spec screen density must be positive.",
            ));
        }
        let distinct: BTreeSet<Abi> = self.supported_abis.iter().copied().collect();
        if distinct.len() != self.supported_abis.len() {
            return Err(command::invalid(
                "Device spec lists the same ABI more than once.",
            ));
        }
        for locale in &self.supported_locales {
            if language_of_locale(locale).is_none() {
                return Err(command::invalid(format!(
                    "Device spec contains invalid locale '{locale}'."
                )));
            }
        }
        Ok(())
    }

    /// Languages of the supported locales, in order, without duplicates
    pub fn languages(&self) -> Vec<String> {
        let mut languages: Vec<String> = Vec::new();
        for language in self
            .supported_locales
            .iter()
            .filter_map(|l| language_of_locale(l))
        {
            if !languages.contains(&language) {
                languages.push(language);
            }
        }
        languages
    }

    /// Texture formats enabled by the GL extensions, most preferred first
    pub fn texture_formats(&self) -> Vec<TextureCompressionFormat> {
        let supported: BTreeSet<TextureCompressionFormat> = self
            .gl_extensions
            .iter()
            .filter_map(|e| TextureCompressionFormat::from_gl_extension(e))
            .collect();
        TextureCompressionFormat::PREFERENCE
            .into_iter()
            .filter(|f| supported.contains(f))
            .collect()
    }

    /// Density bucket closest to the device's screen density
    pub fn density_bucket(&self) -> Option<DensityBucket> {
        let dpi = self.screen_density?;
        let best = crate::domain::targeting::best_density_match(
            dpi,
            DensityBucket::ALL.iter().map(|b| b.dpi()),
        )?;
        DensityBucket::from_dpi(best)
    }
}
