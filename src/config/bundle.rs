//! Bundle configuration (`BundleConfig.json`) data structures
//!
//! Controls which split dimensions are enabled, which resources are pinned to
//! master splits and which files must stay uncompressed.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use wax::{CandidatePath, Glob, Pattern as _};

use crate::domain::resource::ResourceId;
use crate::domain::targeting::{SplitDimension, TextureCompressionFormat};
use crate::error::{BundletoolError, Result, bundle, fs};

pub const BUNDLE_CONFIG_PATH: &str = "BundleConfig.json";

/// Bundle configuration stored at the root of an App Bundle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleConfig {
    #[serde(default)]
    pub bundletool: BundletoolInfo,

    #[serde(default)]
    pub optimizations: Optimizations,

    #[serde(default)]
    pub compression: Compression,

    #[serde(default)]
    pub master_resources: MasterResources,
}

/// Version of the tool that built the bundle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundletoolInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Optimizations {
    /// Overrides of the default split dimensions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub split_dimensions: Vec<SplitDimensionConfig>,

    #[serde(default)]
    pub uncompress_native_libraries: Toggle,

    #[serde(default)]
    pub uncompress_dex_files: Toggle,
}

/// An optimization that is on unless disabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toggle {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl Default for Toggle {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Enables (or, with `negate`, disables) splitting along one dimension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitDimensionConfig {
    pub dimension: SplitDimension,

    #[serde(default)]
    pub negate: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix_stripping: Option<SuffixStripping>,
}

/// Removal of `#tcf_` suffixes from generated APK paths
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuffixStripping {
    #[serde(default)]
    pub enabled: bool,

    /// Format whose directory serves as fallback in standalone APKs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_suffix: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compression {
    /// Globs (relative to the APK root) of files stored uncompressed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uncompressed_glob: Vec<String>,
}

/// Resources that must stay in master splits in every configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterResources {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_ids: Vec<ResourceId>,

    /// `type/name` references
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_names: Vec<String>,
}

impl BundleConfig {
    /// Parse bundle configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse bundle configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file, choosing the format by extension
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(fs::not_found(path));
        }
        let content = std::fs::read_to_string(path).map_err(|e| fs::read_failed(path, e))?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let parsed = match ext.as_deref() {
            Some("yaml" | "yml") => Self::from_yaml(&content),
            _ => Self::from_json(&content),
        };
        parsed.map_err(|e| match e {
            BundletoolError::ParseFailed { reason, .. } => BundletoolError::ParseFailed {
                what: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Serialize bundle configuration to a JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate bundle configuration
    pub fn validate(&self) -> Result<()> {
        for pattern in &self.compression.uncompressed_glob {
            Glob::new(pattern).map_err(|e| {
                bundle::invalid(format!("Invalid uncompressed glob '{pattern}': {e}"))
            })?;
        }

        let mut seen = BTreeSet::new();
        for dimension in &self.optimizations.split_dimensions {
            if !seen.insert(dimension.dimension) {
                return Err(bundle::invalid(format!(
                    "Split dimension {} is configured more than once.",
                    dimension.dimension
                )));
            }
            let default_suffix = dimension
                .suffix_stripping
                .as_ref()
                .and_then(|s| s.default_suffix.as_deref());
            if let Some(suffix) = default_suffix {
                if dimension.dimension != SplitDimension::TextureCompressionFormat {
                    return Err(bundle::invalid(format!(
                        "Suffix stripping is only supported for TEXTURE_COMPRESSION_FORMAT, \
                         found it for {}.",
                        dimension.dimension
                    )));
                }
                if TextureCompressionFormat::from_name(suffix).is_none() {
                    return Err(bundle::invalid(format!(
                        "Unknown default texture compression format '{suffix}'."
                    )));
                }
            }
        }
        Ok(())
    }

    /// Dimensions the bundle is split along.
    ///
    /// ABI, screen density and language are on by default; texture compression
    /// format only when listed.
    pub fn enabled_dimensions(&self) -> BTreeSet<SplitDimension> {
        let mut enabled = BTreeSet::from([
            SplitDimension::Abi,
            SplitDimension::ScreenDensity,
            SplitDimension::Language,
        ]);
        for config in &self.optimizations.split_dimensions {
            if config.negate {
                enabled.remove(&config.dimension);
            } else {
                enabled.insert(config.dimension);
            }
        }
        enabled
    }

    pub fn is_enabled(&self, dimension: SplitDimension) -> bool {
        self.enabled_dimensions().contains(&dimension)
    }

    fn texture_config(&self) -> Option<&SplitDimensionConfig> {
        self.optimizations
            .split_dimensions
            .iter()
            .find(|d| d.dimension == SplitDimension::TextureCompressionFormat && !d.negate)
    }

    pub fn suffix_stripping_enabled(&self) -> bool {
        self.texture_config()
            .and_then(|c| c.suffix_stripping.as_ref())
            .is_some_and(|s| s.enabled)
    }

    /// Default texture format used as fallback when suffix stripping is on
    pub fn default_texture_format(&self) -> Option<TextureCompressionFormat> {
        self.texture_config()
            .and_then(|c| c.suffix_stripping.as_ref())
            .filter(|s| s.enabled)
            .and_then(|s| s.default_suffix.as_deref())
            .and_then(TextureCompressionFormat::from_name)
    }

    /// Whether an APK path matches one of the uncompressed globs
    pub fn is_uncompressed_path(&self, apk_path: &str) -> bool {
        let candidate = CandidatePath::from(apk_path);
        self.compression.uncompressed_glob.iter().any(|pattern| {
            Glob::new(pattern).is_ok_and(|glob| glob.matched(&candidate).is_some())
        })
    }
}
