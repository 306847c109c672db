//! Targeting model
//!
//! Describes which device configurations a directory, APK or variant applies to.
//! Every dimension carries the selected values together with the sibling values
//! that other APKs of the same dimension target (the "alternatives"), which lets a
//! device pick the best match and fall back to the master split when none fits.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Android 5.0, the first release able to install split APKs
pub const SDK_L: u32 = 21;
/// Android 6.0, the first release able to load uncompressed native libraries
pub const SDK_M: u32 = 23;
/// Android 9, from which dex files are stored uncompressed
pub const SDK_P: u32 = 28;

/// Dimensions along which a module can be split, in canonical application order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SplitDimension {
    Abi,
    ScreenDensity,
    Language,
    TextureCompressionFormat,
}

impl SplitDimension {
    /// All dimensions in the order splitters are applied
    pub const ORDER: [SplitDimension; 4] = [
        SplitDimension::Abi,
        SplitDimension::ScreenDensity,
        SplitDimension::Language,
        SplitDimension::TextureCompressionFormat,
    ];
}

impl fmt::Display for SplitDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SplitDimension::Abi => "ABI",
            SplitDimension::ScreenDensity => "SCREEN_DENSITY",
            SplitDimension::Language => "LANGUAGE",
            SplitDimension::TextureCompressionFormat => "TEXTURE_COMPRESSION_FORMAT",
        };
        f.write_str(name)
    }
}

/// Native ABI
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Abi {
    #[serde(rename = "armeabi")]
    Armeabi,
    #[serde(rename = "armeabi-v7a")]
    ArmeabiV7a,
    #[serde(rename = "arm64-v8a")]
    Arm64V8a,
    #[serde(rename = "x86")]
    X86,
    #[serde(rename = "x86_64")]
    X86_64,
    #[serde(rename = "mips")]
    Mips,
    #[serde(rename = "mips64")]
    Mips64,
    #[serde(rename = "riscv64")]
    Riscv64,
}

impl Abi {
    pub const ALL: [Abi; 8] = [
        Abi::Armeabi,
        Abi::ArmeabiV7a,
        Abi::Arm64V8a,
        Abi::X86,
        Abi::X86_64,
        Abi::Mips,
        Abi::Mips64,
        Abi::Riscv64,
    ];

    /// Directory name used under `lib/`
    pub fn as_str(self) -> &'static str {
        match self {
            Abi::Armeabi => "armeabi",
            Abi::ArmeabiV7a => "armeabi-v7a",
            Abi::Arm64V8a => "arm64-v8a",
            Abi::X86 => "x86",
            Abi::X86_64 => "x86_64",
            Abi::Mips => "mips",
            Abi::Mips64 => "mips64",
            Abi::Riscv64 => "riscv64",
        }
    }

    pub fn from_name(name: &str) -> Option<Abi> {
        Abi::ALL.into_iter().find(|abi| abi.as_str() == name)
    }

    /// Form used in split names and APK file names
    pub fn split_suffix(self) -> String {
        self.as_str().replace('-', "_")
    }
}

impl fmt::Display for Abi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Screen density bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DensityBucket {
    Ldpi,
    Mdpi,
    Tvdpi,
    Hdpi,
    Xhdpi,
    Xxhdpi,
    Xxxhdpi,
}

impl DensityBucket {
    pub const ALL: [DensityBucket; 7] = [
        DensityBucket::Ldpi,
        DensityBucket::Mdpi,
        DensityBucket::Tvdpi,
        DensityBucket::Hdpi,
        DensityBucket::Xhdpi,
        DensityBucket::Xxhdpi,
        DensityBucket::Xxxhdpi,
    ];

    pub fn dpi(self) -> u32 {
        match self {
            DensityBucket::Ldpi => 120,
            DensityBucket::Mdpi => 160,
            DensityBucket::Tvdpi => 213,
            DensityBucket::Hdpi => 240,
            DensityBucket::Xhdpi => 320,
            DensityBucket::Xxhdpi => 480,
            DensityBucket::Xxxhdpi => 640,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DensityBucket::Ldpi => "ldpi",
            DensityBucket::Mdpi => "mdpi",
            DensityBucket::Tvdpi => "tvdpi",
            DensityBucket::Hdpi => "hdpi",
            DensityBucket::Xhdpi => "xhdpi",
            DensityBucket::Xxhdpi => "xxhdpi",
            DensityBucket::Xxxhdpi => "xxxhdpi",
        }
    }

    pub fn from_name(name: &str) -> Option<DensityBucket> {
        let lower = name.to_ascii_lowercase();
        DensityBucket::ALL
            .into_iter()
            .find(|bucket| bucket.as_str() == lower)
    }

    pub fn from_dpi(dpi: u32) -> Option<DensityBucket> {
        DensityBucket::ALL
            .into_iter()
            .find(|bucket| bucket.dpi() == dpi)
    }
}

impl fmt::Display for DensityBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Picks the density Android would load for a screen of `dpi` among `available`.
///
/// An exact match wins; otherwise the closest higher density (scaled down), and
/// only then the closest lower one.
pub fn best_density_match(dpi: u32, available: impl IntoIterator<Item = u32>) -> Option<u32> {
    let available: BTreeSet<u32> = available.into_iter().collect();
    if available.contains(&dpi) {
        return Some(dpi);
    }
    available
        .range(dpi..)
        .next()
        .copied()
        .or_else(|| available.range(..dpi).next_back().copied())
}

/// Texture compression format of targeted asset directories
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TextureCompressionFormat {
    #[serde(rename = "etc1")]
    Etc1,
    #[serde(rename = "etc2")]
    Etc2,
    #[serde(rename = "astc")]
    Astc,
    #[serde(rename = "pvrtc")]
    Pvrtc,
    #[serde(rename = "atc")]
    Atc,
    #[serde(rename = "dxt1")]
    Dxt1,
    #[serde(rename = "s3tc")]
    S3tc,
    #[serde(rename = "latc")]
    Latc,
    #[serde(rename = "3dc")]
    ThreeDc,
}

impl TextureCompressionFormat {
    /// Formats from most to least preferred when a device supports several
    pub const PREFERENCE: [TextureCompressionFormat; 9] = [
        TextureCompressionFormat::Astc,
        TextureCompressionFormat::Etc2,
        TextureCompressionFormat::S3tc,
        TextureCompressionFormat::Dxt1,
        TextureCompressionFormat::Pvrtc,
        TextureCompressionFormat::Atc,
        TextureCompressionFormat::Latc,
        TextureCompressionFormat::ThreeDc,
        TextureCompressionFormat::Etc1,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TextureCompressionFormat::Etc1 => "etc1",
            TextureCompressionFormat::Etc2 => "etc2",
            TextureCompressionFormat::Astc => "astc",
            TextureCompressionFormat::Pvrtc => "pvrtc",
            TextureCompressionFormat::Atc => "atc",
            TextureCompressionFormat::Dxt1 => "dxt1",
            TextureCompressionFormat::S3tc => "s3tc",
            TextureCompressionFormat::Latc => "latc",
            TextureCompressionFormat::ThreeDc => "3dc",
        }
    }

    pub fn from_name(name: &str) -> Option<TextureCompressionFormat> {
        let lower = name.to_ascii_lowercase();
        TextureCompressionFormat::PREFERENCE
            .into_iter()
            .find(|format| format.as_str() == lower)
    }

    /// Maps an OpenGL extension string to the format it enables
    pub fn from_gl_extension(extension: &str) -> Option<TextureCompressionFormat> {
        match extension {
            "GL_OES_compressed_ETC1_RGB8_texture" => Some(TextureCompressionFormat::Etc1),
            "GL_OES_compressed_ETC2_RGB8_texture" => Some(TextureCompressionFormat::Etc2),
            "GL_KHR_texture_compression_astc_ldr" => Some(TextureCompressionFormat::Astc),
            "GL_IMG_texture_compression_pvrtc" => Some(TextureCompressionFormat::Pvrtc),
            "GL_AMD_compressed_ATC_texture" | "GL_ATI_texture_compression_atitc" => {
                Some(TextureCompressionFormat::Atc)
            }
            "GL_EXT_texture_compression_dxt1" => Some(TextureCompressionFormat::Dxt1),
            "GL_EXT_texture_compression_s3tc" => Some(TextureCompressionFormat::S3tc),
            "GL_EXT_texture_compression_latc" => Some(TextureCompressionFormat::Latc),
            "GL_AMD_compressed_3DC_texture" => Some(TextureCompressionFormat::ThreeDc),
            _ => None,
        }
    }
}

impl fmt::Display for TextureCompressionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extracts the language subtag from an Android locale or BCP-47 tag.
///
/// Accepts `fr`, `fr-rCA`, `fr-CA`, `fr_CA` and `b+sr+Latn`.
pub fn language_of_locale(locale: &str) -> Option<String> {
    let first = match locale.strip_prefix("b+") {
        Some(rest) => rest.split('+').next()?,
        None => locale.split(['-', '_']).next()?,
    };
    let valid = (2..=3).contains(&first.len()) && first.chars().all(|c| c.is_ascii_alphabetic());
    valid.then(|| first.to_ascii_lowercase())
}

/// Selected values of one dimension plus the sibling values other APKs target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize",
    deserialize = "T: Deserialize<'de> + Ord"
))]
pub struct ValueTargeting<T> {
    pub values: BTreeSet<T>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub alternatives: BTreeSet<T>,
}

impl<T: Ord + Clone> ValueTargeting<T> {
    /// Targets a single value with no alternatives
    pub fn single(value: T) -> Self {
        Self {
            values: BTreeSet::from([value]),
            alternatives: BTreeSet::new(),
        }
    }

    /// Targets `value`; every other entry of `universe` becomes an alternative
    pub fn among(value: T, universe: &BTreeSet<T>) -> Self {
        let alternatives = universe.iter().filter(|v| **v != value).cloned().collect();
        Self {
            values: BTreeSet::from([value]),
            alternatives,
        }
    }

    /// Targets none of `universe`: the fallback when no value applies
    pub fn fallback(universe: &BTreeSet<T>) -> Self {
        Self {
            values: BTreeSet::new(),
            alternatives: universe.clone(),
        }
    }

    /// The only value, if exactly one is targeted
    pub fn value(&self) -> Option<&T> {
        if self.values.len() == 1 {
            self.values.iter().next()
        } else {
            None
        }
    }
}

/// Targeting along every dimension; `None` means the dimension is not targeted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Targeting {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdk_version: Option<ValueTargeting<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abi: Option<ValueTargeting<Abi>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_density: Option<ValueTargeting<DensityBucket>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<ValueTargeting<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture_compression_format: Option<ValueTargeting<TextureCompressionFormat>>,
}

impl Targeting {
    pub fn is_empty(&self) -> bool {
        self.sdk_version.is_none()
            && self.abi.is_none()
            && self.screen_density.is_none()
            && self.language.is_none()
            && self.texture_compression_format.is_none()
    }

    pub fn abi(value: Abi) -> Self {
        Self {
            abi: Some(ValueTargeting::single(value)),
            ..Self::default()
        }
    }

    pub fn language(value: impl Into<String>) -> Self {
        Self {
            language: Some(ValueTargeting::single(value.into())),
            ..Self::default()
        }
    }

    pub fn texture(value: TextureCompressionFormat) -> Self {
        Self {
            texture_compression_format: Some(ValueTargeting::single(value)),
            ..Self::default()
        }
    }

    /// Combines two targetings; dimensions set in `other` win
    #[must_use]
    pub fn merged_with(&self, other: &Targeting) -> Targeting {
        Targeting {
            sdk_version: other.sdk_version.clone().or_else(|| self.sdk_version.clone()),
            abi: other.abi.clone().or_else(|| self.abi.clone()),
            screen_density: other
                .screen_density
                .clone()
                .or_else(|| self.screen_density.clone()),
            language: other.language.clone().or_else(|| self.language.clone()),
            texture_compression_format: other
                .texture_compression_format
                .clone()
                .or_else(|| self.texture_compression_format.clone()),
        }
    }

    /// Split dimensions this targeting constrains
    pub fn dimensions(&self) -> Vec<SplitDimension> {
        let mut dims = Vec::new();
        if self.abi.is_some() {
            dims.push(SplitDimension::Abi);
        }
        if self.screen_density.is_some() {
            dims.push(SplitDimension::ScreenDensity);
        }
        if self.language.is_some() {
            dims.push(SplitDimension::Language);
        }
        if self.texture_compression_format.is_some() {
            dims.push(SplitDimension::TextureCompressionFormat);
        }
        dims
    }
}

/// Splits a path carrying `#lang_xx` / `#tcf_xx` directory suffixes into its
/// plain path and the targeting those suffixes express.
///
/// `assets/textures#tcf_astc/a.ktx` becomes (`assets/textures/a.ktx`, astc).
/// Unknown suffix keys are left in place.
pub fn parse_path_targeting(path: &str) -> (String, Targeting) {
    let mut targeting = Targeting::default();
    let mut components = Vec::new();
    for component in path.split('/') {
        let Some((name, suffix)) = component.split_once('#') else {
            components.push(component.to_string());
            continue;
        };
        let parsed = suffix.split_once('_').and_then(|(key, value)| match key {
            "lang" => language_of_locale(value).map(|lang| {
                targeting.language = Some(ValueTargeting::single(lang));
            }),
            "tcf" => TextureCompressionFormat::from_name(value).map(|format| {
                targeting.texture_compression_format = Some(ValueTargeting::single(format));
            }),
            _ => None,
        });
        if parsed.is_some() {
            components.push(name.to_string());
        } else {
            components.push(component.to_string());
        }
    }
    (components.join("/"), targeting)
}
