//! Matching targeting against a device spec
//!
//! Dimensions the device spec leaves unset match every value.

use std::collections::BTreeSet;

use crate::config::DeviceSpec;
use crate::domain::apk_set::ModuleMetadata;
use crate::domain::targeting::{
    Abi, DensityBucket, SDK_L, Targeting, TextureCompressionFormat, ValueTargeting,
    best_density_match,
};
use crate::error::{Result, command};
use crate::resolver::{DependencyGraph, transitive_closure};

fn universe<T: Ord + Clone>(targeting: &ValueTargeting<T>) -> BTreeSet<T> {
    targeting
        .values
        .iter()
        .chain(targeting.alternatives.iter())
        .cloned()
        .collect()
}

fn variant_sdk(targeting: &Targeting) -> u32 {
    targeting
        .sdk_version
        .as_ref()
        .and_then(|t| t.values.iter().next().copied())
        .unwrap_or(1)
}

/// Decides which variants and APKs a device needs
#[derive(Debug, Clone)]
pub struct DeviceMatcher<'a> {
    spec: &'a DeviceSpec,
    languages: Vec<String>,
    formats: Vec<TextureCompressionFormat>,
    default_format: Option<TextureCompressionFormat>,
}

impl<'a> DeviceMatcher<'a> {
    pub fn new(spec: &'a DeviceSpec) -> Self {
        Self {
            spec,
            languages: spec.languages(),
            formats: spec.texture_formats(),
            default_format: None,
        }
    }

    /// Format served to devices that support none of the offered ones
    pub fn with_default_texture_format(mut self, format: Option<TextureCompressionFormat>) -> Self {
        self.default_format = format;
        self
    }

    /// Indices of every variant that could serve the device
    ///
    /// Within each known dimension only the best candidates survive: the
    /// highest SDK not above the device's, the most preferred ABI, the
    /// closest density.
    pub fn compatible_variants(&self, variants: &[&Targeting]) -> Vec<usize> {
        let mut candidates: Vec<usize> = (0..variants.len()).collect();

        if let Some(device_sdk) = self.spec.sdk_version {
            candidates.retain(|i| variant_sdk(variants[*i]) <= device_sdk);
            if let Some(best) = candidates.iter().map(|i| variant_sdk(variants[*i])).max() {
                candidates.retain(|i| variant_sdk(variants[*i]) == best);
            }
        }

        if !self.spec.supported_abis.is_empty() {
            let rank = |i: &usize| -> Option<usize> {
                match variants[*i].abi.as_ref().and_then(ValueTargeting::value) {
                    Some(abi) => self.spec.supported_abis.iter().position(|a| a == abi),
                    None => Some(self.spec.supported_abis.len()),
                }
            };
            candidates.retain(|i| rank(i).is_some());
            if let Some(best) = candidates.iter().filter_map(rank).min() {
                candidates.retain(|i| rank(i) == Some(best));
            }
        }

        if let Some(dpi) = self.spec.screen_density {
            let density_of = |i: &usize| -> Option<DensityBucket> {
                variants[*i]
                    .screen_density
                    .as_ref()
                    .and_then(ValueTargeting::value)
                    .copied()
            };
            let best = best_density_match(
                dpi,
                candidates.iter().filter_map(density_of).map(DensityBucket::dpi),
            );
            if let Some(best) = best {
                candidates.retain(|i| density_of(i).is_none_or(|d| d.dpi() == best));
            }
        }
        candidates
    }

    /// Index of the one variant the device installs
    ///
    /// Without a known SDK the lowest split variant is preferred over
    /// standalones.
    pub fn select_variant(&self, variants: &[&Targeting]) -> Option<usize> {
        let candidates = self.compatible_variants(variants);
        if self.spec.sdk_version.is_some() {
            return candidates.first().copied();
        }
        let lowest = |filter: &dyn Fn(u32) -> bool| {
            candidates
                .iter()
                .copied()
                .filter(|i| filter(variant_sdk(variants[*i])))
                .min_by_key(|i| variant_sdk(variants[*i]))
        };
        lowest(&|sdk| sdk >= SDK_L).or_else(|| lowest(&|_| true))
    }

    /// Whether the device needs an APK with this targeting
    pub fn apk_matches(&self, targeting: &Targeting) -> bool {
        self.abi_matches(targeting.abi.as_ref())
            && self.density_matches(targeting.screen_density.as_ref())
            && self.language_matches(targeting.language.as_ref())
            && self.texture_matches(targeting.texture_compression_format.as_ref())
    }

    fn abi_matches(&self, targeting: Option<&ValueTargeting<Abi>>) -> bool {
        let Some(targeting) = targeting else {
            return true;
        };
        if self.spec.supported_abis.is_empty() {
            return true;
        }
        let offered = universe(targeting);
        self.spec
            .supported_abis
            .iter()
            .find(|abi| offered.contains(*abi))
            .is_some_and(|best| targeting.values.contains(best))
    }

    fn density_matches(&self, targeting: Option<&ValueTargeting<DensityBucket>>) -> bool {
        let (Some(targeting), Some(dpi)) = (targeting, self.spec.screen_density) else {
            return true;
        };
        let offered = universe(targeting);
        best_density_match(dpi, offered.iter().map(|b| b.dpi()))
            .is_some_and(|best| targeting.values.iter().any(|b| b.dpi() == best))
    }

    fn language_matches(&self, targeting: Option<&ValueTargeting<String>>) -> bool {
        let Some(targeting) = targeting else {
            return true;
        };
        self.languages.is_empty()
            || targeting.values.iter().any(|l| self.languages.contains(l))
    }

    fn texture_matches(&self, targeting: Option<&ValueTargeting<TextureCompressionFormat>>) -> bool {
        let Some(targeting) = targeting else {
            return true;
        };
        if self.spec.gl_extensions.is_empty() {
            return true;
        }
        let offered = universe(targeting);
        let best = self
            .formats
            .iter()
            .find(|format| offered.contains(*format))
            .or_else(|| self.default_format.as_ref().filter(|f| offered.contains(*f)));
        match best {
            Some(best) => targeting.values.contains(best),
            // Served by the fallback split, or by untargeted assets in the master
            None => targeting.values.is_empty(),
        }
    }
}

/// Modules to install: install-time modules plus `requested` and their
/// dependencies
pub fn select_modules(modules: &[&ModuleMetadata], requested: &[String]) -> Result<BTreeSet<String>> {
    for name in requested {
        if !modules.iter().any(|m| &m.name == name) {
            return Err(command::invalid(format!(
                "Module '{name}' is not present in the APK Set."
            )));
        }
    }
    let graph: DependencyGraph = modules
        .iter()
        .map(|m| (m.name.clone(), m.dependencies.clone()))
        .collect();
    Ok(transitive_closure(
        &graph,
        modules
            .iter()
            .filter(|m| m.is_install_time())
            .map(|m| m.name.as_str())
            .chain(requested.iter().map(String::as_str)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::manifest::Delivery;

    fn sdk_variant(sdk: u32) -> Targeting {
        Targeting {
            sdk_version: Some(ValueTargeting::single(sdk)),
            ..Targeting::default()
        }
    }

    fn standalone(abi: Abi, density: DensityBucket) -> Targeting {
        Targeting {
            abi: Some(ValueTargeting::single(abi)),
            screen_density: Some(ValueTargeting::single(density)),
            ..sdk_variant(15)
        }
    }

    fn spec(json: &str) -> DeviceSpec {
        DeviceSpec::from_json(json).unwrap()
    }

    #[test]
    fn test_highest_sdk_not_above_device() {
        let variants = [sdk_variant(21), sdk_variant(23), sdk_variant(28)];
        let refs: Vec<&Targeting> = variants.iter().collect();
        let device = spec(r#"{"sdkVersion": 26}"#);
        assert_eq!(DeviceMatcher::new(&device).select_variant(&refs), Some(1));

        let old = spec(r#"{"sdkVersion": 19}"#);
        assert_eq!(DeviceMatcher::new(&old).select_variant(&refs), None);
    }

    #[test]
    fn test_unknown_sdk_prefers_lowest_split_variant() {
        let variants = [
            standalone(Abi::X86, DensityBucket::Hdpi),
            sdk_variant(21),
            sdk_variant(28),
        ];
        let refs: Vec<&Targeting> = variants.iter().collect();
        let device = spec("{}");
        assert_eq!(DeviceMatcher::new(&device).select_variant(&refs), Some(1));
        assert_eq!(DeviceMatcher::new(&device).compatible_variants(&refs).len(), 3);
    }

    #[test]
    fn test_standalone_by_abi_preference_and_density() {
        let variants = [
            standalone(Abi::ArmeabiV7a, DensityBucket::Hdpi),
            standalone(Abi::ArmeabiV7a, DensityBucket::Xhdpi),
            standalone(Abi::Arm64V8a, DensityBucket::Hdpi),
            standalone(Abi::Arm64V8a, DensityBucket::Xhdpi),
        ];
        let refs: Vec<&Targeting> = variants.iter().collect();
        let device = spec(
            r#"{"sdkVersion": 19, "supportedAbis": ["arm64-v8a", "armeabi-v7a"], "screenDensity": 300}"#,
        );
        assert_eq!(DeviceMatcher::new(&device).select_variant(&refs), Some(3));

        let x86 = spec(r#"{"sdkVersion": 19, "supportedAbis": ["x86"]}"#);
        assert_eq!(DeviceMatcher::new(&x86).select_variant(&refs), None);
    }

    #[test]
    fn test_apk_matching() {
        let device = spec(
            r#"{"supportedAbis": ["x86_64", "x86"], "supportedLocales": ["de-DE", "fr"],
                "screenDensity": 280, "glExtensions": ["GL_OES_compressed_ETC1_RGB8_texture"]}"#,
        );
        let matcher = DeviceMatcher::new(&device);
        let abis = BTreeSet::from([Abi::X86, Abi::ArmeabiV7a]);
        assert!(matcher.apk_matches(&Targeting {
            abi: Some(ValueTargeting::among(Abi::X86, &abis)),
            ..Targeting::default()
        }));
        assert!(!matcher.apk_matches(&Targeting {
            abi: Some(ValueTargeting::among(Abi::ArmeabiV7a, &abis)),
            ..Targeting::default()
        }));

        let buckets = BTreeSet::from([DensityBucket::Hdpi, DensityBucket::Xhdpi]);
        assert!(matcher.apk_matches(&Targeting {
            screen_density: Some(ValueTargeting::among(DensityBucket::Xhdpi, &buckets)),
            ..Targeting::default()
        }));
        assert!(!matcher.apk_matches(&Targeting {
            screen_density: Some(ValueTargeting::among(DensityBucket::Hdpi, &buckets)),
            ..Targeting::default()
        }));

        assert!(matcher.apk_matches(&Targeting::language("de")));
        assert!(!matcher.apk_matches(&Targeting::language("es")));

        let formats = BTreeSet::from([
            TextureCompressionFormat::Etc1,
            TextureCompressionFormat::Astc,
        ]);
        assert!(matcher.apk_matches(&Targeting {
            texture_compression_format: Some(ValueTargeting::among(
                TextureCompressionFormat::Etc1,
                &formats
            )),
            ..Targeting::default()
        }));
        assert!(!matcher.apk_matches(&Targeting {
            texture_compression_format: Some(ValueTargeting::among(
                TextureCompressionFormat::Astc,
                &formats
            )),
            ..Targeting::default()
        }));
    }

    #[test]
    fn test_unsupported_formats_fall_back() {
        let formats = BTreeSet::from([
            TextureCompressionFormat::Astc,
            TextureCompressionFormat::Etc1,
        ]);
        let split = |format| Targeting {
            texture_compression_format: Some(ValueTargeting::among(format, &formats)),
            ..Targeting::default()
        };
        let fallback = Targeting {
            texture_compression_format: Some(ValueTargeting::fallback(&formats)),
            ..Targeting::default()
        };
        let device = spec(r#"{"glExtensions": ["GL_IMG_texture_compression_pvrtc"]}"#);

        let matcher =
            DeviceMatcher::new(&device).with_default_texture_format(Some(TextureCompressionFormat::Etc1));
        assert!(matcher.apk_matches(&split(TextureCompressionFormat::Etc1)));
        assert!(!matcher.apk_matches(&split(TextureCompressionFormat::Astc)));
        assert!(!matcher.apk_matches(&fallback));

        let matcher = DeviceMatcher::new(&device);
        assert!(!matcher.apk_matches(&split(TextureCompressionFormat::Etc1)));
        assert!(!matcher.apk_matches(&split(TextureCompressionFormat::Astc)));
        assert!(matcher.apk_matches(&fallback));

        let unrecognised = spec(r#"{"glExtensions": ["GL_EXT_unrelated"]}"#);
        let matcher = DeviceMatcher::new(&unrecognised);
        assert!(!matcher.apk_matches(&split(TextureCompressionFormat::Astc)));
        assert!(matcher.apk_matches(&fallback));
    }

    #[test]
    fn test_unknown_dimensions_match_everything() {
        let device = spec("{}");
        let matcher = DeviceMatcher::new(&device);
        assert!(matcher.apk_matches(&Targeting::abi(Abi::Mips)));
        assert!(matcher.apk_matches(&Targeting::language("ja")));
        assert!(matcher.apk_matches(&Targeting::texture(TextureCompressionFormat::Pvrtc)));
    }

    fn metadata(name: &str, delivery: Delivery, dependencies: &[&str]) -> ModuleMetadata {
        ModuleMetadata {
            name: name.to_string(),
            delivery,
            dependencies: dependencies.iter().map(|d| (*d).to_string()).collect(),
            instant: false,
        }
    }

    #[test]
    fn test_select_modules() {
        let modules = [
            metadata("base", Delivery::InstallTime, &[]),
            metadata("camera", Delivery::InstallTime, &[]),
            metadata("maps", Delivery::OnDemand, &["shared"]),
            metadata("shared", Delivery::OnDemand, &[]),
            metadata("extra", Delivery::OnDemand, &[]),
        ];
        let refs: Vec<&ModuleMetadata> = modules.iter().collect();

        let installed = select_modules(&refs, &[]).unwrap();
        assert_eq!(installed, BTreeSet::from(["base".into(), "camera".into()]));

        let installed = select_modules(&refs, &["maps".to_string()]).unwrap();
        assert_eq!(
            installed,
            BTreeSet::from([
                "base".into(),
                "camera".into(),
                "maps".into(),
                "shared".into()
            ])
        );

        assert!(select_modules(&refs, &["missing".to_string()]).is_err());
    }
}
