//! Device-targeted selection of variants and APKs
//!
//! Used by `build-apks` with a device spec, which keeps only what the device
//! installs, and by `extract-apks` and `get-size`, which read an APK Set.

pub mod matching;
pub mod provider;

use std::collections::BTreeSet;

use tracing::debug;

use crate::config::DeviceSpec;
use crate::domain::apk_set::{ApkDescription, BuildApksResult, ModuleMetadata};
use crate::domain::bundle::AppBundle;
use crate::domain::split::SplitType;
use crate::domain::targeting::Targeting;
use crate::error::{Result, device};
use crate::variants::GeneratedVariant;

pub use matching::{DeviceMatcher, select_modules};
pub use provider::{DeviceProvider, EnvDeviceProvider, StaticDeviceProvider};

fn no_matching_variant() -> crate::error::BundletoolError {
    device::incompatible("No variant of the app matches the device spec.")
}

/// Keep the variant `spec` installs, reduced to the APKs it needs
///
/// Instant splits are kept only when `instant` is set, and then exclusively.
pub fn filter_variants(
    bundle: &AppBundle,
    variants: Vec<GeneratedVariant>,
    spec: &DeviceSpec,
    requested: &[String],
    instant: bool,
) -> Result<Vec<GeneratedVariant>> {
    let matcher =
        DeviceMatcher::new(spec).with_default_texture_format(bundle.config.default_texture_format());
    let metadata: Vec<ModuleMetadata> = bundle.modules.values().map(ModuleMetadata::from).collect();
    let modules = select_modules(&metadata.iter().collect::<Vec<_>>(), requested)?;

    let targetings: Vec<&Targeting> = variants.iter().map(|v| &v.targeting).collect();
    let selected = matcher
        .select_variant(&targetings)
        .ok_or_else(no_matching_variant)?;

    let mut variants = variants;
    let mut variant = variants.swap_remove(selected);
    variant.splits.retain(|split| {
        modules.contains(split.module.as_str())
            && (split.split_type == SplitType::Instant) == instant
            && matcher.apk_matches(&split.apk_targeting)
    });
    debug!(
        variant = variant.number,
        apks = variant.splits.len(),
        "selected variant for device"
    );
    Ok(vec![variant])
}

/// APKs of an APK Set that `spec` installs
pub fn select_apks<'a>(
    toc: &'a BuildApksResult,
    spec: &DeviceSpec,
    requested: &[String],
    instant: bool,
) -> Result<Vec<&'a ApkDescription>> {
    let matcher = DeviceMatcher::new(spec).with_default_texture_format(toc.default_texture_format);
    let is_wanted = |apk: &ApkDescription| (apk.kind == SplitType::Instant) == instant;

    let candidates: Vec<_> = toc
        .variants
        .iter()
        .filter(|v| v.apk_sets.iter().flat_map(|s| s.apks.iter()).any(is_wanted))
        .collect();
    let targetings: Vec<&Targeting> = candidates.iter().map(|v| &v.targeting).collect();
    let variant = matcher
        .select_variant(&targetings)
        .map(|i| candidates[i])
        .ok_or_else(no_matching_variant)?;

    let metadata: Vec<&ModuleMetadata> = variant.apk_sets.iter().map(|s| &s.module).collect();
    let modules: BTreeSet<String> = select_modules(&metadata, requested)?;

    Ok(variant
        .apk_sets
        .iter()
        .filter(|set| modules.contains(&set.module.name))
        .flat_map(|set| set.apks.iter())
        .filter(|apk| is_wanted(apk) && matcher.apk_matches(&apk.targeting))
        .collect())
}
