//! Per-variant compression policy
//!
//! From Android 6.0 native libraries can be loaded straight from the APK, and
//! from Android 9 dex files can be mapped without extraction. Variants
//! targeting those releases store the files uncompressed when the bundle
//! allows it.

use crate::config::BundleConfig;
use crate::domain::module::EntryKind;
use crate::domain::split::ModuleSplit;
use crate::domain::targeting::{SDK_M, SDK_P};

/// Lowest SDK version the split's variant targets
fn variant_sdk(split: &ModuleSplit) -> Option<u32> {
    split
        .variant_targeting
        .sdk_version
        .as_ref()
        .and_then(|t| t.values.iter().next().copied())
}

/// Marks dex files and native libraries uncompressed where the variant allows it
pub fn apply(mut split: ModuleSplit, config: &BundleConfig) -> ModuleSplit {
    let Some(sdk) = variant_sdk(&split) else {
        return split;
    };
    let uncompress_dex = config.optimizations.uncompress_dex_files.enabled && sdk >= SDK_P;
    let uncompress_native =
        config.optimizations.uncompress_native_libraries.enabled && sdk >= SDK_M;

    for entry in split.entries.values_mut() {
        match entry.kind() {
            Some(EntryKind::Dex) if uncompress_dex => entry.force_uncompressed = true,
            Some(EntryKind::NativeLibrary) if uncompress_native => {
                entry.force_uncompressed = true;
            }
            _ => {}
        }
    }
    split.native_libs_uncompressed = uncompress_native;
    split
}
