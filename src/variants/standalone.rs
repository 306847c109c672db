//! Fused APKs: standalone, universal and system
//!
//! Fused APKs hold every selected module in one APK. Standalones exist per
//! ABI and density bucket, each a variant of its own; the universal APK keeps
//! every configuration; the system APK is cut for one device.
//! Resource pinning does not apply: a fused APK is never completed by splits.

use std::collections::BTreeSet;

use crate::config::BundleConfig;
use crate::domain::module::{BundleModule, abi_of_path};
use crate::domain::split::{ModuleSplit, SplitType};
use crate::domain::targeting::{Abi, DensityBucket, Targeting, ValueTargeting};
use crate::splitters::density::table_for_bucket;
use crate::splitters::texture::entries_for_format;
use crate::splitters::{compression, retain_referenced_resources};

/// Configuration one fused APK is cut for; `None` keeps every value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FusedSlice {
    pub abi: Option<Abi>,
    pub density: Option<DensityBucket>,
}

/// Whether any resource has density-specific values
pub fn has_density_resources(module: &BundleModule) -> bool {
    module.resource_table.as_ref().is_some_and(|table| {
        table
            .entries
            .iter()
            .flat_map(|e| e.values.iter())
            .any(|v| v.qualifiers().density_bucket().is_some())
    })
}

/// Every (ABI, density) combination standalones are generated for
pub fn standalone_slices(fused: &BundleModule) -> Vec<FusedSlice> {
    let abis: Vec<Option<Abi>> = {
        let present: BTreeSet<Abi> = fused.entries.keys().filter_map(|p| abi_of_path(p)).collect();
        if present.is_empty() {
            vec![None]
        } else {
            present.into_iter().map(Some).collect()
        }
    };
    let densities: Vec<Option<DensityBucket>> = if has_density_resources(fused) {
        DensityBucket::ALL.into_iter().map(Some).collect()
    } else {
        vec![None]
    };
    abis.iter()
        .flat_map(|abi| {
            densities.iter().map(move |density| FusedSlice {
                abi: *abi,
                density: *density,
            })
        })
        .collect()
}

/// Variant targeting of the standalone for `slice`
pub fn standalone_targeting(
    slice: FusedSlice,
    slices: &[FusedSlice],
    sdk: u32,
    all_sdks: &BTreeSet<u32>,
) -> Targeting {
    let abis: BTreeSet<Abi> = slices.iter().filter_map(|s| s.abi).collect();
    let densities: BTreeSet<DensityBucket> = slices.iter().filter_map(|s| s.density).collect();
    Targeting {
        sdk_version: Some(ValueTargeting::among(sdk, all_sdks)),
        abi: slice.abi.map(|abi| ValueTargeting::among(abi, &abis)),
        screen_density: slice
            .density
            .map(|density| ValueTargeting::among(density, &densities)),
        ..Targeting::default()
    }
}

/// The fused APK of `fused` restricted to `slice`
pub fn fused_split(
    fused: &BundleModule,
    config: &BundleConfig,
    split_type: SplitType,
    slice: FusedSlice,
    targeting: Targeting,
) -> ModuleSplit {
    let mut split = ModuleSplit::master_of(fused, split_type);
    if let Some(abi) = slice.abi {
        split
            .entries
            .retain(|path, _| abi_of_path(path).is_none_or(|a| a == abi));
    }
    if let Some(bucket) = slice.density {
        let table = split
            .resource_table
            .as_ref()
            .map(|table| table_for_bucket(table, bucket));
        retain_referenced_resources(&mut split.entries, table.as_ref());
        split.resource_table = table;
    }
    if let Some(format) = config.default_texture_format() {
        split.entries = entries_for_format(fused, &split.entries, format, true);
    }
    split.apk_targeting = Targeting {
        sdk_version: None,
        ..targeting.clone()
    };
    split.variant_targeting = targeting;
    compression::apply(split, config)
}
