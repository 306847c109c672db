//! Variant generation
//!
//! A variant is the set of APKs one class of devices installs. Split variants
//! start at each SDK breakpoint and hold the module splits; standalone
//! variants (one per ABI and density) serve devices that cannot install
//! splits. Variants are numbered from 0 in SDK order, standalones first.
//!
//! Per-module splitting runs on the current rayon pool.

pub mod fusing;
pub mod naming;
pub mod sdk;
pub mod standalone;

use std::collections::BTreeSet;

use rayon::prelude::*;
use tracing::info;

use crate::config::{BuildMode, DeviceSpec};
use crate::domain::bundle::AppBundle;
use crate::domain::module::BundleModule;
use crate::domain::split::{ModuleSplit, SplitType};
use crate::domain::targeting::{Targeting, ValueTargeting};
use crate::error::{Result, command};
use crate::resolver::transitive_closure;
use crate::splitters::split_module;

pub use fusing::fuse_modules;
pub use naming::ApkPathAllocator;
pub use sdk::{needs_standalones, sdk_breakpoints};
pub use standalone::FusedSlice;

/// One generated variant and its APKs, in module order
#[derive(Debug, Clone)]
pub struct GeneratedVariant {
    pub number: u32,
    pub targeting: Targeting,
    pub splits: Vec<ModuleSplit>,
}

/// What to generate
#[derive(Debug, Clone, Copy)]
pub struct VariantRequest<'a> {
    pub mode: BuildMode,
    /// Modules to fuse on top of the install-time fused modules
    pub modules: &'a [String],
    /// Target device of system APKs
    pub device: Option<&'a DeviceSpec>,
}

/// Generate every variant `request` asks for
pub fn generate_variants(
    bundle: &AppBundle,
    request: &VariantRequest<'_>,
) -> Result<Vec<GeneratedVariant>> {
    let mut variants = match request.mode {
        BuildMode::Default => {
            let mut variants = Vec::new();
            if needs_standalones(bundle)? {
                variants.extend(standalone_variants(bundle)?);
            }
            variants.extend(split_variants(bundle, true)?);
            variants
        }
        BuildMode::Standalone => standalone_variants(bundle)?,
        BuildMode::Instant => split_variants(bundle, false)?
            .into_iter()
            .map(|mut variant| {
                variant.splits.retain(|s| s.split_type == SplitType::Instant);
                variant
            })
            .filter(|variant| !variant.splits.is_empty())
            .collect(),
        BuildMode::Universal => vec![universal_variant(bundle, request.modules)?],
        BuildMode::System => {
            let device = request.device.ok_or_else(|| {
                command::invalid("Device spec must be provided when running with 'system' mode flag.")
            })?;
            vec![system_variant(bundle, request.modules, device)?]
        }
    };

    for (number, variant) in (0u32..).zip(variants.iter_mut()) {
        variant.number = number;
    }
    info!(
        mode = %request.mode,
        variants = variants.len(),
        apks = variants.iter().map(|v| v.splits.len()).sum::<usize>(),
        "generated variants"
    );
    Ok(variants)
}

/// Every SDK version a variant of this bundle starts at
fn all_sdk_levels(bundle: &AppBundle, with_standalones: bool) -> Result<BTreeSet<u32>> {
    let mut levels = sdk_breakpoints(bundle)?;
    if with_standalones {
        levels.insert(bundle.min_sdk()?);
    }
    Ok(levels)
}

fn split_variants(bundle: &AppBundle, with_split_apks: bool) -> Result<Vec<GeneratedVariant>> {
    let modules = bundle.modules_in_dependency_order()?;
    let levels = all_sdk_levels(bundle, needs_standalones(bundle)?)?;

    sdk_breakpoints(bundle)?
        .into_iter()
        .map(|sdk| {
            let targeting = Targeting {
                sdk_version: Some(ValueTargeting::among(sdk, &levels)),
                ..Targeting::default()
            };
            let per_module: Vec<Vec<ModuleSplit>> = modules
                .par_iter()
                .map(|module| module_splits(module, bundle, &targeting, with_split_apks))
                .collect();
            Ok(GeneratedVariant {
                number: 0,
                targeting,
                splits: per_module.into_iter().flatten().collect(),
            })
        })
        .collect()
}

fn module_splits(
    module: &BundleModule,
    bundle: &AppBundle,
    targeting: &Targeting,
    with_split_apks: bool,
) -> Vec<ModuleSplit> {
    let mut splits = Vec::new();
    if with_split_apks {
        splits.extend(split_module(
            module,
            &bundle.config,
            targeting,
            SplitType::Split,
        ));
    }
    if module.manifest.instant {
        splits.extend(split_module(
            module,
            &bundle.config,
            targeting,
            SplitType::Instant,
        ));
    }
    splits
}

/// Base first, then the other modules to fuse in dependency order
fn modules_to_fuse<'a>(bundle: &'a AppBundle, requested: &[String]) -> Result<Vec<&'a BundleModule>> {
    let mut names: BTreeSet<String> = bundle
        .fused_modules()
        .iter()
        .map(|m| m.name.to_string())
        .collect();
    for name in requested {
        if bundle.module(name).is_none() {
            return Err(command::invalid(format!(
                "Module '{name}' is not present in the bundle."
            )));
        }
    }
    names.extend(transitive_closure(
        &bundle.dependency_graph(),
        requested.iter().map(String::as_str),
    ));

    let mut modules: Vec<&BundleModule> = bundle
        .modules_in_dependency_order()?
        .into_iter()
        .filter(|m| names.contains(m.name.as_str()))
        .collect();
    modules.sort_by_key(|m| !m.is_base());
    Ok(modules)
}

fn standalone_variants(bundle: &AppBundle) -> Result<Vec<GeneratedVariant>> {
    let fused = fuse_modules(&modules_to_fuse(bundle, &[])?)?;
    let sdk = bundle.min_sdk()?;
    let levels = all_sdk_levels(bundle, true)?;
    let slices = standalone::standalone_slices(&fused);

    Ok(slices
        .par_iter()
        .map(|slice| {
            let targeting = standalone::standalone_targeting(*slice, &slices, sdk, &levels);
            let split = standalone::fused_split(
                &fused,
                &bundle.config,
                SplitType::Standalone,
                *slice,
                targeting.clone(),
            );
            GeneratedVariant {
                number: 0,
                targeting,
                splits: vec![split],
            }
        })
        .collect())
}

fn universal_variant(bundle: &AppBundle, modules: &[String]) -> Result<GeneratedVariant> {
    let fused = fuse_modules(&modules_to_fuse(bundle, modules)?)?;
    let targeting = Targeting {
        sdk_version: Some(ValueTargeting::single(bundle.min_sdk()?)),
        ..Targeting::default()
    };
    let split = standalone::fused_split(
        &fused,
        &bundle.config,
        SplitType::Universal,
        FusedSlice::default(),
        targeting.clone(),
    );
    Ok(GeneratedVariant {
        number: 0,
        targeting,
        splits: vec![split],
    })
}

fn system_variant(
    bundle: &AppBundle,
    modules: &[String],
    device: &DeviceSpec,
) -> Result<GeneratedVariant> {
    let fused = fuse_modules(&modules_to_fuse(bundle, modules)?)?;
    let app_abis = fused.native_abis();
    let slice = FusedSlice {
        abi: device
            .supported_abis
            .iter()
            .copied()
            .find(|abi| app_abis.contains(abi)),
        density: device
            .density_bucket()
            .filter(|_| standalone::has_density_resources(&fused)),
    };
    let sdk = device.sdk_version.unwrap_or(bundle.min_sdk()?);
    let targeting = Targeting {
        sdk_version: Some(ValueTargeting::single(sdk)),
        abi: slice.abi.map(ValueTargeting::single),
        screen_density: slice.density.map(ValueTargeting::single),
        ..Targeting::default()
    };
    let split = standalone::fused_split(
        &fused,
        &bundle.config,
        SplitType::System,
        slice,
        targeting.clone(),
    );
    Ok(GeneratedVariant {
        number: 0,
        targeting,
        splits: vec![split],
    })
}
