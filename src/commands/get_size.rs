//! Get-size command implementation
//!
//! Reports the minimum and maximum download size of an APK Set over every
//! device the (possibly partial) device spec describes. Within a variant a
//! device downloads every master APK plus one APK per split dimension, or
//! every matching language split when its languages are known.

use std::collections::BTreeMap;

use tracing::debug;

use crate::cli::GetSizeTotalArgs;
use crate::config::DeviceSpec;
use crate::device::{DeviceMatcher, select_modules};
use crate::domain::apk_set::{ApkDescription, BuildApksResult, ModuleMetadata, Variant};
use crate::domain::split::SplitType;
use crate::domain::targeting::{SplitDimension, Targeting};
use crate::error::{Result, device};
use crate::io::ApkSetArchive;

/// Download size range in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeRange {
    pub min: u64,
    pub max: u64,
}

impl SizeRange {
    fn single(size: u64) -> Self {
        Self {
            min: size,
            max: size,
        }
    }

    fn add(self, other: SizeRange) -> Self {
        Self {
            min: self.min + other.min,
            max: self.max + other.max,
        }
    }
}

fn variant_size(
    variant: &Variant,
    matcher: &DeviceMatcher<'_>,
    spec: &DeviceSpec,
    requested: &[String],
    instant: bool,
) -> Result<SizeRange> {
    let metadata: Vec<&ModuleMetadata> = variant.apk_sets.iter().map(|s| &s.module).collect();
    let modules = select_modules(&metadata, requested)?;
    let languages_known = !spec.languages().is_empty();

    let mut total = SizeRange::single(0);
    let mut groups: BTreeMap<(&str, Vec<SplitDimension>), Vec<&ApkDescription>> = BTreeMap::new();
    for set in variant
        .apk_sets
        .iter()
        .filter(|set| modules.contains(&set.module.name))
    {
        for apk in set
            .apks
            .iter()
            .filter(|apk| (apk.kind == SplitType::Instant) == instant)
            .filter(|apk| matcher.apk_matches(&apk.targeting))
        {
            let dimensions = apk.targeting.dimensions();
            let is_config_split = matches!(apk.kind, SplitType::Split | SplitType::Instant)
                && !apk.is_master
                && !dimensions.is_empty();
            if !is_config_split {
                total = total.add(SizeRange::single(apk.size));
            } else {
                groups
                    .entry((set.module.name.as_str(), dimensions))
                    .or_default()
                    .push(apk);
            }
        }
    }

    for ((_, dimensions), apks) in &groups {
        let range = if languages_known && dimensions.as_slice() == [SplitDimension::Language] {
            SizeRange::single(apks.iter().map(|a| a.size).sum())
        } else {
            SizeRange {
                min: apks.iter().map(|a| a.size).min().unwrap_or(0),
                max: apks.iter().map(|a| a.size).max().unwrap_or(0),
            }
        };
        total = total.add(range);
    }
    Ok(total)
}

/// Download size range of the APKs `spec` could need
pub fn total_size(
    toc: &BuildApksResult,
    spec: &DeviceSpec,
    requested: &[String],
    instant: bool,
) -> Result<SizeRange> {
    let matcher = DeviceMatcher::new(spec).with_default_texture_format(toc.default_texture_format);
    let candidates: Vec<&Variant> = toc
        .variants
        .iter()
        .filter(|v| {
            v.apk_sets
                .iter()
                .flat_map(|s| s.apks.iter())
                .any(|a| (a.kind == SplitType::Instant) == instant)
        })
        .collect();
    let targetings: Vec<&Targeting> = candidates.iter().map(|v| &v.targeting).collect();

    let mut range: Option<SizeRange> = None;
    for index in matcher.compatible_variants(&targetings) {
        let size = variant_size(candidates[index], &matcher, spec, requested, instant)?;
        debug!(variant = candidates[index].number, min = size.min, max = size.max, "variant size");
        range = Some(match range {
            None => size,
            Some(r) => SizeRange {
                min: r.min.min(size.min),
                max: r.max.max(size.max),
            },
        });
    }
    range.ok_or_else(|| device::incompatible("No variant of the app matches the device spec."))
}

/// Run get-size command
pub fn run(args: GetSizeTotalArgs) -> Result<()> {
    let spec = match &args.device_spec {
        Some(path) => {
            let spec = DeviceSpec::from_file(path)?;
            spec.validate()?;
            spec
        }
        None => DeviceSpec::default(),
    };
    let archive = ApkSetArchive::open(&args.apks)?;
    let range = total_size(&archive.toc, &spec, &args.modules, args.instant)?;
    println!("MIN,MAX");
    println!("{},{}", range.min, range.max);
    Ok(())
}
