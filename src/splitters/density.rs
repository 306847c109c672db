//! Resource splitting by screen density
//!
//! Values of one resource that differ only in their density qualifier form a
//! group. For every bucket, the value Android would load on a screen of that
//! density (exact match, else the nearest higher density, else the nearest
//! lower one) goes into the bucket's split. The default value counts as
//! mdpi unless the group has an explicit mdpi value; when it is the best
//! match the bucket needs nothing beyond the master.
//!
//! A value can be the best match for several buckets and is then copied into
//! each of their splits. `anydpi` and `nodpi` values never move.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::resource::{DensityQualifier, ResourceConfig, ResourceEntry, ResourceTable, ResourceValue};
use crate::domain::split::ModuleSplit;
use crate::domain::targeting::{
    DensityBucket, SplitDimension, Targeting, ValueTargeting, best_density_match,
};
use crate::splitters::{
    DimensionSplitter, Partition, PinnedResources, resource_files, retain_referenced_resources,
};

/// Qualifiers of a value other than its density
fn group_key(config: &ResourceConfig) -> (Option<String>, Vec<String>) {
    (config.locale.clone(), config.others.clone())
}

fn is_density_specific(value: &ResourceValue) -> bool {
    value.qualifiers().density_bucket().is_some()
}

/// Whether `value` is the value of `entry` a `bucket` screen loads
///
/// Only density-specific values can match; a default winner means the bucket
/// is served by the master.
pub fn is_best_match(entry: &ResourceEntry, value: &ResourceValue, bucket: DensityBucket) -> bool {
    let config = value.qualifiers();
    let Some(own_bucket) = config.density_bucket() else {
        return false;
    };
    let key = group_key(&config);

    let mut candidates: BTreeMap<u32, bool> = BTreeMap::new();
    let mut has_default = false;
    for sibling in &entry.values {
        let sibling_config = sibling.qualifiers();
        if group_key(&sibling_config) != key {
            continue;
        }
        match sibling_config.density {
            Some(DensityQualifier::Bucket(b)) => {
                candidates.insert(b.dpi(), true);
            }
            None => has_default = true,
            Some(DensityQualifier::Any | DensityQualifier::NoDpi) => {}
        }
    }
    if has_default {
        candidates
            .entry(DensityBucket::Mdpi.dpi())
            .or_insert(false);
    }

    best_density_match(bucket.dpi(), candidates.keys().copied())
        .is_some_and(|best| best == own_bucket.dpi() && candidates.get(&best) == Some(&true))
}

/// Table as seen by a single-density APK: each group keeps only its best value
pub fn table_for_bucket(table: &ResourceTable, bucket: DensityBucket) -> ResourceTable {
    table.filter(|entry, value| {
        if is_density_specific(value) {
            return is_best_match(entry, value, bucket);
        }
        // A default value is dropped when a density-specific sibling wins
        let config = value.qualifiers();
        if config.density.is_some() {
            return true;
        }
        let key = group_key(&config);
        !entry.values.iter().any(|sibling| {
            let sibling_config = sibling.qualifiers();
            group_key(&sibling_config) == key && is_best_match(entry, sibling, bucket)
        })
    })
}

/// Buckets at least one density-specific value is the best match for
pub fn buckets_with_content(table: &ResourceTable) -> BTreeSet<DensityBucket> {
    DensityBucket::ALL
        .into_iter()
        .filter(|bucket| {
            table.entries.iter().any(|entry| {
                entry
                    .values
                    .iter()
                    .any(|value| is_best_match(entry, value, *bucket))
            })
        })
        .collect()
}

pub struct DensitySplitter<'a> {
    pinned: &'a PinnedResources,
}

impl<'a> DensitySplitter<'a> {
    pub fn new(pinned: &'a PinnedResources) -> Self {
        Self { pinned }
    }
}

impl DimensionSplitter for DensitySplitter<'_> {
    fn dimension(&self) -> SplitDimension {
        SplitDimension::ScreenDensity
    }

    fn split(&self, mut master: ModuleSplit) -> Partition {
        let Some(table) = master.resource_table.clone() else {
            return Partition::unchanged(master);
        };
        // Defaults stay visible so a best match can fall back to them
        let splittable = table.filter(|entry, _| !self.pinned.is_pinned(entry));
        let has_density_values = splittable
            .entries
            .iter()
            .any(|entry| entry.values.iter().any(is_density_specific));
        if !has_density_values {
            return Partition::unchanged(master);
        }

        let buckets = buckets_with_content(&splittable);
        let splits = buckets
            .iter()
            .map(|bucket| {
                let split_table =
                    splittable.filter(|entry, value| is_best_match(entry, value, *bucket));
                let entries = resource_files(&master.entries, &split_table);
                let targeting = Targeting {
                    screen_density: Some(ValueTargeting::among(*bucket, &buckets)),
                    ..Targeting::default()
                };
                master.config_split(targeting, entries, Some(split_table))
            })
            .collect();

        let master_table =
            table.filter(|entry, value| self.pinned.is_pinned(entry) || !is_density_specific(value));
        retain_referenced_resources(&mut master.entries, Some(&master_table));
        master.resource_table = Some(master_table);
        Partition { master, splits }
    }
}
