//! Fusing modules into one
//!
//! Standalone, universal and system APKs carry several modules in a single
//! APK. Fusing merges resource tables and directory configurations, renumbers
//! dex files so they form one `classes.dex`, `classes2.dex`, ... sequence and
//! keeps the base module's manifest.

use std::collections::BTreeMap;

use tracing::debug;

use crate::domain::module::{BundleModule, DirectoryTargetingConfig, EntryKind, ModuleEntry};
use crate::error::{Result, bundle};

fn dex_path(index: usize) -> String {
    if index == 1 {
        "dex/classes.dex".to_string()
    } else {
        format!("dex/classes{index}.dex")
    }
}

/// `classes.dex` sorts before `classes2.dex`, which sorts before `classes10.dex`
fn dex_order(path: &str) -> u32 {
    path.strip_prefix("dex/classes")
        .and_then(|rest| rest.strip_suffix(".dex"))
        .map_or(u32::MAX, |n| if n.is_empty() { 1 } else { n.parse().unwrap_or(u32::MAX) })
}

fn merge_directories(
    target: &mut Option<DirectoryTargetingConfig>,
    other: Option<&DirectoryTargetingConfig>,
) {
    let Some(other) = other else {
        return;
    };
    let merged = target.get_or_insert_with(DirectoryTargetingConfig::default);
    for directory in &other.directory {
        if !merged.directory.iter().any(|d| d.path == directory.path) {
            merged.directory.push(directory.clone());
        }
    }
}

/// Merge `modules` into one module named after the first
///
/// The first module must be the base module; the others follow in the order
/// given, which decides dex numbering.
pub fn fuse_modules(modules: &[&BundleModule]) -> Result<BundleModule> {
    let Some((first, rest)) = modules.split_first() else {
        return Err(bundle::invalid("No modules to fuse."));
    };
    let mut fused = (*first).clone();
    let mut owners: BTreeMap<String, String> = fused
        .entries
        .keys()
        .map(|path| (path.clone(), first.name.to_string()))
        .collect();
    let mut dex_count = fused
        .entries
        .values()
        .filter(|e| e.kind() == Some(EntryKind::Dex))
        .count();

    for module in rest {
        let mut dex: Vec<&ModuleEntry> = module
            .entries
            .values()
            .filter(|e| e.kind() == Some(EntryKind::Dex))
            .collect();
        dex.sort_by_key(|e| dex_order(&e.path));
        for entry in dex {
            dex_count += 1;
            let path = dex_path(dex_count);
            owners.insert(path.clone(), module.name.to_string());
            fused.entries.insert(path.clone(), entry.moved_to(path));
        }

        for (path, entry) in &module.entries {
            if entry.kind() == Some(EntryKind::Dex) {
                continue;
            }
            if let Some(owner) = owners.get(path) {
                return Err(bundle::invalid(format!(
                    "Modules '{owner}' and '{}' both contain file '{path}' and cannot be fused.",
                    module.name
                )));
            }
            owners.insert(path.clone(), module.name.to_string());
            fused.entries.insert(path.clone(), entry.clone());
        }

        if let Some(table) = &module.resource_table {
            fused
                .resource_table
                .get_or_insert_with(Default::default)
                .merge(table);
        }
        merge_directories(&mut fused.native_config, module.native_config.as_ref());
        merge_directories(&mut fused.assets_config, module.assets_config.as_ref());
    }

    debug!(
        modules = modules.len(),
        entries = fused.entries.len(),
        "fused modules"
    );
    Ok(fused)
}
