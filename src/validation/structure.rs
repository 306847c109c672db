//! Module layout checks

use crate::domain::bundle::AppBundle;
use crate::domain::module::{BundleModule, EntryKind};
use crate::domain::targeting::Abi;
use crate::error::{Result, bundle};

/// Checks module layout, file locations and naming
pub fn validate(bundle: &AppBundle) -> Result<()> {
    let base = bundle.base_module()?;
    for module in bundle.modules.values() {
        validate_locations(module)?;
        validate_dex_names(module)?;
        validate_native_libraries(module)?;
        if module.manifest.package != base.manifest.package {
            return Err(bundle::invalid(format!(
                "Module '{}' declares package '{}' but the base module declares '{}'.",
                module.name, module.manifest.package, base.manifest.package
            )));
        }
    }
    Ok(())
}

fn validate_locations(module: &BundleModule) -> Result<()> {
    for path in module.entries.keys() {
        if EntryKind::of(path).is_none() {
            return Err(bundle::invalid(format!(
                "Module '{}' contains file '{path}' outside of the known directories \
                 (dex, res, assets, lib, root).",
                module.name
            )));
        }
    }
    Ok(())
}

/// `classes.dex` is index 1, `classesN.dex` index N
fn dex_index(file_name: &str) -> Option<u32> {
    let number = file_name.strip_prefix("classes")?.strip_suffix(".dex")?;
    if number.is_empty() {
        return Some(1);
    }
    if number.starts_with('0') {
        return None;
    }
    number.parse().ok().filter(|n| *n >= 2)
}

fn validate_dex_names(module: &BundleModule) -> Result<()> {
    let mut indices = Vec::new();
    for path in module.entries.keys() {
        let Some(file_name) = path.strip_prefix("dex/") else {
            continue;
        };
        let index = dex_index(file_name).ok_or_else(|| {
            bundle::invalid(format!(
                "Module '{}' contains dex file '{path}' not named classes.dex, classes2.dex, ...",
                module.name
            ))
        })?;
        indices.push(index);
    }
    indices.sort_unstable();
    for (expected, index) in (1u32..).zip(&indices) {
        if *index != expected {
            let missing = if expected == 1 {
                "classes.dex".to_string()
            } else {
                format!("classes{expected}.dex")
            };
            return Err(bundle::invalid(format!(
                "Module '{}' has non-contiguous dex files: '{missing}' is missing.",
                module.name
            )));
        }
    }
    Ok(())
}

fn validate_native_libraries(module: &BundleModule) -> Result<()> {
    for path in module.entries.keys() {
        let Some(rest) = path.strip_prefix("lib/") else {
            continue;
        };
        let Some((abi, file)) = rest.split_once('/') else {
            return Err(bundle::invalid(format!(
                "Module '{}' contains native library '{path}' outside of an ABI directory.",
                module.name
            )));
        };
        if Abi::from_name(abi).is_none() {
            return Err(bundle::invalid(format!(
                "Module '{}' contains native libraries for unknown ABI '{abi}'.",
                module.name
            )));
        }
        if file.contains('/') {
            return Err(bundle::invalid(format!(
                "Module '{}' contains native library '{path}' in a nested directory.",
                module.name
            )));
        }
    }
    Ok(())
}
