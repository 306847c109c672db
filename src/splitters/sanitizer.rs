//! Native library sanitizer
//!
//! A module's `native.json` is authoritative about which ABIs it ships.
//! Libraries under a known ABI directory the configuration does not declare
//! are dropped, as are declared directories left without files, so that the
//! targeting matches the content. Unknown ABI directories are left for the
//! structure validator to report.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::warn;

use crate::domain::bundle::AppBundle;
use crate::domain::module::{BundleModule, DirectoryTargetingConfig, NATIVE_CONFIG_PATH, abi_of_path};
use crate::domain::targeting::Abi;

/// Bundle with native libraries and configurations made consistent
pub fn sanitize_native_libraries(bundle: &AppBundle) -> AppBundle {
    let mut sanitized = bundle.clone();
    for module in sanitized.modules.values_mut() {
        if module.source_files.contains_key(NATIVE_CONFIG_PATH) {
            sanitize_module(module);
        }
    }
    sanitized
}

fn sanitize_module(module: &mut BundleModule) {
    let declared = module.native_abis();
    let before = module.entries.len();
    module.entries.retain(|path, _| match abi_of_path(path) {
        Some(abi) => declared.contains(&abi),
        None => true,
    });
    let dropped = before - module.entries.len();
    if dropped > 0 {
        warn!(
            module = %module.name,
            files = dropped,
            "dropped native libraries for ABIs missing from the native configuration"
        );
    }

    let present: BTreeSet<Abi> = module
        .entries
        .keys()
        .filter_map(|p| abi_of_path(p))
        .collect();
    let Some(config) = &module.native_config else {
        return;
    };
    let directory: Vec<_> = config
        .directory
        .iter()
        .filter(|d| {
            d.targeting
                .abi
                .as_ref()
                .is_none_or(|t| t.values.iter().any(|abi| present.contains(abi)))
        })
        .cloned()
        .collect();
    if directory.len() == config.directory.len() {
        return;
    }

    let sanitized = DirectoryTargetingConfig { directory };
    if let Ok(json) = serde_json::to_vec_pretty(&sanitized) {
        module
            .source_files
            .insert(NATIVE_CONFIG_PATH.to_string(), Arc::from(json));
    }
    module.native_config = Some(sanitized);
}
