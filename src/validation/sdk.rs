//! SDK version range checks

use crate::domain::bundle::AppBundle;
use crate::error::{Result, bundle};

pub fn validate(bundle: &AppBundle) -> Result<()> {
    for module in bundle.modules.values() {
        let manifest = &module.manifest;
        if manifest.min_sdk == 0 {
            return Err(bundle::invalid(format!(
                "Module '{}' declares minSdkVersion 0.",
                module.name
            )));
        }
        if let Some(max) = manifest.max_sdk.filter(|max| *max < manifest.min_sdk) {
            return Err(bundle::invalid(format!(
                "Module '{}' declares maxSdkVersion {max} lower than minSdkVersion {}.",
                module.name, manifest.min_sdk
            )));
        }
    }
    Ok(())
}
