//! SDK version breakpoints of split variants
//!
//! Split APKs need Android 5.0. Further variants are only worth generating
//! where the APK contents change: uncompressed native libraries from
//! Android 6.0 and uncompressed dex from Android 9.

use std::collections::BTreeSet;

use crate::domain::bundle::AppBundle;
use crate::domain::targeting::{SDK_L, SDK_M, SDK_P};
use crate::error::Result;

/// SDK versions at which a split variant starts, clamped to the bundle's range
pub fn sdk_breakpoints(bundle: &AppBundle) -> Result<BTreeSet<u32>> {
    let min_sdk = bundle.min_sdk()?;
    let max_sdk = bundle.max_sdk()?;
    let optimizations = &bundle.config.optimizations;

    let mut points = vec![SDK_L];
    if bundle.has_native_libraries() && optimizations.uncompress_native_libraries.enabled {
        points.push(SDK_M);
    }
    if bundle.has_dex() && optimizations.uncompress_dex_files.enabled {
        points.push(SDK_P);
    }

    Ok(points
        .into_iter()
        .map(|sdk| sdk.max(min_sdk))
        .filter(|sdk| max_sdk.is_none_or(|max| *sdk <= max))
        .collect())
}

/// Whether the bundle supports devices that cannot install split APKs
pub fn needs_standalones(bundle: &AppBundle) -> Result<bool> {
    Ok(bundle.min_sdk()? < SDK_L)
}
