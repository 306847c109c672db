//! Compatibility of a bundle with the build options and the target device
//!
//! [`validate_options`] runs before the bundle is opened; [`validate_device`]
//! runs once both the bundle and the device spec are known. Neither touches
//! the output path.

use std::collections::BTreeSet;

use crate::config::{BuildApksOptions, BuildMode, DeviceSpec};
use crate::domain::bundle::AppBundle;
use crate::domain::targeting::{Abi, SDK_L};
use crate::error::{Result, command, device};

/// Rejects conflicting or incomplete flag combinations
pub fn validate_options(options: &BuildApksOptions) -> Result<()> {
    if options.mode == BuildMode::Universal && options.device_spec.is_some() {
        return Err(command::invalid(
            "Optimizing for device spec is not possible when running with 'universal' mode flag.",
        ));
    }
    if options.mode == BuildMode::Universal && options.connected_device {
        return Err(command::invalid(
            "Optimizing for connected device is not possible when running with 'universal' mode \
             flag.",
        ));
    }
    if options.mode == BuildMode::System {
        match &options.device_spec {
            Some(spec) => validate_system_device(spec)?,
            None if !options.connected_device => {
                return Err(command::invalid(
                    "Device spec must be provided when running with 'system' mode flag.",
                ));
            }
            None => {}
        }
    }
    if options.device_spec.is_some() && options.connected_device {
        return Err(command::invalid(
            "Cannot use both --device-spec and --connected-device.",
        ));
    }
    let targets_device = options.device_spec.is_some() || options.connected_device;
    if !options.modules.is_empty() && !targets_device && options.mode != BuildMode::Universal {
        return Err(command::invalid(
            "Modules can be only set when running with 'universal' mode flag or when \
             optimizing for a device.",
        ));
    }
    Ok(())
}

/// System APKs are built for exactly one ABI and density
pub fn validate_system_device(spec: &DeviceSpec) -> Result<()> {
    if spec.supported_abis.is_empty() {
        return Err(command::invalid(
            "Device spec must have supportedAbis set when running with 'system' mode flag.",
        ));
    }
    if spec.screen_density.is_none() {
        return Err(command::invalid(
            "Device spec must have screenDensity set when running with 'system' mode flag.",
        ));
    }
    Ok(())
}

/// Rejects devices the bundle cannot be installed on
pub fn validate_device(bundle: &AppBundle, spec: &DeviceSpec) -> Result<()> {
    if let Some(sdk) = spec.sdk_version {
        validate_sdk(bundle, sdk)?;
    }
    validate_abis(bundle, &spec.supported_abis)
}

fn validate_sdk(bundle: &AppBundle, device_sdk: u32) -> Result<()> {
    let min_sdk = bundle.min_sdk()?;
    let max_sdk = bundle.max_sdk()?;

    if max_sdk.is_some_and(|max| max < SDK_L) && device_sdk >= SDK_L {
        return Err(device::incompatible(
            "App Bundle targets pre-L devices, but the device has SDK version higher or equal \
             to L.",
        ));
    }
    if min_sdk >= SDK_L && device_sdk < SDK_L {
        return Err(device::incompatible(
            "App Bundle targets L+ devices, but the device has SDK version lower than L.",
        ));
    }
    if let Some(max) = max_sdk.filter(|max| device_sdk > *max) {
        return Err(device::incompatible(format!(
            "Max SDK version of the App Bundle is lower than SDK version of the device \
             ({max} < {device_sdk})."
        )));
    }
    if device_sdk < min_sdk {
        return Err(device::incompatible(format!(
            "App Bundle targets at least SDK version {min_sdk}, but the device has SDK version \
             {device_sdk}."
        )));
    }
    Ok(())
}

fn validate_abis(bundle: &AppBundle, device_abis: &[Abi]) -> Result<()> {
    let app_abis = bundle.native_abis();
    if device_abis.is_empty() || app_abis.is_empty() {
        return Ok(());
    }
    let device_set: BTreeSet<Abi> = device_abis.iter().copied().collect();
    if device_set.is_disjoint(&app_abis) {
        let device_list: Vec<&str> = device_abis.iter().map(|a| a.as_str()).collect();
        let app_list: Vec<&str> = app_abis.iter().map(|a| a.as_str()).collect();
        return Err(device::incompatible(format!(
            "The app doesn't support ABI architectures of the device. Device ABIs: [{}], app \
             ABIs: [{}].",
            device_list.join(", "),
            app_list.join(", ")
        )));
    }
    Ok(())
}
