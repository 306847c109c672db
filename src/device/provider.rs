//! Connected-device resolution
//!
//! Talking to a device goes through [`DeviceProvider`]; the CLI ships a
//! provider reading the spec from a file named by an environment variable and
//! one that reports no connected device.

use std::path::PathBuf;

use tracing::debug;

use crate::config::DeviceSpec;
use crate::error::{Result, command};

/// Environment variable naming a device spec that stands in for the connected device
pub const CONNECTED_DEVICE_SPEC_ENV: &str = "BUNDLETOOL_CONNECTED_DEVICE_SPEC";

/// Source of the spec of the device `--connected-device` refers to
pub trait DeviceProvider: Send + Sync {
    fn device_spec(&self) -> Result<DeviceSpec>;
}

/// Provider for a fixed, already known device
#[derive(Debug, Clone)]
pub struct StaticDeviceProvider {
    spec: DeviceSpec,
}

impl StaticDeviceProvider {
    pub fn new(spec: DeviceSpec) -> Self {
        Self { spec }
    }
}

impl DeviceProvider for StaticDeviceProvider {
    fn device_spec(&self) -> Result<DeviceSpec> {
        Ok(self.spec.clone())
    }
}

/// Provider reading the device spec file named by [`CONNECTED_DEVICE_SPEC_ENV`]
#[derive(Debug, Clone, Default)]
pub struct EnvDeviceProvider;

impl DeviceProvider for EnvDeviceProvider {
    fn device_spec(&self) -> Result<DeviceSpec> {
        let Some(path) = std::env::var_os(CONNECTED_DEVICE_SPEC_ENV).map(PathBuf::from) else {
            return Err(command::invalid("No connected devices found."));
        };
        debug!(path = %path.display(), "reading connected device spec");
        let spec = DeviceSpec::from_file(&path)?;
        spec.validate()?;
        Ok(spec)
    }
}
