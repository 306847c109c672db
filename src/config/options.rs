//! Options of the `build-apks` pipeline

use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;

use crate::config::DeviceSpec;

/// Kind of APK Set to generate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum BuildMode {
    /// Split APKs for L+ devices plus standalone APKs when the app supports pre-L
    #[default]
    Default,
    /// One APK containing every module and configuration
    Universal,
    /// One fused APK for a system image, optimized for one device
    System,
    /// Standalone APKs only
    Standalone,
    /// Instant app splits only
    Instant,
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildMode::Default => "default",
            BuildMode::Universal => "universal",
            BuildMode::System => "system",
            BuildMode::Standalone => "standalone",
            BuildMode::Instant => "instant",
        };
        f.write_str(name)
    }
}

/// Inputs of one `build-apks` invocation
///
/// Required paths go through [`BuildApksOptions::new`]; everything else has a
/// default and is set with struct update syntax.
#[derive(Debug, Clone)]
pub struct BuildApksOptions {
    pub bundle_path: PathBuf,
    pub output_path: PathBuf,
    pub mode: BuildMode,
    /// Generate only the APKs this device needs
    pub device_spec: Option<DeviceSpec>,
    /// Query the device spec from the injected device provider
    pub connected_device: bool,
    /// Feature modules to include, with their dependencies
    pub modules: Vec<String>,
    pub overwrite: bool,
    /// Size of the worker pool; defaults to the available parallelism
    pub threads: Option<usize>,
}

impl BuildApksOptions {
    pub fn new(bundle_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            bundle_path: bundle_path.into(),
            output_path: output_path.into(),
            mode: BuildMode::Default,
            device_spec: None,
            connected_device: false,
            modules: Vec::new(),
            overwrite: false,
            threads: None,
        }
    }
}
