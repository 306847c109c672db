//! Configuration handling for bundletool
//!
//! This module contains data structures for:
//! - `BundleConfig.json` - Bundle configuration (split dimensions, pinning, compression)
//! - `--device-spec` JSON - Target device configuration
//! - `build-apks` options

pub mod bundle;
pub mod device_spec;
pub mod options;

// Re-export commonly used types
pub use bundle::{BUNDLE_CONFIG_PATH, BundleConfig};
pub use device_spec::DeviceSpec;
pub use options::{BuildApksOptions, BuildMode};
