//! Command implementations for the bundletool CLI

pub mod build_apks;
pub mod build_bundle;
pub mod completions;
pub mod extract_apks;
pub mod get_size;
pub mod validate;
pub mod version;

pub use build_apks::BuildApksManager;
pub use build_bundle::{BuildBundleOptions, build_bundle};
