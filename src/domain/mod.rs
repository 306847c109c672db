//! Domain models for bundletool
//!
//! Pure data types for bundles, modules, targeting and generated APKs. They
//! carry the invariants of the App Bundle format but no I/O.

pub mod apk_set;
pub mod bundle;
pub mod manifest;
pub mod module;
pub mod resource;
pub mod split;
pub mod targeting;

pub use apk_set::{ApkDescription, ApkSet, BuildApksResult, ModuleMetadata, TOC_PATH, Variant};
pub use bundle::AppBundle;
pub use manifest::{AndroidManifest, Delivery};
pub use module::{BundleModule, ModuleEntry, ModuleName};
pub use resource::{ResourceId, ResourceTable};
pub use split::{ModuleSplit, SplitType};
pub use targeting::{Abi, DensityBucket, SplitDimension, Targeting, TextureCompressionFormat};
