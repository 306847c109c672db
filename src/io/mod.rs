//! Archive input and output
//!
//! - [`zip`]: deterministic zip reading and writing
//! - [`bundle`]: App Bundle archives and module inputs of `build-bundle`
//! - [`apk`]: APK serialization with the linker and signer collaborators
//! - [`apk_set`]: APK Set archives (table of contents plus APKs)

pub mod apk;
pub mod apk_set;
pub mod bundle;
pub mod zip;

pub use apk::{ApkSerializer, ApkSigner, NoopSigner, ResourceLinker, TextResourceLinker};
pub use apk_set::{ApkSetArchive, GeneratedApk, write_apk_set};
pub use bundle::{load_bundle, read_bundle, read_module, write_bundle};
