//! bundletool - Android App Bundle splitting and variant engine
//!
//! Turns an Android App Bundle into an APK Set: per-module split APKs along
//! ABI, screen density, language and texture compression format, standalone
//! APKs for devices without split support, and universal or system APKs.
//!
//! The entry point for library users is [`commands::BuildApksManager`]; the
//! resource linker, APK signer and connected-device provider it needs are
//! injected through its constructor.

pub mod cli;
pub mod commands;
pub mod config;
pub mod device;
pub mod domain;
pub mod error;
pub mod hash;
pub mod io;
pub mod resolver;
pub mod splitters;
pub mod transaction;
pub mod ui;
pub mod validation;
pub mod variants;

#[cfg(test)]
pub mod test_fixtures;

pub use error::{BundletoolError, ErrorKind, Result};
