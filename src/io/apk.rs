//! APK serialization
//!
//! Turns a [`ModuleSplit`] into APK bytes: the manifest and resource table go
//! through a [`ResourceLinker`], entries are stored or deflated according to
//! the compression policy, and the archive is handed to an [`ApkSigner`].

use std::sync::Arc;

use crate::config::BundleConfig;
use crate::domain::module::apk_path;
use crate::domain::split::ModuleSplit;
use crate::error::{BundletoolError, Result};
use crate::io::zip::{ZipEntry, write_archive_bytes};

pub const APK_MANIFEST_PATH: &str = "AndroidManifest.xml";
pub const APK_RESOURCE_TABLE_PATH: &str = "resources.arsc";

/// Extensions of formats that are already compressed
const NO_COMPRESS_EXTENSIONS: &[&str] = &[
    "3g2", "3gp", "3gpp", "3gpp2", "aac", "amr", "awb", "gif", "imy", "jet", "jpeg", "jpg", "m4a",
    "m4v", "mid", "midi", "mkv", "mp2", "mp3", "mp4", "mpeg", "mpg", "ogg", "png", "rtttl", "smf",
    "webm", "webp", "wma", "wmv", "xmf",
];

/// Compiles the manifest and resource table of a split into APK files
///
/// Stands in for aapt2. Implementations return complete APK entries, at least
/// `AndroidManifest.xml`.
pub trait ResourceLinker: Send + Sync {
    fn link(&self, split: &ModuleSplit) -> Result<Vec<ZipEntry>>;
}

/// Signs serialized APKs
pub trait ApkSigner: Send + Sync {
    fn sign(&self, apk: Vec<u8>) -> Result<Vec<u8>>;
}

/// Linker that writes the manifest as XML text and the resource table as JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct TextResourceLinker;

impl ResourceLinker for TextResourceLinker {
    fn link(&self, split: &ModuleSplit) -> Result<Vec<ZipEntry>> {
        let manifest = split.manifest.render(&split.manifest_attributes())?;
        let mut entries = vec![ZipEntry::new(APK_MANIFEST_PATH, manifest, true)];
        if let Some(table) = split.resource_table.as_ref().filter(|t| !t.is_empty()) {
            let json = serde_json::to_vec_pretty(table)?;
            // Resource tables are memory-mapped by the platform
            entries.push(ZipEntry::new(APK_RESOURCE_TABLE_PATH, json, false));
        }
        Ok(entries)
    }
}

/// Signer that leaves APKs unsigned
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSigner;

impl ApkSigner for NoopSigner {
    fn sign(&self, apk: Vec<u8>) -> Result<Vec<u8>> {
        Ok(apk)
    }
}

/// Whether a file is stored by default because compressing it gains nothing
pub fn is_precompressed(path: &str) -> bool {
    path.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .is_some_and(|ext| NO_COMPRESS_EXTENSIONS.contains(&ext.as_str()))
}

/// Serializes splits into APK bytes
pub struct ApkSerializer<'a> {
    config: &'a BundleConfig,
    linker: &'a dyn ResourceLinker,
    signer: &'a dyn ApkSigner,
}

impl<'a> ApkSerializer<'a> {
    pub fn new(
        config: &'a BundleConfig,
        linker: &'a dyn ResourceLinker,
        signer: &'a dyn ApkSigner,
    ) -> Self {
        Self {
            config,
            linker,
            signer,
        }
    }

    /// Entries of the APK for `split`, in archive order
    pub fn apk_entries(&self, split: &ModuleSplit) -> Result<Vec<ZipEntry>> {
        let mut entries = self.linker.link(split)?;
        if !entries.iter().any(|e| e.path == APK_MANIFEST_PATH) {
            return Err(BundletoolError::ValidatorFailed {
                message: format!(
                    "Resource linker produced no {APK_MANIFEST_PATH} for module '{}'.",
                    split.module
                ),
            });
        }

        for (module_path, entry) in &split.entries {
            let Some(path) = apk_path(module_path) else {
                continue;
            };
            let compressed = !(entry.force_uncompressed
                || self.config.is_uncompressed_path(&path)
                || is_precompressed(&path));
            if entries.iter().any(|e| e.path == path) {
                return Err(BundletoolError::InvalidBundle {
                    message: format!(
                        "Module '{}' has more than one file mapped to APK path '{path}'.",
                        split.module
                    ),
                });
            }
            entries.push(ZipEntry {
                path,
                content: Arc::clone(&entry.content),
                compressed,
            });
        }
        Ok(entries)
    }

    /// Serialize and sign the APK for `split`
    pub fn serialize(&self, split: &ModuleSplit) -> Result<Vec<u8>> {
        let entries = self.apk_entries(split)?;
        let unsigned = write_archive_bytes(&entries)?;
        self.signer.sign(unsigned)
    }
}
