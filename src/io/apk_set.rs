//! APK Set archives
//!
//! An APK Set is a zip holding `toc.json` followed by every generated APK.
//! APKs are already compressed archives, so they are stored as-is.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::domain::apk_set::{ApkDescription, BuildApksResult, TOC_PATH};
use crate::error::{BundletoolError, Result, bundle};
use crate::hash::verify_digest;
use crate::io::zip::{ZipEntry, read_archive, write_archive_bytes};
use crate::transaction::AtomicFile;

/// Serialized APK waiting to be written
#[derive(Debug, Clone)]
pub struct GeneratedApk {
    pub path: String,
    pub bytes: Arc<[u8]>,
}

/// Write the table of contents and APKs to `target` in one step
pub fn write_apk_set(
    target: &Path,
    overwrite: bool,
    toc: &BuildApksResult,
    apks: &[GeneratedApk],
) -> Result<()> {
    let mut output = AtomicFile::create(target, overwrite)?;

    let mut entries = Vec::with_capacity(apks.len() + 1);
    entries.push(ZipEntry::new(TOC_PATH, toc.to_json()?.into_bytes(), true));
    entries.extend(
        apks.iter()
            .map(|apk| ZipEntry::new(apk.path.clone(), Arc::clone(&apk.bytes), false)),
    );
    output.write_all(&write_archive_bytes(&entries)?)?;
    output.commit()?;

    info!(path = %target.display(), apks = apks.len(), "wrote APK set");
    Ok(())
}

/// A read APK Set
#[derive(Debug, Clone)]
pub struct ApkSetArchive {
    pub toc: BuildApksResult,
    files: BTreeMap<String, Arc<[u8]>>,
}

impl ApkSetArchive {
    pub fn open(path: &Path) -> Result<Self> {
        let files = read_archive(path)?;
        Self::from_files(files)
    }

    pub fn from_files(mut files: BTreeMap<String, Arc<[u8]>>) -> Result<Self> {
        let toc_bytes = files
            .remove(TOC_PATH)
            .ok_or_else(|| bundle::invalid(format!("The APK Set has no '{TOC_PATH}'.")))?;
        let json = std::str::from_utf8(&toc_bytes).map_err(|e| BundletoolError::ParseFailed {
            what: TOC_PATH.to_string(),
            reason: e.to_string(),
        })?;
        let toc = BuildApksResult::from_json(json)?;
        Ok(Self { toc, files })
    }

    /// Bytes of one APK, checked against the digest in the table of contents
    pub fn apk(&self, apk: &ApkDescription) -> Result<&[u8]> {
        let bytes = self.files.get(&apk.path).ok_or_else(|| {
            bundle::invalid(format!(
                "APK '{}' is listed in the table of contents but missing from the APK Set.",
                apk.path
            ))
        })?;
        verify_digest(&apk.path, bytes, &apk.digest)?;
        Ok(bytes)
    }
}
