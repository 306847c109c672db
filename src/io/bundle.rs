//! Reading and writing App Bundle archives
//!
//! `build-bundle` assembles modules from zips or directories; every other
//! command loads an `.aab`, sanitizes it and runs the built-in validators
//! before anything else touches it.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::domain::bundle::AppBundle;
use crate::domain::module::{BundleModule, ModuleName};
use crate::error::{Result, command, fs};
use crate::io::zip::{ZipEntry, read_archive, write_archive_bytes};
use crate::splitters::sanitizer::sanitize_native_libraries;
use crate::transaction::AtomicFile;
use crate::validation::BundleValidator;

/// Read the bundle archive at `path` without validating it
pub fn read_bundle(path: &Path) -> Result<AppBundle> {
    let entries = read_archive(path)?;
    debug!(path = %path.display(), entries = entries.len(), "read bundle archive");
    AppBundle::from_entries(entries)
}

/// Read, sanitize and validate the bundle archive at `path`
pub fn load_bundle(path: &Path) -> Result<AppBundle> {
    let bundle = read_bundle(path)?;
    let bundle = sanitize_native_libraries(&bundle);
    BundleValidator::builtin().validate(&bundle)?;
    info!(
        path = %path.display(),
        modules = bundle.modules.len(),
        "loaded bundle"
    );
    Ok(bundle)
}

/// Write `bundle` to `path`, atomically
pub fn write_bundle(bundle: &AppBundle, path: &Path, overwrite: bool) -> Result<()> {
    let entries: Vec<ZipEntry> = bundle
        .to_entries()?
        .into_iter()
        .map(|(path, content)| ZipEntry::new(path, content, true))
        .collect();
    let mut output = AtomicFile::create(path, overwrite)?;
    output.write_all(&write_archive_bytes(&entries)?)?;
    output.commit()?;
    info!(path = %path.display(), entries = entries.len(), "wrote bundle");
    Ok(())
}

/// Module name for a module zip or directory: its file name without extension
pub fn module_name_of(path: &Path) -> Result<ModuleName> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| {
            command::invalid(format!(
                "Cannot derive a module name from '{}'.",
                path.display()
            ))
        })?;
    ModuleName::new(stem)
}

/// Files of a module given as a zip or a directory
pub fn read_module_files(path: &Path) -> Result<BTreeMap<String, Arc<[u8]>>> {
    if path.is_dir() {
        read_module_directory(path)
    } else {
        read_archive(path)
    }
}

fn read_module_directory(dir: &Path) -> Result<BTreeMap<String, Arc<[u8]>>> {
    let mut files = BTreeMap::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| fs::read_failed(dir, e))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(dir)
            .map_err(|e| fs::read_failed(entry.path(), e))?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let content = std::fs::read(entry.path()).map_err(|e| fs::read_failed(entry.path(), e))?;
        files.insert(name, Arc::from(content));
    }
    Ok(files)
}

/// Parse one module from a zip or directory
pub fn read_module(path: &Path) -> Result<BundleModule> {
    let name = module_name_of(path)?;
    let files = read_module_files(path)?;
    BundleModule::from_files(name, files)
}
