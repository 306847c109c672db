//! Zip archive primitives
//!
//! Archives are read fully into memory as a `BTreeMap` of entry paths to
//! shared bytes, and written with fixed timestamps so identical input always
//! produces identical archives.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use std::sync::Arc;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use crate::error::{BundletoolError, Result, fs};

/// One file to be written into an archive
#[derive(Debug, Clone)]
pub struct ZipEntry {
    pub path: String,
    pub content: Arc<[u8]>,
    pub compressed: bool,
}

impl ZipEntry {
    pub fn new(path: impl Into<String>, content: impl Into<Arc<[u8]>>, compressed: bool) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            compressed,
        }
    }
}

/// Read every file entry of the archive at `path`
pub fn read_archive(path: &Path) -> Result<BTreeMap<String, Arc<[u8]>>> {
    if !path.is_file() {
        return Err(fs::not_found(path));
    }
    let file = File::open(path).map_err(|e| fs::read_failed(path, e))?;
    read_entries(file).map_err(|e| match e {
        BundletoolError::Zip { message } => BundletoolError::Zip {
            message: format!("{}: {message}", path.display()),
        },
        other => other,
    })
}

/// Read every file entry of an in-memory archive
pub fn read_archive_bytes(bytes: &[u8]) -> Result<BTreeMap<String, Arc<[u8]>>> {
    read_entries(Cursor::new(bytes))
}

fn read_entries<R: Read + Seek>(reader: R) -> Result<BTreeMap<String, Arc<[u8]>>> {
    let mut archive = ZipArchive::new(reader)?;
    let mut entries = BTreeMap::new();
    for idx in 0..archive.len() {
        let mut entry = archive.by_index(idx)?;
        if entry.is_dir() {
            continue;
        }
        if entry.enclosed_name().is_none() {
            return Err(BundletoolError::Zip {
                message: format!("entry '{}' escapes the archive root", entry.name()),
            });
        }
        let name = entry.name().to_string();
        let mut data = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or_default());
        entry.read_to_end(&mut data)?;
        if entries.insert(name.clone(), Arc::from(data)).is_some() {
            return Err(BundletoolError::Zip {
                message: format!("duplicate entry '{name}'"),
            });
        }
    }
    Ok(entries)
}

fn options(compressed: bool) -> SimpleFileOptions {
    let method = if compressed {
        CompressionMethod::Deflated
    } else {
        CompressionMethod::Stored
    };
    SimpleFileOptions::default()
        .compression_method(method)
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644)
}

/// Write `entries` in the given order to `writer`
pub fn write_archive<W: Write + Seek>(writer: W, entries: &[ZipEntry]) -> Result<W> {
    let mut zip = ZipWriter::new(writer);
    for entry in entries {
        zip.start_file(entry.path.as_str(), options(entry.compressed))?;
        zip.write_all(&entry.content)?;
    }
    Ok(zip.finish()?)
}

/// Write `entries` into a new in-memory archive
pub fn write_archive_bytes(entries: &[ZipEntry]) -> Result<Vec<u8>> {
    let cursor = write_archive(Cursor::new(Vec::new()), entries)?;
    Ok(cursor.into_inner())
}

/// Compression method of each entry, for inspecting generated APKs
pub fn stored_entries(bytes: &[u8]) -> Result<BTreeMap<String, bool>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut methods = BTreeMap::new();
    for idx in 0..archive.len() {
        let entry = archive.by_index(idx)?;
        methods.insert(
            entry.name().to_string(),
            entry.compression() == CompressionMethod::Stored,
        );
    }
    Ok(methods)
}
