//! Transaction support for atomic output
//!
//! Commands either produce their complete output or leave the file system as
//! they found it. Two shapes are provided:
//!
//! - [`AtomicFile`]: a single archive written to a temporary file next to its
//!   destination and moved into place on commit.
//! - [`Transaction`]: a group of files written into a directory, removed again
//!   (together with directories created for them) unless committed.
//!
//! ## Usage
//!
//! ```ignore
//! let mut transaction = Transaction::new();
//! transaction.create_dir_all(&output_dir)?;
//! transaction.write_file(&output_dir.join("base-master.apk"), &bytes, false)?;
//!
//! // On success:
//! transaction.commit();
//!
//! // On error (automatic via Drop if not committed):
//! // rollback happens automatically
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{Result, command, fs as fs_error};

/// A file that only appears at its destination once committed
#[derive(Debug)]
pub struct AtomicFile {
    target: PathBuf,
    /// `None` once persisted
    temp: Option<NamedTempFile>,
    /// Parent directories created for the target
    created_dirs: Vec<PathBuf>,
}

impl AtomicFile {
    /// Prepare writing `target`
    ///
    /// Fails with an output-exists error when `target` exists and `overwrite`
    /// is off. Nothing is created in that case.
    pub fn create(target: &Path, overwrite: bool) -> Result<Self> {
        if target.exists() && !overwrite {
            return Err(command::output_exists(target.display().to_string()));
        }
        if target.is_dir() {
            return Err(command::invalid(format!(
                "Output path '{}' is a directory.",
                target.display()
            )));
        }

        let parent = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let created_dirs = create_missing_dirs(&parent)?;
        let temp = NamedTempFile::new_in(&parent).map_err(|e| fs_error::write_failed(target, e))?;

        Ok(Self {
            target: target.to_path_buf(),
            temp: Some(temp),
            created_dirs,
        })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let target = &self.target;
        let temp = self
            .temp
            .as_mut()
            .ok_or_else(|| fs_error::write_failed(target, "file already committed"))?;
        temp.as_file_mut()
            .write_all(bytes)
            .map_err(|e| fs_error::write_failed(target, e))
    }

    /// Move the written file into place
    pub fn commit(mut self) -> Result<()> {
        if let Some(temp) = self.temp.take() {
            temp.persist(&self.target)
                .map_err(|e| fs_error::write_failed(&self.target, e.error))?;
        }
        self.created_dirs.clear();
        Ok(())
    }
}

impl Drop for AtomicFile {
    fn drop(&mut self) {
        // Fields drop after this body; the temporary file must go first
        drop(self.temp.take());
        remove_empty_dirs(&self.created_dirs);
    }
}

/// Files written into a directory as one unit
#[derive(Debug, Default)]
pub struct Transaction {
    created_files: Vec<PathBuf>,
    created_dirs: Vec<PathBuf>,
    committed: bool,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `dir` and its missing ancestors, tracking what was created
    pub fn create_dir_all(&mut self, dir: &Path) -> Result<()> {
        let created = create_missing_dirs(dir)?;
        self.created_dirs.extend(created);
        Ok(())
    }

    /// Write a new file, refusing to replace an existing one unless `overwrite`
    pub fn write_file(&mut self, path: &Path, bytes: &[u8], overwrite: bool) -> Result<()> {
        if path.exists() && !overwrite {
            return Err(command::output_exists(path.display().to_string()));
        }
        if let Some(parent) = path.parent() {
            self.create_dir_all(parent)?;
        }
        let existed = path.exists();
        fs::write(path, bytes).map_err(|e| fs_error::write_failed(path, e))?;
        if !existed {
            self.created_files.push(path.to_path_buf());
        }
        Ok(())
    }

    pub fn created_files(&self) -> &[PathBuf] {
        &self.created_files
    }

    /// Commit the transaction (prevent rollback)
    pub fn commit(mut self) {
        self.committed = true;
    }

    /// Remove everything this transaction created
    pub fn rollback(&mut self) {
        if self.committed {
            return;
        }
        for path in &self.created_files {
            if path.exists() {
                let _ = fs::remove_file(path);
            }
        }
        self.created_files.clear();
        remove_empty_dirs(&self.created_dirs);
        self.created_dirs.clear();
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if !self.committed {
            self.rollback();
        }
    }
}

/// Creates `dir` and returns the directories that did not exist before,
/// outermost first
fn create_missing_dirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut missing: Vec<PathBuf> = dir
        .ancestors()
        .take_while(|d| !d.as_os_str().is_empty() && !d.exists())
        .map(Path::to_path_buf)
        .collect();
    missing.reverse();
    if !missing.is_empty() {
        fs::create_dir_all(dir).map_err(|e| fs_error::write_failed(dir, e))?;
    }
    Ok(missing)
}

fn remove_empty_dirs(dirs: &[PathBuf]) {
    // Deepest first so parents are empty by the time they are reached
    let mut dirs: Vec<&PathBuf> = dirs.iter().collect();
    dirs.sort_by_key(|d| std::cmp::Reverse(d.components().count()));
    for dir in dirs {
        let is_empty = fs::read_dir(dir).is_ok_and(|mut d| d.next().is_none());
        if is_empty {
            let _ = fs::remove_dir(dir);
        }
    }
}
