//! File system errors

use std::path::Path;

use super::BundletoolError;

/// Creates a file not found error
pub fn not_found(path: &Path) -> BundletoolError {
    BundletoolError::FileNotFound {
        path: path.display().to_string(),
    }
}

/// Creates a file read error
pub fn read_failed(path: &Path, reason: impl ToString) -> BundletoolError {
    BundletoolError::FileReadFailed {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Creates a file write error
pub fn write_failed(path: &Path, reason: impl ToString) -> BundletoolError {
    BundletoolError::FileWriteFailed {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}
