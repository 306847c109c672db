//! Command (flag misuse) errors

use super::BundletoolError;

/// Creates an invalid command error
pub fn invalid(message: impl Into<String>) -> BundletoolError {
    BundletoolError::InvalidCommand {
        message: message.into(),
    }
}

/// Creates an error for an output file that already exists
pub fn output_exists(path: impl Into<String>) -> BundletoolError {
    BundletoolError::OutputExists { path: path.into() }
}
