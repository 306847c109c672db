//! Device compatibility errors

use super::BundletoolError;

/// Creates an incompatible device error
pub fn incompatible(message: impl Into<String>) -> BundletoolError {
    BundletoolError::IncompatibleDevice {
        message: message.into(),
    }
}
