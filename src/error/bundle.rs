//! Bundle-related errors

use super::BundletoolError;

/// Creates an invalid bundle error
pub fn invalid(message: impl Into<String>) -> BundletoolError {
    BundletoolError::InvalidBundle {
        message: message.into(),
    }
}

/// Creates a cyclic module dependency error
pub fn circular(chain: impl Into<String>) -> BundletoolError {
    BundletoolError::CircularDependency {
        chain: chain.into(),
    }
}
