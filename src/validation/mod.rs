//! Bundle validation
//!
//! A [`BundleValidator`] runs an ordered list of [`SubValidator`]s over an
//! [`AppBundle`]: the built-in checks first, then any extension validators
//! registered by the caller. The first failure aborts and is returned as is.
//!
//! Built-in checks:
//! - [`structure`]: module layout, file locations, dex and native library naming
//! - [`dependencies`]: `uses-split` references, delivery constraints, cycles
//! - [`sdk`]: SDK version ranges
//! - [`resources`]: resource table and `res/` files agree
//! - [`texture`]: fallbacks for texture-compression-format targeted assets
//!
//! [`compatibility`] checks the bundle against build options and the device.

pub mod compatibility;
pub mod dependencies;
pub mod resources;
pub mod sdk;
pub mod structure;
pub mod texture;

use std::fmt;

use tracing::debug;

use crate::domain::bundle::AppBundle;
use crate::error::Result;

/// A bundle-level check
pub type SubValidator = Box<dyn Fn(&AppBundle) -> Result<()> + Send + Sync>;

/// Ordered list of named bundle checks
#[derive(Default)]
pub struct BundleValidator {
    validators: Vec<(String, SubValidator)>,
}

impl fmt::Debug for BundleValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.validators.iter().map(|(name, _)| name))
            .finish()
    }
}

impl BundleValidator {
    /// Validator running only the built-in checks
    pub fn builtin() -> Self {
        let mut validator = Self::default();
        validator.push("structure", Box::new(structure::validate));
        validator.push("dependencies", Box::new(dependencies::validate));
        validator.push("sdk", Box::new(sdk::validate));
        validator.push("resources", Box::new(resources::validate));
        validator.push("texture compression format", Box::new(texture::validate));
        validator
    }

    /// Append a check; it runs after every check added before it
    pub fn push(&mut self, name: impl Into<String>, validator: SubValidator) {
        self.validators.push((name.into(), validator));
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Run every check in order, stopping at the first failure
    pub fn validate(&self, bundle: &AppBundle) -> Result<()> {
        for (name, validator) in &self.validators {
            debug!(validator = %name, "running bundle validator");
            validator(bundle)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::BundletoolError;
    use crate::test_fixtures::BundleFixture;

    #[test]
    fn test_builtin_accepts_minimal_bundle() {
        let bundle = BundleFixture::new().build();
        assert!(BundleValidator::builtin().validate(&bundle).is_ok());
    }

    #[test]
    fn test_extension_error_propagates_intact() {
        let bundle = BundleFixture::new().build();
        let mut validator = BundleValidator::builtin();
        validator.push(
            "custom",
            Box::new(|_| {
                Err(BundletoolError::ValidatorFailed {
                    message: "Custom policy violated in module 'base'.".to_string(),
                })
            }),
        );
        match validator.validate(&bundle) {
            Err(BundletoolError::ValidatorFailed { message }) => {
                assert_eq!(message, "Custom policy violated in module 'base'.");
            }
            other => panic!("Expected ValidatorFailed error, got {other:?}"),
        }
    }

    #[test]
    fn test_first_failure_stops_later_validators() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut validator = BundleValidator::default();
        validator.push(
            "failing",
            Box::new(|_| Err(crate::error::bundle::invalid("first"))),
        );
        let counter = Arc::clone(&calls);
        validator.push(
            "counting",
            Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        );
        assert!(validator.validate(&BundleFixture::new().build()).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(validator.len(), 2);
    }
}
