//! Validate command implementation

use crate::cli::ValidateArgs;
use crate::error::Result;
use crate::io::load_bundle;
use crate::ui::display::display_bundle;

/// Run validate command
pub fn run(args: ValidateArgs) -> Result<()> {
    let bundle = load_bundle(&args.bundle)?;
    display_bundle(&bundle);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::write_bundle;
    use crate::test_fixtures::{BundleFixture, ModuleFixture};
    use tempfile::TempDir;

    #[test]
    fn test_validate_accepts_valid_bundle() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("app.aab");
        write_bundle(&BundleFixture::new().build(), &path, false).unwrap();
        assert!(run(ValidateArgs { bundle: path }).is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_dependency() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("app.aab");
        let bundle = BundleFixture::new()
            .module("feature", ModuleFixture::new().uses_split("missing"))
            .build();
        write_bundle(&bundle, &path, false).unwrap();
        assert!(run(ValidateArgs { bundle: path }).is_err());
    }
}
