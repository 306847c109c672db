//! Module dependency checks
//!
//! Beyond the graph itself (known targets, no self or cyclic dependencies),
//! delivery constraints apply: the base module depends on nothing, install-time
//! modules cannot pull in on-demand modules and instant modules can only
//! depend on instant modules.

use crate::domain::bundle::AppBundle;
use crate::error::{Result, bundle};
use crate::resolver::{topological_sort, validate_dependencies};

pub fn validate(bundle: &AppBundle) -> Result<()> {
    let graph = bundle.dependency_graph();
    validate_dependencies(&graph)?;
    topological_sort(&graph)?;

    for module in bundle.modules.values() {
        if module.is_base() && !module.dependencies().is_empty() {
            return Err(bundle::invalid(format!(
                "The base module cannot declare dependencies, found: {}.",
                module.dependencies().join(", ")
            )));
        }
        for dependency in module.dependencies() {
            let Some(target) = bundle.module(dependency) else {
                continue;
            };
            if module.is_install_time() && !target.is_install_time() {
                return Err(bundle::invalid(format!(
                    "Install-time module '{}' cannot depend on on-demand module '{}'.",
                    module.name, target.name
                )));
            }
            if module.manifest.instant && !target.manifest.instant && !target.is_base() {
                return Err(bundle::invalid(format!(
                    "Instant module '{}' cannot depend on module '{}' that is not instant.",
                    module.name, target.name
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BundletoolError;
    use crate::test_fixtures::{BundleFixture, ModuleFixture};

    #[test]
    fn test_accepts_valid_graph() {
        let bundle = BundleFixture::new()
            .module("camera", ModuleFixture::new().on_demand().uses_split("base"))
            .module(
                "filters",
                ModuleFixture::new().on_demand().uses_split("camera"),
            )
            .build();
        assert!(validate(&bundle).is_ok());
    }

    #[test]
    fn test_rejects_unknown_dependency() {
        let bundle = BundleFixture::new()
            .module("camera", ModuleFixture::new().uses_split("missing"))
            .build();
        let err = validate(&bundle).unwrap_err();
        assert!(err.to_string().contains("unknown module 'missing'"));
    }

    #[test]
    fn test_rejects_cycle() {
        let bundle = BundleFixture::new()
            .module("feature1", ModuleFixture::new().uses_split("feature2"))
            .module("feature2", ModuleFixture::new().uses_split("feature1"))
            .build();
        match validate(&bundle) {
            Err(BundletoolError::CircularDependency { chain }) => {
                assert_eq!(chain, "feature1 -> feature2 -> feature1");
            }
            other => panic!("Expected CircularDependency error, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_base_dependency() {
        let bundle = BundleFixture::new()
            .base(|m| m.uses_split("camera"))
            .module("camera", ModuleFixture::new())
            .build();
        let err = validate(&bundle).unwrap_err();
        assert!(err.to_string().contains("base module cannot declare"));
    }

    #[test]
    fn test_rejects_install_time_on_on_demand() {
        let bundle = BundleFixture::new()
            .module("camera", ModuleFixture::new().on_demand())
            .module("gallery", ModuleFixture::new().uses_split("camera"))
            .build();
        let err = validate(&bundle).unwrap_err();
        assert!(
            err.to_string()
                .contains("Install-time module 'gallery' cannot depend on on-demand module 'camera'")
        );
    }

    #[test]
    fn test_rejects_instant_on_non_instant() {
        let bundle = BundleFixture::new()
            .module("camera", ModuleFixture::new().on_demand())
            .module(
                "preview",
                ModuleFixture::new().on_demand().instant().uses_split("camera"),
            )
            .build();
        let err = validate(&bundle).unwrap_err();
        assert!(err.to_string().contains("Instant module 'preview'"));
    }
}
