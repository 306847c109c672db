//! Resource table consistency checks

use crate::domain::bundle::AppBundle;
use crate::error::{Result, bundle};

/// Every file the table references exists and every `res/` file is referenced
pub fn validate(bundle: &AppBundle) -> Result<()> {
    for module in bundle.modules.values() {
        let res_files: Vec<&String> = module
            .entries
            .keys()
            .filter(|p| p.starts_with("res/"))
            .collect();

        let Some(table) = &module.resource_table else {
            if let Some(file) = res_files.first() {
                return Err(bundle::invalid(format!(
                    "Module '{}' contains resource file '{file}' but no resource table.",
                    module.name
                )));
            }
            continue;
        };

        let referenced = table.referenced_files();
        for file in &referenced {
            if !module.entries.contains_key(file) {
                return Err(bundle::invalid(format!(
                    "Resource table of module '{}' references missing file '{file}'.",
                    module.name
                )));
            }
        }
        for file in res_files {
            if !referenced.contains(file) {
                return Err(bundle::invalid(format!(
                    "Module '{}' contains resource file '{file}' not referenced by the \
                     resource table.",
                    module.name
                )));
            }
        }
    }
    Ok(())
}
