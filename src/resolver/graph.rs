//! Graph building and validation for module dependencies
//!
//! The dependency graph is a map from module names to the modules they declare
//! with `<uses-split>`:
//!
//! ```text
//! BTreeMap<String, Vec<String>>
//!    ↓              ↓
//!  module_name   [dep1, dep2]
//! ```
//!
//! A `BTreeMap` keeps every traversal in name order, so results never depend
//! on the order modules were read from the archive.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::module::{BundleModule, ModuleName};
use crate::error::{Result, bundle};

/// Adjacency list of module dependencies
pub type DependencyGraph = BTreeMap<String, Vec<String>>;

/// Build the dependency list (adjacency list) of a set of modules
///
/// Modules without `uses-split` declarations get an empty list.
pub fn build_dependency_list(modules: &BTreeMap<ModuleName, BundleModule>) -> DependencyGraph {
    modules
        .iter()
        .map(|(name, module)| (name.to_string(), module.dependencies().to_vec()))
        .collect()
}

/// Validate that every dependency in the graph names a module of the graph
///
/// # Errors
///
/// Returns an invalid bundle error if a module depends on itself or on a
/// module the bundle does not contain.
pub fn validate_dependencies(deps: &DependencyGraph) -> Result<()> {
    for (name, module_deps) in deps {
        for dep_name in module_deps {
            if dep_name == name {
                return Err(bundle::invalid(format!(
                    "Module '{name}' declares a dependency on itself."
                )));
            }
            if deps.contains_key(dep_name) {
                continue;
            }
            let available: Vec<&str> = deps.keys().map(String::as_str).collect();
            return Err(bundle::invalid(format!(
                "Module '{name}' declares dependency on unknown module '{dep_name}'. \
                 Available modules: {}",
                available.join(", ")
            )));
        }
    }
    Ok(())
}

/// `roots` plus every module they transitively depend on
pub fn transitive_closure<'a>(
    deps: &DependencyGraph,
    roots: impl IntoIterator<Item = &'a str>,
) -> BTreeSet<String> {
    let mut closure = BTreeSet::new();
    let mut pending: Vec<String> = roots.into_iter().map(str::to_string).collect();
    while let Some(name) = pending.pop() {
        if !closure.insert(name.clone()) {
            continue;
        }
        if let Some(module_deps) = deps.get(&name) {
            pending.extend(module_deps.iter().cloned());
        }
    }
    closure
}
