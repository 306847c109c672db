//! Topological sort of module dependencies using depth-first search (DFS)
//!
//! ## Algorithm
//!
//! Uses DFS with three-color marking to detect cycles and produce ordering:
//!
//! 1. **WHITE** (unvisited): Module hasn't been processed
//! 2. **GRAY** (on the current path): Module is in the current recursion stack
//! 3. **BLACK** (done): Module and all its dependencies have been processed
//!
//! Reaching a GRAY module means the current path closes a cycle; the path from
//! that module onwards is reported as the cycle chain (`a -> b -> a`).

use std::collections::BTreeSet;

use crate::error::{Result, bundle};
use crate::resolver::graph::{DependencyGraph, validate_dependencies};

struct TopoSortContext<'a> {
    deps: &'a DependencyGraph,
    /// BLACK modules
    visited: BTreeSet<String>,
    /// GRAY modules, in path order
    path: Vec<String>,
    result: Vec<String>,
}

/// Order modules so that every module comes after its dependencies
///
/// Independent modules are emitted in name order.
///
/// # Errors
///
/// Returns an invalid bundle error for unknown dependencies and a circular
/// dependency error listing the cycle.
///
/// # Example
///
/// ```text
/// Dependencies:
///   camera depends on media
///   media depends on base
///
/// Result: [base, media, camera]
/// ```
pub fn topological_sort(deps: &DependencyGraph) -> Result<Vec<String>> {
    validate_dependencies(deps)?;

    let mut ctx = TopoSortContext {
        deps,
        visited: BTreeSet::new(),
        path: Vec::new(),
        result: Vec::new(),
    };
    for name in deps.keys() {
        if !ctx.visited.contains(name) {
            topo_dfs(&mut ctx, name)?;
        }
    }
    Ok(ctx.result)
}

fn topo_dfs(ctx: &mut TopoSortContext<'_>, name: &str) -> Result<()> {
    if let Some(start) = ctx.path.iter().position(|n| n == name) {
        let mut chain = ctx.path[start..].to_vec();
        chain.push(name.to_string());
        return Err(bundle::circular(chain.join(" -> ")));
    }
    if ctx.visited.contains(name) {
        return Ok(());
    }

    ctx.path.push(name.to_string());
    if let Some(module_deps) = ctx.deps.get(name) {
        for dep_name in module_deps {
            topo_dfs(ctx, dep_name)?;
        }
    }
    ctx.path.pop();

    ctx.visited.insert(name.to_string());
    // Post-order: dependencies first
    ctx.result.push(name.to_string());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BundletoolError;

    fn graph(edges: &[(&str, &[&str])]) -> DependencyGraph {
        edges
            .iter()
            .map(|(name, deps)| {
                (
                    (*name).to_string(),
                    deps.iter().map(|d| (*d).to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_topological_sort_simple() {
        let deps = graph(&[("camera", &["base"]), ("base", &[])]);
        let result = topological_sort(&deps).unwrap();
        assert_eq!(result, vec!["base", "camera"]);
    }

    #[test]
    fn test_topological_sort_transitive_deps() {
        let deps = graph(&[
            ("a_feature", &["b_feature"]),
            ("b_feature", &["c_feature"]),
            ("c_feature", &[]),
        ]);
        let result = topological_sort(&deps).unwrap();
        assert_eq!(result, vec!["c_feature", "b_feature", "a_feature"]);
    }

    #[test]
    fn test_topological_sort_independent_in_name_order() {
        let deps = graph(&[("zeta", &[]), ("alpha", &[]), ("base", &[])]);
        let result = topological_sort(&deps).unwrap();
        assert_eq!(result, vec!["alpha", "base", "zeta"]);
    }

    #[test]
    fn test_topological_sort_cycle_chain() {
        let deps = graph(&[
            ("base", &[]),
            ("feature1", &["feature2"]),
            ("feature2", &["feature3"]),
            ("feature3", &["feature1"]),
        ]);
        let result = topological_sort(&deps);
        match result {
            Err(BundletoolError::CircularDependency { chain }) => {
                assert_eq!(chain, "feature1 -> feature2 -> feature3 -> feature1");
            }
            other => panic!("Expected CircularDependency error, got {other:?}"),
        }
    }
}
