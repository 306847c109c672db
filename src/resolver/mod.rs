//! Module dependency resolution
//!
//! This module handles:
//! - Building the `uses-split` dependency graph of a bundle's modules
//! - Validating that every dependency names an existing module
//! - Topological sorting so dependencies come before their dependents
//! - Circular dependency detection

pub mod graph;
pub mod sort;

pub use graph::{DependencyGraph, build_dependency_list, transitive_closure, validate_dependencies};
pub use sort::topological_sort;
