//! Build-bundle command implementation
//!
//! Assembles module zips or directories, an optional bundle configuration and
//! metadata files into an `.aab`. The result goes through the same validators
//! as a bundle read from disk, so a bundle with a dependency cycle is never
//! written.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::cli::BuildBundleArgs;
use crate::config::BundleConfig;
use crate::domain::bundle::AppBundle;
use crate::error::{Result, command, fs};
use crate::io::{read_module, write_bundle};
use crate::splitters::sanitizer::sanitize_native_libraries;
use crate::ui::display::display_written_bundle;
use crate::validation::BundleValidator;

/// Inputs of one `build-bundle` invocation
#[derive(Debug, Clone)]
pub struct BuildBundleOptions {
    pub modules: Vec<PathBuf>,
    pub output: PathBuf,
    pub config: Option<PathBuf>,
    /// `<namespace>/<name>:<path>` metadata declarations
    pub metadata_files: Vec<String>,
    pub overwrite: bool,
}

/// Split a `<namespace>/<name>:<path>` declaration
fn parse_metadata_file(declaration: &str) -> Result<(String, PathBuf)> {
    let invalid = || {
        command::invalid(format!(
            "Metadata file '{declaration}' must be given as '<namespace>/<name>:<path>'."
        ))
    };
    let (key, path) = declaration.split_once(':').ok_or_else(invalid)?;
    let (namespace, name) = key.split_once('/').ok_or_else(invalid)?;
    if namespace.is_empty() || name.is_empty() || path.is_empty() {
        return Err(invalid());
    }
    Ok((key.to_string(), PathBuf::from(path)))
}

fn read_metadata(declarations: &[String]) -> Result<BTreeMap<String, Arc<[u8]>>> {
    let mut metadata = BTreeMap::new();
    for declaration in declarations {
        let (key, path) = parse_metadata_file(declaration)?;
        if !path.is_file() {
            return Err(fs::not_found(&path));
        }
        let content = std::fs::read(&path).map_err(|e| fs::read_failed(&path, e))?;
        if metadata.insert(key.clone(), Arc::from(content)).is_some() {
            return Err(command::invalid(format!(
                "Metadata file '{key}' is given more than once."
            )));
        }
    }
    Ok(metadata)
}

/// Assemble and validate the bundle without writing it
pub fn assemble(options: &BuildBundleOptions) -> Result<AppBundle> {
    let modules = options
        .modules
        .iter()
        .map(|path| read_module(path))
        .collect::<Result<Vec<_>>>()?;
    let config = match &options.config {
        Some(path) => BundleConfig::from_file(path)?,
        None => BundleConfig::default(),
    };
    let metadata = read_metadata(&options.metadata_files)?;
    debug!(
        modules = modules.len(),
        metadata = metadata.len(),
        "assembling bundle"
    );

    let bundle = AppBundle::new(modules, config, metadata)?;
    BundleValidator::builtin().validate(&sanitize_native_libraries(&bundle))?;
    Ok(bundle)
}

/// Assemble, validate and write the bundle
pub fn build_bundle(options: &BuildBundleOptions) -> Result<AppBundle> {
    if options.output.exists() && !options.overwrite {
        return Err(command::output_exists(options.output.display().to_string()));
    }
    let bundle = assemble(options)?;
    write_bundle(&bundle, &options.output, options.overwrite)?;
    Ok(bundle)
}

/// Run build-bundle command
pub fn run(args: BuildBundleArgs) -> Result<()> {
    let options = BuildBundleOptions {
        modules: args.modules,
        output: args.output,
        config: args.config,
        metadata_files: args.metadata_files,
        overwrite: args.overwrite,
    };
    let bundle = build_bundle(&options)?;
    display_written_bundle(Path::new(&options.output), bundle.modules.len());
    Ok(())
}
