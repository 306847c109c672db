//! Texture compression format fallback check
//!
//! Devices supporting none of the formats an asset directory is targeted at
//! still need the assets. Each group of `#tcf_` directories must therefore
//! have an untargeted sibling with files, or, with suffix stripping, a
//! directory for the configured default format.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::bundle::AppBundle;
use crate::domain::module::BundleModule;
use crate::domain::targeting::{SplitDimension, TextureCompressionFormat, parse_path_targeting};
use crate::error::{Result, bundle};

pub fn validate(bundle: &AppBundle) -> Result<()> {
    if !bundle.config.is_enabled(SplitDimension::TextureCompressionFormat) {
        return Ok(());
    }
    let default_format = bundle.config.default_texture_format();
    for module in bundle.modules.values() {
        validate_module(module, default_format)?;
    }
    Ok(())
}

/// Formats targeted under each stripped asset directory
fn targeted_groups(module: &BundleModule) -> BTreeMap<String, BTreeSet<TextureCompressionFormat>> {
    let mut groups: BTreeMap<String, BTreeSet<TextureCompressionFormat>> = BTreeMap::new();
    let Some(config) = &module.assets_config else {
        return groups;
    };
    for directory in &config.directory {
        let Some(texture) = &directory.targeting.texture_compression_format else {
            continue;
        };
        let (stripped, _) = parse_path_targeting(&directory.path);
        groups
            .entry(stripped)
            .or_default()
            .extend(texture.values.iter().copied());
    }
    groups
}

fn validate_module(
    module: &BundleModule,
    default_format: Option<TextureCompressionFormat>,
) -> Result<()> {
    for (stripped, formats) in targeted_groups(module) {
        let has_untargeted_files = module.entries.keys().any(|path| {
            path.rsplit_once('/')
                .is_some_and(|(parent, _)| parent == stripped)
        });
        let has_default = default_format.is_some_and(|format| formats.contains(&format));
        if !has_untargeted_files && !has_default {
            let targeted: Vec<&str> = formats.iter().map(|f| f.as_str()).collect();
            return Err(bundle::invalid(format!(
                "Module '{}' has assets in '{stripped}' targeted at texture compression formats \
                 [{}] with no fallback for devices supporting none of them. Add an untargeted \
                 '{stripped}' directory or set a default suffix matching one of the formats.",
                module.name,
                targeted.join(", ")
            )));
        }
    }
    Ok(())
}
