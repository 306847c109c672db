//! Module splitting
//!
//! A module starts as one master split holding all of its entries and its
//! whole resource table. Each enabled [`DimensionSplitter`] then runs in
//! canonical order (ABI, screen density, language, texture compression
//! format) and moves the content of its dimension out of the master into
//! config splits. Code and untargeted assets never move.
//!
//! ```text
//! master ─abi─▶ master' + [x86, arm64_v8a]
//!        ─density─▶ master'' + [ldpi, ..., xxxhdpi]
//!        ─language─▶ ...
//! ```

pub mod abi;
pub mod compression;
pub mod density;
pub mod language;
pub mod pinning;
pub mod sanitizer;
pub mod texture;

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::BundleConfig;
use crate::domain::module::{BundleModule, ModuleEntry};
use crate::domain::resource::ResourceTable;
use crate::domain::split::{ModuleSplit, SplitType};
use crate::domain::targeting::{SplitDimension, Targeting};

pub use abi::AbiSplitter;
pub use density::DensitySplitter;
pub use language::LanguageSplitter;
pub use pinning::PinnedResources;
pub use texture::TextureSplitter;

/// Master split left after one splitter ran, and the config splits it produced
#[derive(Debug, Clone)]
pub struct Partition {
    pub master: ModuleSplit,
    pub splits: Vec<ModuleSplit>,
}

impl Partition {
    /// Nothing moved out of the master
    pub fn unchanged(master: ModuleSplit) -> Self {
        Self {
            master,
            splits: Vec::new(),
        }
    }
}

/// Moves the content of one dimension from a master split into config splits
pub trait DimensionSplitter {
    fn dimension(&self) -> SplitDimension;

    fn split(&self, master: ModuleSplit) -> Partition;
}

fn splitters_for<'a>(
    module: &'a BundleModule,
    config: &'a BundleConfig,
    pinned: &'a PinnedResources,
) -> Vec<Box<dyn DimensionSplitter + 'a>> {
    SplitDimension::ORDER
        .into_iter()
        .filter(|dimension| config.is_enabled(*dimension))
        .map(|dimension| -> Box<dyn DimensionSplitter + 'a> {
            match dimension {
                SplitDimension::Abi => Box::new(AbiSplitter),
                SplitDimension::ScreenDensity => Box::new(DensitySplitter::new(pinned)),
                SplitDimension::Language => Box::new(LanguageSplitter::new(module, pinned)),
                SplitDimension::TextureCompressionFormat => Box::new(TextureSplitter::new(
                    module,
                    config.suffix_stripping_enabled(),
                    config.default_texture_format(),
                )),
            }
        })
        .collect()
}

/// Split one module for one variant
///
/// The master split comes first, then config splits in dimension order and,
/// within a dimension, in value order.
pub fn split_module(
    module: &BundleModule,
    config: &BundleConfig,
    variant_targeting: &Targeting,
    split_type: SplitType,
) -> Vec<ModuleSplit> {
    let pinned = PinnedResources::new(config, &module.manifest);
    let mut master = ModuleSplit::master_of(module, split_type);
    master.variant_targeting = variant_targeting.clone();

    let mut config_splits = Vec::new();
    for splitter in splitters_for(module, config, &pinned) {
        let partition = splitter.split(master);
        debug!(
            module = %module.name,
            dimension = %splitter.dimension(),
            splits = partition.splits.len(),
            "applied splitter"
        );
        master = partition.master;
        config_splits.extend(partition.splits);
    }

    std::iter::once(master)
        .chain(config_splits)
        .map(|split| compression::apply(split, config))
        .collect()
}

/// Entries of `source` holding the files referenced by `table`
pub(crate) fn resource_files(
    source: &BTreeMap<String, ModuleEntry>,
    table: &ResourceTable,
) -> BTreeMap<String, ModuleEntry> {
    table
        .referenced_files()
        .into_iter()
        .filter_map(|file| source.get(&file).map(|entry| (file, entry.clone())))
        .collect()
}

/// Drops `res/` entries that `table` no longer references
pub(crate) fn retain_referenced_resources(
    entries: &mut BTreeMap<String, ModuleEntry>,
    table: Option<&ResourceTable>,
) {
    let referenced = table.map(ResourceTable::referenced_files).unwrap_or_default();
    entries.retain(|path, _| !path.starts_with("res/") || referenced.contains(path));
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::domain::targeting::{Abi, ValueTargeting};
    use crate::test_fixtures::{BundleFixture, file_entry, ldpi_hdpi_icon, resource_table, text_entry};

    fn split_base(fixture: BundleFixture) -> Vec<ModuleSplit> {
        let bundle = fixture.build();
        let base = bundle.base_module().unwrap();
        split_module(base, &bundle.config, &Targeting::default(), SplitType::Split)
    }

    fn suffixes(splits: &[ModuleSplit]) -> Vec<String> {
        splits.iter().map(ModuleSplit::suffix).collect()
    }

    #[test]
    fn test_master_first_then_dimension_order() {
        let table = resource_table(vec![
            file_entry(
                0x7f01_0001,
                "drawable",
                "icon",
                &[
                    ("", "res/drawable/icon.png"),
                    ("xhdpi", "res/drawable-xhdpi/icon.png"),
                ],
            ),
            text_entry(0x7f02_0001, "string", "title", &[("", "Title"), ("fr", "Titre")]),
        ]);
        let splits = split_base(
            BundleFixture::new().base(|m| m.resources(table).file("lib/x86/libfoo.so", b"so")),
        );
        assert_eq!(
            suffixes(&splits),
            vec!["master", "x86", "tvdpi", "hdpi", "xhdpi", "xxhdpi", "xxxhdpi", "fr"]
        );
        assert!(splits[0].is_master);
        assert!(splits[1..].iter().all(|s| !s.is_master));
    }

    #[test]
    fn test_entries_cover_module() {
        let config = BundleConfig::from_json(
            r#"{"optimizations":{"split_dimensions":[{"dimension":"TEXTURE_COMPRESSION_FORMAT"}]}}"#,
        )
        .unwrap();
        let table = resource_table(vec![
            ldpi_hdpi_icon().entries[0].clone(),
            file_entry(
                0x7f03_0001,
                "raw",
                "intro",
                &[
                    ("", "res/raw/intro.txt"),
                    ("de", "res/raw-de/intro.txt"),
                    ("fr", "res/raw-fr/intro.txt"),
                ],
            ),
        ]);
        let bundle = BundleFixture::new()
            .config(config)
            .base(|m| {
                m.resources(table)
                    .file("lib/x86/libfoo.so", b"so")
                    .file("lib/arm64-v8a/libfoo.so", b"so")
                    .file("assets/data.bin", b"data")
                    .file("assets/textures#tcf_astc/a.ktx", b"astc")
                    .file("assets/textures#tcf_etc1/a.ktx", b"etc1")
                    .file("assets/textures/a.ktx", b"fallback")
            })
            .build();
        let base = bundle.base_module().unwrap();
        let splits = split_module(base, &bundle.config, &Targeting::default(), SplitType::Split);

        let covered: BTreeSet<&String> = splits.iter().flat_map(|s| s.entries.keys()).collect();
        let expected: BTreeSet<&String> = base.entries.keys().collect();
        assert_eq!(covered, expected);
        assert!(splits[0].entries.contains_key("dex/classes.dex"));
        assert!(splits[0].entries.contains_key("assets/data.bin"));
        assert!(!splits[0].entries.keys().any(|p| p.starts_with("lib/")));

        // A density value may serve several buckets; everything else has one home
        let mut owner: BTreeMap<&String, String> = BTreeMap::new();
        for split in splits.iter().filter(|s| s.apk_targeting.screen_density.is_none()) {
            for path in split.entries.keys() {
                if let Some(previous) = owner.insert(path, split.suffix()) {
                    panic!("{path} is in both {previous} and {}", split.suffix());
                }
            }
        }
        let suffixes = suffixes(&splits);
        for expected in ["x86", "arm64_v8a", "de", "fr", "etc1", "astc"] {
            assert!(suffixes.iter().any(|s| s == expected), "{suffixes:?}");
        }
        for split in splits.iter().filter(|s| s.apk_targeting.screen_density.is_some()) {
            assert!(split.entries.keys().all(|p| !splits[0].entries.contains_key(p)));
        }
    }

    #[test]
    fn test_disabled_dimension_keeps_content_in_master() {
        let config = BundleConfig::from_json(
            r#"{"optimizations":{"split_dimensions":[{"dimension":"ABI","negate":true},{"dimension":"SCREEN_DENSITY","negate":true}]}}"#,
        )
        .unwrap();
        let splits = split_base(
            BundleFixture::new()
                .config(config)
                .base(|m| m.resources(ldpi_hdpi_icon()).file("lib/x86/libfoo.so", b"so")),
        );
        assert_eq!(splits.len(), 1);
        assert!(splits[0].entries.contains_key("lib/x86/libfoo.so"));
        assert!(splits[0].entries.contains_key("res/drawable-hdpi/icon.png"));
    }

    #[test]
    fn test_variant_targeting_is_propagated() {
        let bundle = BundleFixture::new()
            .base(|m| m.file("lib/x86/libfoo.so", b"so"))
            .build();
        let variant = Targeting {
            sdk_version: Some(ValueTargeting::single(23)),
            ..Targeting::default()
        };
        let splits = split_module(
            bundle.base_module().unwrap(),
            &bundle.config,
            &variant,
            SplitType::Split,
        );
        assert!(splits.iter().all(|s| s.variant_targeting == variant));
        let abi_split = &splits[1];
        assert_eq!(
            abi_split.apk_targeting.abi.as_ref().unwrap().value(),
            Some(&Abi::X86)
        );
    }
}
