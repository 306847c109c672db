//! Asset splitting by texture compression format
//!
//! Asset directories suffixed `#tcf_<format>` move into one split per
//! format. With suffix stripping the suffix is removed from the paths, so
//! the app reads the same path whatever format the device received.
//!
//! A stripped path may also exist as an untargeted fallback file. That file
//! leaves the master: it is dropped when a default format serves devices
//! supporting none of the formats, and otherwise moves to a fallback split
//! targeted only by alternatives.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::module::{BundleModule, ModuleEntry};
use crate::domain::split::ModuleSplit;
use crate::domain::targeting::{
    SplitDimension, Targeting, TextureCompressionFormat, ValueTargeting,
};
use crate::splitters::{DimensionSplitter, Partition};

/// Removes `#tcf_<format>` suffixes from the components of `path`
pub fn strip_texture_suffix(path: &str) -> String {
    path.split('/')
        .map(|component| match component.split_once("#tcf_") {
            Some((name, _)) => name,
            None => component,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Format the asset directory containing `path` is targeted at
pub fn texture_format_of(module: &BundleModule, path: &str) -> Option<TextureCompressionFormat> {
    let targeting = module.asset_targeting(path)?;
    targeting.texture_compression_format.as_ref()?.value().copied()
}

/// Entries as stored in an APK holding a single format
///
/// Directories of other formats are dropped. With `strip`, entries of
/// `format` lose their suffix and replace untargeted entries at the same path.
pub fn entries_for_format(
    module: &BundleModule,
    entries: &BTreeMap<String, ModuleEntry>,
    format: TextureCompressionFormat,
    strip: bool,
) -> BTreeMap<String, ModuleEntry> {
    let mut selected = BTreeMap::new();
    let mut stripped = BTreeMap::new();
    for (path, entry) in entries {
        match texture_format_of(module, path) {
            None => {
                selected.insert(path.clone(), entry.clone());
            }
            Some(f) if f == format && strip => {
                let target = strip_texture_suffix(path);
                stripped.insert(target.clone(), entry.moved_to(target));
            }
            Some(f) if f == format => {
                selected.insert(path.clone(), entry.clone());
            }
            Some(_) => {}
        }
    }
    selected.extend(stripped);
    selected
}

pub struct TextureSplitter<'a> {
    module: &'a BundleModule,
    strip_suffix: bool,
    default_format: Option<TextureCompressionFormat>,
}

impl<'a> TextureSplitter<'a> {
    pub fn new(
        module: &'a BundleModule,
        strip_suffix: bool,
        default_format: Option<TextureCompressionFormat>,
    ) -> Self {
        Self {
            module,
            strip_suffix,
            default_format,
        }
    }
}

impl DimensionSplitter for TextureSplitter<'_> {
    fn dimension(&self) -> SplitDimension {
        SplitDimension::TextureCompressionFormat
    }

    fn split(&self, mut master: ModuleSplit) -> Partition {
        let mut by_format: BTreeMap<TextureCompressionFormat, BTreeMap<String, ModuleEntry>> =
            BTreeMap::new();
        let mut kept = BTreeMap::new();
        for (path, entry) in std::mem::take(&mut master.entries) {
            match texture_format_of(self.module, &path) {
                Some(format) => {
                    let entry = if self.strip_suffix {
                        entry.moved_to(strip_texture_suffix(&path))
                    } else {
                        entry
                    };
                    by_format
                        .entry(format)
                        .or_default()
                        .insert(entry.path.clone(), entry);
                }
                None => {
                    kept.insert(path, entry);
                }
            }
        }
        let stripped: BTreeSet<&String> = by_format.values().flat_map(|e| e.keys()).collect();
        let (fallback, kept): (BTreeMap<_, _>, BTreeMap<_, _>) = kept
            .into_iter()
            .partition(|(path, _)| self.strip_suffix && stripped.contains(path));
        master.entries = kept;

        let universe: BTreeSet<TextureCompressionFormat> = by_format.keys().copied().collect();
        let mut splits: Vec<ModuleSplit> = by_format
            .into_iter()
            .map(|(format, entries)| {
                let targeting = Targeting {
                    texture_compression_format: Some(ValueTargeting::among(format, &universe)),
                    ..Targeting::default()
                };
                master.config_split(targeting, entries, None)
            })
            .collect();
        if !fallback.is_empty() && self.default_format.is_none() {
            let targeting = Targeting {
                texture_compression_format: Some(ValueTargeting::fallback(&universe)),
                ..Targeting::default()
            };
            splits.push(master.config_split(targeting, fallback, None));
        }
        Partition { master, splits }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::split::SplitType;
    use crate::test_fixtures::BundleFixture;

    fn bundle() -> crate::domain::bundle::AppBundle {
        BundleFixture::new()
            .base(|m| {
                m.file("assets/textures#tcf_astc/a.ktx", b"astc")
                    .file("assets/textures#tcf_etc1/a.ktx", b"etc1")
                    .file("assets/textures/a.ktx", b"fallback")
            })
            .build()
    }

    #[test]
    fn test_strip_texture_suffix() {
        assert_eq!(
            strip_texture_suffix("assets/textures#tcf_astc/a.ktx"),
            "assets/textures/a.ktx"
        );
        assert_eq!(strip_texture_suffix("assets/plain/a.ktx"), "assets/plain/a.ktx");
    }

    #[test]
    fn test_split_per_format() {
        let bundle = bundle();
        let base = bundle.base_module().unwrap();
        let partition = TextureSplitter::new(base, false, None)
            .split(ModuleSplit::master_of(base, SplitType::Split));

        let suffixes: Vec<String> = partition.splits.iter().map(ModuleSplit::suffix).collect();
        assert_eq!(suffixes, vec!["etc1", "astc"]);
        assert!(partition.splits[1].entries.contains_key("assets/textures#tcf_astc/a.ktx"));
        assert!(partition.master.entries.contains_key("assets/textures/a.ktx"));
    }

    #[test]
    fn test_split_with_suffix_stripping() {
        let bundle = bundle();
        let base = bundle.base_module().unwrap();
        let partition = TextureSplitter::new(base, true, None)
            .split(ModuleSplit::master_of(base, SplitType::Split));
        let astc = &partition.splits[1];
        let entry = &astc.entries["assets/textures/a.ktx"];
        assert_eq!(entry.path, "assets/textures/a.ktx");
        assert_eq!(&*entry.content, b"astc");
    }

    #[test]
    fn test_stripped_paths_are_not_shared_with_master() {
        let bundle = bundle();
        let base = bundle.base_module().unwrap();
        let partition = TextureSplitter::new(base, true, None)
            .split(ModuleSplit::master_of(base, SplitType::Split));

        let suffixes: Vec<String> = partition.splits.iter().map(ModuleSplit::suffix).collect();
        assert_eq!(suffixes, vec!["etc1", "astc", "other_tcf"]);
        assert!(!partition.master.entries.contains_key("assets/textures/a.ktx"));

        let fallback = &partition.splits[2];
        assert_eq!(&*fallback.entries["assets/textures/a.ktx"].content, b"fallback");
        let targeting = fallback.apk_targeting.texture_compression_format.as_ref().unwrap();
        assert!(targeting.values.is_empty());
        assert_eq!(
            targeting.alternatives,
            BTreeSet::from([TextureCompressionFormat::Etc1, TextureCompressionFormat::Astc])
        );

        for split in &partition.splits {
            for path in split.entries.keys() {
                assert!(
                    !partition.master.entries.contains_key(path),
                    "{path} is in master and {}",
                    split.suffix()
                );
            }
        }
    }

    #[test]
    fn test_default_format_replaces_fallback() {
        let bundle = bundle();
        let base = bundle.base_module().unwrap();
        let partition = TextureSplitter::new(base, true, Some(TextureCompressionFormat::Etc1))
            .split(ModuleSplit::master_of(base, SplitType::Split));

        let suffixes: Vec<String> = partition.splits.iter().map(ModuleSplit::suffix).collect();
        assert_eq!(suffixes, vec!["etc1", "astc"]);
        assert!(!partition.master.entries.contains_key("assets/textures/a.ktx"));
        assert_eq!(&*partition.splits[0].entries["assets/textures/a.ktx"].content, b"etc1");
    }

    #[test]
    fn test_entries_for_format() {
        let bundle = bundle();
        let base = bundle.base_module().unwrap();

        let kept = entries_for_format(base, &base.entries, TextureCompressionFormat::Etc1, true);
        assert_eq!(&*kept["assets/textures/a.ktx"].content, b"etc1");
        assert!(!kept.keys().any(|p| p.contains("#tcf_")));

        let kept = entries_for_format(base, &base.entries, TextureCompressionFormat::Etc1, false);
        assert!(kept.contains_key("assets/textures#tcf_etc1/a.ktx"));
        assert!(!kept.contains_key("assets/textures#tcf_astc/a.ktx"));
        assert_eq!(&*kept["assets/textures/a.ktx"].content, b"fallback");
    }
}
