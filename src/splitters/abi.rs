//! Native library splitting by ABI

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::module::{ModuleEntry, abi_of_path};
use crate::domain::split::ModuleSplit;
use crate::domain::targeting::{Abi, SplitDimension, Targeting, ValueTargeting};
use crate::splitters::{DimensionSplitter, Partition};

/// Moves each `lib/<abi>/` directory into its own split
#[derive(Debug, Clone, Copy, Default)]
pub struct AbiSplitter;

impl DimensionSplitter for AbiSplitter {
    fn dimension(&self) -> SplitDimension {
        SplitDimension::Abi
    }

    fn split(&self, mut master: ModuleSplit) -> Partition {
        let mut by_abi: BTreeMap<Abi, BTreeMap<String, ModuleEntry>> = BTreeMap::new();
        let mut kept = BTreeMap::new();
        for (path, entry) in std::mem::take(&mut master.entries) {
            match abi_of_path(&path) {
                Some(abi) => {
                    by_abi.entry(abi).or_default().insert(path, entry);
                }
                None => {
                    kept.insert(path, entry);
                }
            }
        }
        master.entries = kept;

        let universe: BTreeSet<Abi> = by_abi.keys().copied().collect();
        let splits = by_abi
            .into_iter()
            .map(|(abi, entries)| {
                let targeting = Targeting {
                    abi: Some(ValueTargeting::among(abi, &universe)),
                    ..Targeting::default()
                };
                master.config_split(targeting, entries, None)
            })
            .collect();
        Partition { master, splits }
    }
}
