//! APK paths inside the APK Set
//!
//! | Split type | Path |
//! |---|---|
//! | split | `splits/<module>-<suffix>.apk` |
//! | instant | `instant/<module>-<suffix>.apk` |
//! | standalone | `standalones/standalone-<suffix>.apk` |
//! | universal | `universal.apk` |
//! | system | `system/system.apk` |
//!
//! A name already taken by an earlier variant gets `_2`, `_3`, ... appended.

use std::collections::BTreeMap;

use crate::domain::split::{ModuleSplit, SplitType};

/// Hands out unique APK paths in allocation order
#[derive(Debug, Default)]
pub struct ApkPathAllocator {
    used: BTreeMap<String, u32>,
}

fn base_name(split: &ModuleSplit) -> String {
    match split.split_type {
        SplitType::Split => format!("splits/{}-{}", split.module, split.suffix()),
        SplitType::Instant => format!("instant/{}-{}", split.module, split.suffix()),
        SplitType::Standalone if split.apk_targeting.dimensions().is_empty() => {
            "standalones/standalone".to_string()
        }
        SplitType::Standalone => format!("standalones/standalone-{}", split.suffix()),
        SplitType::Universal => "universal".to_string(),
        SplitType::System => "system/system".to_string(),
    }
}

impl ApkPathAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, split: &ModuleSplit) -> String {
        let name = base_name(split);
        let count = self.used.entry(name.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            format!("{name}.apk")
        } else {
            format!("{name}_{count}.apk")
        }
    }
}
