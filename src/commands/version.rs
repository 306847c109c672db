//! Version command implementation

use crate::domain::apk_set::TOC_PATH;
use crate::domain::targeting::SDK_L;
use crate::error::Result;

/// Version stamped into every generated APK Set
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

fn summary() -> Vec<(&'static str, String)> {
    vec![
        ("Table of contents", TOC_PATH.to_string()),
        ("Split APKs from SDK", SDK_L.to_string()),
        ("Minimum Rust", env!("CARGO_PKG_RUST_VERSION").to_string()),
        (
            "Profile",
            if cfg!(debug_assertions) {
                "debug"
            } else {
                "release"
            }
            .to_string(),
        ),
    ]
}

/// Run version command
pub fn run() -> Result<()> {
    println!("bundletool {VERSION}");
    println!();
    println!("Build info:");
    for (label, value) in summary() {
        println!("  {label}: {value}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_names_toc() {
        let summary = summary();
        assert!(summary.iter().any(|(_, v)| v == "toc.json"));
        assert!(summary.iter().any(|(label, _)| *label == "Profile"));
    }

    #[test]
    fn test_version_runs() {
        assert!(run().is_ok());
    }
}
