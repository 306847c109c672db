//! Display functions for command summaries
//!
//! Everything here prints to stdout with `console` styling; machine-readable
//! output (like `get-size`'s CSV) is formatted by the caller.

use std::path::Path;

use console::Style;

use crate::domain::apk_set::BuildApksResult;
use crate::domain::bundle::AppBundle;

macro_rules! display_field {
    ($label:expr, $value:expr) => {
        println!("  {} {}", Style::new().bold().apply_to($label), $value);
    };
}

/// Summary of a written APK Set
pub fn display_apk_set(path: &Path, toc: &BuildApksResult) {
    println!(
        "{} {}",
        Style::new().bold().green().apply_to("Built APK Set"),
        path.display()
    );
    display_field!("Package:", toc.package_name);
    display_field!("Variants:", toc.variants.len());
    display_field!("APKs:", toc.apks().count());
}

/// Module overview of a bundle
pub fn display_bundle(bundle: &AppBundle) {
    let package = bundle.package_name().unwrap_or_default();
    println!(
        "{} {}",
        Style::new().bold().green().apply_to("Valid bundle"),
        package
    );
    for module in bundle.modules.values() {
        println!("  {}", Style::new().bold().yellow().apply_to(&module.name));
        let delivery = if module.is_install_time() {
            "install-time"
        } else {
            "on-demand"
        };
        println!(
            "    {} {}",
            Style::new().bold().apply_to("Delivery:"),
            delivery
        );
        if !module.dependencies().is_empty() {
            println!(
                "    {} {}",
                Style::new().bold().apply_to("Depends on:"),
                module.dependencies().join(", ")
            );
        }
        println!(
            "    {} {}",
            Style::new().bold().apply_to("Files:"),
            module.entries.len()
        );
        let abis = module.native_abis();
        if !abis.is_empty() {
            let names: Vec<&str> = abis.iter().map(|a| a.as_str()).collect();
            println!(
                "    {} {}",
                Style::new().bold().apply_to("ABIs:"),
                names.join(", ")
            );
        }
    }
}

/// Confirmation of a written bundle
pub fn display_written_bundle(path: &Path, modules: usize) {
    println!(
        "{} {} ({} modules)",
        Style::new().bold().green().apply_to("Built bundle"),
        path.display(),
        modules
    );
}

/// Confirmation of extracted APKs
pub fn display_extracted(paths: &[std::path::PathBuf]) {
    for path in paths {
        println!("{}", path.display());
    }
}
