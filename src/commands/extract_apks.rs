//! Extract-apks command implementation
//!
//! Copies the APKs a device needs out of an APK Set. Files are written through
//! a [`Transaction`], so a failure part way leaves the output directory as it
//! was.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::cli::ExtractApksArgs;
use crate::config::DeviceSpec;
use crate::device::select_apks;
use crate::error::Result;
use crate::io::ApkSetArchive;
use crate::transaction::Transaction;
use crate::ui::display::display_extracted;

/// Extract the APKs `spec` needs into `output_dir`, returning the written paths
pub fn extract_apks(
    archive: &ApkSetArchive,
    spec: &DeviceSpec,
    modules: &[String],
    instant: bool,
    output_dir: &Path,
    overwrite: bool,
) -> Result<Vec<PathBuf>> {
    let apks = select_apks(&archive.toc, spec, modules, instant)?;

    let mut transaction = Transaction::new();
    transaction.create_dir_all(output_dir)?;
    let mut written = Vec::with_capacity(apks.len());
    for apk in &apks {
        let target = output_dir.join(&apk.path);
        transaction.write_file(&target, archive.apk(apk)?, overwrite)?;
        written.push(target);
    }
    transaction.commit();

    info!(
        output = %output_dir.display(),
        apks = written.len(),
        "extracted APKs"
    );
    Ok(written)
}

/// Run extract-apks command
pub fn run(args: ExtractApksArgs) -> Result<()> {
    let spec = DeviceSpec::from_file(&args.device_spec)?;
    spec.validate()?;
    let archive = ApkSetArchive::open(&args.apks)?;
    let written = extract_apks(
        &archive,
        &spec,
        &args.modules,
        args.instant,
        &args.output_dir,
        args.overwrite,
    )?;
    display_extracted(&written);
    Ok(())
}
