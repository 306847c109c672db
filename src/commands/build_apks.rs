//! Build-apks command implementation
//!
//! The pipeline:
//! 1. Check the flag combination
//! 2. Load, sanitize and validate the bundle (built-in and extension validators)
//! 3. Resolve the target device, if any, and check it can run the bundle
//! 4. Generate variants and keep what the device needs
//! 5. Name and serialize the APKs on the worker pool
//! 6. Write the table of contents and APKs as one archive
//!
//! Nothing is written to the output path unless every step succeeds.

use std::collections::BTreeMap;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::cli::BuildApksArgs;
use crate::commands::version::VERSION;
use crate::config::bundle::BundletoolInfo;
use crate::config::{BuildApksOptions, BuildMode, DeviceSpec};
use crate::device::{DeviceProvider, EnvDeviceProvider, filter_variants};
use crate::domain::apk_set::{ApkDescription, ApkSet, BuildApksResult, ModuleMetadata, Variant};
use crate::domain::bundle::AppBundle;
use crate::domain::split::ModuleSplit;
use crate::error::{BundletoolError, Result, command};
use crate::hash;
use crate::io::{
    ApkSerializer, ApkSigner, GeneratedApk, NoopSigner, ResourceLinker, TextResourceLinker,
    load_bundle, write_apk_set,
};
use crate::ui::display::display_apk_set;
use crate::ui::{InteractiveProgressReporter, ProgressReporter, SilentProgressReporter};
use crate::validation::compatibility::{validate_device, validate_options, validate_system_device};
use crate::validation::{BundleValidator, SubValidator};
use crate::variants::{ApkPathAllocator, GeneratedVariant, VariantRequest, generate_variants};

/// Runs `build-apks` with injected collaborators
pub struct BuildApksManager {
    linker: Box<dyn ResourceLinker>,
    signer: Box<dyn ApkSigner>,
    device_provider: Box<dyn DeviceProvider>,
    extensions: BundleValidator,
    progress: Box<dyn ProgressReporter>,
}

/// An APK waiting for serialization
struct PendingApk<'a> {
    variant: usize,
    path: String,
    split: &'a ModuleSplit,
}

impl BuildApksManager {
    pub fn new(
        linker: Box<dyn ResourceLinker>,
        signer: Box<dyn ApkSigner>,
        device_provider: Box<dyn DeviceProvider>,
    ) -> Self {
        Self {
            linker,
            signer,
            device_provider,
            extensions: BundleValidator::default(),
            progress: Box::new(SilentProgressReporter),
        }
    }

    /// Add a bundle check that runs after the built-in ones
    #[must_use]
    pub fn with_validator(mut self, name: impl Into<String>, validator: SubValidator) -> Self {
        self.extensions.push(name, validator);
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Box<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Build the APK Set described by `options` and return its table of contents
    pub fn execute(&self, options: &BuildApksOptions) -> Result<BuildApksResult> {
        validate_options(options)?;
        if options.output_path.exists() && !options.overwrite {
            return Err(command::output_exists(
                options.output_path.display().to_string(),
            ));
        }

        let bundle = load_bundle(&options.bundle_path)?;
        self.extensions.validate(&bundle)?;

        let device = self.resolve_device(options)?;
        if let Some(spec) = &device {
            spec.validate()?;
            if options.mode == BuildMode::System {
                validate_system_device(spec)?;
            }
            validate_device(&bundle, spec)?;
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.threads.unwrap_or(0))
            .build()
            .map_err(|e| BundletoolError::Io {
                message: format!("Failed to start worker pool: {e}"),
            })?;

        let toc = pool.install(|| self.build(&bundle, options, device.as_ref()))?;
        Ok(toc)
    }

    fn resolve_device(&self, options: &BuildApksOptions) -> Result<Option<DeviceSpec>> {
        if let Some(spec) = &options.device_spec {
            return Ok(Some(spec.clone()));
        }
        if options.connected_device {
            let spec = self.device_provider.device_spec()?;
            debug!(?spec, "resolved connected device");
            return Ok(Some(spec));
        }
        Ok(None)
    }

    fn build(
        &self,
        bundle: &AppBundle,
        options: &BuildApksOptions,
        device: Option<&DeviceSpec>,
    ) -> Result<BuildApksResult> {
        let request = VariantRequest {
            mode: options.mode,
            modules: &options.modules,
            device,
        };
        let mut variants = generate_variants(bundle, &request)?;
        if let Some(spec) = device.filter(|_| options.mode != BuildMode::System) {
            variants = filter_variants(
                bundle,
                variants,
                spec,
                &options.modules,
                options.mode == BuildMode::Instant,
            )?;
        }

        let mut allocator = ApkPathAllocator::new();
        let pending: Vec<PendingApk<'_>> = variants
            .iter()
            .enumerate()
            .flat_map(|(index, variant)| {
                variant.splits.iter().map(move |split| (index, split))
            })
            .map(|(variant, split)| PendingApk {
                variant,
                path: allocator.allocate(split),
                split,
            })
            .collect();

        let apks = self.serialize(bundle, &pending)?;
        let toc = table_of_contents(bundle, &variants, &pending, &apks)?;
        write_apk_set(&options.output_path, options.overwrite, &toc, &apks)?;
        info!(
            variants = toc.variants.len(),
            apks = apks.len(),
            "built APK set"
        );
        Ok(toc)
    }

    fn serialize(&self, bundle: &AppBundle, pending: &[PendingApk<'_>]) -> Result<Vec<GeneratedApk>> {
        let serializer =
            ApkSerializer::new(&bundle.config, self.linker.as_ref(), self.signer.as_ref());
        self.progress
            .start("Serializing APKs", pending.len() as u64);
        let result = pending
            .par_iter()
            .map(|apk| {
                let bytes = serializer.serialize(apk.split)?;
                self.progress.advance(&apk.path);
                Ok(GeneratedApk {
                    path: apk.path.clone(),
                    bytes: Arc::from(bytes),
                })
            })
            .collect::<Result<Vec<_>>>();
        match &result {
            Ok(_) => self.progress.finish(),
            Err(_) => self.progress.abandon(),
        }
        result
    }
}

impl Default for BuildApksManager {
    fn default() -> Self {
        Self::new(
            Box::new(TextResourceLinker),
            Box::new(NoopSigner),
            Box::new(EnvDeviceProvider),
        )
    }
}

fn table_of_contents(
    bundle: &AppBundle,
    variants: &[GeneratedVariant],
    pending: &[PendingApk<'_>],
    apks: &[GeneratedApk],
) -> Result<BuildApksResult> {
    let mut toc_variants: Vec<Variant> = variants
        .iter()
        .map(|variant| Variant {
            number: variant.number,
            targeting: variant.targeting.clone(),
            apk_sets: Vec::new(),
        })
        .collect();

    let mut sets: BTreeMap<(usize, String), Vec<ApkDescription>> = BTreeMap::new();
    let mut module_order: Vec<(usize, String)> = Vec::new();
    for (apk, generated) in pending.iter().zip(apks) {
        let key = (apk.variant, apk.split.module.to_string());
        if !sets.contains_key(&key) {
            module_order.push(key.clone());
        }
        sets.entry(key).or_default().push(ApkDescription {
            path: apk.path.clone(),
            targeting: apk.split.apk_targeting.clone(),
            kind: apk.split.split_type,
            split_id: apk.split.split_id(),
            is_master: apk.split.is_master,
            digest: hash::digest(&generated.bytes),
            size: generated.bytes.len() as u64,
        });
    }

    for key in module_order {
        let module = bundle.module(&key.1).ok_or_else(|| BundletoolError::InvalidBundle {
            message: format!("Generated an APK for unknown module '{}'.", key.1),
        })?;
        let apks = sets.remove(&key).unwrap_or_default();
        toc_variants[key.0].apk_sets.push(ApkSet {
            module: ModuleMetadata::from(module),
            apks,
        });
    }

    Ok(BuildApksResult {
        bundletool: BundletoolInfo {
            version: Some(VERSION.to_string()),
        },
        package_name: bundle.package_name()?.to_string(),
        variants: toc_variants,
        default_texture_format: bundle.config.default_texture_format(),
    })
}

/// Run build-apks command
pub fn run(args: BuildApksArgs, quiet: bool) -> Result<()> {
    let device_spec = args
        .device_spec
        .as_deref()
        .map(DeviceSpec::from_file)
        .transpose()?;
    let options = BuildApksOptions {
        mode: args.mode,
        device_spec,
        connected_device: args.connected_device,
        modules: args.modules,
        overwrite: args.overwrite,
        threads: args.threads,
        ..BuildApksOptions::new(args.bundle, args.output)
    };

    let progress: Box<dyn ProgressReporter> = if quiet {
        Box::new(SilentProgressReporter)
    } else {
        Box::new(InteractiveProgressReporter::new())
    };
    let toc = BuildApksManager::default()
        .with_progress(progress)
        .execute(&options)?;
    display_apk_set(&options.output_path, &toc);
    Ok(())
}
