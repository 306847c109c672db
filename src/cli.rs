//! CLI definitions using clap derive API

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::BuildMode;

/// bundletool - Android App Bundle to APK Set builder
///
/// Build APK Sets from Android App Bundles and select the APKs a device needs.
#[derive(Parser, Debug)]
#[command(
    name = "bundletool",
    author,
    version,
    color = clap::ColorChoice::Auto,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Builds device-targeted APK sets from Android App Bundles",
    long_about = "bundletool turns an Android App Bundle (.aab) into an APK Set: split APKs \
                  per ABI, screen density, language and texture format, standalone APKs for \
                  pre-Lollipop devices, and universal or system APKs.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n    \
                  bundletool build-bundle --modules base.zip --output app.aab\n    \
                  bundletool build-apks --bundle app.aab --output app.apks\n    \
                  bundletool build-apks --bundle app.aab --output app.apks --device-spec device.json\n    \
                  bundletool extract-apks --apks app.apks --device-spec device.json --output-dir out\n    \
                  bundletool get-size total --apks app.apks"
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Hide progress bars
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build an App Bundle from module zips or directories
    BuildBundle(BuildBundleArgs),

    /// Generate an APK Set from an App Bundle
    BuildApks(BuildApksArgs),

    /// Extract the APKs a device needs from an APK Set
    ExtractApks(ExtractApksArgs),

    /// Compute download sizes of an APK Set
    GetSize(GetSizeArgs),

    /// Validate an App Bundle and print its modules
    Validate(ValidateArgs),

    /// Show version information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the build-bundle command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Build from module zips:\n    bundletool build-bundle --modules base.zip,feature.zip --output app.aab\n\n\
                  Build from directories with a config:\n    bundletool build-bundle --modules base --config BundleConfig.yaml --output app.aab\n\n\
                  Attach metadata:\n    bundletool build-bundle --modules base.zip --output app.aab \
                  --metadata-file com.example/mapping.txt:build/mapping.txt")]
pub struct BuildBundleArgs {
    /// Module zips or directories; the file name is the module name
    #[arg(long, value_delimiter = ',', num_args = 1.., required = true)]
    pub modules: Vec<PathBuf>,

    /// Path of the bundle to write
    #[arg(long)]
    pub output: PathBuf,

    /// Bundle configuration (JSON or YAML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Metadata file as `<namespace>/<name>:<path>`
    #[arg(long = "metadata-file", value_name = "NAMESPACE/NAME:PATH")]
    pub metadata_files: Vec<String>,

    /// Replace the output file if it exists
    #[arg(long)]
    pub overwrite: bool,
}

/// Arguments for the build-apks command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Build every variant:\n    bundletool build-apks --bundle app.aab --output app.apks\n\n\
                  Build for one device:\n    bundletool build-apks --bundle app.aab --output app.apks --device-spec device.json\n\n\
                  Build a universal APK:\n    bundletool build-apks --bundle app.aab --output app.apks --mode universal")]
pub struct BuildApksArgs {
    /// App Bundle to read
    #[arg(long)]
    pub bundle: PathBuf,

    /// APK Set to write
    #[arg(long)]
    pub output: PathBuf,

    #[arg(long, value_enum, default_value_t = BuildMode::Default)]
    pub mode: BuildMode,

    /// Device spec JSON; only the APKs this device needs are generated
    #[arg(long)]
    pub device_spec: Option<PathBuf>,

    /// Build for the connected device
    #[arg(long)]
    pub connected_device: bool,

    /// Feature modules to include (with their dependencies)
    #[arg(long, value_delimiter = ',')]
    pub modules: Vec<String>,

    /// Replace the output file if it exists
    #[arg(long)]
    pub overwrite: bool,

    /// Number of worker threads
    #[arg(long, env = "BUNDLETOOL_THREADS")]
    pub threads: Option<usize>,
}

/// Arguments for the extract-apks command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Extract for a device:\n    bundletool extract-apks --apks app.apks --device-spec device.json --output-dir out")]
pub struct ExtractApksArgs {
    /// APK Set to read
    #[arg(long)]
    pub apks: PathBuf,

    /// Device spec JSON
    #[arg(long)]
    pub device_spec: PathBuf,

    /// Directory to extract into
    #[arg(long)]
    pub output_dir: PathBuf,

    /// Feature modules to include (with their dependencies)
    #[arg(long, value_delimiter = ',')]
    pub modules: Vec<String>,

    /// Extract instant APKs instead of installable ones
    #[arg(long)]
    pub instant: bool,

    /// Replace existing files in the output directory
    #[arg(long)]
    pub overwrite: bool,
}

/// Arguments for the get-size command
#[derive(Parser, Debug)]
pub struct GetSizeArgs {
    #[command(subcommand)]
    pub command: GetSizeCommand,
}

#[derive(Subcommand, Debug)]
pub enum GetSizeCommand {
    /// Minimum and maximum total download size
    Total(GetSizeTotalArgs),
}

#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Size over every device:\n    bundletool get-size total --apks app.apks\n\n\
                  Size for a device:\n    bundletool get-size total --apks app.apks --device-spec device.json")]
pub struct GetSizeTotalArgs {
    /// APK Set to read
    #[arg(long)]
    pub apks: PathBuf,

    /// Device spec JSON; unset dimensions range over every value
    #[arg(long)]
    pub device_spec: Option<PathBuf>,

    /// Feature modules to include (with their dependencies)
    #[arg(long, value_delimiter = ',')]
    pub modules: Vec<String>,

    /// Include instant APKs instead of installable ones
    #[arg(long)]
    pub instant: bool,
}

/// Arguments for the validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// App Bundle to validate
    #[arg(long)]
    pub bundle: PathBuf,
}

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    bundletool completions --shell bash > ~/.bash_completion.d/bundletool\n\n\
                  Generate zsh completions:\n    bundletool completions --shell zsh > ~/.zfunc/_bundletool\n\n\
                  Generate fish completions:\n    bundletool completions --shell fish > ~/.config/fish/completions/bundletool.fish")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    #[arg(long)]
    pub shell: String,
}
