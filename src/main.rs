//! bundletool - Android App Bundle to APK Set builder
//!
//! Command line front end of the bundletool library.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use bundletool::cli::{Cli, Commands, GetSizeCommand};
use bundletool::commands;

/// Environment variable holding the tracing filter
const LOG_ENV: &str = "BUNDLETOOL_LOG";

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("bundletool=debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::BuildBundle(args) => commands::build_bundle::run(args),
        Commands::BuildApks(args) => commands::build_apks::run(args, cli.quiet),
        Commands::ExtractApks(args) => commands::extract_apks::run(args),
        Commands::GetSize(args) => match args.command {
            GetSizeCommand::Total(args) => commands::get_size::run(args),
        },
        Commands::Validate(args) => commands::validate::run(args),
        Commands::Version => commands::version::run(),
        Commands::Completions(args) => commands::completions::run(&args),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
