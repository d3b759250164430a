//! CLI tool for keeping the dependency license manifest in sync

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::*;
use dependency_license_manifest::{
    AuditConfig, AuditError, Bucket, LicenseValidator, ManifestGenerator, ManifestUpdater,
    PrettyEntry,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "license-manifest")]
#[command(about = "Track third-party dependencies and their licenses in a manifest", long_about = None)]
#[command(version)]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Root of the project to inspect
    #[arg(short = 'p', long, default_value = ".")]
    project_path: PathBuf,

    /// Path to custom configuration file (TOML)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Manifest location, overriding the configuration
    #[arg(short = 'm', long)]
    manifest: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bootstrap the manifest from the installed dependencies
    Generate,

    /// Bring the manifest up to date, keeping manual edits
    Update,

    /// Check the manifest against the project and the license whitelist
    Check,

    /// List recorded dependencies without versions
    List {
        /// Bucket to list
        #[arg(short = 'b', long, default_value = "packages")]
        bucket: Bucket,

        /// Output format
        #[arg(short = 'f', long, default_value = "markdown")]
        format: ListFormat,
    },
}

#[derive(Clone, Debug)]
enum ListFormat {
    Json,
    Markdown,
}

impl std::str::FromStr for ListFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ListFormat::Json),
            "markdown" | "md" => Ok(ListFormat::Markdown),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = match load_config(&cli) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{} Failed to load config: {:#}", "Error:".red().bold(), e);
            process::exit(1);
        }
    };
    debug!("Using manifest {}", config.manifest_path().display());

    match cli.command {
        Commands::Generate => {
            let generator = ManifestGenerator::from_config(&config);
            match with_spinner(|| generator.generate()) {
                Ok(_) => println!("Created {}!", generator.path().display()),
                Err(AuditError::ManifestAlreadyExists { path }) => {
                    eprintln!(
                        "{} manifest already exists at '{}'. Aborting...",
                        "Error:".red().bold(),
                        path.display()
                    );
                    process::exit(1);
                }
                Err(e) => fail("Generate failed", e),
            }
        }

        Commands::Update => {
            let updater = ManifestUpdater::from_config(&config);
            match with_spinner(|| updater.update_file()) {
                Ok(()) => println!(
                    "Updated {}! Run your tests and check your diffs!",
                    updater.path().display()
                ),
                Err(e) => fail("Update failed", e),
            }
        }

        Commands::Check => {
            let validator = LicenseValidator::from_config(&config);
            let report = match with_spinner(|| validator.validate()) {
                Ok(report) => report,
                Err(e) => fail("Check failed", e),
            };

            if report.is_valid() {
                println!("{} Manifest matches the project", "Success:".green().bold());
            } else {
                eprintln!(
                    "{} {} manifest problems:",
                    "Failed:".red().bold(),
                    report.errors.len()
                );
                for message in report.messages() {
                    eprintln!("  - {}", message);
                }
                process::exit(1);
            }
        }

        Commands::List { bucket, format } => {
            let validator = LicenseValidator::from_config(&config);
            let entries = match validator.pretty_list(bucket) {
                Ok(entries) => entries,
                Err(e) => fail("List failed", e),
            };

            match format {
                ListFormat::Json => match serde_json::to_string_pretty(&entries) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Failed to serialize list: {}", e);
                        process::exit(1);
                    }
                },
                ListFormat::Markdown => print!("{}", markdown_list(bucket, &entries)),
            }
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<AuditConfig> {
    let mut config = match &cli.config {
        Some(path) => AuditConfig::from_toml_file(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => AuditConfig::default(),
    };

    if config.project_root == Path::new(".") {
        config.project_root = cli.project_path.clone();
    }
    if let Some(manifest) = &cli.manifest {
        config.manifest_file = manifest.clone();
    }

    config.validate()?;
    Ok(config)
}

fn with_spinner<T>(work: impl FnOnce() -> T) -> T {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("Inspecting dependencies...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let result = work();

    spinner.finish_and_clear();
    result
}

fn fail(context: &str, error: AuditError) -> ! {
    eprintln!("{} {}: {}", "Error:".red().bold(), context, error);
    process::exit(1);
}

fn markdown_list(bucket: Bucket, entries: &[PrettyEntry]) -> String {
    let mut md = String::new();

    md.push_str(&format!("## {}\n\n", bucket));
    md.push_str("| Name | License | License URL | Project URL |\n");
    md.push_str("|------|---------|-------------|-------------|\n");

    for entry in entries {
        md.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            entry.name,
            entry.license.as_deref().unwrap_or("Unknown"),
            entry.license_url.as_deref().unwrap_or(""),
            entry.project_url.as_deref().unwrap_or("")
        ));
    }

    md
}
