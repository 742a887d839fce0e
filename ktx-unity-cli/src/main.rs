//! KTX Unity CLI
//!
//! Command-line diagnostics for GPU format negotiation of KTX2 and Basis
//! Universal textures.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use ktx_unity::inventory::TextureInventory;
use ktx_unity::{FormatSelector, ImageFeatures, RuntimeProfile};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ktx-unity")]
#[command(about = "GPU format negotiation for KTX2 / Basis Universal textures")]
#[command(version)]
struct Cli {
    /// Log selection details
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every catalog entry and whether the profile supports it
    Formats {
        /// Built-in profile name or YAML profile path
        #[arg(short, long, default_value = "desktop")]
        profile: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Select the GPU format for an image
    Select {
        #[arg(long)]
        width: u32,

        #[arg(long)]
        height: u32,

        /// The image has an alpha channel
        #[arg(long)]
        alpha: bool,

        /// Sample in linear color space (defaults to the profile's setting)
        #[arg(long)]
        linear: bool,

        /// Built-in profile name or YAML profile path
        #[arg(short, long, default_value = "desktop")]
        profile: String,
    },

    /// Detect KTX2 and Basis files
    Inspect {
        /// File or directory
        path: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Yaml,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Formats { profile, format } => formats_command(&profile, format),
        Commands::Select {
            width,
            height,
            alpha,
            linear,
            profile,
        } => select_command(width, height, alpha, linear, &profile),
        Commands::Inspect { path } => inspect_command(&path),
    }
}

/// Resolve a preset name, falling back to a YAML file path
fn load_profile(name: &str) -> Result<RuntimeProfile> {
    if let Some(profile) = RuntimeProfile::preset(name) {
        return Ok(profile);
    }

    let path = Path::new(name);
    if path.is_file() {
        debug!("Loading runtime profile from {:?}", path);
        return RuntimeProfile::from_yaml_file(path)
            .with_context(|| format!("Failed to load profile {:?}", path));
    }

    bail!(
        "Unknown profile '{}'. Use one of {} or a YAML file",
        name,
        RuntimeProfile::PRESETS.join(", ")
    )
}

fn formats_command(profile: &str, format: OutputFormat) -> Result<()> {
    let profile = load_profile(profile)?;
    let selector = FormatSelector::new();
    let report = selector.support_report(&profile);

    match format {
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(&report)?);
        }
        OutputFormat::Table => {
            println!("Profile: {}", profile.name);
            println!(
                "{:<3} {:<42} {:<24} {:<16} {}",
                "#", "Requirement", "GPU format", "Transcode", "Supported"
            );
            for (i, line) in report.iter().enumerate() {
                println!(
                    "{:<3} {:<42} {:<24} {:<16} {}",
                    i,
                    line.entry.requirement.to_string(),
                    line.entry.graphics_format.name(),
                    line.entry.transcode_format.to_string(),
                    if line.supported { "yes" } else { "no" }
                );
            }
            let supported = report.iter().filter(|line| line.supported).count();
            println!("{} of {} entries supported", supported, report.len());
        }
    }

    Ok(())
}

fn select_command(width: u32, height: u32, alpha: bool, linear: bool, profile: &str) -> Result<()> {
    let profile = load_profile(profile)?;
    let linear = linear || profile.linear;
    let features = ImageFeatures::from_dimensions(width, height, alpha, linear);
    let selector = FormatSelector::new();

    println!("Profile: {}", profile.name);
    println!("Features: {}", features.mask());

    let pair = selector
        .select_or_err(features, &profile)
        .with_context(|| format!("No format for a {}x{} image", width, height))?;

    println!("GPU format: {}", pair.graphics_format);
    println!("Transcode format: {}", pair.transcode_format);
    match pair.transcode_format.calculate_data_size(width, height) {
        Some(size) => println!("Level size: {} bytes", size),
        None => println!("Level size: too large to address"),
    }
    if selector.stats().snapshot().alpha_fallbacks > 0 {
        println!("Note: no alpha-capable format supported, alpha is dropped");
    }

    Ok(())
}

fn inspect_command(path: &Path) -> Result<()> {
    let mut inventory = TextureInventory::new();
    inventory
        .load(path)
        .with_context(|| format!("Failed to inspect {:?}", path))?;

    for file in inventory.files() {
        println!(
            "{}: {} ({} bytes)",
            file.path.display(),
            file.kind.name(),
            file.size
        );
    }
    for skipped in inventory.skipped() {
        debug!("Not a texture: {:?}", skipped);
    }

    println!(
        "✓ {} texture file(s), {} bytes total",
        inventory.files().len(),
        inventory.total_size()
    );
    if inventory.files().is_empty() && path.is_file() {
        bail!("{:?} is not a KTX2 or Basis Universal file", path);
    }

    Ok(())
}
