//! Preset management commands.
//!
//! Provides commands to create, check and show chain presets.

use std::path::PathBuf;

use cadena_config::{PresetValidator, format_filter_list, open_chain};
use cadena_registry::FilterCatalog;
use clap::{Args, Subcommand};

use super::common::{ChainArgs, load_preset};

#[derive(Args)]
pub struct PresetArgs {
    #[command(subcommand)]
    command: PresetCommand,
}

#[derive(Subcommand)]
enum PresetCommand {
    /// Write a preset file from chain options
    Create {
        /// Name for the new preset
        name: String,

        /// Where to write the TOML file
        path: PathBuf,

        /// Description of the preset
        #[arg(short, long)]
        description: Option<String>,

        /// Overwrite the file if it already exists
        #[arg(long)]
        force: bool,

        #[command(flatten)]
        chain: ChainArgs,
    },

    /// Validate a preset file and negotiate it if it names an input format
    Check {
        /// Preset file
        path: PathBuf,
    },

    /// Print a preset as command-line options
    Show {
        /// Preset file
        path: PathBuf,
    },
}

pub fn run(args: PresetArgs) -> anyhow::Result<()> {
    match args.command {
        PresetCommand::Create {
            name,
            path,
            description,
            force,
            chain,
        } => create(&name, &path, description, force, &chain),
        PresetCommand::Check { path } => check(&path),
        PresetCommand::Show { path } => show(&path),
    }
}

fn create(
    name: &str,
    path: &std::path::Path,
    description: Option<String>,
    force: bool,
    chain: &ChainArgs,
) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "'{}' already exists. Use --force to overwrite.",
            path.display()
        );
    }

    let catalog = FilterCatalog::new();
    let mut preset = chain.to_preset(name, &catalog.registry())?;
    preset.name = name.to_string();
    if description.is_some() {
        preset.description = description;
    }
    PresetValidator::with_registry(catalog.registry()).validate_preset(&preset)?;

    preset.save(path)?;
    println!(
        "Saved preset '{}' ({} filters) to {}",
        preset.name,
        preset.len(),
        path.display()
    );
    Ok(())
}

fn check(path: &std::path::Path) -> anyhow::Result<()> {
    let preset = load_preset(path)?;
    let catalog = FilterCatalog::new();
    PresetValidator::with_registry(catalog.registry()).validate_preset(&preset)?;

    if preset.input.is_some() {
        let chain = open_chain(&preset, catalog.registry())?;
        print!("{chain}");
    }
    println!("Preset '{}' is valid", preset.name);
    Ok(())
}

fn show(path: &std::path::Path) -> anyhow::Result<()> {
    let preset = load_preset(path)?;

    println!("{}", preset.name);
    println!("{}", "=".repeat(preset.name.len()));
    if let Some(desc) = &preset.description {
        println!();
        println!("{desc}");
    }
    println!();

    let mut options = Vec::new();
    if let Some(input) = &preset.input {
        options.push(format!("--input {input}"));
    }
    if let Some(output) = &preset.output {
        options.push(format!("--output {output}"));
    }
    if !preset.output_layouts.is_empty() {
        options.push(format!("--layouts \"{}\"", preset.output_layouts.join(",")));
    }
    if let Some(resampler) = &preset.resampler {
        options.push(format!("--resampler {resampler}"));
    }
    if preset.force {
        options.push("--no-auto".to_string());
    }
    if !preset.is_empty() {
        options.push(format!("--af \"{}\"", format_filter_list(&preset.filters)));
    }

    if options.is_empty() {
        println!("(empty preset)");
    } else {
        println!("cadena negotiate {}", options.join(" "));
    }
    Ok(())
}
