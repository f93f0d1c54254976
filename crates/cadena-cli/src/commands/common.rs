//! Shared CLI helpers used across multiple commands.

use std::path::PathBuf;

use anyhow::Context;
use cadena_config::{ChainPreset, resolve_filter_list};
use cadena_core::{ChainEvent, FilterRegistry};
use clap::Args;

/// Options that describe a chain, shared by `negotiate` and `preset create`.
#[derive(Args, Debug, Clone, Default)]
pub struct ChainArgs {
    /// Input format, e.g. 48000:5.1:float
    #[arg(short, long, value_name = "RATE:CHANNELS:FORMAT")]
    pub input: Option<String>,

    /// Desired output format; unset or `auto` fields are negotiated
    #[arg(short, long, value_name = "RATE:CHANNELS:FORMAT")]
    pub output: Option<String>,

    /// Filter list, e.g. "@vol:volume=-6dB,format=s16"
    #[arg(long = "af", value_name = "FILTERS")]
    pub filters: Option<String>,

    /// Start from a TOML preset; the other options override its fields
    #[arg(short, long, value_name = "FILE")]
    pub preset: Option<PathBuf>,

    /// Output layout policy: comma separated layouts, `any`, `waveext` or
    /// `waveext-defaults`
    #[arg(long, value_name = "LAYOUTS")]
    pub layouts: Option<String>,

    /// Filter to auto-insert for channel and rate changes
    #[arg(long, value_name = "FILTER")]
    pub resampler: Option<String>,

    /// Use the filters exactly as given: no conversions, no detaching
    #[arg(long)]
    pub no_auto: bool,
}

impl ChainArgs {
    /// Merges the preset file (if any) with the command-line overrides.
    pub fn to_preset(&self, name: &str, registry: &FilterRegistry) -> anyhow::Result<ChainPreset> {
        let mut preset = match &self.preset {
            Some(path) => load_preset(path)?,
            None => ChainPreset::new(name),
        };
        if let Some(input) = &self.input {
            preset.input = Some(input.clone());
        }
        if let Some(output) = &self.output {
            preset.output = Some(output.clone());
        }
        if let Some(list) = &self.filters {
            preset.filters = resolve_filter_list(list, registry)
                .with_context(|| format!("invalid filter list '{list}'"))?;
        }
        if let Some(layouts) = &self.layouts {
            preset.output_layouts = layouts
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(resampler) = &self.resampler {
            preset.resampler = Some(resampler.clone());
        }
        if self.no_auto {
            preset.force = true;
        }
        Ok(preset)
    }
}

/// Load a preset from a TOML file.
pub fn load_preset(path: &std::path::Path) -> anyhow::Result<ChainPreset> {
    if !path.exists() {
        anyhow::bail!("Preset file '{}' not found", path.display());
    }
    ChainPreset::load(path).map_err(|e| anyhow::anyhow!("{}", e))
}

/// One-line description of a chain event.
pub fn describe_event(event: &ChainEvent) -> String {
    match event {
        ChainEvent::AutoInserted { filter, before } => {
            format!("inserted '{filter}' before '{before}'")
        }
        ChainEvent::PassthroughRemoved { filter } => {
            format!("removed '{filter}': it cannot process passthrough audio")
        }
        ChainEvent::Detached { filter } => format!("'{filter}' detached itself"),
        ChainEvent::Broken { error } => format!("chain broken: {error}"),
        ChainEvent::Rebuilt => "chain rebuilt from its settings".to_string(),
    }
}
