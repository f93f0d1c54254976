//! Building filter chains from presets.
//!
//! # Example
//!
//! ```rust
//! use cadena_config::{ChainPreset, FilterConfig, open_chain};
//! use cadena_registry::builtin_registry;
//!
//! let preset = ChainPreset::new("night")
//!     .with_input("48000:5.1:float")
//!     .with_output("48000:stereo:s16")
//!     .with_filter(FilterConfig::new("volume").with_arg("gain", "-6dB"));
//!
//! let chain = open_chain(&preset, builtin_registry()).unwrap();
//! assert_eq!(chain.output_format().spec_string(), "48000:stereo:s16");
//! ```

use std::sync::Arc;

use cadena_core::{AudioFormat, FilterChain, FilterRegistry};

use crate::error::ConfigError;
use crate::preset::ChainPreset;
use crate::validation::PresetValidator;

/// Creates a configured chain from a preset without negotiating it.
///
/// The preset is validated against `registry` first. Set an input format
/// (if the preset has none) and call [`FilterChain::init`] to negotiate.
pub fn build_chain(
    preset: &ChainPreset,
    registry: Arc<FilterRegistry>,
) -> Result<FilterChain, ConfigError> {
    PresetValidator::with_registry(Arc::clone(&registry)).validate_preset(preset)?;

    let mut chain = FilterChain::new(registry);
    if let Some(input) = preset.input_format()? {
        chain.set_input_format(input);
    }
    chain.set_output_format(preset.output_format()?);
    chain.set_output_layouts(preset.output_selector()?);
    if let Some(resampler) = &preset.resampler {
        chain.set_resampler(resampler.clone());
    }
    chain.set_forced(preset.force);
    chain.set_settings(preset.settings());

    tracing::debug!(
        "preset_build: '{}' with {} filters",
        preset.name,
        preset.filters.len()
    );
    Ok(chain)
}

/// Builds and negotiates a chain for `input`, overriding the preset's input.
pub fn open_chain_with_input(
    preset: &ChainPreset,
    registry: Arc<FilterRegistry>,
    input: AudioFormat,
) -> Result<FilterChain, ConfigError> {
    if !input.is_complete() {
        return Err(ConfigError::format_spec(
            input.spec_string(),
            "rate, channels and sample format are all required",
        ));
    }
    let mut chain = build_chain(preset, registry)?;
    chain.set_input_format(input);
    chain.init()?;
    Ok(chain)
}

/// Builds and negotiates a chain from a preset that names its input format.
pub fn open_chain(
    preset: &ChainPreset,
    registry: Arc<FilterRegistry>,
) -> Result<FilterChain, ConfigError> {
    let input = preset.input_format()?.ok_or_else(|| {
        ConfigError::format_spec("", format!("preset '{}' has no input format", preset.name))
    })?;
    open_chain_with_input(preset, registry, input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter_config::FilterConfig;
    use crate::validation::ValidationError;
    use cadena_registry::builtin_registry;

    #[test]
    fn build_applies_preset() {
        let preset = ChainPreset::new("p")
            .with_input("44100:stereo:s16")
            .with_output("48000")
            .with_filter(FilterConfig::new("dummy").with_label("d"));
        let chain = build_chain(&preset, builtin_registry()).unwrap();
        assert_eq!(chain.input_format().rate, 44100);
        assert_eq!(chain.output_format().rate, 48000);
        assert_eq!(chain.settings().len(), 1);
        assert!(chain.is_empty(), "nothing is created before init");
    }

    #[test]
    fn build_rejects_invalid_preset() {
        let preset = ChainPreset::new("p").with_filter(FilterConfig::new("flanger"));
        assert!(matches!(
            build_chain(&preset, builtin_registry()),
            Err(ConfigError::Validation(ValidationError::UnknownFilter(_)))
        ));
    }

    #[test]
    fn open_needs_input() {
        let preset = ChainPreset::new("no-input");
        let err = open_chain(&preset, builtin_registry()).unwrap_err();
        assert!(err.to_string().contains("has no input format"), "{err}");
    }

    #[test]
    fn open_negotiates() {
        let preset = ChainPreset::new("p")
            .with_input("44100:stereo:s16")
            .with_output("48000:auto:float");
        let chain = open_chain(&preset, builtin_registry()).unwrap();
        let names: Vec<_> = chain.filters().into_iter().filter_map(|id| chain.name(id)).collect();
        assert_eq!(names, ["resample", "format"]);
        assert_eq!(chain.output_format().spec_string(), "48000:stereo:float");
    }

    #[test]
    fn forced_preset_skips_conversions() {
        let preset = ChainPreset::from_toml(
            "name = \"strict\"\ninput = \"48000:stereo:s16\"\nforce = true\n\n[[filters]]\nname = \"volume\"\n",
        )
        .unwrap();
        assert!(preset.force);
        match open_chain(&preset, builtin_registry()) {
            Err(ConfigError::Chain(cadena_core::ChainError::AutoConversionDisabled {
                filter, ..
            })) => assert_eq!(filter, "volume"),
            other => panic!("expected disabled conversion, got {other:?}"),
        }

        let relaxed = preset.with_force(false);
        let chain = open_chain(&relaxed, builtin_registry()).unwrap();
        assert!(!chain.is_forced());
        assert_eq!(chain.len(), 2);
    }
}
