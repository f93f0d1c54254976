//! Chain preset file format and operations.

use std::path::Path;

use cadena_core::{AudioFormat, ChannelMap, ChannelMapSelector, FilterRegistry, FilterSettings};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::filter_config::FilterConfig;
use crate::filter_list::resolve_filter_list;
use crate::format_spec::{parse_complete_format_spec, parse_format_spec};

/// Selector policies an `output_layouts` entry may name instead of a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LayoutKeyword {
    /// Accept any layout.
    Any,
    /// Accept any wave-extensible ordered layout.
    Waveext,
    /// Accept the default layouts for 1 to 8 channels.
    WaveextDefaults,
}

pub(crate) fn layout_keyword(entry: &str) -> Option<LayoutKeyword> {
    match entry.trim() {
        "any" => Some(LayoutKeyword::Any),
        "waveext" => Some(LayoutKeyword::Waveext),
        "waveext-defaults" => Some(LayoutKeyword::WaveextDefaults),
        _ => None,
    }
}

/// Preset file format for filter chains.
///
/// A preset names the formats on both ends of the chain, an optional output
/// layout policy, and the user filters in order.
///
/// # TOML Format
///
/// ```toml
/// name = "night"
/// description = "Quiet 5.1 downmix"
/// input = "48000:5.1:float"
/// output = "48000:stereo:s16"
/// output_layouts = ["stereo", "mono"]
///
/// [[filters]]
/// name = "volume"
/// label = "vol"
/// [filters.args]
/// gain = "-6dB"
/// ```
///
/// `output_layouts` entries are channel maps, or one of `any`, `waveext` and
/// `waveext-defaults`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainPreset {
    /// Name of the preset.
    pub name: String,

    /// Optional description of the preset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Input format spec. Must be complete when given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,

    /// Desired output format spec. Unset fields are negotiated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Output channel map policy, used when the output leaves channels unset.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_layouts: Vec<String>,

    /// Filter to auto-insert for channel and rate changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resampler: Option<String>,

    /// Negotiate the filters exactly as listed, without conversions.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub force: bool,

    /// User filters in chain order.
    #[serde(default)]
    pub filters: Vec<FilterConfig>,
}

impl ChainPreset {
    /// Create a new empty preset.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            input: None,
            output: None,
            output_layouts: Vec::new(),
            resampler: None,
            force: false,
            filters: Vec::new(),
        }
    }

    /// Create a preset from a filter list string, resolved against `registry`.
    pub fn from_filter_list(
        name: impl Into<String>,
        list: &str,
        registry: &FilterRegistry,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(name).with_filters(resolve_filter_list(list, registry)?))
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the input format spec.
    pub fn with_input(mut self, spec: impl Into<String>) -> Self {
        self.input = Some(spec.into());
        self
    }

    /// Set the output format spec.
    pub fn with_output(mut self, spec: impl Into<String>) -> Self {
        self.output = Some(spec.into());
        self
    }

    /// Set the output layout policy.
    pub fn with_output_layouts<I, S>(mut self, layouts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_layouts = layouts.into_iter().map(Into::into).collect();
        self
    }

    /// Set the auto-inserted resampler.
    pub fn with_resampler(mut self, name: impl Into<String>) -> Self {
        self.resampler = Some(name.into());
        self
    }

    /// Disable automatic conversion and detach.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Add a filter to the preset.
    pub fn with_filter(mut self, filter: FilterConfig) -> Self {
        self.filters.push(filter);
        self
    }

    /// Add multiple filters to the preset.
    pub fn with_filters(mut self, filters: impl IntoIterator<Item = FilterConfig>) -> Self {
        self.filters.extend(filters);
        self
    }

    /// Load a preset from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let preset: ChainPreset = toml::from_str(&content)?;
        tracing::debug!(
            "preset_load: '{}' from {} ({} filters)",
            preset.name,
            path.display(),
            preset.filters.len()
        );
        Ok(preset)
    }

    /// Load a preset from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the preset to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        tracing::debug!("preset_save: '{}' to {}", self.name, path.display());
        Ok(())
    }

    /// Convert the preset to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Get the number of filters in the preset.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Check if the preset has no filters.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Get a filter by index.
    pub fn get(&self, index: usize) -> Option<&FilterConfig> {
        self.filters.get(index)
    }

    /// Find a filter by label.
    pub fn find_by_label(&self, label: &str) -> Option<&FilterConfig> {
        self.filters
            .iter()
            .find(|f| f.label.as_deref() == Some(label))
    }

    /// The parsed input format, if the preset names one.
    pub fn input_format(&self) -> Result<Option<AudioFormat>, ConfigError> {
        self.input
            .as_deref()
            .map(parse_complete_format_spec)
            .transpose()
    }

    /// The parsed output format; unset when the preset names none.
    pub fn output_format(&self) -> Result<AudioFormat, ConfigError> {
        match self.output.as_deref() {
            Some(spec) => parse_format_spec(spec),
            None => Ok(AudioFormat::UNSET),
        }
    }

    /// The output layout policy, `None` when `output_layouts` is empty.
    pub fn output_selector(&self) -> Result<Option<ChannelMapSelector>, ConfigError> {
        if self.output_layouts.is_empty() {
            return Ok(None);
        }
        let mut selector = ChannelMapSelector::new();
        for entry in &self.output_layouts {
            match layout_keyword(entry) {
                Some(LayoutKeyword::Any) => {
                    selector.allow_any();
                }
                Some(LayoutKeyword::Waveext) => {
                    selector.allow_waveext();
                }
                Some(LayoutKeyword::WaveextDefaults) => {
                    selector.allow_waveext_defaults();
                }
                None => {
                    let map: ChannelMap = entry.trim().parse().map_err(
                        |e: cadena_core::ChannelMapParseError| {
                            ConfigError::format_spec(entry.as_str(), e.to_string())
                        },
                    )?;
                    selector.add_map(&map);
                }
            }
        }
        Ok(Some(selector))
    }

    /// Settings for every filter, in chain order.
    pub fn settings(&self) -> Vec<FilterSettings> {
        self.filters.iter().map(FilterConfig::to_settings).collect()
    }
}

impl Default for ChainPreset {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadena_core::SampleFormat;
    use cadena_registry::builtin_registry;

    const NIGHT: &str = r#"
name = "night"
description = "Quiet 5.1 downmix"
input = "48000:5.1:float"
output = "48000:stereo:s16"
output_layouts = ["stereo", "mono"]

[[filters]]
name = "volume"
label = "vol"
[filters.args]
gain = "-6dB"

[[filters]]
name = "meter"
"#;

    #[test]
    fn test_preset_new() {
        let preset = ChainPreset::new("Test");
        assert_eq!(preset.name, "Test");
        assert!(preset.description.is_none());
        assert!(preset.is_empty());
        assert_eq!(ChainPreset::default().name, "Untitled");
    }

    #[test]
    fn test_preset_builder() {
        let preset = ChainPreset::new("Test")
            .with_description("A test preset")
            .with_output("::s16")
            .with_filter(FilterConfig::new("volume").with_label("v"))
            .with_filters([FilterConfig::new("dummy"), FilterConfig::new("meter")]);

        assert_eq!(preset.len(), 3);
        assert_eq!(preset.get(1).map(|f| f.name.as_str()), Some("dummy"));
        assert_eq!(preset.find_by_label("v").map(|f| f.name.as_str()), Some("volume"));
        assert!(preset.find_by_label("w").is_none());
    }

    #[test]
    fn test_preset_from_toml() {
        let preset = ChainPreset::from_toml(NIGHT).unwrap();
        assert_eq!(preset.name, "night");
        assert_eq!(preset.description.as_deref(), Some("Quiet 5.1 downmix"));
        assert_eq!(preset.output_layouts, ["stereo", "mono"]);
        assert_eq!(preset.len(), 2);
        assert_eq!(preset.filters[0].arg("gain"), Some("-6dB"));
        assert!(preset.filters[1].args.is_empty());
    }

    #[test]
    fn test_minimal_toml() {
        let preset = ChainPreset::from_toml("name = \"bare\"").unwrap();
        assert!(preset.is_empty());
        assert!(preset.input.is_none());
        assert!(preset.output_layouts.is_empty());
        assert!(ChainPreset::from_toml("filters = []").is_err());
    }

    #[test]
    fn test_preset_toml_roundtrip() {
        let preset = ChainPreset::from_toml(NIGHT).unwrap();
        let text = preset.to_toml().unwrap();
        assert_eq!(ChainPreset::from_toml(&text).unwrap(), preset);
    }

    #[test]
    fn test_formats() {
        let preset = ChainPreset::from_toml(NIGHT).unwrap();
        let input = preset.input_format().unwrap().unwrap();
        assert_eq!(input.rate, 48000);
        assert_eq!(input.channels.len(), 6);
        let output = preset.output_format().unwrap();
        assert_eq!(output.format, Some(SampleFormat::S16));

        let bare = ChainPreset::new("bare");
        assert_eq!(bare.input_format().unwrap(), None);
        assert!(bare.output_format().unwrap().is_unset());

        let partial = ChainPreset::new("p").with_input("48000");
        assert!(partial.input_format().is_err());
    }

    #[test]
    fn test_output_selector() {
        let preset = ChainPreset::from_toml(NIGHT).unwrap();
        let selector = preset.output_selector().unwrap().unwrap();
        assert_eq!(selector.maps().len(), 2);
        assert_eq!(
            selector.adjust(&"5.1".parse().unwrap()),
            Some(ChannelMap::STEREO)
        );

        let any = ChainPreset::new("a").with_output_layouts(["any"]);
        let selector = any.output_selector().unwrap().unwrap();
        let map: ChannelMap = "7.1".parse().unwrap();
        assert_eq!(selector.adjust(&map), Some(map));

        assert!(ChainPreset::new("n").output_selector().unwrap().is_none());
        let bad = ChainPreset::new("b").with_output_layouts(["hexaphonic"]);
        assert!(bad.output_selector().is_err());
    }

    #[test]
    fn test_from_filter_list() {
        let registry = builtin_registry();
        let preset =
            ChainPreset::from_filter_list("cli", "@v:volume=0.5,resample=44100", &registry)
                .unwrap();
        assert_eq!(preset.len(), 2);
        let settings = preset.settings();
        assert_eq!(settings[0].label.as_deref(), Some("v"));
        assert_eq!(settings[0].args, [("gain".to_string(), "0.5".to_string())]);
        assert_eq!(settings[1].args, [("rate".to_string(), "44100".to_string())]);
    }
}
