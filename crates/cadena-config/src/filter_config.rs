//! Configuration for a single filter in a chain.

use std::collections::BTreeMap;
use std::fmt;

use cadena_core::FilterSettings;
use serde::{Deserialize, Serialize};

/// Configuration for a single filter.
///
/// Arguments are always stored by parameter name; positional arguments from
/// a filter list are resolved against the registry before they get here.
///
/// # TOML Format
///
/// ```toml
/// [[filters]]
/// name = "volume"
/// label = "vol"
/// [filters.args]
/// gain = "-6dB"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterConfig {
    /// Registry name of the filter.
    pub name: String,

    /// Optional unique label for runtime lookup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Arguments by parameter name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub args: BTreeMap<String, String>,
}

impl FilterConfig {
    /// Create a filter config with no label or arguments.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            args: BTreeMap::new(),
        }
    }

    /// Set the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set an argument, replacing any earlier value.
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    /// Get an argument value.
    pub fn arg(&self, key: &str) -> Option<&str> {
        self.args.get(key).map(String::as_str)
    }

    /// Settings the chain creates the filter from.
    pub fn to_settings(&self) -> FilterSettings {
        FilterSettings {
            name: self.name.clone(),
            label: self.label.clone(),
            args: self
                .args
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

impl From<&FilterSettings> for FilterConfig {
    fn from(settings: &FilterSettings) -> Self {
        Self {
            name: settings.name.clone(),
            label: settings.label.clone(),
            args: settings.args.iter().cloned().collect(),
        }
    }
}

/// Quotes a value if it would otherwise split a filter list.
pub(crate) fn quote_if_needed(value: &str) -> String {
    if value.is_empty() || value.contains([',', ':', '=', '"', '@']) {
        format!("\"{value}\"")
    } else {
        value.to_string()
    }
}

/// Filter list syntax with named arguments: `@vol:volume=gain=-6dB`.
impl fmt::Display for FilterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(label) = &self.label {
            write!(f, "@{}:", quote_if_needed(label))?;
        }
        f.write_str(&self.name)?;
        for (i, (key, value)) in self.args.iter().enumerate() {
            let sep = if i == 0 { '=' } else { ':' };
            write!(f, "{sep}{key}={}", quote_if_needed(value))?;
        }
        Ok(())
    }
}
