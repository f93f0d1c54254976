//! Filter and preset validation.
//!
//! Checks configurations against a [`FilterRegistry`] before a chain is built,
//! so that every problem is reported at once instead of one failed `init` at
//! a time.
//!
//! # Example
//!
//! ```rust
//! use cadena_config::{FilterConfig, PresetValidator};
//!
//! let validator = PresetValidator::new();
//! validator
//!     .validate_filter(&FilterConfig::new("volume").with_arg("gain", "-6dB"))
//!     .expect("volume accepts dB gains");
//! assert!(validator.validate_filter(&FilterConfig::new("reverb")).is_err());
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use cadena_core::{ChannelMap, FilterError, FilterFlags, FilterRegistry};
use cadena_registry::builtin_registry;
use thiserror::Error;

use crate::filter_config::FilterConfig;
use crate::format_spec::{parse_complete_format_spec, parse_format_spec};
use crate::preset::{ChainPreset, layout_keyword};

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// No filter with this name is registered.
    #[error("unknown filter: {0}")]
    UnknownFilter(String),

    /// The filter does not declare this parameter.
    #[error("unknown parameter '{param}' for filter '{filter}'")]
    UnknownParameter {
        /// Name of the filter.
        filter: String,
        /// Name of the unrecognized parameter.
        param: String,
    },

    /// The filter rejected an argument value.
    #[error("invalid value '{value}' for '{param}' of filter '{filter}': {reason}")]
    InvalidValue {
        /// Name of the filter.
        filter: String,
        /// Name of the parameter.
        param: String,
        /// The rejected value.
        value: String,
        /// Why the filter rejected it.
        reason: String,
    },

    /// More positional arguments than declared parameters.
    #[error("filter '{filter}' takes at most {max} positional arguments, got {given}")]
    TooManyArguments {
        /// Name of the filter.
        filter: String,
        /// Positional arguments given.
        given: usize,
        /// Parameters the filter declares.
        max: usize,
    },

    /// The same parameter was set twice in one filter.
    #[error("parameter '{param}' given twice for filter '{filter}'")]
    DuplicateArgument {
        /// Name of the filter.
        filter: String,
        /// Name of the repeated parameter.
        param: String,
    },

    /// Two filters share a label.
    #[error("duplicate label: {0}")]
    DuplicateLabel(String),

    /// Labels must be non-empty.
    #[error("empty label on filter '{0}'")]
    EmptyLabel(String),

    /// A non-reentrant filter appears more than once.
    #[error("filter '{0}' can only be used once per chain")]
    NotReentrant(String),

    /// A format spec field is malformed.
    #[error("invalid {field} format: {reason}")]
    InvalidFormat {
        /// Which field (`input` or `output`).
        field: String,
        /// Description of the format error.
        reason: String,
    },

    /// An output layout entry is malformed.
    #[error("invalid output layout '{layout}': {reason}")]
    InvalidLayout {
        /// The rejected entry.
        layout: String,
        /// Description of the error.
        reason: String,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn collect(mut errors: Vec<ValidationError>) -> ValidationResult<()> {
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

/// Validator for filter configurations and presets.
///
/// Argument values are checked by creating a scratch instance of the filter
/// and applying them, so the filter's own parsing decides what is valid.
#[derive(Debug, Clone)]
pub struct PresetValidator {
    registry: Arc<FilterRegistry>,
}

impl Default for PresetValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl PresetValidator {
    /// Validator for the built-in filters.
    pub fn new() -> Self {
        Self::with_registry(builtin_registry())
    }

    /// Validator for a custom registry.
    pub fn with_registry(registry: Arc<FilterRegistry>) -> Self {
        Self { registry }
    }

    /// Validate that a filter name is registered.
    pub fn validate_filter_name(&self, name: &str) -> ValidationResult<()> {
        if self.registry.get(name).is_some() {
            Ok(())
        } else {
            Err(ValidationError::UnknownFilter(name.to_string()))
        }
    }

    /// Validate one filter: its name, label, parameter names and values.
    pub fn validate_filter(&self, config: &FilterConfig) -> ValidationResult<()> {
        let Some((info, mut filter)) = self.registry.create(&config.name) else {
            return Err(ValidationError::UnknownFilter(config.name.clone()));
        };

        let mut errors = Vec::new();
        if config.label.as_deref().is_some_and(str::is_empty) {
            errors.push(ValidationError::EmptyLabel(config.name.clone()));
        }
        for (param, value) in &config.args {
            if !info.params.iter().any(|p| *p == param.as_str()) {
                errors.push(ValidationError::UnknownParameter {
                    filter: config.name.clone(),
                    param: param.clone(),
                });
                continue;
            }
            match filter.set_param(param, value) {
                Ok(()) => {}
                Err(FilterError::UnknownParam(_)) => {
                    errors.push(ValidationError::UnknownParameter {
                        filter: config.name.clone(),
                        param: param.clone(),
                    });
                }
                Err(FilterError::InvalidParam { reason, .. }) => {
                    errors.push(ValidationError::InvalidValue {
                        filter: config.name.clone(),
                        param: param.clone(),
                        value: value.clone(),
                        reason,
                    });
                }
                Err(other) => {
                    errors.push(ValidationError::InvalidValue {
                        filter: config.name.clone(),
                        param: param.clone(),
                        value: value.clone(),
                        reason: other.to_string(),
                    });
                }
            }
        }
        collect(errors)
    }

    /// Validate a filter list: every filter, plus labels and reentrancy
    /// across the list.
    pub fn validate_filters(&self, filters: &[FilterConfig]) -> ValidationResult<()> {
        let mut errors = Vec::new();
        let mut labels = HashSet::new();
        let mut singletons = HashSet::new();

        for config in filters {
            match self.validate_filter(config) {
                Ok(()) => {}
                Err(ValidationError::Multiple(inner)) => errors.extend(inner),
                Err(e) => errors.push(e),
            }
            if let Some(label) = &config.label
                && !label.is_empty()
                && !labels.insert(label.as_str())
            {
                errors.push(ValidationError::DuplicateLabel(label.clone()));
            }
            if let Some(info) = self.registry.get(&config.name)
                && info.flags.contains(FilterFlags::NOT_REENTRANT)
                && !singletons.insert(info.name)
            {
                errors.push(ValidationError::NotReentrant(config.name.clone()));
            }
        }
        collect(errors)
    }

    /// Validate a whole preset.
    pub fn validate_preset(&self, preset: &ChainPreset) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Some(input) = &preset.input
            && let Err(e) = parse_complete_format_spec(input)
        {
            errors.push(ValidationError::InvalidFormat {
                field: "input".into(),
                reason: e.to_string(),
            });
        }
        if let Some(output) = &preset.output
            && let Err(e) = parse_format_spec(output)
        {
            errors.push(ValidationError::InvalidFormat {
                field: "output".into(),
                reason: e.to_string(),
            });
        }
        for layout in &preset.output_layouts {
            if layout_keyword(layout).is_none()
                && let Err(e) = layout.parse::<ChannelMap>()
            {
                errors.push(ValidationError::InvalidLayout {
                    layout: layout.clone(),
                    reason: e.to_string(),
                });
            }
        }
        if let Some(resampler) = &preset.resampler
            && let Err(e) = self.validate_filter_name(resampler)
        {
            errors.push(e);
        }

        match self.validate_filters(&preset.filters) {
            Ok(()) => {}
            Err(ValidationError::Multiple(inner)) => errors.extend(inner),
            Err(e) => errors.push(e),
        }
        collect(errors)
    }
}

/// Validate a preset against the built-in filters.
pub fn validate_preset(preset: &ChainPreset) -> ValidationResult<()> {
    PresetValidator::new().validate_preset(preset)
}
