//! Configuration and preset management for cadena filter chains.
//!
//! This crate turns text into chain configuration: filter list strings from
//! the command line, `rate:channels:format` specs, and TOML presets that
//! describe a whole chain.
//!
//! # Features
//!
//! - **Filter Lists**: `[@label:]name[=arg[:arg...]]`, comma separated
//! - **Format Specs**: `48000:stereo:float`, any field may be `auto`
//! - **Preset System**: Load and save chain presets from TOML files
//! - **Validation**: Filter names, parameters, labels and formats against the
//!   registry, reporting every problem at once
//! - **Chain Construction**: Build and negotiate a
//!   [`FilterChain`](cadena_core::FilterChain) from a preset
//!
//! # Example
//!
//! ```rust,no_run
//! use cadena_config::{ChainPreset, resolve_filter_list};
//! use cadena_registry::builtin_registry;
//!
//! let registry = builtin_registry();
//! let filters = resolve_filter_list("@vol:volume=-6dB,meter", &registry).unwrap();
//!
//! let preset = ChainPreset::new("night")
//!     .with_input("48000:5.1:float")
//!     .with_output("48000:stereo:s16")
//!     .with_filters(filters);
//! preset.save("night.toml").unwrap();
//! ```

mod chain;
mod error;
mod filter_config;
mod preset;

/// Filter list string syntax.
pub mod filter_list;

/// `rate:channels:format` parsing.
pub mod format_spec;

/// Filter and preset validation.
pub mod validation;

pub use chain::{build_chain, open_chain, open_chain_with_input};
pub use error::ConfigError;
pub use filter_config::FilterConfig;
pub use filter_list::{
    FilterArg, FilterSpec, format_filter_list, parse_filter_list, resolve_filter_list,
};
pub use format_spec::{parse_complete_format_spec, parse_format_spec, parse_layout_list};
pub use preset::ChainPreset;
pub use validation::{PresetValidator, ValidationError, ValidationResult, validate_preset};

/// Re-export commonly used types from cadena-registry
pub use cadena_registry::{FilterCatalog, FilterCategory, FilterDescriptor, builtin_registry};
