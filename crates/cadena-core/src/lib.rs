//! Cadena Core - audio format negotiation and filter chains
//!
//! This crate reshapes an audio stream from whatever format a source produces
//! into the exact format a sink requires, through a runtime-editable chain of
//! filters.
//!
//! # Core Abstractions
//!
//! ## Channel Layouts
//!
//! - [`ChannelMap`] - Ordered speaker layout (`fl-fr`, `5.1(side)`, `unknown6`)
//! - [`Speaker`] - Speaker identifiers with wave-extensible numbering
//! - [`ChannelMapSelector`] - Acceptance policy and best-match selection
//! - [`is_better`] - The preference order used for fallback layouts
//!
//! ## Formats and Frames
//!
//! - [`SampleFormat`] - PCM encodings and compressed passthrough encodings
//! - [`AudioFormat`] - Sample format, channel map and rate of a stream
//! - [`AudioFrame`] - Owned block of samples with `f32` decode/encode
//!
//! ## Filters
//!
//! - [`Filter`] - Object-safe trait implemented by every processing stage
//! - [`Command`] / [`Reply`] - Typed control protocol
//! - [`FilterInfo`] - Static capabilities, including sample format conversions
//! - [`FilterRegistry`] - Ordered name -> factory table
//!
//! ## Chains
//!
//! - [`FilterChain`] - Arena-backed linked list between `in` and `out` sentinels,
//!   with negotiation, control broadcast and a pull-based frame pump
//! - [`find_conversion`] - Shortest sample format conversion path search
//!
//! # Example
//!
//! ```rust
//! use cadena_core::{ChannelMap, ChannelMapSelector};
//!
//! let mut policy = ChannelMapSelector::new();
//! policy.add_map(&"5.1".parse().unwrap()).add_map(&ChannelMap::STEREO);
//!
//! // Side surrounds stand in for back surrounds.
//! let picked = policy.adjust(&"5.1(side)".parse().unwrap()).unwrap();
//! assert_eq!(picked.to_string(), "5.1");
//! ```

pub mod chain;
pub mod chmap;
pub mod error;
pub mod filter;
pub mod format;
pub mod frame;
pub mod path;
pub mod registry;
pub mod select;

pub use chain::{
    ChainEvent, ChainState, DEFAULT_RESAMPLER, FilterChain, FilterId, OutputStatus,
};
pub use chmap::{ChannelMap, ChannelMapParseError, MAX_CHANNELS, STANDARD_LAYOUTS, Speaker};
pub use error::{ChainError, FilterError};
pub use filter::{
    Command, ConversionTest, Filter, FilterFlags, FilterInfo, FilterIo, FilterSettings, Reply,
};
pub use format::{AudioFormat, SampleFormat, UnknownSampleFormat};
pub use frame::AudioFrame;
pub use path::{ConversionStep, find_conversion};
pub use registry::{FilterFactory, FilterRegistry};
pub use select::{ChannelMapSelector, is_better};
