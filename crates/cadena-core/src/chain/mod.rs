//! The filter chain and its negotiator.
//!
//! A [`FilterChain`] is a doubly linked list of filter nodes stored in an
//! arena and addressed by [`FilterId`]. Two sentinel nodes bound the list:
//! `in` carries the source format and `out` the sink format. Neither can be
//! removed.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized --init/reinit--> Negotiating --> Ok
//!                                     |
//!                                     +--------> Broken (rebuild with init)
//! ```
//!
//! Every topology or format change runs the negotiator
//! ([`reinit()`](FilterChain::reinit)). It walks the list from the front,
//! offers each node its predecessor's output, and resolves mismatches by
//! asking the predecessor to adapt or by auto-inserting conversion filters.
//! The first successful negotiation fixes the chain's output format.
//!
//! # Frame flow
//!
//! Frames enter with [`filter_frame()`](FilterChain::filter_frame), are pumped
//! with [`output_frame()`](FilterChain::output_frame) and leave with
//! [`read_output_frame()`](FilterChain::read_output_frame). Pumping is pull
//! based: a node only works when something downstream needs data. End of
//! stream propagates front to back, and every node is flushed at most once per
//! cycle.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cadena_core::{AudioFormat, FilterChain, FilterSettings, SampleFormat, ChannelMap};
//!
//! let mut chain = FilterChain::new(Arc::new(registry));
//! chain.set_input_format(AudioFormat::new(SampleFormat::S16, ChannelMap::MONO, 16000));
//! chain.set_output_format(AudioFormat::new(SampleFormat::Float, ChannelMap::STEREO, 48000));
//! chain.set_settings(vec![FilterSettings::new("volume").with_arg("gain", "-6dB")]);
//! chain.init()?;
//!
//! chain.filter_frame(frame)?;
//! while chain.output_frame(false)? == OutputStatus::Available {
//!     let out = chain.read_output_frame();
//! }
//! ```

mod negotiate;
mod node;
mod processing;

pub use node::FilterId;
pub use processing::{ChainEvent, ChainState, DEFAULT_RESAMPLER, FilterChain, OutputStatus};
