//! The filter abstraction and its control protocol.
//!
//! A filter is a stateful processing stage. The chain talks to it through
//! two entry points:
//!
//! - [`Filter::control`] receives a typed [`Command`] and answers with a
//!   [`Reply`]. Negotiation uses [`Command::Reinit`]; the other commands
//!   push parameters (channels, rate, sample format, volume) or reset state.
//! - [`Filter::filter_frame`] consumes one input frame (or `None` to flush)
//!   and appends produced frames to the node's output queue in [`FilterIo`].
//!
//! Static capabilities live in a [`FilterInfo`] descriptor that the
//! [`FilterRegistry`](crate::FilterRegistry) stores next to a factory.
//!
//! # Reinit contract
//!
//! On `Reinit(candidate)` the chain has already stored `candidate` as the
//! node's input format. The filter answers:
//!
//! - [`Reply::Ok`] after storing a complete output format with
//!   [`FilterIo::set_output`];
//! - [`Reply::NeedsAdjustment`] with the input it requires instead;
//! - [`Reply::Detach`] if it has nothing to do for this stream.

use std::collections::VecDeque;

use crate::chmap::ChannelMap;
use crate::error::FilterError;
use crate::format::{AudioFormat, SampleFormat};
use crate::frame::AudioFrame;

/// Control messages sent to filters.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Negotiate with the given input format.
    Reinit(AudioFormat),
    /// Drop internal state after a discontinuity.
    Reset,
    /// Produce this channel map from now on.
    SetChannels(ChannelMap),
    /// Produce this sample rate from now on.
    SetSampleRate(u32),
    /// Produce this sample format from now on.
    SetFormat(SampleFormat),
    /// Set linear output gain.
    SetVolume(f32),
    /// Set a named parameter from its string form.
    SetParam {
        /// Parameter name.
        name: String,
        /// Parameter value.
        value: String,
    },
}

impl Command {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Reinit(_) => "reinit",
            Command::Reset => "reset",
            Command::SetChannels(_) => "set-channels",
            Command::SetSampleRate(_) => "set-sample-rate",
            Command::SetFormat(_) => "set-format",
            Command::SetVolume(_) => "set-volume",
            Command::SetParam { .. } => "set-param",
        }
    }
}

/// Answer to a [`Command`].
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Accepted.
    Ok,
    /// The offered input is not usable; this is the input the filter wants.
    /// Unset fields keep the offered values.
    NeedsAdjustment(AudioFormat),
    /// The filter is redundant for this stream and asks to be removed.
    Detach,
    /// The command is not supported by this filter.
    Unknown,
    /// The command failed.
    Error(FilterError),
}

/// Negotiated formats, declared delay and output queue of one chain node.
///
/// Owned by the chain and lent to the filter for every call.
#[derive(Debug, Default)]
pub struct FilterIo {
    pub(crate) input: AudioFormat,
    pub(crate) output: AudioFormat,
    pub(crate) delay: f64,
    pub(crate) queue: VecDeque<AudioFrame>,
}

impl FilterIo {
    /// Fresh state with unset formats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Negotiated input format.
    pub fn input(&self) -> &AudioFormat {
        &self.input
    }

    /// Negotiated output format.
    pub fn output(&self) -> &AudioFormat {
        &self.output
    }

    /// Stores the output format this filter produces.
    pub fn set_output(&mut self, format: AudioFormat) {
        self.output = format;
    }

    /// Declared processing delay in seconds.
    pub fn delay(&self) -> f64 {
        self.delay
    }

    /// Declares the processing delay in seconds.
    pub fn set_delay(&mut self, seconds: f64) {
        self.delay = seconds.max(0.0);
    }

    /// Appends a produced frame to the output queue.
    pub fn push_output(&mut self, frame: AudioFrame) {
        self.queue.push_back(frame);
    }

    /// Takes the oldest queued output frame.
    pub fn pop_output(&mut self) -> Option<AudioFrame> {
        self.queue.pop_front()
    }

    /// Whether output frames are waiting downstream.
    pub fn has_output(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Number of queued output frames.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Queued sample frames, in output samples.
    pub fn queued_samples(&self) -> usize {
        self.queue.iter().map(AudioFrame::samples).sum()
    }

    pub(crate) fn reset_formats(&mut self) {
        self.input = AudioFormat::UNSET;
        self.output = AudioFormat::UNSET;
    }
}

/// Capability flags of a filter.
///
/// # Example
///
/// ```rust
/// use cadena_core::FilterFlags;
///
/// let flags = FilterFlags::NOT_REENTRANT;
/// assert!(flags.contains(FilterFlags::NOT_REENTRANT));
/// assert!(!FilterFlags::NONE.contains(FilterFlags::NOT_REENTRANT));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterFlags(u8);

impl FilterFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// At most one instance per chain.
    pub const NOT_REENTRANT: Self = Self(1 << 0);

    /// Returns `true` if all bits in `other` are set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Returns the union of two flag sets.
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// Predicate telling whether a filter can convert between two encodings.
pub type ConversionTest = fn(SampleFormat, SampleFormat) -> bool;

/// Static description of a filter.
#[derive(Debug, Clone, Copy)]
pub struct FilterInfo {
    /// Unique name used in filter lists.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Capability flags.
    pub flags: FilterFlags,
    /// Parameter names, in positional-argument order.
    pub params: &'static [&'static str],
    /// Sample format conversions this filter offers to the negotiator.
    pub test_conversion: Option<ConversionTest>,
}

impl FilterInfo {
    /// Whether this filter converts `from` into `to`.
    pub fn converts(&self, from: SampleFormat, to: SampleFormat) -> bool {
        self.test_conversion.is_some_and(|test| test(from, to))
    }
}

/// A processing stage in a [`FilterChain`](crate::FilterChain).
///
/// Filters are created by a registry factory, configured with
/// [`set_param`](Filter::set_param), opened, and then driven by the chain.
pub trait Filter: Send {
    /// Handles a control message.
    fn control(&mut self, io: &mut FilterIo, cmd: &Command) -> Reply;

    /// Consumes one input frame, or flushes on `None`. Output goes to
    /// [`FilterIo::push_output`].
    fn filter_frame(
        &mut self,
        io: &mut FilterIo,
        frame: Option<AudioFrame>,
    ) -> Result<(), FilterError>;

    /// Produces output without new input. Called when the node's queue is
    /// empty and downstream wants data.
    fn filter_out(&mut self, _io: &mut FilterIo) -> Result<(), FilterError> {
        Ok(())
    }

    /// Applies a named argument before [`open`](Filter::open).
    fn set_param(&mut self, name: &str, _value: &str) -> Result<(), FilterError> {
        Err(FilterError::UnknownParam(name.to_string()))
    }

    /// Called once after arguments are applied.
    fn open(&mut self) -> Result<(), FilterError> {
        Ok(())
    }

    /// Called once before the filter is destroyed.
    fn uninit(&mut self) {}
}

/// A filter request: registry name, optional label and named arguments.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterSettings {
    /// Registry name.
    pub name: String,
    /// Unique label for runtime lookup.
    pub label: Option<String>,
    /// Named arguments, applied in order.
    pub args: Vec<(String, String)>,
}

impl FilterSettings {
    /// Settings for `name` with no label or arguments.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            args: Vec::new(),
        }
    }

    /// Sets the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Appends a named argument.
    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.push((name.into(), value.into()));
        self
    }
}
