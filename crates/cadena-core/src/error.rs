//! Error types for chain operations and filter hooks.

use crate::format::AudioFormat;

/// Errors reported by a filter's hooks.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    /// The filter has no parameter with this name.
    #[error("unknown parameter '{0}'")]
    UnknownParam(String),

    /// The value could not be applied to the parameter.
    #[error("invalid value '{value}' for parameter '{param}': {reason}")]
    InvalidParam {
        /// Parameter name.
        param: String,
        /// Rejected value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The filter cannot handle this input.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Frame processing failed.
    #[error("processing failed: {0}")]
    Processing(String),
}

impl FilterError {
    /// Shorthand for [`FilterError::InvalidParam`].
    pub fn invalid_param(
        param: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidParam {
            param: param.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Errors reported by [`FilterChain`](crate::FilterChain) operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChainError {
    /// No filter with this name is registered.
    #[error("unknown filter '{0}'")]
    UnknownFilter(String),

    /// The filter may only exist once per chain.
    #[error("filter '{0}' can only be used once per chain")]
    NotReentrant(String),

    /// Another filter already carries this label.
    #[error("a filter labeled '{0}' already exists")]
    DuplicateLabel(String),

    /// Creating or opening the filter failed.
    #[error("could not open filter '{name}': {source}")]
    FilterOpen {
        /// Filter name.
        name: String,
        /// Underlying error.
        source: FilterError,
    },

    /// A chain operation received an unusable argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No registered filter chain converts between the two formats.
    #[error("no conversion from {from} to {to} before '{filter}'")]
    NoConversion {
        /// Format produced upstream.
        from: AudioFormat,
        /// Format the filter requires.
        to: AudioFormat,
        /// The filter that could not be satisfied.
        filter: String,
    },

    /// A forced chain met a format mismatch it may not fix.
    #[error("formats do not match before '{filter}' ({from} vs {to}) and automatic conversion is disabled")]
    AutoConversionDisabled {
        /// Format produced upstream.
        from: AudioFormat,
        /// Format the filter requires.
        to: AudioFormat,
        /// The filter that could not be satisfied.
        filter: String,
    },

    /// Negotiation kept adjusting without converging.
    #[error("format negotiation did not converge after {0} adjustments")]
    RetryBudgetExhausted(usize),

    /// An incomplete format reached a filter during negotiation.
    #[error("incomplete format {format} offered to '{filter}'")]
    MalformedFormat {
        /// The offending format.
        format: AudioFormat,
        /// The filter it was offered to.
        filter: String,
    },

    /// A filter refused reinitialization.
    #[error("filter '{filter}' rejected its input format: {reason}")]
    FilterRejected {
        /// Filter name.
        filter: String,
        /// Reason given.
        reason: String,
    },

    /// The output channel policy admits no layout for the stream.
    #[error("no acceptable output channel layout for {0}")]
    NoLayout(String),

    /// Renegotiation produced a different output format.
    #[error("output format changed from {fixed} to {actual}")]
    OutputFormatChanged {
        /// Format fixed by the first negotiation.
        fixed: AudioFormat,
        /// Format produced now.
        actual: AudioFormat,
    },

    /// The chain failed negotiation and must be rebuilt.
    #[error("filter chain is broken")]
    Broken,

    /// The chain has not been negotiated yet.
    #[error("filter chain is not initialized")]
    NotInitialized,

    /// A frame does not match the chain's input format.
    #[error("frame format {actual} does not match chain input {expected}")]
    FormatMismatch {
        /// Declared chain input.
        expected: AudioFormat,
        /// Format of the frame.
        actual: AudioFormat,
    },

    /// A filter failed while processing a frame.
    #[error("filter '{filter}': {source}")]
    Filter {
        /// Filter name.
        filter: String,
        /// Underlying error.
        source: FilterError,
    },
}

impl ChainError {
    /// Errors caused by the requested chain layout itself. The chain is left
    /// unchanged (or rolled back) when one of these is returned.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnknownFilter(_)
                | Self::NotReentrant(_)
                | Self::DuplicateLabel(_)
                | Self::FilterOpen { .. }
                | Self::InvalidArgument(_)
        )
    }

    /// Errors that leave the chain broken.
    pub fn is_negotiation(&self) -> bool {
        matches!(
            self,
            Self::NoConversion { .. }
                | Self::AutoConversionDisabled { .. }
                | Self::RetryBudgetExhausted(_)
                | Self::MalformedFormat { .. }
                | Self::FilterRejected { .. }
                | Self::NoLayout(_)
                | Self::OutputFormatChanged { .. }
        )
    }
}
