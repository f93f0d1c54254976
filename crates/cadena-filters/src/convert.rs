//! Sample format converter.
//!
//! This is the filter the negotiator inserts to bridge sample format
//! mismatches: its [`INFO`] declares every conversion between two distinct
//! PCM encodings.

use cadena_core::{
    AudioFormat, AudioFrame, Command, Filter, FilterError, FilterFlags, FilterInfo, FilterIo,
    Reply, SampleFormat,
};

/// Registry entry for [`FormatConverter`].
pub const INFO: FilterInfo = FilterInfo {
    name: "format",
    description: "Converts between PCM sample formats",
    flags: FilterFlags::NONE,
    params: &["format"],
    test_conversion: Some(pcm_conversion),
};

/// Any PCM encoding converts into any other. Passthrough data is opaque.
pub fn pcm_conversion(from: SampleFormat, to: SampleFormat) -> bool {
    from != to && !from.is_passthrough() && !to.is_passthrough()
}

/// Re-encodes frames into a target sample format.
///
/// Without a target (neither `format=` nor [`Command::SetFormat`]) the
/// filter passes its input format through.
#[derive(Debug, Default)]
pub struct FormatConverter {
    target: Option<SampleFormat>,
}

impl FormatConverter {
    /// Converter without a target.
    pub fn new() -> Self {
        Self::default()
    }

    /// Converter producing `target`.
    pub fn with_target(target: SampleFormat) -> Self {
        Self {
            target: Some(target),
        }
    }

    /// The configured target format.
    pub fn target(&self) -> Option<SampleFormat> {
        self.target
    }
}

impl Filter for FormatConverter {
    fn control(&mut self, io: &mut FilterIo, cmd: &Command) -> Reply {
        match cmd {
            Command::Reinit(input) => {
                let mut output = *input;
                if let Some(target) = self.target {
                    output.format = Some(target);
                }
                if input.format != output.format && input.is_passthrough() {
                    // Compressed data cannot be re-encoded; ask for PCM.
                    return Reply::NeedsAdjustment(AudioFormat {
                        format: Some(SampleFormat::Float),
                        ..AudioFormat::UNSET
                    });
                }
                if input.format != output.format && output.is_passthrough() {
                    return Reply::Error(FilterError::Unsupported(format!(
                        "cannot encode {}",
                        self.target.map_or("?", SampleFormat::name)
                    )));
                }
                io.set_output(output);
                Reply::Ok
            }
            Command::SetFormat(format) => {
                self.target = Some(*format);
                Reply::Ok
            }
            Command::Reset => Reply::Ok,
            _ => Reply::Unknown,
        }
    }

    fn filter_frame(
        &mut self,
        io: &mut FilterIo,
        frame: Option<AudioFrame>,
    ) -> Result<(), FilterError> {
        let Some(frame) = frame else {
            return Ok(());
        };
        let output = *io.output();
        if frame.format().format == output.format {
            io.push_output(frame);
            return Ok(());
        }
        io.push_output(AudioFrame::from_f32(output, &frame.to_f32()?)?);
        Ok(())
    }

    fn set_param(&mut self, name: &str, value: &str) -> Result<(), FilterError> {
        match name {
            "format" => {
                let format: SampleFormat = value
                    .parse()
                    .map_err(|e| FilterError::invalid_param(name, value, format!("{e}")))?;
                self.target = Some(format);
                Ok(())
            }
            _ => Err(FilterError::UnknownParam(name.to_string())),
        }
    }
}
