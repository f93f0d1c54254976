//! Per-channel delay lines.

use std::collections::VecDeque;

use cadena_core::{
    AudioFormat, AudioFrame, Command, Filter, FilterError, FilterFlags, FilterInfo, FilterIo,
    Reply, SampleFormat,
};

use crate::value::parse_seconds;

/// Registry entry for [`Delay`].
pub const INFO: FilterInfo = FilterInfo {
    name: "delay",
    description: "Delays each channel by its own amount",
    flags: FilterFlags::NONE,
    params: &["delays"],
    test_conversion: None,
};

/// Delays channel `n` by the `n`-th entry of a `|`-separated list
/// (`delays=10ms|0|2.5ms`). Channels beyond the list are not delayed.
///
/// Each line starts filled with silence, so the stream keeps its length and
/// the first samples of a delayed channel are zero.
#[derive(Debug, Default)]
pub struct Delay {
    delays: Vec<f64>,
    lines: Vec<VecDeque<f32>>,
}

impl Delay {
    /// Delay with no configured delays.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configured delays in seconds.
    pub fn delays(&self) -> &[f64] {
        &self.delays
    }

    fn prime(&mut self, format: &AudioFormat) {
        let rate = f64::from(format.rate);
        self.lines = (0..format.channels.len())
            .map(|ch| {
                let seconds = self.delays.get(ch).copied().unwrap_or(0.0);
                let len = (seconds * rate).round() as usize;
                std::iter::repeat_n(0.0, len).collect()
            })
            .collect();
    }

    fn prime_from_io(&mut self, io: &FilterIo) {
        let format = *io.output();
        self.prime(&format);
    }
}

impl Filter for Delay {
    fn control(&mut self, io: &mut FilterIo, cmd: &Command) -> Reply {
        match cmd {
            Command::Reinit(input) => {
                if input.is_passthrough() {
                    return Reply::NeedsAdjustment(AudioFormat {
                        format: Some(SampleFormat::Float),
                        ..AudioFormat::UNSET
                    });
                }
                io.set_output(*input);
                self.prime(input);
                Reply::Ok
            }
            Command::Reset => {
                self.prime_from_io(io);
                Reply::Ok
            }
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
        if self.lines.iter().all(VecDeque::is_empty) {
            io.push_output(frame);
            return Ok(());
        }
        let channels = frame.channels();
        if channels != self.lines.len() {
            return Err(FilterError::Processing(format!(
                "frame has {channels} channels, delay lines expect {}",
                self.lines.len()
            )));
        }
        let mut samples = frame.to_f32()?;
        for chunk in samples.chunks_exact_mut(channels) {
            for (s, line) in chunk.iter_mut().zip(&mut self.lines) {
                if !line.is_empty() {
                    line.push_back(*s);
                    *s = line.pop_front().unwrap_or(0.0);
                }
            }
        }
        io.push_output(AudioFrame::from_f32(*frame.format(), &samples)?);
        Ok(())
    }

    fn set_param(&mut self, name: &str, value: &str) -> Result<(), FilterError> {
        match name {
            "delays" => {
                self.delays = value
                    .split('|')
                    .map(|v| parse_seconds(name, v))
                    .collect::<Result<_, _>>()?;
                Ok(())
            }
            _ => Err(FilterError::UnknownParam(name.to_string())),
        }
    }
}
