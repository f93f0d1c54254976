//! Sample rate and channel layout conversion.
//!
//! The negotiator inserts this filter when a neighbor cannot adopt a required
//! channel map or sample rate, then pushes the requirement into it with
//! [`Command::SetChannels`] / [`Command::SetSampleRate`]. The sample format is
//! left unchanged.
//!
//! Channel conversion uses a static mixing matrix: speakers present on both
//! sides are copied, missing speakers are folded into the nearest front
//! channel at -3 dB, LFE is dropped on downmix, and mono is copied to both
//! front channels on upmix. Rate conversion is linear interpolation with the
//! fractional read position carried across frames.

use cadena_core::{
    AudioFormat, AudioFrame, ChannelMap, Command, Filter, FilterError, FilterFlags, FilterInfo,
    FilterIo, Reply, SampleFormat, Speaker,
};

use crate::value::parse_rate;

/// Registry entry for [`Resample`].
pub const INFO: FilterInfo = FilterInfo {
    name: "resample",
    description: "Converts sample rate and remixes channels",
    flags: FilterFlags::NONE,
    params: &["rate", "channels"],
    test_conversion: None,
};

/// -3 dB.
const FOLD_GAIN: f32 = core::f32::consts::FRAC_1_SQRT_2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
    Center,
    Lfe,
    None,
}

fn side(sp: Speaker) -> Side {
    use Speaker as S;
    match sp {
        S::FrontLeft
        | S::BackLeft
        | S::FrontLeftOfCenter
        | S::SideLeft
        | S::TopFrontLeft
        | S::TopBackLeft
        | S::DownmixLeft
        | S::WideLeft
        | S::SurroundDirectLeft => Side::Left,
        S::FrontRight
        | S::BackRight
        | S::FrontRightOfCenter
        | S::SideRight
        | S::TopFrontRight
        | S::TopBackRight
        | S::DownmixRight
        | S::WideRight
        | S::SurroundDirectRight => Side::Right,
        S::FrontCenter | S::BackCenter | S::TopCenter | S::TopFrontCenter | S::TopBackCenter => {
            Side::Center
        }
        S::LowFrequency | S::LowFrequency2 => Side::Lfe,
        S::Na => Side::None,
    }
}

/// Row-major `out_channels x in_channels` gain matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct RemixMatrix {
    inputs: usize,
    outputs: usize,
    gains: Vec<f32>,
}

impl RemixMatrix {
    /// Builds the matrix converting `from` into `to`.
    pub fn new(from: &ChannelMap, to: &ChannelMap) -> Self {
        let (inputs, outputs) = (from.len(), to.len());
        let mut m = Self {
            inputs,
            outputs,
            gains: vec![0.0; inputs * outputs],
        };

        let sources = to.source_indices(from);
        let mut used = vec![false; inputs];
        for (out, src) in sources.iter().enumerate() {
            if let Some(i) = *src {
                m.gains[out * inputs + i] = 1.0;
                used[i] = true;
            }
        }
        if from.is_unknown() || to.is_unknown() {
            return m;
        }

        let find = |sp: Speaker| to.speakers().iter().position(|&s| s == sp);
        let (fl, fr, fc) = (
            find(Speaker::FrontLeft),
            find(Speaker::FrontRight),
            find(Speaker::FrontCenter),
        );

        if from.is_mono() {
            for out in [fl, fr].into_iter().flatten() {
                m.gains[out * inputs] = 1.0;
            }
            if fl.is_some() || fr.is_some() {
                return m;
            }
        }

        for (i, &sp) in from.speakers().iter().enumerate() {
            if used[i] {
                continue;
            }
            let targets: Vec<usize> = match side(sp) {
                Side::Left => fl.or(fc).into_iter().collect(),
                Side::Right => fr.or(fc).into_iter().collect(),
                Side::Center => match fc {
                    Some(c) => vec![c],
                    None => [fl, fr].into_iter().flatten().collect(),
                },
                Side::Lfe | Side::None => Vec::new(),
            };
            for out in targets {
                m.gains[out * inputs + i] += FOLD_GAIN;
            }
        }
        m
    }

    /// Whether the matrix copies every channel unchanged.
    pub fn is_identity(&self) -> bool {
        self.inputs == self.outputs
            && (0..self.outputs).all(|o| {
                (0..self.inputs).all(|i| self.gain(o, i) == if o == i { 1.0 } else { 0.0 })
            })
    }

    /// Gain from input channel `input` to output channel `output`.
    pub fn gain(&self, output: usize, input: usize) -> f32 {
        self.gains[output * self.inputs + input]
    }

    /// Mixes one interleaved sample frame.
    fn apply(&self, input: &[f32], out: &mut Vec<f32>) {
        for o in 0..self.outputs {
            let row = &self.gains[o * self.inputs..(o + 1) * self.inputs];
            out.push(row.iter().zip(input).map(|(g, s)| g * s).sum());
        }
    }
}

/// Channel remixer and linear-interpolation resampler.
///
/// ## Parameters
///
/// | Name | Syntax | Default |
/// |------|--------|---------|
/// | `rate` | Hz (`48000`, `44.1kHz`) | input rate |
/// | `channels` | channel map (`stereo`, `fl-fr-fc`, `6`) | input layout |
#[derive(Debug, Default)]
pub struct Resample {
    rate: Option<u32>,
    channels: Option<ChannelMap>,
    matrix: Option<RemixMatrix>,
    resampling: bool,
    /// Input rate over output rate.
    step: f64,
    /// Read position relative to `prev`.
    phase: f64,
    /// Last remixed input sample frame of the previous block.
    prev: Option<Vec<f32>>,
}

impl Resample {
    /// Resampler keeping rate and layout until told otherwise.
    pub fn new() -> Self {
        Self::default()
    }

    fn reset_state(&mut self) {
        self.phase = 0.0;
        self.prev = None;
    }

    /// Linear interpolation over `prev` followed by `block`.
    fn interpolate(&mut self, block: Vec<f32>, channels: usize) -> Vec<f32> {
        let mut buf = self.prev.take().unwrap_or_default();
        buf.extend(block);
        let frames = buf.len() / channels.max(1);
        if frames == 0 {
            return Vec::new();
        }
        let last = (frames - 1) as f64;
        let mut t = self.phase;

        let mut out = Vec::with_capacity(((frames as f64 / self.step) as usize + 1) * channels);
        while t <= last {
            let i = t as usize;
            let frac = (t - i as f64) as f32;
            let j = (i + 1).min(frames - 1);
            for c in 0..channels {
                let a = buf[i * channels + c];
                let b = buf[j * channels + c];
                out.push(a + (b - a) * frac);
            }
            t += self.step;
        }
        self.phase = t - last;
        self.prev = Some(buf[(frames - 1) * channels..].to_vec());
        out
    }
}

impl Filter for Resample {
    fn control(&mut self, io: &mut FilterIo, cmd: &Command) -> Reply {
        match cmd {
            Command::Reinit(input) => {
                if input.is_passthrough() {
                    return Reply::NeedsAdjustment(AudioFormat {
                        format: Some(SampleFormat::Float),
                        ..AudioFormat::UNSET
                    });
                }
                let mut output = *input;
                if let Some(channels) = self.channels {
                    output.channels = channels;
                }
                if let Some(rate) = self.rate {
                    output.rate = rate;
                }
                let matrix = RemixMatrix::new(&input.channels, &output.channels);
                self.matrix = (!matrix.is_identity()).then_some(matrix);
                self.resampling = input.rate != output.rate;
                self.step = f64::from(input.rate) / f64::from(output.rate);
                self.reset_state();
                io.set_output(output);
                io.set_delay(if input.rate == output.rate {
                    0.0
                } else {
                    1.0 / f64::from(input.rate)
                });
                Reply::Ok
            }
            Command::SetChannels(channels) if channels.is_valid() => {
                self.channels = Some(*channels);
                Reply::Ok
            }
            Command::SetSampleRate(rate) if *rate > 0 => {
                self.rate = Some(*rate);
                Reply::Ok
            }
            Command::SetChannels(_) | Command::SetSampleRate(_) => {
                Reply::Error(FilterError::Unsupported(format!("invalid {}", cmd.name())))
            }
            Command::Reset => {
                self.reset_state();
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
        let output = *io.output();
        if self.matrix.is_none() && !self.resampling {
            io.push_output(frame);
            return Ok(());
        }

        let mut samples = frame.to_f32()?;
        if let Some(matrix) = &self.matrix {
            let mut mixed = Vec::with_capacity(frame.samples() * matrix.outputs);
            for chunk in samples.chunks_exact(matrix.inputs.max(1)) {
                matrix.apply(chunk, &mut mixed);
            }
            samples = mixed;
        }
        if self.resampling {
            samples = self.interpolate(samples, output.channels.len());
        }
        if !samples.is_empty() {
            io.push_output(AudioFrame::from_f32(output, &samples)?);
        }
        Ok(())
    }

    fn set_param(&mut self, name: &str, value: &str) -> Result<(), FilterError> {
        match name {
            "rate" => self.rate = Some(parse_rate(name, value)?),
            "channels" => {
                let map: ChannelMap = value
                    .parse()
                    .map_err(|e| FilterError::invalid_param(name, value, format!("{e}")))?;
                if !map.is_valid() {
                    return Err(FilterError::invalid_param(name, value, "invalid channel map"));
                }
                self.channels = Some(map);
            }
            _ => return Err(FilterError::UnknownParam(name.to_string())),
        }
        Ok(())
    }
}
