//! Gain stage.

use cadena_core::{
    AudioFormat, AudioFrame, Command, Filter, FilterError, FilterFlags, FilterInfo, FilterIo,
    Reply, SampleFormat,
};

use crate::value::{linear_to_db, parse_bool, parse_gain};

/// Registry entry for [`Volume`].
pub const INFO: FilterInfo = FilterInfo {
    name: "volume",
    description: "Applies a linear or dB gain to float audio",
    flags: FilterFlags::NONE,
    params: &["gain", "detach"],
    test_conversion: None,
};

/// Multiplies every sample by a gain factor.
///
/// Works on `float` and `floatp` input and asks for `float` otherwise.
/// With `detach=yes` the filter removes itself from the chain while the
/// gain is exactly unity.
///
/// ## Parameters
///
/// | Name | Syntax | Default |
/// |------|--------|---------|
/// | `gain` | factor or dB (`0.5`, `-6dB`) | 1.0 |
/// | `detach` | `yes`/`no` | `no` |
///
/// # Example
///
/// ```rust
/// use cadena_core::Filter;
/// use cadena_filters::Volume;
///
/// let mut vol = Volume::new();
/// vol.set_param("gain", "-6dB").unwrap();
/// assert!((vol.gain() - 0.501).abs() < 0.001);
/// ```
#[derive(Debug, Clone)]
pub struct Volume {
    gain: f32,
    detach: bool,
}

impl Default for Volume {
    fn default() -> Self {
        Self::new()
    }
}

impl Volume {
    /// Unity gain, never detaches.
    pub fn new() -> Self {
        Self {
            gain: 1.0,
            detach: false,
        }
    }

    /// Current linear gain.
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Current gain in dB.
    pub fn gain_db(&self) -> f32 {
        linear_to_db(self.gain)
    }

    fn supports(format: Option<SampleFormat>) -> bool {
        matches!(format, Some(SampleFormat::Float | SampleFormat::FloatP))
    }
}

impl Filter for Volume {
    fn control(&mut self, io: &mut FilterIo, cmd: &Command) -> Reply {
        match cmd {
            Command::Reinit(input) => {
                if self.detach && self.gain == 1.0 {
                    return Reply::Detach;
                }
                if !Self::supports(input.format) {
                    return Reply::NeedsAdjustment(AudioFormat {
                        format: Some(SampleFormat::Float),
                        ..AudioFormat::UNSET
                    });
                }
                io.set_output(*input);
                Reply::Ok
            }
            Command::SetVolume(gain) if gain.is_finite() && *gain >= 0.0 => {
                self.gain = *gain;
                Reply::Ok
            }
            Command::SetVolume(gain) => Reply::Error(FilterError::invalid_param(
                "gain",
                gain.to_string(),
                "gain must be finite and not negative",
            )),
            Command::SetParam { name, value } => match self.set_param(name, value) {
                Ok(()) => Reply::Ok,
                Err(FilterError::UnknownParam(_)) => Reply::Unknown,
                Err(e) => Reply::Error(e),
            },
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
        if self.gain == 1.0 {
            io.push_output(frame);
            return Ok(());
        }
        let mut samples = frame.to_f32()?;
        for s in &mut samples {
            *s *= self.gain;
        }
        io.push_output(AudioFrame::from_f32(*frame.format(), &samples)?);
        Ok(())
    }

    fn set_param(&mut self, name: &str, value: &str) -> Result<(), FilterError> {
        match name {
            "gain" => self.gain = parse_gain(name, value)?,
            "detach" => self.detach = parse_bool(name, value)?,
            _ => return Err(FilterError::UnknownParam(name.to_string())),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadena_core::ChannelMap;

    fn float_stereo() -> AudioFormat {
        AudioFormat::new(SampleFormat::Float, ChannelMap::STEREO, 48000)
    }

    #[test]
    fn applies_gain() {
        let mut io = FilterIo::new();
        let mut vol = Volume::new();
        vol.set_param("gain", "0.5").unwrap();
        assert_eq!(vol.control(&mut io, &Command::Reinit(float_stereo())), Reply::Ok);

        let frame = AudioFrame::from_f32(float_stereo(), &[0.8, -0.4, 0.2, 0.0]).unwrap();
        vol.filter_frame(&mut io, Some(frame)).unwrap();
        assert_eq!(io.queued(), 1);
        assert_eq!(io.queued_samples(), 2);
    }

    #[test]
    fn asks_for_float() {
        let mut io = FilterIo::new();
        let s16 = AudioFormat::new(SampleFormat::S16, ChannelMap::STEREO, 48000);
        match Volume::new().control(&mut io, &Command::Reinit(s16)) {
            Reply::NeedsAdjustment(req) => {
                assert_eq!(req.format, Some(SampleFormat::Float));
                assert_eq!(req.rate, 0);
                assert!(req.channels.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn detaches_at_unity() {
        let mut io = FilterIo::new();
        let mut vol = Volume::new();
        vol.set_param("detach", "yes").unwrap();
        assert_eq!(vol.control(&mut io, &Command::Reinit(float_stereo())), Reply::Detach);

        vol.set_param("gain", "-3dB").unwrap();
        assert_eq!(vol.control(&mut io, &Command::Reinit(float_stereo())), Reply::Ok);
    }

    #[test]
    fn volume_commands() {
        let mut io = FilterIo::new();
        let mut vol = Volume::new();
        assert_eq!(vol.control(&mut io, &Command::SetVolume(0.25)), Reply::Ok);
        assert_eq!(vol.gain(), 0.25);
        assert!(matches!(
            vol.control(&mut io, &Command::SetVolume(f32::NAN)),
            Reply::Error(_)
        ));

        let set = Command::SetParam {
            name: "gain".into(),
            value: "0dB".into(),
        };
        assert_eq!(vol.control(&mut io, &set), Reply::Ok);
        assert!(vol.gain_db().abs() < 1e-4);

        let unknown = Command::SetParam {
            name: "pan".into(),
            value: "0".into(),
        };
        assert_eq!(vol.control(&mut io, &unknown), Reply::Unknown);
    }
}
