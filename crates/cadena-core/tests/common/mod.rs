//! Minimal filters for exercising the chain without real DSP.
#![allow(dead_code)]

use std::sync::Arc;

use cadena_core::{
    AudioFormat, AudioFrame, ChannelMap, Command, Filter, FilterError, FilterFlags, FilterInfo,
    FilterIo, FilterRegistry, Reply, SampleFormat,
};

/// Declared delay of the mock resampler, in seconds.
pub const RESAMPLE_DELAY: f64 = 0.002;

pub fn fmt(format: SampleFormat, channels: &str, rate: u32) -> AudioFormat {
    AudioFormat::new(format, channels.parse().unwrap(), rate)
}

fn info(name: &'static str) -> FilterInfo {
    FilterInfo {
        name,
        description: "test filter",
        flags: FilterFlags::NONE,
        params: &[],
        test_conversion: None,
    }
}

/// Passes frames through unchanged; accepts any format. Accepts `SetVolume`.
#[derive(Default)]
pub struct Pass {
    pub volume: f32,
}

impl Filter for Pass {
    fn control(&mut self, io: &mut FilterIo, cmd: &Command) -> Reply {
        match cmd {
            Command::Reinit(input) => {
                io.set_output(*input);
                Reply::Ok
            }
            Command::SetVolume(v) => {
                self.volume = *v;
                Reply::Ok
            }
            Command::Reset => Reply::Ok,
            _ => Reply::Unknown,
        }
    }

    fn filter_frame(&mut self, io: &mut FilterIo, frame: Option<AudioFrame>) -> Result<(), FilterError> {
        if let Some(frame) = frame {
            io.push_output(frame);
        }
        Ok(())
    }
}

/// Needs float PCM input.
pub struct PcmOnly;

impl Filter for PcmOnly {
    fn control(&mut self, io: &mut FilterIo, cmd: &Command) -> Reply {
        match cmd {
            Command::Reinit(input) if input.format == Some(SampleFormat::Float) => {
                io.set_output(*input);
                Reply::Ok
            }
            Command::Reinit(_) => Reply::NeedsAdjustment(AudioFormat {
                format: Some(SampleFormat::Float),
                ..AudioFormat::UNSET
            }),
            _ => Reply::Unknown,
        }
    }

    fn filter_frame(&mut self, io: &mut FilterIo, frame: Option<AudioFrame>) -> Result<(), FilterError> {
        if let Some(frame) = frame {
            io.push_output(frame);
        }
        Ok(())
    }
}

/// Changes channel map and rate on request; keeps the sample format.
#[derive(Default)]
pub struct Resample {
    channels: Option<ChannelMap>,
    rate: Option<u32>,
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
                let mut out = *input;
                if let Some(ch) = self.channels {
                    out.channels = ch;
                }
                if let Some(rate) = self.rate {
                    out.rate = rate;
                }
                io.set_output(out);
                io.set_delay(RESAMPLE_DELAY);
                Reply::Ok
            }
            Command::SetChannels(ch) => {
                self.channels = Some(*ch);
                Reply::Ok
            }
            Command::SetSampleRate(rate) => {
                self.rate = Some(*rate);
                Reply::Ok
            }
            Command::Reset => Reply::Ok,
            _ => Reply::Unknown,
        }
    }

    fn filter_frame(&mut self, io: &mut FilterIo, frame: Option<AudioFrame>) -> Result<(), FilterError> {
        if let Some(frame) = frame {
            let out = *io.output();
            let samples = frame.samples() * out.rate as usize / io.input().rate as usize;
            io.push_output(AudioFrame::silence(out, samples)?);
        }
        Ok(())
    }
}

/// Converts between PCM sample formats.
#[derive(Default)]
pub struct Convert {
    target: Option<SampleFormat>,
}

fn pcm_pair(from: SampleFormat, to: SampleFormat) -> bool {
    from != to && !from.is_passthrough() && !to.is_passthrough()
}

impl Filter for Convert {
    fn control(&mut self, io: &mut FilterIo, cmd: &Command) -> Reply {
        match cmd {
            Command::Reinit(input) => {
                let mut out = *input;
                if let Some(target) = self.target {
                    out.format = Some(target);
                }
                io.set_output(out);
                Reply::Ok
            }
            Command::SetFormat(f) => {
                self.target = Some(*f);
                Reply::Ok
            }
            _ => Reply::Unknown,
        }
    }

    fn filter_frame(&mut self, io: &mut FilterIo, frame: Option<AudioFrame>) -> Result<(), FilterError> {
        if let Some(frame) = frame {
            let out = AudioFrame::from_f32(*io.output(), &frame.to_f32()?)?;
            io.push_output(out);
        }
        Ok(())
    }
}

/// Asks to be removed on every reinit.
pub struct Detacher;

impl Filter for Detacher {
    fn control(&mut self, _io: &mut FilterIo, cmd: &Command) -> Reply {
        match cmd {
            Command::Reinit(_) => Reply::Detach,
            _ => Reply::Unknown,
        }
    }

    fn filter_frame(&mut self, _io: &mut FilterIo, _frame: Option<AudioFrame>) -> Result<(), FilterError> {
        Err(FilterError::Processing("detached filter received a frame".into()))
    }
}

/// Always wants the other of 44.1 kHz and 48 kHz.
pub struct Flip;

impl Filter for Flip {
    fn control(&mut self, _io: &mut FilterIo, cmd: &Command) -> Reply {
        match cmd {
            Command::Reinit(input) => Reply::NeedsAdjustment(AudioFormat {
                rate: if input.rate == 48000 { 44100 } else { 48000 },
                ..AudioFormat::UNSET
            }),
            _ => Reply::Unknown,
        }
    }

    fn filter_frame(&mut self, _io: &mut FilterIo, _frame: Option<AudioFrame>) -> Result<(), FilterError> {
        Ok(())
    }
}

/// Rejects every reinit.
pub struct Reject;

impl Filter for Reject {
    fn control(&mut self, _io: &mut FilterIo, cmd: &Command) -> Reply {
        match cmd {
            Command::Reinit(_) => Reply::Error(FilterError::Unsupported("nothing works".into())),
            _ => Reply::Unknown,
        }
    }

    fn filter_frame(&mut self, _io: &mut FilterIo, _frame: Option<AudioFrame>) -> Result<(), FilterError> {
        Ok(())
    }
}

/// Always outputs s16, whatever it is told.
pub struct ToS16;

impl Filter for ToS16 {
    fn control(&mut self, io: &mut FilterIo, cmd: &Command) -> Reply {
        match cmd {
            Command::Reinit(input) => {
                io.set_output(AudioFormat {
                    format: Some(SampleFormat::S16),
                    ..*input
                });
                Reply::Ok
            }
            _ => Reply::Unknown,
        }
    }

    fn filter_frame(&mut self, io: &mut FilterIo, frame: Option<AudioFrame>) -> Result<(), FilterError> {
        if let Some(frame) = frame {
            io.push_output(AudioFrame::from_f32(*io.output(), &frame.to_f32()?)?);
        }
        Ok(())
    }
}

/// Holds back one frame; releases it on the next input or on flush.
/// Fails if flushed twice without new input.
#[derive(Default)]
pub struct Delay1 {
    held: Option<AudioFrame>,
    flushed: bool,
}

impl Filter for Delay1 {
    fn control(&mut self, io: &mut FilterIo, cmd: &Command) -> Reply {
        match cmd {
            Command::Reinit(input) => {
                io.set_output(*input);
                Reply::Ok
            }
            Command::Reset => {
                self.held = None;
                Reply::Ok
            }
            _ => Reply::Unknown,
        }
    }

    fn filter_frame(&mut self, io: &mut FilterIo, frame: Option<AudioFrame>) -> Result<(), FilterError> {
        match frame {
            Some(frame) => {
                self.flushed = false;
                if let Some(old) = self.held.replace(frame) {
                    io.push_output(old);
                }
            }
            None => {
                if self.flushed {
                    return Err(FilterError::Processing("flushed twice".into()));
                }
                self.flushed = true;
                if let Some(old) = self.held.take() {
                    io.push_output(old);
                }
            }
        }
        Ok(())
    }
}

/// Fails on every frame.
pub struct Broken;

impl Filter for Broken {
    fn control(&mut self, io: &mut FilterIo, cmd: &Command) -> Reply {
        match cmd {
            Command::Reinit(input) => {
                io.set_output(*input);
                Reply::Ok
            }
            _ => Reply::Unknown,
        }
    }

    fn filter_frame(&mut self, _io: &mut FilterIo, frame: Option<AudioFrame>) -> Result<(), FilterError> {
        match frame {
            Some(_) => Err(FilterError::Processing("bad frame".into())),
            None => Ok(()),
        }
    }
}

/// Registry with every mock. `resample` and `convert` are the conversion
/// filters the negotiator uses.
pub fn registry() -> Arc<FilterRegistry> {
    let mut reg = FilterRegistry::new();
    reg.register(info("pass"), || Box::new(Pass::default()))
        .register(info("pass2"), || Box::new(Pass::default()))
        .register(info("pcm"), || Box::new(PcmOnly))
        .register(info("resample"), || Box::new(Resample::default()))
        .register(
            FilterInfo {
                test_conversion: Some(pcm_pair),
                ..info("convert")
            },
            || Box::new(Convert::default()),
        )
        .register(info("detach"), || Box::new(Detacher))
        .register(info("flip"), || Box::new(Flip))
        .register(info("reject"), || Box::new(Reject))
        .register(info("tos16"), || Box::new(ToS16))
        .register(info("delay1"), || Box::new(Delay1::default()))
        .register(info("broken"), || Box::new(Broken))
        .register(
            FilterInfo {
                flags: FilterFlags::NOT_REENTRANT,
                ..info("solo")
            },
            || Box::new(Pass::default()),
        );
    Arc::new(reg)
}
