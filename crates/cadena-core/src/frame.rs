//! Owned audio frames.
//!
//! An [`AudioFrame`] is a block of samples in one complete [`AudioFormat`].
//! Interleaved formats store one sample frame after another; planar formats
//! store one plane per channel back to back. Filters that do arithmetic go
//! through [`to_f32()`](AudioFrame::to_f32) and
//! [`from_f32()`](AudioFrame::from_f32), which always use interleaved `f32`.

use crate::error::FilterError;
use crate::format::{AudioFormat, SampleFormat};

/// A block of audio samples with its format.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    format: AudioFormat,
    samples: usize,
    data: Vec<u8>,
}

impl AudioFrame {
    /// Wraps raw sample bytes. The length must be exactly `samples` sample
    /// frames of `format`.
    pub fn from_bytes(
        format: AudioFormat,
        samples: usize,
        data: Vec<u8>,
    ) -> Result<Self, FilterError> {
        if !format.is_complete() {
            return Err(FilterError::Unsupported(format!(
                "frame format {format} is incomplete"
            )));
        }
        let expected = samples * format.bytes_per_frame();
        if data.len() != expected {
            return Err(FilterError::Processing(format!(
                "frame holds {} bytes, expected {expected}",
                data.len()
            )));
        }
        Ok(Self {
            format,
            samples,
            data,
        })
    }

    /// `samples` sample frames of digital silence.
    pub fn silence(format: AudioFormat, samples: usize) -> Result<Self, FilterError> {
        let mut data = vec![0u8; samples * format.bytes_per_frame()];
        if format.format == Some(SampleFormat::U8) {
            data.fill(0x80);
        }
        Self::from_bytes(format, samples, data)
    }

    /// Encodes interleaved `f32` samples in the `[-1.0, 1.0]` range into
    /// `format`, clipping out-of-range values for integer formats.
    pub fn from_f32(format: AudioFormat, interleaved: &[f32]) -> Result<Self, FilterError> {
        let sample_format = pcm_format(&format)?;
        let channels = format.channels.len();
        if channels == 0 || interleaved.len() % channels != 0 {
            return Err(FilterError::Processing(format!(
                "{} samples do not divide into {channels} channels",
                interleaved.len()
            )));
        }
        let samples = interleaved.len() / channels;
        let bps = sample_format.bytes();
        let mut data = vec![0u8; interleaved.len() * bps];
        for (i, &v) in interleaved.iter().enumerate() {
            let pos = if sample_format.is_planar() {
                let (frame, ch) = (i / channels, i % channels);
                ch * samples + frame
            } else {
                i
            };
            encode(sample_format, v, &mut data[pos * bps..(pos + 1) * bps]);
        }
        Self::from_bytes(format, samples, data)
    }

    /// Decodes to interleaved `f32`.
    pub fn to_f32(&self) -> Result<Vec<f32>, FilterError> {
        let sample_format = pcm_format(&self.format)?;
        let channels = self.channels();
        let bps = sample_format.bytes();
        let mut out = vec![0.0f32; self.samples * channels];
        for (i, v) in out.iter_mut().enumerate() {
            let pos = if sample_format.is_planar() {
                let (frame, ch) = (i / channels, i % channels);
                ch * self.samples + frame
            } else {
                i
            };
            *v = decode(sample_format, &self.data[pos * bps..(pos + 1) * bps]);
        }
        Ok(out)
    }

    /// The frame's format.
    pub fn format(&self) -> &AudioFormat {
        &self.format
    }

    /// Number of sample frames.
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.format.channels.len()
    }

    /// True if the frame holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples == 0
    }

    /// Raw sample bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Playback duration in seconds.
    pub fn duration(&self) -> f64 {
        self.samples as f64 / f64::from(self.format.rate)
    }
}

fn pcm_format(format: &AudioFormat) -> Result<SampleFormat, FilterError> {
    match format.format {
        Some(f) if !f.is_passthrough() => Ok(f),
        Some(f) => Err(FilterError::Unsupported(format!(
            "cannot decode passthrough format {f}"
        ))),
        None => Err(FilterError::Unsupported("frame format unset".to_string())),
    }
}

fn encode(format: SampleFormat, v: f32, out: &mut [u8]) {
    let v = if v.is_finite() { v } else { 0.0 };
    match format {
        SampleFormat::U8 => {
            out[0] = (v * 128.0 + 128.0).round().clamp(0.0, 255.0) as u8;
        }
        SampleFormat::S16 | SampleFormat::S16P => {
            let s = (v * 32768.0).round().clamp(-32768.0, 32767.0) as i16;
            out.copy_from_slice(&s.to_le_bytes());
        }
        SampleFormat::S24 => {
            let s = (v * 8_388_608.0).round().clamp(-8_388_608.0, 8_388_607.0) as i32;
            out.copy_from_slice(&s.to_le_bytes()[..3]);
        }
        SampleFormat::S32 => {
            let s = (f64::from(v) * 2_147_483_648.0)
                .round()
                .clamp(-2_147_483_648.0, 2_147_483_647.0) as i32;
            out.copy_from_slice(&s.to_le_bytes());
        }
        SampleFormat::Float | SampleFormat::FloatP => out.copy_from_slice(&v.to_le_bytes()),
        SampleFormat::Double => out.copy_from_slice(&f64::from(v).to_le_bytes()),
        // Rejected by `pcm_format`.
        _ => {}
    }
}

fn decode(format: SampleFormat, b: &[u8]) -> f32 {
    match format {
        SampleFormat::U8 => (f32::from(b[0]) - 128.0) / 128.0,
        SampleFormat::S16 | SampleFormat::S16P => {
            f32::from(i16::from_le_bytes([b[0], b[1]])) / 32768.0
        }
        SampleFormat::S24 => {
            // Sign-extend from the top byte.
            let s = i32::from_le_bytes([0, b[0], b[1], b[2]]) >> 8;
            s as f32 / 8_388_608.0
        }
        SampleFormat::S32 => {
            (f64::from(i32::from_le_bytes([b[0], b[1], b[2], b[3]])) / 2_147_483_648.0) as f32
        }
        SampleFormat::Float | SampleFormat::FloatP => f32::from_le_bytes([b[0], b[1], b[2], b[3]]),
        SampleFormat::Double => {
            f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]) as f32
        }
        _ => 0.0,
    }
}
