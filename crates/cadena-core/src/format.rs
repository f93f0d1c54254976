//! Sample encodings and audio format descriptors.
//!
//! [`AudioFormat`] bundles a [`SampleFormat`], a [`ChannelMap`] and a sample
//! rate. Descriptors of real flowing data are always complete; descriptors
//! used as negotiation targets may leave fields unset (no sample format, an
//! empty channel map, rate `0`).

use core::fmt;
use core::str::FromStr;

use crate::chmap::ChannelMap;

/// Encoding of a single sample.
///
/// The passthrough encodings carry compressed bitstreams packed in 16-bit
/// words. PCM filters must never touch them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SampleFormat {
    /// Unsigned 8-bit.
    U8,
    /// Signed 16-bit.
    S16,
    /// Signed 24-bit, packed in 3 bytes.
    S24,
    /// Signed 32-bit.
    S32,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
    /// Signed 16-bit, one plane per channel.
    S16P,
    /// 32-bit float, one plane per channel.
    FloatP,
    /// AC-3 passthrough.
    SpdifAc3,
    /// E-AC-3 passthrough.
    SpdifEac3,
    /// DTS passthrough.
    SpdifDts,
    /// DTS-HD passthrough.
    SpdifDtsHd,
    /// TrueHD passthrough.
    SpdifTrueHd,
}

impl SampleFormat {
    /// Every known encoding, in a fixed order used for indexing.
    pub const ALL: [SampleFormat; 13] = [
        SampleFormat::U8,
        SampleFormat::S16,
        SampleFormat::S24,
        SampleFormat::S32,
        SampleFormat::Float,
        SampleFormat::Double,
        SampleFormat::S16P,
        SampleFormat::FloatP,
        SampleFormat::SpdifAc3,
        SampleFormat::SpdifEac3,
        SampleFormat::SpdifDts,
        SampleFormat::SpdifDtsHd,
        SampleFormat::SpdifTrueHd,
    ];

    /// Short name as used in format specs.
    pub const fn name(self) -> &'static str {
        match self {
            SampleFormat::U8 => "u8",
            SampleFormat::S16 => "s16",
            SampleFormat::S24 => "s24",
            SampleFormat::S32 => "s32",
            SampleFormat::Float => "float",
            SampleFormat::Double => "double",
            SampleFormat::S16P => "s16p",
            SampleFormat::FloatP => "floatp",
            SampleFormat::SpdifAc3 => "spdif-ac3",
            SampleFormat::SpdifEac3 => "spdif-eac3",
            SampleFormat::SpdifDts => "spdif-dts",
            SampleFormat::SpdifDtsHd => "spdif-dts-hd",
            SampleFormat::SpdifTrueHd => "spdif-truehd",
        }
    }

    /// Position in [`ALL`](Self::ALL).
    pub fn index(self) -> usize {
        self as usize
    }

    /// Bytes per sample of one channel. Passthrough formats use 16-bit words.
    pub const fn bytes(self) -> usize {
        match self {
            SampleFormat::U8 => 1,
            SampleFormat::S16 | SampleFormat::S16P => 2,
            SampleFormat::S24 => 3,
            SampleFormat::S32 | SampleFormat::Float | SampleFormat::FloatP => 4,
            SampleFormat::Double => 8,
            SampleFormat::SpdifAc3
            | SampleFormat::SpdifEac3
            | SampleFormat::SpdifDts
            | SampleFormat::SpdifDtsHd
            | SampleFormat::SpdifTrueHd => 2,
        }
    }

    /// Compressed passthrough encoding.
    pub const fn is_passthrough(self) -> bool {
        matches!(
            self,
            SampleFormat::SpdifAc3
                | SampleFormat::SpdifEac3
                | SampleFormat::SpdifDts
                | SampleFormat::SpdifDtsHd
                | SampleFormat::SpdifTrueHd
        )
    }

    /// One plane per channel.
    pub const fn is_planar(self) -> bool {
        matches!(self, SampleFormat::S16P | SampleFormat::FloatP)
    }

    /// Floating point PCM.
    pub const fn is_float(self) -> bool {
        matches!(
            self,
            SampleFormat::Float | SampleFormat::Double | SampleFormat::FloatP
        )
    }

    /// Interleaved counterpart of a planar format, or the format itself.
    pub const fn packed(self) -> Self {
        match self {
            SampleFormat::S16P => SampleFormat::S16,
            SampleFormat::FloatP => SampleFormat::Float,
            other => other,
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a sample format name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sample format '{0}'")]
pub struct UnknownSampleFormat(pub String);

impl FromStr for SampleFormat {
    type Err = UnknownSampleFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let alias = match lower.as_str() {
            "f32" | "floatle" => "float",
            "f64" => "double",
            "f32p" => "floatp",
            "ac3" => "spdif-ac3",
            "eac3" => "spdif-eac3",
            "dts" => "spdif-dts",
            "dts-hd" | "dtshd" => "spdif-dts-hd",
            "truehd" => "spdif-truehd",
            other => other,
        };
        SampleFormat::ALL
            .iter()
            .copied()
            .find(|f| f.name() == alias)
            .ok_or_else(|| UnknownSampleFormat(s.to_string()))
    }
}

/// Sample encoding, channel layout and rate of a stream.
///
/// Compared by structural equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioFormat {
    /// Sample encoding, `None` if unset.
    pub format: Option<SampleFormat>,
    /// Channel layout, empty if unset.
    pub channels: ChannelMap,
    /// Samples per second, `0` if unset.
    pub rate: u32,
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self::UNSET
    }
}

impl AudioFormat {
    /// A descriptor with every field unset.
    pub const UNSET: AudioFormat = AudioFormat {
        format: None,
        channels: ChannelMap::EMPTY,
        rate: 0,
    };

    /// A complete descriptor.
    pub fn new(format: SampleFormat, channels: ChannelMap, rate: u32) -> Self {
        Self {
            format: Some(format),
            channels,
            rate,
        }
    }

    /// Every field set, and the channel map valid.
    ///
    /// Only complete descriptors may describe flowing data.
    pub fn is_complete(&self) -> bool {
        self.format.is_some() && self.channels.is_valid() && self.rate > 0
    }

    /// No field set.
    pub fn is_unset(&self) -> bool {
        self.format.is_none() && self.channels.is_empty() && self.rate == 0
    }

    /// The sample encoding is a passthrough encoding.
    pub fn is_passthrough(&self) -> bool {
        self.format.is_some_and(SampleFormat::is_passthrough)
    }

    /// Returns `self` with every set field of `target` applied on top.
    pub fn overlay(&self, target: &AudioFormat) -> AudioFormat {
        AudioFormat {
            format: target.format.or(self.format),
            channels: if target.channels.is_empty() {
                self.channels
            } else {
                target.channels
            },
            rate: if target.rate == 0 { self.rate } else { target.rate },
        }
    }

    /// Fills fields unset in `self` from `actual`.
    pub fn fill_unset_from(&mut self, actual: &AudioFormat) {
        *self = actual.overlay(self);
    }

    /// Bytes of one sample frame (all channels).
    pub fn bytes_per_frame(&self) -> usize {
        self.format.map_or(0, SampleFormat::bytes) * self.channels.len()
    }

    /// Compact form such as `48000:5.1:float`, with `auto` for unset fields.
    pub fn spec_string(&self) -> String {
        let rate = if self.rate == 0 {
            "auto".to_string()
        } else {
            self.rate.to_string()
        };
        let channels = if self.channels.is_empty() {
            "auto".to_string()
        } else {
            self.channels.to_string()
        };
        let format = self.format.map_or("auto", SampleFormat::name);
        format!("{rate}:{channels}:{format}")
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rate == 0 {
            f.write_str("?Hz")?;
        } else {
            write!(f, "{}Hz", self.rate)?;
        }
        if self.channels.is_empty() {
            f.write_str(" ?ch")?;
        } else {
            write!(
                f,
                " {} {}ch",
                self.channels.to_human_string(),
                self.channels.len()
            )?;
        }
        match self.format {
            Some(format) => write!(f, " {format}"),
            None => f.write_str(" ?"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_format_names_round_trip() {
        for format in SampleFormat::ALL {
            assert_eq!(format.name().parse::<SampleFormat>(), Ok(format));
        }
        assert_eq!("ac3".parse(), Ok(SampleFormat::SpdifAc3));
        assert!("s12".parse::<SampleFormat>().is_err());
    }

    #[test]
    fn index_matches_table_position() {
        for (i, format) in SampleFormat::ALL.iter().enumerate() {
            assert_eq!(format.index(), i);
        }
    }

    #[test]
    fn predicates() {
        assert!(SampleFormat::SpdifDts.is_passthrough());
        assert!(!SampleFormat::Float.is_passthrough());
        assert!(SampleFormat::FloatP.is_planar());
        assert!(SampleFormat::FloatP.is_float());
        assert_eq!(SampleFormat::S16P.packed(), SampleFormat::S16);
        assert_eq!(SampleFormat::S24.bytes(), 3);
    }

    #[test]
    fn completeness() {
        assert!(AudioFormat::UNSET.is_unset());
        assert!(!AudioFormat::UNSET.is_complete());
        let f = AudioFormat::new(SampleFormat::S16, ChannelMap::STEREO, 44100);
        assert!(f.is_complete());
        assert!(!AudioFormat { rate: 0, ..f }.is_complete());
        assert_eq!(f.bytes_per_frame(), 4);
    }

    #[test]
    fn overlay_applies_set_fields() {
        let actual = AudioFormat::new(SampleFormat::S16, ChannelMap::MONO, 16000);
        let target = AudioFormat {
            rate: 48000,
            ..AudioFormat::UNSET
        };
        let merged = actual.overlay(&target);
        assert_eq!(merged.rate, 48000);
        assert_eq!(merged.channels, ChannelMap::MONO);
        assert_eq!(merged.format, Some(SampleFormat::S16));

        let mut t = target;
        t.fill_unset_from(&actual);
        assert_eq!(t, merged);
    }

    #[test]
    fn display_forms() {
        let f = AudioFormat::new(SampleFormat::Float, ChannelMap::STEREO, 48000);
        assert_eq!(f.to_string(), "48000Hz stereo 2ch float");
        assert_eq!(f.spec_string(), "48000:stereo:float");
        assert_eq!(AudioFormat::UNSET.spec_string(), "auto:auto:auto");
    }
}
