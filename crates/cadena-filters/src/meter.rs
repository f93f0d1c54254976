//! Peak meter.

use cadena_core::{AudioFrame, Command, Filter, FilterError, FilterFlags, FilterInfo, FilterIo, Reply};

use crate::value::linear_to_db;

/// Registry entry for [`Meter`].
pub const INFO: FilterInfo = FilterInfo {
    name: "meter",
    description: "Counts samples and tracks per-channel peaks",
    flags: FilterFlags::NOT_REENTRANT,
    params: &[],
    test_conversion: None,
};

/// Totals gathered by a [`Meter`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeterStats {
    /// Frames seen.
    pub frames: u64,
    /// Sample frames seen.
    pub samples: u64,
    /// Absolute peak per channel. Empty for passthrough streams.
    pub peaks: Vec<f32>,
}

impl MeterStats {
    /// Highest peak across channels, in dBFS.
    pub fn peak_db(&self) -> f32 {
        linear_to_db(self.peaks.iter().copied().fold(0.0, f32::max))
    }
}

/// Forwards audio unchanged while collecting [`MeterStats`]. Only one meter
/// may exist in a chain; the totals are logged when it is destroyed.
#[derive(Debug, Default)]
pub struct Meter {
    stats: MeterStats,
}

impl Meter {
    /// Meter with empty totals.
    pub fn new() -> Self {
        Self::default()
    }

    /// Totals so far.
    pub fn stats(&self) -> &MeterStats {
        &self.stats
    }
}

impl Filter for Meter {
    fn control(&mut self, io: &mut FilterIo, cmd: &Command) -> Reply {
        match cmd {
            Command::Reinit(input) => {
                io.set_output(*input);
                self.stats.peaks = if input.is_passthrough() {
                    Vec::new()
                } else {
                    vec![0.0; input.channels.len()]
                };
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
        self.stats.frames += 1;
        self.stats.samples += frame.samples() as u64;
        if !frame.format().is_passthrough() && !self.stats.peaks.is_empty() {
            let samples = frame.to_f32()?;
            let channels = frame.channels();
            for chunk in samples.chunks_exact(channels) {
                for (peak, s) in self.stats.peaks.iter_mut().zip(chunk) {
                    *peak = peak.max(s.abs());
                }
            }
        }
        io.push_output(frame);
        Ok(())
    }

    fn uninit(&mut self) {
        tracing::info!(
            "meter: {} frames, {} samples, peak {:.1} dBFS",
            self.stats.frames,
            self.stats.samples,
            self.stats.peak_db()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadena_core::{AudioFormat, ChannelMap, SampleFormat};

    #[test]
    fn tracks_peaks_per_channel() {
        let fmt = AudioFormat::new(SampleFormat::Float, ChannelMap::STEREO, 48000);
        let mut io = FilterIo::new();
        let mut m = Meter::new();
        assert_eq!(m.control(&mut io, &Command::Reinit(fmt)), Reply::Ok);

        let frame = AudioFrame::from_f32(fmt, &[0.25, -0.5, -0.75, 0.1]).unwrap();
        m.filter_frame(&mut io, Some(frame)).unwrap();
        m.filter_frame(&mut io, None).unwrap();

        let stats = m.stats();
        assert_eq!(stats.frames, 1);
        assert_eq!(stats.samples, 2);
        assert_eq!(stats.peaks, vec![0.75, 0.5]);
        assert!((stats.peak_db() - linear_to_db(0.75)).abs() < 1e-6);
        assert_eq!(io.queued(), 1);
        m.uninit();
    }

    #[test]
    fn counts_passthrough_without_decoding() {
        let fmt = AudioFormat::new(SampleFormat::SpdifEac3, ChannelMap::STEREO, 192000);
        let mut io = FilterIo::new();
        let mut m = Meter::new();
        assert_eq!(m.control(&mut io, &Command::Reinit(fmt)), Reply::Ok);
        m.filter_frame(&mut io, Some(AudioFrame::silence(fmt, 64).unwrap()))
            .unwrap();
        assert_eq!(m.stats().samples, 64);
        assert!(m.stats().peaks.is_empty());
    }

    #[test]
    fn is_not_reentrant() {
        assert!(INFO.flags.contains(FilterFlags::NOT_REENTRANT));
    }
}
