//! Cadena Filters - built-in filter implementations
//!
//! Every filter implements [`cadena_core::Filter`] and exposes its registry
//! entry as a `INFO` constant in its module:
//!
//! - [`Dummy`] - Passes audio through unchanged (`dummy`)
//! - [`Volume`] - Linear or dB gain, optionally detaching at unity (`volume`)
//! - [`FormatConverter`] - PCM sample format conversion (`format`)
//! - [`Resample`] - Channel remixing and sample rate conversion (`resample`)
//! - [`Delay`] - Per-channel delay lines (`delay`)
//! - [`Meter`] - Per-channel peak statistics, one per chain (`meter`)
//!
//! The [`value`] module parses argument strings with units (`-6dB`, `10ms`,
//! `44.1kHz`).
//!
//! ## Example
//!
//! ```rust
//! use cadena_core::{AudioFormat, ChannelMap, Command, Filter, FilterIo, Reply, SampleFormat};
//! use cadena_filters::Resample;
//!
//! let mut resample = Resample::new();
//! let mut io = FilterIo::new();
//! resample.control(&mut io, &Command::SetSampleRate(48000));
//!
//! let input = AudioFormat::new(SampleFormat::Float, ChannelMap::MONO, 44100);
//! assert_eq!(resample.control(&mut io, &Command::Reinit(input)), Reply::Ok);
//! assert_eq!(io.output().rate, 48000);
//! ```

pub mod convert;
pub mod delay;
pub mod dummy;
pub mod meter;
pub mod resample;
pub mod value;
pub mod volume;

pub use convert::{FormatConverter, pcm_conversion};
pub use delay::Delay;
pub use dummy::Dummy;
pub use meter::{Meter, MeterStats};
pub use resample::{RemixMatrix, Resample};
pub use volume::Volume;
