//! `rate:channels:format` strings.
//!
//! Any field may be empty or `auto`, leaving it unset: `48000:stereo:float`,
//! `44100`, `::s16`, `:5.1(side)`. Rates accept `Hz`/`kHz` units, channels
//! accept layout names, speaker lists, counts and `unknownN`.

use cadena_core::{AudioFormat, ChannelMap, SampleFormat};
use cadena_filters::value::parse_rate;

use crate::error::ConfigError;

fn is_auto(field: &str) -> bool {
    field.is_empty() || field.eq_ignore_ascii_case("auto")
}

/// Parses a format spec. Unset fields stay unset.
pub fn parse_format_spec(spec: &str) -> Result<AudioFormat, ConfigError> {
    let fields: Vec<&str> = spec.trim().split(':').map(str::trim).collect();
    if fields.len() > 3 {
        return Err(ConfigError::format_spec(
            spec,
            "expected at most rate:channels:format",
        ));
    }
    let field = |i: usize| fields.get(i).copied().unwrap_or("");

    let rate = match field(0) {
        f if is_auto(f) => 0,
        f => parse_rate("rate", f).map_err(|e| ConfigError::format_spec(spec, e.to_string()))?,
    };

    let channels = match field(1) {
        f if is_auto(f) => ChannelMap::EMPTY,
        f => {
            let map: ChannelMap = f
                .parse()
                .map_err(|e: cadena_core::ChannelMapParseError| {
                    ConfigError::format_spec(spec, e.to_string())
                })?;
            if !map.is_valid() {
                return Err(ConfigError::format_spec(
                    spec,
                    format!("channel map '{f}' is not usable"),
                ));
            }
            map
        }
    };

    let format = match field(2) {
        f if is_auto(f) => None,
        f => Some(
            f.parse::<SampleFormat>()
                .map_err(|e| ConfigError::format_spec(spec, e.to_string()))?,
        ),
    };

    Ok(AudioFormat {
        format,
        channels,
        rate,
    })
}

/// Parses a format spec that must describe flowing data: every field set.
pub fn parse_complete_format_spec(spec: &str) -> Result<AudioFormat, ConfigError> {
    let format = parse_format_spec(spec)?;
    if !format.is_complete() {
        return Err(ConfigError::format_spec(
            spec,
            "rate, channels and sample format are all required",
        ));
    }
    Ok(format)
}

/// Parses a comma separated list of channel maps for an output layout policy.
pub fn parse_layout_list(list: &str) -> Result<Vec<ChannelMap>, ConfigError> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<ChannelMap>()
                .map_err(|e| ConfigError::format_spec(list, e.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_spec() {
        let f = parse_format_spec("48000:stereo:float").unwrap();
        assert_eq!(
            f,
            AudioFormat::new(SampleFormat::Float, ChannelMap::STEREO, 48000)
        );
        assert_eq!(f.spec_string(), "48000:stereo:float");
    }

    #[test]
    fn partial_specs() {
        let f = parse_format_spec("44100").unwrap();
        assert_eq!(f.rate, 44100);
        assert!(f.channels.is_empty());
        assert_eq!(f.format, None);

        let f = parse_format_spec("::s16").unwrap();
        assert_eq!(f.rate, 0);
        assert_eq!(f.format, Some(SampleFormat::S16));

        let f = parse_format_spec("auto:5.1(side):auto").unwrap();
        assert_eq!(f.channels.to_string(), "5.1(side)");

        assert!(parse_format_spec("").unwrap().is_unset());
        assert!(parse_format_spec("auto").unwrap().is_unset());
    }

    #[test]
    fn units_and_counts() {
        let f = parse_format_spec("44.1kHz:6").unwrap();
        assert_eq!(f.rate, 44100);
        assert_eq!(f.channels.len(), 6);

        let f = parse_format_spec(":unknown3").unwrap();
        assert_eq!(f.channels.len(), 3);

        let f = parse_format_spec(":fl-fr-lfe:ac3").unwrap();
        assert_eq!(f.channels.to_string(), "2.1");
        assert!(f.is_passthrough());
    }

    #[test]
    fn rejects_bad_fields() {
        for spec in [
            "48000:stereo:float:extra",
            "fast",
            "-1",
            ":nonsense",
            "::s12",
            "0:stereo",
        ] {
            assert!(
                matches!(parse_format_spec(spec), Err(ConfigError::FormatSpec { .. })),
                "{spec}"
            );
        }
    }

    #[test]
    fn complete_specs() {
        assert!(parse_complete_format_spec("48000:mono:s16").is_ok());
        let err = parse_complete_format_spec("48000:mono").unwrap_err();
        assert!(err.to_string().contains("all required"), "{err}");
    }

    #[test]
    fn layout_lists() {
        let maps = parse_layout_list("5.1, stereo,,mono").unwrap();
        let names: Vec<_> = maps.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["5.1", "stereo", "mono"]);
        assert!(parse_layout_list("stereo,bogus").is_err());
    }
}
