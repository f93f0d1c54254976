//! Parsing of filter argument values.
//!
//! Arguments arrive as strings from filter lists and presets. Numeric
//! values may carry a unit suffix:
//!
//! | Kind | Examples | Result |
//! |------|----------|--------|
//! | gain | `0.5`, `-6dB`, `+3 db` | linear factor |
//! | time | `10`, `10ms`, `1.5s` | seconds (bare numbers are milliseconds) |
//! | rate | `48000`, `48000Hz`, `44.1kHz` | Hz |
//! | flag | `yes`, `no`, `true`, `false`, `1`, `0` | `bool` |

use cadena_core::FilterError;
use libm::{expf, logf};

/// Convert decibels to linear gain.
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels. Clamped at -200 dB for silence.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// Splits `value` into its numeric part and a lowercase unit suffix.
fn split_unit(value: &str) -> (&str, String) {
    let value = value.trim();
    let end = value
        .rfind(|c: char| c.is_ascii_digit() || c == '.')
        .map_or(0, |i| i + 1);
    let (num, unit) = value.split_at(end);
    (num.trim(), unit.trim().to_ascii_lowercase())
}

fn number(param: &str, value: &str, num: &str) -> Result<f64, FilterError> {
    let n: f64 = num
        .parse()
        .map_err(|_| FilterError::invalid_param(param, value, "not a number"))?;
    if !n.is_finite() {
        return Err(FilterError::invalid_param(param, value, "not finite"));
    }
    Ok(n)
}

/// Parses a plain number.
pub fn parse_number(param: &str, value: &str) -> Result<f64, FilterError> {
    number(param, value, value.trim())
}

/// Parses a gain as a linear factor. Accepts plain factors and `dB`.
pub fn parse_gain(param: &str, value: &str) -> Result<f32, FilterError> {
    let (num, unit) = split_unit(value);
    let n = number(param, value, num)?;
    match unit.as_str() {
        "" => {
            if n < 0.0 {
                return Err(FilterError::invalid_param(
                    param,
                    value,
                    "linear gain must not be negative",
                ));
            }
            Ok(n as f32)
        }
        "db" => Ok(db_to_linear(n as f32)),
        _ => Err(FilterError::invalid_param(
            param,
            value,
            format!("unknown gain unit '{unit}'"),
        )),
    }
}

/// Parses a non-negative duration in seconds. Bare numbers are
/// milliseconds.
pub fn parse_seconds(param: &str, value: &str) -> Result<f64, FilterError> {
    let (num, unit) = split_unit(value);
    let n = number(param, value, num)?;
    let seconds = match unit.as_str() {
        "" | "ms" => n / 1000.0,
        "s" => n,
        _ => {
            return Err(FilterError::invalid_param(
                param,
                value,
                format!("unknown time unit '{unit}'"),
            ));
        }
    };
    if seconds < 0.0 {
        return Err(FilterError::invalid_param(param, value, "negative duration"));
    }
    Ok(seconds)
}

/// Parses a sample rate in Hz. Accepts `Hz` and `kHz`.
pub fn parse_rate(param: &str, value: &str) -> Result<u32, FilterError> {
    let (num, unit) = split_unit(value);
    let n = number(param, value, num)?;
    let hz = match unit.as_str() {
        "" | "hz" => n,
        "khz" => n * 1000.0,
        _ => {
            return Err(FilterError::invalid_param(
                param,
                value,
                format!("unknown rate unit '{unit}'"),
            ));
        }
    };
    let hz = hz.round();
    if !(1.0..=f64::from(u32::MAX)).contains(&hz) {
        return Err(FilterError::invalid_param(param, value, "rate out of range"));
    }
    Ok(hz as u32)
}

/// Parses a yes/no flag.
pub fn parse_bool(param: &str, value: &str) -> Result<bool, FilterError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" | "on" | "1" => Ok(true),
        "no" | "false" | "off" | "0" => Ok(false),
        _ => Err(FilterError::invalid_param(param, value, "expected yes or no")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gain_units() {
        assert_eq!(parse_gain("gain", "0.5").unwrap(), 0.5);
        assert!((parse_gain("gain", "-6dB").unwrap() - 0.501).abs() < 0.001);
        assert!((parse_gain("gain", "+20 db").unwrap() - 10.0).abs() < 1e-4);
        assert!((parse_gain("gain", "0dB").unwrap() - 1.0).abs() < 1e-6);
        assert!(parse_gain("gain", "-1").is_err());
        assert!(parse_gain("gain", "loud").is_err());
        assert!(parse_gain("gain", "3dBFS").is_err());
    }

    #[test]
    fn time_units() {
        assert_eq!(parse_seconds("t", "250").unwrap(), 0.25);
        assert_eq!(parse_seconds("t", "10ms").unwrap(), 0.01);
        assert_eq!(parse_seconds("t", "1.5s").unwrap(), 1.5);
        assert!(parse_seconds("t", "-5ms").is_err());
        assert!(parse_seconds("t", "3min").is_err());
    }

    #[test]
    fn rate_units() {
        assert_eq!(parse_rate("rate", "48000").unwrap(), 48000);
        assert_eq!(parse_rate("rate", "48000Hz").unwrap(), 48000);
        assert_eq!(parse_rate("rate", "44.1kHz").unwrap(), 44100);
        assert!(parse_rate("rate", "0").is_err());
        assert!(parse_rate("rate", "fast").is_err());
    }

    #[test]
    fn flags() {
        assert!(parse_bool("detach", "yes").unwrap());
        assert!(!parse_bool("detach", "No").unwrap());
        assert!(parse_bool("detach", "maybe").is_err());
    }

    #[test]
    fn db_roundtrip() {
        for db in [-40.0f32, -6.0, 0.0, 12.0] {
            assert!((linear_to_db(db_to_linear(db)) - db).abs() < 1e-3);
        }
        assert!(linear_to_db(0.0) <= -199.0);
    }

    #[test]
    fn invalid_param_names_the_parameter() {
        match parse_number("mix", "x") {
            Err(FilterError::InvalidParam { param, value, .. }) => {
                assert_eq!(param, "mix");
                assert_eq!(value, "x");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
