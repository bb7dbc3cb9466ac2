use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, time::Duration};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DurationError {
    #[error("Duration is empty")]
    Empty,
    #[error("Invalid number in duration '{value}'")]
    InvalidNumber { value: String },
    #[error("Unknown unit '{unit}' in duration '{value}'")]
    UnknownUnit { value: String, unit: String },
    #[error("Missing unit after the last number in duration '{value}'")]
    MissingUnit { value: String },
}

/// Unit every duration of a figure is normalized to
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    #[serde(alias = "ns")]
    Nanoseconds,
    #[serde(alias = "us", alias = "µs", alias = "μs")]
    Microseconds,
    #[serde(alias = "ms")]
    Milliseconds,
    #[serde(alias = "s")]
    Seconds,
}

impl TimeUnit {
    /// number of units in one second
    pub fn per_second(self) -> f64 {
        match self {
            Self::Nanoseconds => 1e9,
            Self::Microseconds => 1e6,
            Self::Milliseconds => 1e3,
            Self::Seconds => 1.0,
        }
    }

    pub fn from_seconds(self, seconds: f64) -> f64 {
        seconds * self.per_second()
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Nanoseconds => "nanoseconds",
            Self::Microseconds => "microseconds",
            Self::Milliseconds => "milliseconds",
            Self::Seconds => "seconds",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TimeUnit {
    type Err = DurationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "ns" | "nanoseconds" => Ok(Self::Nanoseconds),
            "us" | "µs" | "μs" | "microseconds" => Ok(Self::Microseconds),
            "ms" | "milliseconds" => Ok(Self::Milliseconds),
            "s" | "seconds" => Ok(Self::Seconds),
            unit => Err(DurationError::UnknownUnit {
                value: value.to_owned(),
                unit: unit.to_owned(),
            }),
        }
    }
}

/// length of a duration suffix in seconds
fn unit_scale(unit: &str) -> Option<f64> {
    match unit {
        "h" => Some(3600.0),
        "m" => Some(60.0),
        "s" => Some(1.0),
        "ms" => Some(1e-3),
        // micro sign (U+00B5) and greek mu (U+03BC) both show up in the wild
        "us" | "µs" | "μs" => Some(1e-6),
        "ns" => Some(1e-9),
        _ => None,
    }
}

/// Parse a duration string into `unit`.
///
/// Accepts the notation of Go's `time.Duration` (`150ms`, `2m30.5s`, `1h0m0s`, `800µs`).
/// A bare number has no unit to convert from and is returned as is, i.e., it is assumed to
/// already be expressed in `unit`.
pub fn parse_duration(value: &str, unit: TimeUnit) -> Result<f64, DurationError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(DurationError::Empty);
    }

    if let Ok(number) = trimmed.parse::<f64>() {
        return if number.is_finite() {
            Ok(number)
        } else {
            Err(DurationError::InvalidNumber {
                value: value.to_owned(),
            })
        };
    }

    let converted = unit.from_seconds(parse_seconds(trimmed)?);

    if converted.is_finite() {
        Ok(converted)
    } else {
        Err(DurationError::InvalidNumber {
            value: value.to_owned(),
        })
    }
}

/// sum up all `<number><unit>` components of a duration, in seconds
fn parse_seconds(value: &str) -> Result<f64, DurationError> {
    let invalid = || DurationError::InvalidNumber {
        value: value.to_owned(),
    };

    let (sign, mut rest) = match value.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, value.strip_prefix('+').unwrap_or(value)),
    };

    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total = 0.0;

    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_end);

        if !number.chars().any(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let number: f64 = number.parse().map_err(|_| invalid())?;

        let unit_end = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_end);

        if unit.is_empty() {
            return Err(DurationError::MissingUnit {
                value: value.to_owned(),
            });
        }

        let scale = unit_scale(unit).ok_or_else(|| DurationError::UnknownUnit {
            value: value.to_owned(),
            unit: unit.to_owned(),
        })?;

        total += number * scale;
        if !total.is_finite() {
            return Err(invalid());
        }
        rest = next;
    }

    Ok(sign * total)
}

pub fn to_seconds(value: &str) -> Result<f64, DurationError> {
    parse_duration(value, TimeUnit::Seconds)
}

pub fn to_milliseconds(value: &str) -> Result<f64, DurationError> {
    parse_duration(value, TimeUnit::Milliseconds)
}

/// Format a duration the way Go's `time.Duration.String()` does, so files written here read
/// the same as the ones produced by the benchmark harness.
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();

    if nanos == 0 {
        return "0s".to_owned();
    }
    if nanos < 1_000 {
        return format!("{nanos}ns");
    }
    if nanos < 1_000_000 {
        return format!("{}µs", fraction(nanos, 1_000));
    }
    if nanos < 1_000_000_000 {
        return format!("{}ms", fraction(nanos, 1_000_000));
    }

    let hours = nanos / 3_600_000_000_000;
    let minutes = (nanos / 60_000_000_000) % 60;
    let seconds = fraction(nanos % 60_000_000_000, 1_000_000_000);

    match (hours, minutes) {
        (0, 0) => format!("{seconds}s"),
        (0, minutes) => format!("{minutes}m{seconds}s"),
        (hours, minutes) => format!("{hours}h{minutes}m{seconds}s"),
    }
}

/// `value / divisor` as a decimal without trailing zeros, divisor must be a power of ten
fn fraction(value: u128, divisor: u128) -> String {
    let whole = value / divisor;
    let remainder = value % divisor;

    if remainder == 0 {
        return whole.to_string();
    }

    let width = divisor.ilog10() as usize;
    let digits = format!("{remainder:0width$}");

    format!("{whole}.{}", digits.trim_end_matches('0'))
}
