use std::fmt;
use std::ops::RangeInclusive;

use crate::{Error, Result};

pub const CHANNELS: RangeInclusive<u8> = 1..=4;

pub fn channel(channel: u8) -> Result<u8> {
    if CHANNELS.contains(&channel) {
        Ok(channel)
    } else {
        Err(invalid("signaling channel", format!("{} not in {:?}", channel, CHANNELS)))
    }
}

pub fn in_range<T: PartialOrd + fmt::Display>(parameter: &str, value: T, min: T, max: T)
        -> Result<T> {
    // written so that NaN fails too
    if value >= min && value <= max {
        Ok(value)
    } else {
        Err(invalid(parameter, format!("{} not in [{}, {}]", value, min, max)))
    }
}

/// Half-open `[min, max)`.
pub fn below<T: PartialOrd + fmt::Display>(parameter: &str, value: T, min: T, max: T)
        -> Result<T> {
    if value >= min && value < max {
        Ok(value)
    } else {
        Err(invalid(parameter, format!("{} not in [{}, {})", value, min, max)))
    }
}

pub fn invalid(parameter: &str, reason: String) -> Error {
    Error::Validation { parameter: parameter.to_owned(), reason }
}

pub fn mismatch(parameter: String, expected: impl fmt::Display, actual: impl fmt::Display)
        -> Error {
    Error::ConfigurationMismatch {
        parameter,
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}

/// Round to the 0.01 grid the instrument keeps for powers and attenuations.
pub fn hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Compared in hundredths, so that a read-back exactly `tolerance` away is accepted.
pub fn within_tolerance(expected: f64, actual: f64, tolerance: f64) -> bool {
    ((actual - expected) * 100.0).round().abs() <= (tolerance * 100.0).round()
}
