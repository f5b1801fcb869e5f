use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Error)]
pub enum ParseError {
    #[error("duration is empty")]
    Empty,
    #[error("invalid magnitude, expected a whole number before the unit")]
    InvalidMagnitude,
    #[error("unknown unit, expected one of s, m, h, d, w")]
    UnknownUnit,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DurationUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
}

impl DurationUnit {
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            's' => Some(Self::Seconds),
            'm' => Some(Self::Minutes),
            'h' => Some(Self::Hours),
            'd' => Some(Self::Days),
            'w' => Some(Self::Weeks),
            _ => None,
        }
    }

    pub fn seconds(self) -> u64 {
        match self {
            Self::Seconds => 1,
            Self::Minutes => 60,
            Self::Hours => 3_600,
            Self::Days => 86_400,
            Self::Weeks => 604_800,
        }
    }
}

/// Parses `<digits><unit>` such as `30s`, `2m`, `7d` or `3w`.
///
/// The whole input is the token: surrounding whitespace, signs, fractions and
/// multi-character units are rejected. Whitespace-only input is `Empty`.
pub fn parse_duration(input: &str) -> Result<Duration, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let Some((split_at, code)) = input.char_indices().next_back() else {
        return Err(ParseError::Empty);
    };
    let magnitude = parse_magnitude(&input[..split_at])?;
    let unit = DurationUnit::from_code(code).ok_or(ParseError::UnknownUnit)?;

    magnitude
        .checked_mul(unit.seconds())
        .map(Duration::from_secs)
        .ok_or(ParseError::InvalidMagnitude)
}

fn parse_magnitude(raw: &str) -> Result<u64, ParseError> {
    // `u64::from_str` tolerates a leading '+', the grammar does not.
    if raw.is_empty() || !raw.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(ParseError::InvalidMagnitude);
    }
    raw.parse::<u64>().map_err(|_| ParseError::InvalidMagnitude)
}
