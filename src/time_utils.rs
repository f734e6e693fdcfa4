// SPDX-License-Identifier: MIT

//! Shared helpers for the backend's timestamp format.
//!
//! Timestamps are written as `yyyy-MM-ddTHH:mm:ss.SSSSSSZ` (six fractional
//! digits, `Z` suffix). Historical clients wrote anywhere between zero and
//! ten fractional digits and sometimes a `+0000`-style offset, so the parser
//! has to tolerate all of those.

use chrono::{DateTime, Utc};

/// Format a UTC timestamp in the backend's wire format.
pub fn format_timestamp(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Parse a timestamp in any of the historical wire formats.
///
/// Accepts 0-10 fractional-second digits and `Z`, `+HH:MM`, or `+HHMM`
/// offsets. Returns `None` for anything unrecognizable.
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let normalized = clamp_fraction(input);
    let s = normalized.as_str();

    if let Ok(date) = DateTime::parse_from_rfc3339(s) {
        return Some(date.with_timezone(&Utc));
    }

    // Offsets without a colon ("+0000") are not valid RFC 3339.
    for format in ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M:%S%z"] {
        if let Ok(date) = DateTime::parse_from_str(s, format) {
            return Some(date.with_timezone(&Utc));
        }
    }

    None
}

/// Truncate a fractional-seconds component longer than nine digits, which
/// chrono rejects. Ten-digit fractions exist in old persisted data.
fn clamp_fraction(input: &str) -> String {
    let Some(dot) = input.find('.') else {
        return input.to_string();
    };

    let digits: String = input[dot + 1..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.len() <= 9 {
        return input.to_string();
    }

    let rest = &input[dot + 1 + digits.len()..];
    format!("{}.{}{}", &input[..dot], &digits[..9], rest)
}
