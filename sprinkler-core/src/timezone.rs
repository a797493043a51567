//! Conversions between UTC offsets and the firmware's timezone byte.
//!
//! The firmware stores the offset as quarter hours shifted by twelve hours, so
//! `0` is UTC-12:00, `48` is UTC and `96` is UTC+12:00.

use chrono::{Offset, TimeZone, Utc};
use chrono_tz::Tz;

const QUARTERS_PER_HOUR: i32 = 4;
const MINUTES_PER_QUARTER: i32 = 15;
/// Byte value for UTC+00:00.
const UTC_BYTE: i32 = 12 * QUARTERS_PER_HOUR;
const MAX_BYTE: i32 = 24 * QUARTERS_PER_HOUR;

/// Encode an offset in minutes into the firmware byte.
///
/// Partial quarter hours are truncated toward zero.
pub fn encode(offset_minutes: i32) -> u8 {
    let quarters = offset_minutes / MINUTES_PER_QUARTER;
    (quarters + UTC_BYTE).clamp(0, MAX_BYTE) as u8
}

/// Inverse of [`encode`], exact for quarter-hour offsets.
pub fn decode(byte: u8) -> i32 {
    (i32::from(byte) - UTC_BYTE) * MINUTES_PER_QUARTER
}

/// Parse a UTC offset out of either an ISO-8601 timestamp
/// (`2013-12-21T07:00:00-0500`, `...+05:30`, `...Z`) or a bare offset (`-0500`, `+05:30`).
pub fn parse_offset(input: &str) -> Option<i32> {
    let input = input.trim();

    let suffix = match input.split_once('T') {
        Some((_, time)) => {
            if time.ends_with('Z') {
                return Some(0);
            }
            let at = time.rfind(['+', '-'])?;
            &time[at..]
        }
        None => input,
    };

    parse_bare_offset(suffix)
}

fn parse_bare_offset(s: &str) -> Option<i32> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };

    let (hours, minutes) = match rest.split_once(':') {
        Some(parts) => parts,
        None if rest.len() == 4 && rest.is_ascii() => rest.split_at(2),
        None => return None,
    };

    if hours.len() != 2 || minutes.len() != 2 {
        return None;
    }
    if !hours.bytes().chain(minutes.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if minutes >= 60 {
        return None;
    }

    Some(sign * (hours * 60 + minutes))
}

/// Current UTC offset of a named zone, in minutes.
///
/// Uses "now" rather than the forecast date, so a DST switch inside the
/// forecast window is not reflected.
pub fn current_offset_minutes(tz: Tz) -> i32 {
    offset_minutes_at(tz, Utc::now())
}

pub fn offset_minutes_at(tz: Tz, at: chrono::DateTime<Utc>) -> i32 {
    tz.offset_from_utc_datetime(&at.naive_utc()).fix().local_minus_utc() / 60
}
