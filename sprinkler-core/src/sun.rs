//! Timezone and sunrise/sunset for a coordinate pair.

use std::sync::OnceLock;

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use sunrise::{SolarDay, SolarEvent};
use tzf_rs::DefaultFinder;

use crate::{location::Coordinates, timezone};

const MINUTES_PER_DAY: i32 = 24 * 60;

/// Reported for a day the sun never sets.
pub const POLAR_DAY: (u16, u16) = (0, (MINUTES_PER_DAY - 1) as u16);
/// Reported for a day the sun never rises.
pub const POLAR_NIGHT: (u16, u16) = (0, 0);

/// Axial tilt, degrees.
const OBLIQUITY: f64 = 23.44;

static FINDER: OnceLock<DefaultFinder> = OnceLock::new();

/// Offset and local sun times, always available for valid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeData {
    /// UTC offset in minutes.
    pub timezone: i32,
    /// Minutes since local midnight.
    pub sunrise: u16,
    /// Minutes since local midnight.
    pub sunset: u16,
}

impl TimeData {
    pub fn for_coordinates(coords: Coordinates) -> Self {
        Self::at(coords, Utc::now())
    }

    pub fn at(coords: Coordinates, now: DateTime<Utc>) -> Self {
        let offset = utc_offset_at(coords, now);
        let (sunrise, sunset) = sun_times(coords, now.date_naive(), offset);

        Self {
            timezone: offset,
            sunrise,
            sunset,
        }
    }
}

/// IANA zone name covering the coordinates.
pub fn timezone_name(coords: Coordinates) -> &'static str {
    FINDER
        .get_or_init(DefaultFinder::new)
        .get_tz_name(coords.longitude, coords.latitude)
}

/// UTC offset in minutes at `at`. Falls back to the nautical offset when the
/// zone name is unknown to the tz database.
pub fn utc_offset_at(coords: Coordinates, at: DateTime<Utc>) -> i32 {
    match timezone_name(coords).parse::<Tz>() {
        Ok(tz) => timezone::offset_minutes_at(tz, at),
        Err(_) => {
            tracing::debug!(%coords, "no named timezone, using nautical offset");
            nautical_offset(coords.longitude)
        }
    }
}

fn nautical_offset(longitude: f64) -> i32 {
    (longitude / 15.0).round() as i32 * 60
}

/// Sunrise and sunset on `date`, as minutes since local midnight.
///
/// Inside the polar circles the sun may not cross the horizon at all; such days
/// give [`POLAR_DAY`] or [`POLAR_NIGHT`].
pub fn sun_times(coords: Coordinates, date: NaiveDate, offset_minutes: i32) -> (u16, u16) {
    // Coordinates were range-checked on construction.
    let Some(position) = sunrise::Coordinates::new(coords.latitude, coords.longitude) else {
        return (0, 0);
    };

    let day = SolarDay::new(position, date);
    let rise = day.event_time(SolarEvent::Sunrise);
    let set = day.event_time(SolarEvent::Sunset);

    // No horizon crossing comes back from the solver as the Unix epoch.
    if rise.timestamp() == 0 || set.timestamp() == 0 {
        return if is_polar_day(coords.latitude, date) {
            POLAR_DAY
        } else {
            POLAR_NIGHT
        };
    }

    (
        local_minutes(rise, offset_minutes),
        local_minutes(set, offset_minutes),
    )
}

/// Sun stays up when the observer is on the same side of the equator as the sun.
fn is_polar_day(latitude: f64, date: NaiveDate) -> bool {
    let days = f64::from(date.ordinal() + 10);
    let declination = -OBLIQUITY * (2.0 * std::f64::consts::PI * days / 365.0).cos();
    latitude * declination > 0.0
}

fn local_minutes(t: DateTime<Utc>, offset_minutes: i32) -> u16 {
    let utc_minutes = (t.hour() * 60 + t.minute()) as i32;
    (utc_minutes + offset_minutes).rem_euclid(MINUTES_PER_DAY) as u16
}
