//! Watering scale, restrictions and rain delay.
//!
//! Everything here is pure: a [`WeatherSnapshot`] and the firmware's settings
//! go in, a [`Decision`] comes out.

use crate::model::{Condition, MISSING_SENTINEL, WeatherSnapshot};

pub mod options;

pub use options::AdjustmentOptions;

const DEFAULT_HUMIDITY_BASE: f64 = 30.0;
const DEFAULT_TEMP_BASE: f64 = 70.0;
const DEFAULT_PRECIP_BASE: f64 = 0.0;

/// Returned when the watering scale does not apply, and for "no rain delay".
pub const NOT_APPLICABLE: i32 = -1;
pub const NEUTRAL_SCALE: i32 = 100;
pub const MAX_SCALE: f64 = 200.0;
pub const DEFAULT_RAIN_DELAY_HOURS: i32 = 24;

/// Precipitation above which the California restriction blocks watering, inches.
const CALIFORNIA_PRECIP_LIMIT: f64 = 0.01;

const RESTRICTION_BIT: u8 = 1 << 7;

/// Weather codes that mean it is raining or otherwise too wet to water.
const ADVERSE_CODES: &[i32] = &[
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 35, 37, 38, 39, 40, 41, 42,
    43, 44, 45, 46, 47,
];
const ADVERSE_WORDS: &[&str] = &[
    "flurries",
    "sleet",
    "rain",
    "snow",
    "tstorms",
    "thunderstorm",
    "thunderstorms",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustmentMethod {
    /// Manual watering; rain checks are skipped.
    None,
    Zimmerman,
    RainDelay,
    /// Index the service does not know; passed through untouched.
    Unknown(u8),
}

impl AdjustmentMethod {
    pub fn index(self) -> u8 {
        match self {
            AdjustmentMethod::None => 0,
            AdjustmentMethod::Zimmerman => 1,
            AdjustmentMethod::RainDelay => 2,
            AdjustmentMethod::Unknown(i) => i,
        }
    }
}

impl From<u8> for AdjustmentMethod {
    fn from(index: u8) -> Self {
        match index {
            0 => AdjustmentMethod::None,
            1 => AdjustmentMethod::Zimmerman,
            2 => AdjustmentMethod::RainDelay,
            other => AdjustmentMethod::Unknown(other),
        }
    }
}

/// The firmware's method byte: bit 7 is the California restriction, bits 0-6 the method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedMethod {
    pub method: AdjustmentMethod,
    pub california_restriction: bool,
}

impl EncodedMethod {
    pub fn decode(byte: u8) -> Self {
        Self {
            method: AdjustmentMethod::from(byte & !RESTRICTION_BIT),
            california_restriction: byte & RESTRICTION_BIT != 0,
        }
    }

    /// Decode the numeric path segment; anything that is not a byte means "no method".
    pub fn from_path_segment(segment: &str) -> Self {
        Self::decode(segment.parse().unwrap_or(0))
    }

    pub fn encode(self) -> u8 {
        let restriction = if self.california_restriction { RESTRICTION_BIT } else { 0 };
        self.method.index() | restriction
    }
}

impl Default for EncodedMethod {
    fn default() -> Self {
        Self::decode(0)
    }
}

/// Final scale and rain delay for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub scale: i32,
    pub rain_delay: i32,
}

/// Usable reading: present, finite and not the missing sentinel.
fn reading(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v != MISSING_SENTINEL)
}

/// Zimmerman watering scale in percent, 0..=200.
///
/// Any missing input yields the neutral scale.
pub fn zimmerman_scale(options: Option<&AdjustmentOptions>, weather: &WeatherSnapshot) -> i32 {
    let (Some(temp), Some(humidity), Some(precip)) = (
        reading(weather.temp),
        reading(weather.humidity),
        reading(weather.precip),
    ) else {
        return NEUTRAL_SCALE;
    };

    let opts = options.copied().unwrap_or_default();
    let humidity_base = opts.bh.unwrap_or(DEFAULT_HUMIDITY_BASE);
    let temp_base = opts.bt.unwrap_or(DEFAULT_TEMP_BASE);
    let precip_base = opts.br.unwrap_or(DEFAULT_PRECIP_BASE);

    let weight = |factor: f64, pct: Option<f64>| pct.map_or(factor, |p| factor * (p / 100.0));

    let humidity_factor = weight(humidity_base - humidity, opts.h);
    let temp_factor = weight((temp - temp_base) * 4.0, opts.t);
    let precip_factor = weight((precip_base - precip) * 200.0, opts.r);

    let scale = (100.0 + humidity_factor + temp_factor + precip_factor).clamp(0.0, MAX_SCALE);
    scale.trunc() as i32
}

/// Scale for the given method; [`NOT_APPLICABLE`] for anything but Zimmerman.
pub fn calculate_scale(
    method: AdjustmentMethod,
    options: Option<&AdjustmentOptions>,
    weather: &WeatherSnapshot,
) -> i32 {
    match method {
        AdjustmentMethod::Zimmerman => zimmerman_scale(options, weather),
        _ => NOT_APPLICABLE,
    }
}

/// California restriction: no watering after more than 0.01" of rain.
pub fn is_restricted(method: EncodedMethod, weather: &WeatherSnapshot) -> bool {
    method.california_restriction
        && reading(weather.precip).is_some_and(|p| p > CALIFORNIA_PRECIP_LIMIT)
}

pub fn is_raining(weather: &WeatherSnapshot) -> bool {
    let adverse_word = |s: &str| {
        let s = s.to_ascii_lowercase();
        s.split(|c: char| !c.is_ascii_alphabetic())
            .any(|word| ADVERSE_WORDS.contains(&word))
    };

    let by_condition = match &weather.icon {
        Some(Condition::Code(code)) => ADVERSE_CODES.contains(code),
        Some(Condition::Icon(icon)) => adverse_word(icon),
        None => false,
    };

    by_condition || weather.description.as_deref().is_some_and(adverse_word)
}

/// Run scale, restriction and rain checks in order.
///
/// The restriction and a rain-forced stop both set the scale to 0; a rain delay
/// never touches the scale.
pub fn decide(
    method: EncodedMethod,
    options: Option<&AdjustmentOptions>,
    weather: &WeatherSnapshot,
) -> Decision {
    let mut scale = calculate_scale(method.method, options, weather);
    let mut rain_delay = NOT_APPLICABLE;

    if is_restricted(method, weather) {
        scale = 0;
    }

    if method.method != AdjustmentMethod::None && is_raining(weather) {
        if method.method == AdjustmentMethod::RainDelay {
            rain_delay = options
                .and_then(|o| o.d)
                .filter(|d| d.is_finite())
                .map_or(DEFAULT_RAIN_DELAY_HOURS, |d| d.trunc() as i32);
        } else {
            scale = 0;
        }
    }

    Decision {
        scale,
        rain_delay,
    }
}
