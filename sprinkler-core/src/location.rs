use serde::{Deserialize, Serialize};
use std::fmt;

/// A resolved position on the globe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Returns `None` when either value is outside its valid range.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self {
            latitude,
            longitude,
        })
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Serialized as `[lat, lon]`, which is how weather reports expose the location.
impl From<Coordinates> for [f64; 2] {
    fn from(c: Coordinates) -> Self {
        [c.latitude, c.longitude]
    }
}

/// What a raw `loc` string turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    Gps(Coordinates),
    /// Legacy `pws:`/`icao:`/`zmw:` identifier. Never resolvable.
    Station(String),
    /// Anything else; needs geocoding.
    Text(String),
}

const STATION_PREFIXES: &[&str] = &["pws:", "icao:", "zmw:"];

impl Location {
    /// Classify a raw location string. GPS wins over station prefixes, which win over free text.
    pub fn classify(raw: &str) -> Self {
        if let Some(coords) = parse_gps(raw) {
            return Location::Gps(coords);
        }

        if STATION_PREFIXES.iter().any(|p| raw.starts_with(p)) {
            return Location::Station(raw.to_string());
        }

        Location::Text(raw.to_string())
    }
}

/// Parse `lat,lon` with optional whitespace after the comma.
///
/// Each half is an optionally signed decimal (`12`, `-12.5`, `+0.25`); exponents,
/// bare dots and surrounding whitespace are rejected.
pub fn parse_gps(raw: &str) -> Option<Coordinates> {
    let (lat, lon) = raw.split_once(',')?;
    let lat = parse_decimal(lat, 2)?;
    let lon = parse_decimal(lon.trim_start(), 3)?;
    Coordinates::new(lat, lon)
}

fn parse_decimal(s: &str, max_int_digits: usize) -> Option<f64> {
    let unsigned = s.strip_prefix(['-', '+']).unwrap_or(s);
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());

    if !digits(int_part) || int_part.len() > max_int_digits {
        return None;
    }
    if frac_part.is_some_and(|f| !digits(f)) {
        return None;
    }

    s.parse().ok()
}
