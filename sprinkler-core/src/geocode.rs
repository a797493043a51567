use std::sync::Arc;

use chrono_tz::Tz;
use serde::Deserialize;

use crate::{
    error::{Result, WeatherError},
    location::Coordinates,
    timezone,
    transport::TextFetcher,
};

pub const DEFAULT_AUTOCOMPLETE_URL: &str = "http://autocomplete.wunderground.com/aq";

/// A free-text location after geocoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedLocation {
    pub coordinates: Coordinates,
    /// UTC offset of the result's timezone right now, in minutes.
    pub utc_offset: i32,
}

/// Autocomplete-style lookup: text in, first matching place out.
#[derive(Debug, Clone)]
pub struct AutocompleteGeocoder {
    fetcher: Arc<dyn TextFetcher>,
    base_url: String,
}

impl AutocompleteGeocoder {
    pub fn new(fetcher: Arc<dyn TextFetcher>, base_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            base_url: base_url.into(),
        }
    }

    fn url(&self, query: &str) -> String {
        format!("{}?h=0&query={}", self.base_url, urlencoding::encode(query))
    }

    /// One lookup, no retry. Every failure collapses into `UnresolvedLocation`.
    pub async fn resolve(&self, query: &str) -> Result<ResolvedLocation> {
        let body = self.fetcher.get_text(&self.url(query)).await.map_err(|e| {
            tracing::warn!(error = %e, query, "geocoding request failed");
            WeatherError::UnresolvedLocation
        })?;

        let resolved = parse_autocomplete(&body);
        match resolved {
            Some(r) => {
                tracing::debug!(
                    query,
                    coordinates = %r.coordinates,
                    utc_offset = r.utc_offset,
                    "geocoded location"
                );
                Ok(r)
            }
            None => {
                tracing::debug!(query, "no usable geocoding result");
                Err(WeatherError::UnresolvedLocation)
            }
        }
    }
}

fn parse_autocomplete(body: &str) -> Option<ResolvedLocation> {
    let parsed: AcResponse = serde_json::from_str(body).ok()?;
    let first = parsed.results.into_iter().next()?;

    let tz_name = first.tz.filter(|tz| tz != "MISSING")?;
    let tz: Tz = tz_name.parse().ok()?;

    let coordinates = Coordinates::new(first.lat?.value()?, first.lon?.value()?)?;

    Some(ResolvedLocation {
        coordinates,
        utc_offset: timezone::current_offset_minutes(tz),
    })
}

#[derive(Debug, Deserialize)]
struct AcResponse {
    #[serde(rename = "RESULTS", default)]
    results: Vec<AcResult>,
}

#[derive(Debug, Deserialize)]
struct AcResult {
    lat: Option<AcNumber>,
    lon: Option<AcNumber>,
    tz: Option<String>,
}

/// The autocomplete service sends coordinates as strings; accept numbers too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AcNumber {
    Number(f64),
    Text(String),
}

impl AcNumber {
    fn value(&self) -> Option<f64> {
        match self {
            AcNumber::Number(n) => Some(*n),
            AcNumber::Text(s) => s.trim().parse().ok(),
        }
    }
}
