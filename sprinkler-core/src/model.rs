use serde::{Deserialize, Serialize};

use crate::{location::Coordinates, sun::TimeData};

/// Placeholder some providers emit for "no reading".
pub const MISSING_SENTINEL: f64 = -999.0;

/// Weather condition as reported upstream: a numeric code or an icon/token string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    Code(i32),
    Icon(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub temp_min: i32,
    pub temp_max: i32,
    /// Epoch seconds.
    pub date: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Normalized weather for one location, built once per request.
///
/// Time fields are always present; everything else may be missing when the
/// forecast could not be fetched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    pub timezone: i32,
    pub sunrise: u16,
    pub sunset: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind: Option<f64>,
    /// Inches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precip: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<Condition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast: Option<Vec<ForecastDay>>,
}

impl WeatherSnapshot {
    /// Snapshot carrying only timezone and sun data.
    pub fn from_time(time: TimeData) -> Self {
        Self {
            timezone: time.timezone,
            sunrise: time.sunrise,
            sunset: time.sunset,
            ..Self::default()
        }
    }

    pub fn has_weather(&self) -> bool {
        self.temp.is_some() || self.humidity.is_some() || self.precip.is_some()
    }
}

/// Payload of the weather data endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    #[serde(flatten)]
    pub weather: WeatherSnapshot,
    #[serde(serialize_with = "serialize_location")]
    pub location: Coordinates,
}

fn serialize_location<S: serde::Serializer>(c: &Coordinates, s: S) -> Result<S::Ok, S::Error> {
    <[f64; 2]>::from(*c).serialize(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn partial_snapshot_serializes_time_only() {
        let snapshot = WeatherSnapshot::from_time(TimeData {
            timezone: -300,
            sunrise: 420,
            sunset: 1110,
        });
        let value = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(value, json!({ "timezone": -300, "sunrise": 420, "sunset": 1110 }));
        assert!(!snapshot.has_weather());
    }

    #[test]
    fn report_carries_location_pair() {
        let report = WeatherReport {
            weather: WeatherSnapshot {
                min_temp: Some(60.0),
                icon: Some(Condition::Icon("10d".into())),
                ..WeatherSnapshot::default()
            },
            location: Coordinates {
                latitude: 40.0,
                longitude: -75.5,
            },
        };
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["location"], json!([40.0, -75.5]));
        assert_eq!(value["minTemp"], json!(60.0));
        assert_eq!(value["icon"], json!("10d"));
    }
}
