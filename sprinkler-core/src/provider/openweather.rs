use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    location::Coordinates,
    model::{Condition, ForecastDay, WeatherSnapshot},
    sun::TimeData,
    transport::TextFetcher,
};

use super::WeatherProvider;

pub const DEFAULT_FORECAST_URL: &str = "http://api.openweathermap.org/data/2.5/forecast/daily";

const MM_PER_INCH: f64 = 25.4;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    forecast_url: String,
    fetcher: Arc<dyn TextFetcher>,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, forecast_url: String, fetcher: Arc<dyn TextFetcher>) -> Self {
        Self {
            api_key,
            forecast_url,
            fetcher,
        }
    }

    fn url(&self, coords: Coordinates) -> String {
        format!(
            "{}?appid={}&units=imperial&lat={}&lon={}",
            self.forecast_url,
            urlencoding::encode(&self.api_key),
            coords.latitude,
            coords.longitude,
        )
    }

    async fn fetch_forecast(&self, coords: Coordinates) -> Result<OwForecastResponse> {
        let body = self
            .fetcher
            .get_text(&self.url(coords))
            .await
            .context("Failed to fetch OpenWeather daily forecast")?;

        let parsed: OwForecastResponse =
            serde_json::from_str(&body).context("Failed to parse OpenWeather forecast JSON")?;

        if parsed.list.is_empty() {
            return Err(anyhow!("OpenWeather forecast response contained no data"));
        }

        Ok(parsed)
    }
}

/// Map the provider payload onto a snapshot that already carries time data.
fn apply_forecast(snapshot: &mut WeatherSnapshot, parsed: OwForecastResponse) {
    let Some(today) = parsed.list.first() else {
        return;
    };

    let min_temp = today.temp.min.trunc();
    let max_temp = today.temp.max.trunc();
    let condition = today.weather.first();

    if let Some(city) = parsed.city {
        snapshot.region = city.country;
        snapshot.city = city.name;
    }
    snapshot.min_temp = Some(min_temp);
    snapshot.max_temp = Some(max_temp);
    snapshot.temp = Some((min_temp + max_temp) / 2.0);
    snapshot.humidity = today.humidity.map(f64::trunc);
    snapshot.wind = today.speed.map(f64::trunc);
    snapshot.precip = Some(today.rain.unwrap_or(0.0) / MM_PER_INCH);
    snapshot.description = condition.and_then(|w| w.description.clone());
    snapshot.icon = condition.and_then(|w| w.icon.clone()).map(Condition::Icon);

    snapshot.forecast = Some(
        parsed
            .list
            .iter()
            .map(|entry| {
                let condition = entry.weather.first();
                ForecastDay {
                    temp_min: entry.temp.min.trunc() as i32,
                    temp_max: entry.temp.max.trunc() as i32,
                    date: entry.dt,
                    icon: condition.and_then(|w| w.icon.clone()),
                    description: condition.and_then(|w| w.description.clone()),
                }
            })
            .collect(),
    );
}

#[derive(Debug, Deserialize)]
struct OwTemp {
    min: f64,
    max: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: Option<String>,
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    name: Option<String>,
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    temp: OwTemp,
    humidity: Option<f64>,
    speed: Option<f64>,
    /// Millimeters.
    rain: Option<f64>,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: Option<OwCity>,
    #[serde(default)]
    list: Vec<OwForecastEntry>,
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn get_weather(&self, coords: Coordinates) -> WeatherSnapshot {
        // Time data first, so it survives a failed forecast call.
        let mut snapshot = WeatherSnapshot::from_time(TimeData::for_coordinates(coords));

        match self.fetch_forecast(coords).await {
            Ok(parsed) => apply_forecast(&mut snapshot, parsed),
            Err(e) => {
                tracing::warn!(
                    error = ?e,
                    %coords,
                    "forecast unavailable, using time data only"
                );
            }
        }

        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::fake::FakeFetcher;

    const FORECAST: &str = r#"{
        "city": {"id": 4560349, "name": "Philadelphia", "country": "US"},
        "cod": "200",
        "cnt": 2,
        "list": [
            {"dt": 1719853200, "temp": {"day": 84.2, "min": 68.9, "max": 88.7},
             "pressure": 1012, "humidity": 55, "speed": 7.9, "rain": 5.08,
             "weather": [{"id": 500, "main": "Rain", "description": "light rain", "icon": "10d"}]},
            {"dt": 1719939600, "temp": {"day": 80.1, "min": 66.2, "max": 83.4},
             "pressure": 1015, "humidity": 48, "speed": 5.2,
             "weather": [{"id": 800, "main": "Clear", "description": "sky is clear",
                          "icon": "01d"}]}
        ]
    }"#;

    fn provider(fetcher: FakeFetcher) -> (OpenWeatherProvider, Arc<FakeFetcher>) {
        let fetcher = Arc::new(fetcher);
        let provider = OpenWeatherProvider::new(
            "KEY".to_string(),
            DEFAULT_FORECAST_URL.to_string(),
            fetcher.clone(),
        );
        (provider, fetcher)
    }

    fn philadelphia() -> Coordinates {
        Coordinates::new(39.95, -75.16).unwrap()
    }

    #[tokio::test]
    async fn maps_first_day_and_forecast() {
        let (provider, fetcher) = provider(FakeFetcher::new().respond("forecast/daily", FORECAST));

        let w = provider.get_weather(philadelphia()).await;

        assert_eq!(w.city.as_deref(), Some("Philadelphia"));
        assert_eq!(w.region.as_deref(), Some("US"));
        assert_eq!(w.min_temp, Some(68.0));
        assert_eq!(w.max_temp, Some(88.0));
        assert_eq!(w.temp, Some(78.0));
        assert_eq!(w.humidity, Some(55.0));
        assert_eq!(w.wind, Some(7.0));
        assert!((w.precip.unwrap() - 0.2).abs() < 1e-9);
        assert_eq!(w.description.as_deref(), Some("light rain"));
        assert_eq!(w.icon, Some(Condition::Icon("10d".into())));

        let forecast = w.forecast.expect("forecast list");
        assert_eq!(forecast.len(), 2);
        assert_eq!(forecast[1].temp_min, 66);
        assert_eq!(forecast[1].temp_max, 83);
        assert_eq!(forecast[1].date, 1719939600);
        assert_eq!(forecast[1].icon.as_deref(), Some("01d"));

        assert_eq!(
            fetcher.requested(),
            vec![format!(
                "{DEFAULT_FORECAST_URL}?appid=KEY&units=imperial&lat=39.95&lon=-75.16"
            )]
        );
    }

    #[tokio::test]
    async fn absent_rain_means_zero_precip() {
        let body = r#"{"list":[
            {"dt":1,"temp":{"min":50,"max":60},"humidity":40,"speed":3,"weather":[]}
        ]}"#;
        let (provider, _) = provider(FakeFetcher::new().respond("forecast/daily", body));

        let w = provider.get_weather(philadelphia()).await;

        assert_eq!(w.precip, Some(0.0));
        assert_eq!(w.temp, Some(55.0));
        assert_eq!(w.city, None);
        assert_eq!(w.description, None);
    }

    #[tokio::test]
    async fn transport_failure_keeps_time_data() {
        let (provider, _) = provider(FakeFetcher::new().fail("forecast/daily"));

        let w = provider.get_weather(philadelphia()).await;

        assert!(!w.has_weather());
        assert!(w.forecast.is_none());
        assert!(w.timezone == -300 || w.timezone == -240);
        assert!(w.sunrise < w.sunset);
    }

    #[tokio::test]
    async fn malformed_payload_keeps_time_data() {
        let bodies = [
            "not json",
            r#"{"cod":"401","message":"Invalid API key"}"#,
            r#"{"list":[]}"#,
        ];
        for body in bodies {
            let (provider, _) = provider(FakeFetcher::new().respond("forecast/daily", body));
            let w = provider.get_weather(philadelphia()).await;
            assert!(!w.has_weather(), "{body} should leave weather empty");
        }
    }
}
