//! The per-request pipeline: classify, geocode if needed, fetch weather, decide.

use std::sync::Arc;

use crate::{
    adjustment::{self, AdjustmentOptions, EncodedMethod},
    config::Config,
    error::{Result, WeatherError},
    geocode::AutocompleteGeocoder,
    location::{Coordinates, Location},
    model::WeatherReport,
    provider::{WeatherProvider, provider_from_config},
    response::{self, AdjustmentResult},
    timezone,
    transport::{HttpFetcher, TextFetcher},
};

/// Everything the firmware sent with one adjustment request, already decoded.
#[derive(Debug, Clone, Default)]
pub struct AdjustmentRequest {
    pub method: EncodedMethod,
    pub options: Option<AdjustmentOptions>,
    pub location: Option<String>,
    /// Client address as seen by the service (first forwarded hop or peer).
    pub remote_addr: String,
}

/// Shared, read-only service; one instance serves all requests.
#[derive(Debug)]
pub struct WeatherService {
    geocoder: AutocompleteGeocoder,
    provider: Box<dyn WeatherProvider>,
}

impl WeatherService {
    pub fn new(geocoder: AutocompleteGeocoder, provider: Box<dyn WeatherProvider>) -> Self {
        Self { geocoder, provider }
    }

    /// Build the service on a real HTTP client.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Self::with_fetcher(config, Arc::new(HttpFetcher::new()))
    }

    pub fn with_fetcher(config: &Config, fetcher: Arc<dyn TextFetcher>) -> anyhow::Result<Self> {
        let provider = provider_from_config(config, fetcher.clone())?;
        let geocoder = AutocompleteGeocoder::new(fetcher, config.geocoder.autocomplete_url.clone());
        Ok(Self::new(geocoder, provider))
    }

    /// Turn a raw `loc` value into coordinates, geocoding free text.
    pub async fn resolve(&self, raw: &str) -> Result<Coordinates> {
        match Location::classify(raw) {
            Location::Gps(coords) => Ok(coords),
            Location::Station(id) => {
                tracing::debug!(station = %id, "rejecting station identifier");
                Err(WeatherError::UnsupportedLocationFormat)
            }
            Location::Text(text) => Ok(self.geocoder.resolve(&text).await?.coordinates),
        }
    }

    pub async fn adjust(&self, request: &AdjustmentRequest) -> Result<AdjustmentResult> {
        let raw = request
            .location
            .as_deref()
            .filter(|loc| !loc.is_empty())
            .ok_or(WeatherError::MissingLocation)?;

        let coords = self.resolve(raw).await?;
        let weather = self.provider.get_weather(coords).await;
        let decision = adjustment::decide(request.method, request.options.as_ref(), &weather);

        tracing::debug!(
            %coords,
            method = request.method.encode(),
            scale = decision.scale,
            rain_delay = decision.rain_delay,
            has_weather = weather.has_weather(),
            "adjustment computed"
        );

        Ok(AdjustmentResult {
            scale: decision.scale,
            rd: decision.rain_delay,
            tz: timezone::encode(weather.timezone),
            sunrise: weather.sunrise,
            sunset: weather.sunset,
            eip: response::encode_ip(&request.remote_addr),
        })
    }

    /// Full weather snapshot for the weather data endpoint.
    pub async fn report(&self, location: Option<&str>) -> Result<WeatherReport> {
        let raw = location.filter(|loc| !loc.is_empty()).ok_or(WeatherError::MissingLocation)?;
        let coords = self.resolve(raw).await?;
        let weather = self.provider.get_weather(coords).await;

        Ok(WeatherReport {
            weather,
            location: coords,
        })
    }
}
