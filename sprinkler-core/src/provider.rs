use crate::{
    Config, Coordinates, WeatherSnapshot, provider::openweather::OpenWeatherProvider,
    transport::TextFetcher,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Never fails: when the forecast is unavailable the snapshot carries only time data.
    async fn get_weather(&self, coords: Coordinates) -> WeatherSnapshot;
}

/// Construct the forecast provider from config.
pub fn provider_from_config(
    config: &Config,
    fetcher: Arc<dyn TextFetcher>,
) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.openweather_api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No OpenWeatherMap API key configured.\n\
                 Hint: run `sprinkler-weather configure` or set OWM_API_KEY."
        )
    })?;

    Ok(Box::new(OpenWeatherProvider::new(
        api_key.to_owned(),
        config.openweather.forecast_url.clone(),
        fetcher,
    )))
}
