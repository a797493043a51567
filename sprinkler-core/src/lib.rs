//! Core library for the sprinkler weather service.
//!
//! This crate defines:
//! - Location classification and geocoding of free-text locations
//! - Weather normalization over a forecast provider, with local sun times
//! - The watering adjustment engine and the firmware's timezone byte
//! - Response rendering for the controller
//!
//! It is used by `sprinkler-weather`, but the adjustment engine is plain
//! functions and can be reused without any I/O.

pub mod adjustment;
pub mod config;
pub mod error;
pub mod geocode;
pub mod location;
pub mod model;
pub mod provider;
pub mod response;
pub mod service;
pub mod sun;
pub mod timezone;
pub mod transport;

pub use adjustment::{AdjustmentMethod, AdjustmentOptions, Decision, EncodedMethod};
pub use config::Config;
pub use error::WeatherError;
pub use location::{Coordinates, Location};
pub use model::{Condition, ForecastDay, WeatherReport, WeatherSnapshot};
pub use provider::WeatherProvider;
pub use response::{AdjustmentResult, OutputFormat};
pub use service::{AdjustmentRequest, WeatherService};
pub use transport::{HttpFetcher, TextFetcher};
