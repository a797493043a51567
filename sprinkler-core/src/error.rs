use thiserror::Error;

/// Failures the adjustment pipeline can report.
///
/// The `Display` text of the user-visible variants is what the firmware gets
/// back after the `Error: ` prefix, so it must stay stable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeatherError {
    #[error("No location provided.")]
    MissingLocation,

    /// Station identifiers (`pws:`, `icao:`, `zmw:`) need a directory service
    /// that no longer exists.
    #[error("Weather Underground is discontinued.")]
    UnsupportedLocationFormat,

    #[error("Unable to resolve location")]
    UnresolvedLocation,

    #[error("Upstream service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Invalid adjustment options: {0}")]
    InvalidAdjustmentOptions(String),
}

pub type Result<T, E = WeatherError> = std::result::Result<T, E>;
