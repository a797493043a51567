//! HTTP front end for the sprinkler weather service.
//!
//! Routes firmware requests into [`sprinkler_core::WeatherService`] and renders
//! the answers the way the controllers expect them.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub mod web;

pub use web::{build_app, serve};

const DEFAULT_LOG_FILTER: &str = "info,sprinkler_core=debug,sprinkler_weather=debug";

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
/// Logs go to stderr so command output on stdout stays clean.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
