use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use sprinkler_core::{
    AdjustmentOptions, AdjustmentRequest, Config, EncodedMethod, OutputFormat, WeatherService,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "sprinkler-weather",
    version,
    about = "Weather-based watering adjustments for sprinkler controllers"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP service.
    Serve {
        /// Listen address, e.g. "0.0.0.0:3000". Overrides the config file and PORT.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Store the OpenWeatherMap API key in the config file.
    Configure,

    /// Compute one adjustment and print it the way a controller receives it.
    Adjust {
        /// GPS "lat,lon" or a place name.
        location: String,

        /// Firmware method byte (bit 7 = California restriction).
        #[arg(long, default_value_t = 1)]
        method: u8,

        /// Adjustment options in controller form, e.g. '"h":100,"t":100,"bt":70'.
        #[arg(long)]
        wto: Option<String>,

        /// `json` or `kv`.
        #[arg(long, default_value = "kv")]
        format: String,
    },

    /// Print the weather report for a location as JSON.
    Report {
        /// GPS "lat,lon" or a place name.
        location: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Serve { bind } => {
                let mut config = Config::load()?;
                if let Some(bind) = bind {
                    config.server.bind = bind;
                }

                let addr = config.bind_addr()?;
                let service = WeatherService::from_config(&config)?;
                sprinkler_weather::serve(Arc::new(service), addr).await?;
            }
            Command::Configure => configure()?,
            Command::Adjust {
                location,
                method,
                wto,
                format,
            } => {
                let service = WeatherService::from_config(&Config::load()?)?;
                let request = AdjustmentRequest {
                    method: EncodedMethod::decode(method),
                    options: AdjustmentOptions::from_wto_lenient(wto.as_deref()),
                    location: Some(location),
                    remote_addr: "127.0.0.1".to_string(),
                };
                let format = OutputFormat::from_query(Some(format.as_str()));

                match service.adjust(&request).await {
                    Ok(result) => println!("{}", result.render(format)),
                    Err(e) => println!("Error: {e}"),
                }
            }
            Command::Report { location } => {
                let service = WeatherService::from_config(&Config::load()?)?;
                match service.report(Some(&location)).await {
                    Ok(report) => println!("{}", serde_json::to_string_pretty(&report)?),
                    Err(e) => println!("Error: {e}"),
                }
            }
        }

        Ok(())
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load_file()?;

    let api_key = Password::new("OpenWeatherMap API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    config.set_openweather_api_key(api_key.trim().to_string());
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}
