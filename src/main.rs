// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Weatherscan kiosk: a rotating local weather channel for a spare screen.

mod config;
mod location;
mod render;
mod weather;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use config::AppConfig;
use log::{info, warn};
use mimalloc::MiMalloc;
use rotation_core::Kiosk;
use weather::{HttpSource, LocationOrigin, TwcProvider};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Packages in rotation order, comma separated (Core, MiniCore, ExtraLocal, Spanish)
    #[arg(long, value_delimiter = ',')]
    packages: Option<Vec<String>>,

    /// Location search such as "Philadelphia, PA" or a postal code
    #[arg(long)]
    location: Option<String>,

    /// Background artwork set (neighborhood, oceaneast, urban, southwest)
    #[arg(long)]
    locale: Option<String>,

    /// Print the configuration file path and exit
    #[arg(long)]
    print_config_path: bool,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Apply command-line overrides on top of the stored configuration.
    fn apply(&self, config: &mut AppConfig) {
        if let Some(packages) = &self.packages {
            config.enabled_packages.clone_from(packages);
        }
        if let Some(location) = &self.location {
            config.location_query = Some(location.clone());
        }
        if let Some(locale) = &self.locale {
            config.locale.clone_from(locale);
        }
    }
}

fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

fn location_origin(config: &AppConfig) -> LocationOrigin {
    if let Some(query) = config.location_query.as_ref().filter(|q| !q.trim().is_empty()) {
        LocationOrigin::Query(query.trim().to_string())
    } else if let Some((lat, lon)) = config.override_coordinates() {
        LocationOrigin::Coordinates(lat, lon)
    } else {
        LocationOrigin::Geolocate
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.print_config_path {
        println!("{}", AppConfig::get_config_path()?.display());
        return Ok(());
    }

    info!("Starting Weatherscan kiosk...");
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        AppConfig::default()
    });
    cli.apply(&mut config);

    let kiosk_config = config.kiosk_config()?;
    let api_key = config.resolve_api_key().unwrap_or_else(|| {
        warn!(
            "No weather.com API key in {} or the config file; slides will show placeholders",
            config::API_KEY_ENV
        );
        String::new()
    });

    let client = reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(config.fetch_timeout_secs.max(1)))
        .build()?;
    let origin = location_origin(&config);
    info!("Location source: {:?}", origin);

    let provider = Arc::new(TwcProvider::new(
        Arc::new(HttpSource::new(client.clone())),
        client,
        api_key,
        origin,
    ));
    let kiosk = Kiosk::start(
        kiosk_config,
        provider,
        render::console_collaborators(config.music_volume),
    )?;

    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");
    kiosk.shutdown().await;
    Ok(())
}
