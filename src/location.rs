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

//! IP-based geolocation for kiosks without a configured location.

use log::{info, warn};
use serde_json::Value;

/// Geolocation services tried in order, with their latitude/longitude keys.
const SOURCES: [(&str, &str, &str); 2] = [
    ("https://ipapi.co/json/", "latitude", "longitude"),
    ("http://ip-api.com/json/", "lat", "lon"),
];

/// Look up the kiosk's approximate coordinates from its public IP.
pub async fn current_location(client: &reqwest::Client) -> Option<(f64, f64)> {
    info!("Fetching current location...");

    for (url, lat_key, lon_key) in SOURCES {
        match fetch(client, url).await {
            Ok(value) => {
                if let Some(coords) = coordinates(&value, lat_key, lon_key) {
                    info!("Location found via {}: {}, {}", url, coords.0, coords.1);
                    return Some(coords);
                }
                warn!("No coordinates in response from {}", url);
            }
            Err(e) => warn!("Geolocation via {} failed: {}", url, e),
        }
    }

    warn!("Failed to fetch location from all sources");
    None
}

async fn fetch(client: &reqwest::Client, url: &str) -> Result<Value, reqwest::Error> {
    client.get(url).send().await?.error_for_status()?.json().await
}

fn coordinates(value: &Value, lat_key: &str, lon_key: &str) -> Option<(f64, f64)> {
    let lat = value.get(lat_key).and_then(Value::as_f64)?;
    let lon = value.get(lon_key).and_then(Value::as_f64)?;
    Some((lat, lon))
}
