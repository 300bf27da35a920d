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

//! weather.com v3 implementation of [`WeatherProvider`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use log::{debug, warn};
use rotation_core::store::{
    Alert, Almanac, AlmanacDay, DayForecast, Forecast, MessageType, Observation, Period, Severity,
};
use rotation_core::{Language, Location, LocationSet, UpstreamError, WeatherProvider};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::{lunar, CachedFetcher, JsonSource};
use crate::location;

const API_BASE: &str = "https://api.weather.com/v3";

/// Nearby locations resolved around the primary one.
const NEARBY_LIMIT: usize = 8;

/// Where the primary location comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationOrigin {
    /// Free-text location search ("Philadelphia, PA", a postal code).
    Query(String),
    /// Fixed coordinates.
    Coordinates(f64, f64),
    /// IP geolocation.
    Geolocate,
}

#[derive(Debug, Deserialize)]
struct LocationResponse {
    location: LocationColumns,
}

/// Location search results, one column per attribute.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LocationColumns {
    loc_id: Vec<Option<String>>,
    latitude: Vec<f64>,
    longitude: Vec<f64>,
    display_name: Vec<Option<String>>,
    admin_district: Vec<Option<String>>,
    country: Vec<Option<String>>,
    iana_time_zone: Vec<Option<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObservationResponse {
    temperature: Option<i32>,
    relative_humidity: Option<i32>,
    pressure_altimeter: Option<f64>,
    wind_speed: Option<i32>,
    wind_direction_cardinal: Option<String>,
    wind_gust: Option<i32>,
    wx_phrase_medium: Option<String>,
    icon_code: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct DailyResponse {
    day_of_week: Vec<String>,
    temperature_max: Vec<Option<i32>>,
    temperature_min: Vec<Option<i32>>,
    sunrise_time_local: Vec<Option<String>>,
    sunset_time_local: Vec<Option<String>>,
    daypart: Vec<Daypart>,
}

/// Day and night halves of the daily forecast, interleaved.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Daypart {
    daypart_name: Vec<Option<String>>,
    narrative: Vec<Option<String>>,
    icon_code: Vec<Option<u32>>,
    wx_phrase_short: Vec<Option<String>>,
    wx_phrase_long: Vec<Option<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct HeadlinesResponse {
    alerts: Vec<Headline>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Headline {
    detail_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlertDetailResponse {
    alert_detail: AlertDetail,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlertDetail {
    #[serde(default)]
    source: String,
    #[serde(default)]
    phenomena: String,
    #[serde(default)]
    significance: String,
    #[serde(default)]
    message_type: String,
    #[serde(default)]
    event_description: String,
    #[serde(default)]
    headline_text: String,
    #[serde(rename = "expireTimeUTC")]
    expire_time_utc: i64,
}

/// Weather provider backed by the weather.com v3 API.
pub struct TwcProvider {
    fetcher: CachedFetcher,
    api_key: String,
    origin: LocationOrigin,
    client: reqwest::Client,
}

impl std::fmt::Debug for TwcProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwcProvider")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

impl TwcProvider {
    /// `client` is used for IP geolocation when the origin is [`LocationOrigin::Geolocate`].
    pub fn new(
        source: Arc<dyn JsonSource>,
        client: reqwest::Client,
        api_key: String,
        origin: LocationOrigin,
    ) -> Self {
        Self {
            fetcher: CachedFetcher::new(source),
            api_key,
            origin,
            client,
        }
    }

    fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<String, UpstreamError> {
        let mut url = reqwest::Url::parse(&format!("{API_BASE}/{path}"))
            .map_err(|e| UpstreamError::Malformed(e.to_string()))?;
        url.query_pairs_mut()
            .extend_pairs(params)
            .append_pair("format", "json")
            .append_pair("apiKey", &self.api_key);
        Ok(url.into())
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, UpstreamError> {
        parse(self.fetcher.get(url).await?)
    }

    async fn search(&self, query: &str) -> Result<Location, UpstreamError> {
        let url = self.url("location/search", &[("query", query), ("language", "en-US")])?;
        let response: LocationResponse = self.get(&url).await?;
        first_location(&response.location)
            .ok_or_else(|| UpstreamError::Malformed(format!("no match for '{query}'")))
    }

    /// Resolve coordinates to a named location, or a placeholder for them.
    async fn resolve_point(&self, lat: f64, lon: f64) -> Location {
        match self.search(&format!("{lat},{lon}")).await {
            Ok(location) => location,
            Err(e) => {
                warn!("Location lookup for {},{} failed: {}", lat, lon, e);
                Location {
                    lat,
                    lon,
                    ..Location::fallback(format!("NA_{lat}_{lon}"))
                }
            }
        }
    }

    async fn nearby(&self, primary: &Location) -> Vec<Location> {
        let geocode = geocode(primary);
        let near = match self.url(
            "location/near",
            &[("geocode", geocode.as_str()), ("product", "observation")],
        ) {
            Ok(url) => self.get::<LocationResponse>(&url).await,
            Err(e) => Err(e),
        };
        let columns = match near {
            Ok(response) => response.location,
            Err(e) => {
                warn!("Nearby locations unavailable: {}", e);
                return Vec::new();
            }
        };

        // The first entry is the primary location itself.
        let points: Vec<(f64, f64)> = columns
            .latitude
            .iter()
            .zip(&columns.longitude)
            .skip(1)
            .take(NEARBY_LIMIT)
            .map(|(lat, lon)| (*lat, *lon))
            .collect();

        let mut nearby = Vec::with_capacity(points.len());
        for (lat, lon) in points {
            nearby.push(self.resolve_point(lat, lon).await);
        }
        nearby
    }

    async fn daily(&self, location: &Location, language: Language) -> Result<DailyResponse, UpstreamError> {
        let geocode = geocode(location);
        let url = self.url(
            "wx/forecast/daily/7day",
            &[("geocode", geocode.as_str()), ("units", "e"), ("language", language.code())],
        )?;
        self.get(&url).await
    }

    async fn alert_detail(&self, detail_key: &str) -> Result<Option<Alert>, UpstreamError> {
        let url = self.url("alerts/detail", &[("alertId", detail_key), ("language", "en-US")])?;
        let response: AlertDetailResponse = parse(self.fetcher.get_uncached(&url).await?)?;
        Ok(alert_from(response.alert_detail))
    }
}

#[async_trait]
impl WeatherProvider for TwcProvider {
    async fn locations(&self) -> Result<LocationSet, UpstreamError> {
        self.fetcher.cleanup_cache();

        let primary = match &self.origin {
            LocationOrigin::Query(query) => self.search(query).await?,
            LocationOrigin::Coordinates(lat, lon) => self.resolve_point(*lat, *lon).await,
            LocationOrigin::Geolocate => {
                let (lat, lon) = location::current_location(&self.client)
                    .await
                    .ok_or_else(|| UpstreamError::Unavailable("geolocation failed".to_string()))?;
                self.resolve_point(lat, lon).await
            }
        };
        debug!("Primary location: {}, {} ({})", primary.city, primary.state, primary.loc_id);

        let nearby = self.nearby(&primary).await;
        Ok(LocationSet::new(primary, nearby))
    }

    async fn observation(
        &self,
        location: &Location,
        language: Language,
    ) -> Result<Observation, UpstreamError> {
        let geocode = geocode(location);
        let url = self.url(
            "wx/observations/current",
            &[("geocode", geocode.as_str()), ("units", "e"), ("language", language.code())],
        )?;
        let response: ObservationResponse = self.get(&url).await?;
        Ok(Observation {
            temperature: response.temperature,
            relative_humidity: response.relative_humidity,
            pressure_altimeter: response.pressure_altimeter,
            wind_speed: response.wind_speed,
            wind_direction_cardinal: response.wind_direction_cardinal,
            wind_gust: response.wind_gust,
            phrase: response.wx_phrase_medium,
            icon_code: response.icon_code,
        })
    }

    async fn forecast(
        &self,
        location: &Location,
        language: Language,
    ) -> Result<Forecast, UpstreamError> {
        Ok(forecast_from(&self.daily(location, language).await?, language))
    }

    async fn almanac(
        &self,
        location: &Location,
        language: Language,
    ) -> Result<Almanac, UpstreamError> {
        let daily = self.daily(location, language).await?;
        let moon_phases = match lunar::next_phases(&self.fetcher, Local::now().date_naive(), language).await {
            Ok(phases) => phases,
            Err(e) => {
                warn!("Moon phases unavailable: {}", e);
                Vec::new()
            }
        };
        Ok(Almanac {
            days: almanac_days(&daily),
            moon_phases,
        })
    }

    async fn alerts(&self, location: &Location) -> Result<Vec<Alert>, UpstreamError> {
        let geocode = geocode(location);
        let url = self.url(
            "alerts/headlines",
            &[("geocode", geocode.as_str()), ("language", "en-US")],
        )?;
        // No active alerts comes back as an empty body.
        let body = self.fetcher.get_uncached(&url).await?;
        if body.is_null() {
            return Ok(Vec::new());
        }
        let headlines: HeadlinesResponse = parse(body)?;

        let mut alerts = Vec::with_capacity(headlines.alerts.len());
        for headline in headlines.alerts {
            match self.alert_detail(&headline.detail_key).await {
                Ok(Some(alert)) => alerts.push(alert),
                Ok(None) => warn!("Alert {} has no usable expiry", headline.detail_key),
                Err(e) => warn!("Alert detail {} unavailable: {}", headline.detail_key, e),
            }
        }
        Ok(alerts)
    }
}

fn parse<T: DeserializeOwned>(body: Value) -> Result<T, UpstreamError> {
    serde_json::from_value(body).map_err(|e| UpstreamError::Malformed(e.to_string()))
}

fn geocode(location: &Location) -> String {
    format!("{},{}", location.lat, location.lon)
}

fn first_location(columns: &LocationColumns) -> Option<Location> {
    let lat = *columns.latitude.first()?;
    let lon = *columns.longitude.first()?;
    let first = |column: &Vec<Option<String>>| column.first().cloned().flatten();

    Some(Location {
        loc_id: first(&columns.loc_id).unwrap_or_else(|| format!("NA_{lat}_{lon}")),
        lat,
        lon,
        city: first(&columns.display_name)
            .unwrap_or_else(|| Language::English.not_available().to_string()),
        state: first(&columns.admin_district)
            .or_else(|| first(&columns.country))
            .unwrap_or_default(),
        timezone: first(&columns.iana_time_zone).unwrap_or_else(|| "America/New_York".to_string()),
    })
}

fn forecast_from(daily: &DailyResponse, language: Language) -> Forecast {
    let Some(daypart) = daily.daypart.first() else {
        return Forecast::default();
    };
    let at = |column: &Vec<Option<String>>, index: usize| column.get(index).cloned().flatten();

    // Late in the day the first daypart is null.
    let start = daypart
        .daypart_name
        .iter()
        .position(Option::is_some)
        .unwrap_or(0);

    let periods = (start..start + Forecast::PERIODS)
        .filter_map(|index| {
            Some(Period {
                name: Some(at(&daypart.daypart_name, index)?),
                narrative: at(&daypart.narrative, index),
            })
        })
        .collect();

    let days = (0..Forecast::DAYS)
        .map(|day| {
            let mut index = start + day * 2;
            while index < daypart.daypart_name.len()
                && !is_daytime(at(&daypart.daypart_name, index).as_deref(), language)
            {
                index += 1;
            }
            let phrases = match language {
                Language::English => &daypart.wx_phrase_short,
                Language::Spanish => &daypart.wx_phrase_long,
            };
            DayForecast {
                name: daily
                    .day_of_week
                    .get(day + 1)
                    .and_then(|name| short_day_name(name, language)),
                high: daily.temperature_max.get(day + 1).copied().flatten(),
                low: daily.temperature_min.get(day + 1).copied().flatten(),
                icon_code: daypart.icon_code.get(index).copied().flatten(),
                phrase: at(phrases, index).map(|phrase| phrase.to_uppercase()),
            }
        })
        .collect();

    Forecast { periods, days }
}

/// Whether a daypart name is a daytime period of a future day.
fn is_daytime(name: Option<&str>, language: Language) -> bool {
    let Some(name) = name else {
        return false;
    };
    let name = name.to_lowercase();
    let excluded: &[&str] = match language {
        Language::English => &["today", "night", "tonight", "overnight"],
        Language::Spanish => &["hoy", "noche"],
    };
    !excluded.iter().any(|word| name.contains(word))
}

fn short_day_name(day: &str, language: Language) -> Option<String> {
    let short = match (language, day) {
        (Language::English, "Sunday") => "SUN",
        (Language::English, "Monday") => "MON",
        (Language::English, "Tuesday") => "TUE",
        (Language::English, "Wednesday") => "WED",
        (Language::English, "Thursday") => "THU",
        (Language::English, "Friday") => "FRI",
        (Language::English, "Saturday") => "SAT",
        (Language::Spanish, "Domingo") => "DOM",
        (Language::Spanish, "Lunes") => "LUN",
        (Language::Spanish, "Martes") => "MAR",
        (Language::Spanish, "Miércoles") => "MIERC",
        (Language::Spanish, "Jueves") => "JUE",
        (Language::Spanish, "Viernes") => "VIE",
        (Language::Spanish, "Sábado") => "SAB",
        _ => return None,
    };
    Some(short.to_string())
}

fn almanac_days(daily: &DailyResponse) -> Vec<AlmanacDay> {
    (0..Almanac::DAYS)
        .map(|day| AlmanacDay {
            day_of_week: daily
                .day_of_week
                .get(day)
                .map(|name| name.chars().take(3).collect::<String>().to_uppercase()),
            sunrise: daily
                .sunrise_time_local
                .get(day)
                .and_then(|time| clock_time(time.as_deref()?)),
            sunset: daily
                .sunset_time_local
                .get(day)
                .and_then(|time| clock_time(time.as_deref()?)),
        })
        .collect()
}

/// "2025-03-14T07:12:31-0400" as "7:12 am".
fn clock_time(local: &str) -> Option<String> {
    let time = DateTime::parse_from_str(local, "%Y-%m-%dT%H:%M:%S%z").ok()?;
    Some(time.format("%-I:%M %P").to_string())
}

fn alert_from(detail: AlertDetail) -> Option<Alert> {
    let expires_at = DateTime::<Utc>::from_timestamp(detail.expire_time_utc, 0)?;
    let message_type = if detail.message_type.eq_ignore_ascii_case("update") {
        MessageType::Update
    } else {
        MessageType::New
    };
    Some(Alert {
        severity: Severity::from_significance(&detail.significance, &detail.event_description),
        phenomena: detail.phenomena,
        summary: format!("{}.", in_effect_until(&detail.headline_text)),
        headline: detail.headline_text,
        event_description: detail.event_description,
        message_type,
        source: detail.source,
        expires_at,
    })
}

/// "Flood Warning until 5 PM" as "Flood Warning in effect until 5 PM".
fn in_effect_until(headline: &str) -> String {
    let lower = headline.to_ascii_lowercase();
    let mut out = String::with_capacity(headline.len() + 16);
    let mut rest = 0;
    for (at, _) in lower.match_indices("until") {
        out.push_str(&headline[rest..at]);
        out.push_str("in effect ");
        out.push_str(&headline[at..at + "until".len()]);
        rest = at + "until".len();
    }
    out.push_str(&headline[rest..]);
    out
}
