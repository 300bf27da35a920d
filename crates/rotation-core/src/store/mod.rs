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

//! Weather data store.
//!
//! The store owns every weather record. Readers take an immutable [`Snapshot`]
//! that is swapped in whole once a refresh has completed, so a reader never
//! observes a half-populated refresh. Upstream failures are absorbed here:
//! every location and language in the snapshot always has a record, using
//! fallback placeholders where the upstream failed.

pub mod provider;
pub mod records;
mod static_provider;

pub use provider::WeatherProvider;
pub use records::{
    Alert, Almanac, AlmanacDay, DayForecast, Forecast, MessageType, MoonPhase, Observation,
    Period, Severity,
};
pub use static_provider::StaticProvider;

use std::borrow::Cow;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::error::UpstreamError;
use crate::model::{Language, Location, LocationSet};

/// Maximum alerts retained per location.
pub const MAX_ALERTS_PER_LOCATION: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RecordKey {
    loc_id: String,
    language: Language,
}

impl RecordKey {
    fn new(loc_id: &str, language: Language) -> Self {
        Self {
            loc_id: loc_id.to_string(),
            language,
        }
    }
}

/// Immutable view of all weather data at one point in time.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub locations: LocationSet,
    /// Incremented by every completed refresh; zero before the first one.
    pub generation: u64,
    pub refreshed_at: Option<DateTime<Utc>>,
    observations: HashMap<RecordKey, Observation>,
    forecasts: HashMap<RecordKey, Forecast>,
    almanacs: HashMap<RecordKey, Almanac>,
    alerts: HashMap<String, Vec<Alert>>,
}

impl Snapshot {
    /// An empty snapshot for `locations`; all lookups return fallback records.
    #[must_use]
    pub fn new(locations: LocationSet) -> Self {
        Self {
            locations,
            generation: 0,
            refreshed_at: None,
            observations: HashMap::new(),
            forecasts: HashMap::new(),
            almanacs: HashMap::new(),
            alerts: HashMap::new(),
        }
    }

    #[must_use]
    pub fn observation(&self, loc_id: &str, language: Language) -> Cow<'_, Observation> {
        self.observations
            .get(&RecordKey::new(loc_id, language))
            .map_or_else(|| Cow::Owned(Observation::fallback()), Cow::Borrowed)
    }

    #[must_use]
    pub fn forecast(&self, loc_id: &str, language: Language) -> Cow<'_, Forecast> {
        self.forecasts
            .get(&RecordKey::new(loc_id, language))
            .map_or_else(|| Cow::Owned(Forecast::fallback()), Cow::Borrowed)
    }

    #[must_use]
    pub fn almanac(&self, loc_id: &str, language: Language) -> Cow<'_, Almanac> {
        self.almanacs
            .get(&RecordKey::new(loc_id, language))
            .map_or_else(|| Cow::Owned(Almanac::fallback()), Cow::Borrowed)
    }

    /// Alerts for a location in provider order; empty when there are none.
    #[must_use]
    pub fn alerts(&self, loc_id: &str) -> &[Alert] {
        self.alerts.get(loc_id).map_or(&[], Vec::as_slice)
    }

    /// Alerts for the primary location.
    #[must_use]
    pub fn primary_alerts(&self) -> &[Alert] {
        self.alerts(&self.locations.primary.loc_id)
    }

    pub fn insert_observation(&mut self, loc_id: &str, language: Language, record: Observation) {
        self.observations.insert(RecordKey::new(loc_id, language), record);
    }

    pub fn insert_forecast(&mut self, loc_id: &str, language: Language, record: Forecast) {
        self.forecasts.insert(RecordKey::new(loc_id, language), record);
    }

    pub fn insert_almanac(&mut self, loc_id: &str, language: Language, record: Almanac) {
        self.almanacs.insert(RecordKey::new(loc_id, language), record);
    }

    /// Replace the alerts of a location, keeping the first
    /// [`MAX_ALERTS_PER_LOCATION`] entries.
    pub fn set_alerts(&mut self, loc_id: &str, mut alerts: Vec<Alert>) {
        alerts.truncate(MAX_ALERTS_PER_LOCATION);
        self.alerts.insert(loc_id.to_string(), alerts);
    }
}

/// Data store tuning.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Upper bound on any single upstream call.
    pub fetch_timeout: Duration,
    /// Languages to keep records for.
    pub languages: Vec<Language>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(10),
            languages: Language::ALL.to_vec(),
        }
    }
}

enum Fetched {
    Observation(String, Language, Result<Observation, UpstreamError>),
    Forecast(String, Language, Result<Forecast, UpstreamError>),
    Almanac(String, Language, Result<Almanac, UpstreamError>),
    Alerts(String, Result<Vec<Alert>, UpstreamError>),
}

/// Owner of all weather data.
pub struct DataStore {
    provider: Arc<dyn WeatherProvider>,
    config: StoreConfig,
    snapshot_tx: watch::Sender<Arc<Snapshot>>,
    locations: Mutex<Option<LocationSet>>,
    refresh_lock: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for DataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataStore")
            .field("config", &self.config)
            .field("generation", &self.snapshot_tx.borrow().generation)
            .finish_non_exhaustive()
    }
}

impl DataStore {
    #[must_use]
    pub fn new(provider: Arc<dyn WeatherProvider>, config: StoreConfig) -> Self {
        let (snapshot_tx, _) = watch::channel(Arc::new(Snapshot::new(LocationSet::fallback())));
        Self {
            provider,
            config,
            snapshot_tx,
            locations: Mutex::new(None),
            refresh_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// The most recently completed snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot_tx.borrow().clone()
    }

    /// Receiver notified every time a refresh completes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshot_tx.subscribe()
    }

    /// Resolves once the first refresh has completed, fallback data included.
    pub async fn is_ready(&self) {
        let mut rx = self.snapshot_tx.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|snapshot| snapshot.generation > 0).await;
    }

    /// Replace the location set wholesale. Takes effect on the next refresh.
    pub fn set_locations(&self, locations: LocationSet) {
        info!(
            "Locations reconfigured: primary {} ({}), {} nearby",
            locations.primary.city,
            locations.primary.loc_id,
            locations.nearby.len()
        );
        if let Ok(mut current) = self.locations.lock() {
            *current = Some(locations);
        }
    }

    /// Fetch all data and publish a new snapshot. Never fails.
    ///
    /// Concurrent calls are serialised; each publishes a complete snapshot.
    pub async fn refresh(&self) {
        let _guard = self.refresh_lock.lock().await;
        let started = std::time::Instant::now();

        let locations = self.resolve_locations().await;
        let mut snapshot = Snapshot::new(locations.clone());
        let mut tasks = JoinSet::new();
        let timeout = self.config.fetch_timeout;

        for location in locations.iter() {
            for &language in &self.config.languages {
                let provider = Arc::clone(&self.provider);
                let loc = location.clone();
                tasks.spawn(async move {
                    let result = bounded(timeout, provider.observation(&loc, language)).await;
                    Fetched::Observation(loc.loc_id, language, result)
                });

                let provider = Arc::clone(&self.provider);
                let loc = location.clone();
                tasks.spawn(async move {
                    let result = bounded(timeout, provider.forecast(&loc, language)).await;
                    Fetched::Forecast(loc.loc_id, language, result)
                });

                let provider = Arc::clone(&self.provider);
                let loc = location.clone();
                tasks.spawn(async move {
                    let result = bounded(timeout, provider.almanac(&loc, language)).await;
                    Fetched::Almanac(loc.loc_id, language, result)
                });
            }

            let provider = Arc::clone(&self.provider);
            let loc = location.clone();
            tasks.spawn(async move {
                let result = bounded(timeout, provider.alerts(&loc)).await;
                Fetched::Alerts(loc.loc_id, result)
            });
        }

        let mut failures = 0usize;
        while let Some(joined) = tasks.join_next().await {
            let fetched = match joined {
                Ok(fetched) => fetched,
                Err(e) => {
                    warn!("Fetch task failed: {}", e);
                    failures += 1;
                    continue;
                }
            };
            match fetched {
                Fetched::Observation(loc_id, language, result) => {
                    let record = recover(result, &mut failures, &loc_id, "observation")
                        .unwrap_or_else(Observation::fallback);
                    snapshot.insert_observation(&loc_id, language, record);
                }
                Fetched::Forecast(loc_id, language, result) => {
                    let record = recover(result, &mut failures, &loc_id, "forecast")
                        .unwrap_or_else(Forecast::fallback);
                    snapshot.insert_forecast(&loc_id, language, record);
                }
                Fetched::Almanac(loc_id, language, result) => {
                    let record = recover(result, &mut failures, &loc_id, "almanac")
                        .unwrap_or_else(Almanac::fallback);
                    snapshot.insert_almanac(&loc_id, language, record);
                }
                Fetched::Alerts(loc_id, result) => {
                    let alerts = recover(result, &mut failures, &loc_id, "alerts").unwrap_or_default();
                    snapshot.set_alerts(&loc_id, alerts);
                }
            }
        }

        self.publish(snapshot);
        info!(
            "Data refresh complete in {} ms ({} upstream failures)",
            started.elapsed().as_millis(),
            failures
        );
    }

    async fn resolve_locations(&self) -> LocationSet {
        if let Some(locations) = self.locations.lock().ok().and_then(|l| l.clone()) {
            return locations;
        }

        match bounded(self.config.fetch_timeout, self.provider.locations()).await {
            Ok(locations) => {
                info!(
                    "Resolved primary location {}, {} ({} nearby)",
                    locations.primary.city,
                    locations.primary.state,
                    locations.nearby.len()
                );
                if let Ok(mut current) = self.locations.lock() {
                    *current = Some(locations.clone());
                }
                locations
            }
            Err(e) => {
                warn!("Location lookup failed, using placeholder location: {}", e);
                LocationSet::fallback()
            }
        }
    }

    fn publish(&self, mut snapshot: Snapshot) {
        snapshot.generation = self.snapshot_tx.borrow().generation + 1;
        snapshot.refreshed_at = Some(Utc::now());
        debug!("Publishing snapshot generation {}", snapshot.generation);
        self.snapshot_tx.send_replace(Arc::new(snapshot));
    }
}

async fn bounded<T>(
    timeout: Duration,
    fut: impl Future<Output = Result<T, UpstreamError>>,
) -> Result<T, UpstreamError> {
    tokio::time::timeout(timeout, fut)
        .await
        .unwrap_or(Err(UpstreamError::Timeout(timeout.as_secs())))
}

fn recover<T>(
    result: Result<T, UpstreamError>,
    failures: &mut usize,
    loc_id: &str,
    what: &str,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Using fallback {} for {}: {}", what, loc_id, e);
            *failures += 1;
            None
        }
    }
}
