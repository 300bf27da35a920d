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

//! In-memory provider.
//!
//! Serves records that were set on it ahead of time. Used for offline
//! operation and for exercising the stack without network access.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::UpstreamError;
use crate::model::{Language, Location, LocationSet};
use crate::store::provider::WeatherProvider;
use crate::store::records::{Alert, Almanac, Forecast, Observation};

#[derive(Debug, Default)]
struct Records {
    observations: HashMap<String, Observation>,
    forecasts: HashMap<String, Forecast>,
    almanacs: HashMap<String, Almanac>,
    alerts: HashMap<String, Vec<Alert>>,
    failing: bool,
    delay: Option<Duration>,
}

/// Provider backed by records held in memory.
///
/// Records are keyed by location id and served for every language.
#[derive(Debug)]
pub struct StaticProvider {
    locations: LocationSet,
    records: Mutex<Records>,
    location_lookups: AtomicUsize,
    alert_fetches: AtomicUsize,
}

impl StaticProvider {
    #[must_use]
    pub fn new(locations: LocationSet) -> Self {
        Self {
            locations,
            records: Mutex::new(Records::default()),
            location_lookups: AtomicUsize::new(0),
            alert_fetches: AtomicUsize::new(0),
        }
    }

    pub fn set_observation(&self, loc_id: &str, record: Observation) {
        self.with_records(|r| {
            r.observations.insert(loc_id.to_string(), record);
        });
    }

    pub fn set_forecast(&self, loc_id: &str, record: Forecast) {
        self.with_records(|r| {
            r.forecasts.insert(loc_id.to_string(), record);
        });
    }

    pub fn set_almanac(&self, loc_id: &str, record: Almanac) {
        self.with_records(|r| {
            r.almanacs.insert(loc_id.to_string(), record);
        });
    }

    /// Replace the active alerts of a location.
    pub fn set_alerts(&self, loc_id: &str, alerts: Vec<Alert>) {
        self.with_records(|r| {
            r.alerts.insert(loc_id.to_string(), alerts);
        });
    }

    /// Make every call fail with [`UpstreamError::Unavailable`].
    pub fn set_failing(&self, failing: bool) {
        self.with_records(|r| r.failing = failing);
    }

    /// Delay every call by `delay` before answering.
    pub fn set_delay(&self, delay: Duration) {
        self.with_records(|r| r.delay = Some(delay));
    }

    /// Number of location lookups served so far.
    #[must_use]
    pub fn location_lookups(&self) -> usize {
        self.location_lookups.load(Ordering::Relaxed)
    }

    /// Number of alert fetches served so far.
    #[must_use]
    pub fn alert_fetches(&self) -> usize {
        self.alert_fetches.load(Ordering::Relaxed)
    }

    fn with_records<R>(&self, f: impl FnOnce(&mut Records) -> R) -> Option<R> {
        self.records.lock().ok().map(|mut records| f(&mut records))
    }

    async fn answer<T>(&self, f: impl FnOnce(&Records) -> T) -> Result<T, UpstreamError> {
        let delay = self.with_records(|r| r.delay).flatten();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.with_records(|r| {
            if r.failing {
                Err(UpstreamError::Unavailable("static provider offline".to_string()))
            } else {
                Ok(f(r))
            }
        })
        .unwrap_or_else(|| Err(UpstreamError::Unavailable("record lock poisoned".to_string())))
    }
}

#[async_trait]
impl WeatherProvider for StaticProvider {
    async fn locations(&self) -> Result<LocationSet, UpstreamError> {
        self.location_lookups.fetch_add(1, Ordering::Relaxed);
        let locations = self.locations.clone();
        self.answer(move |_| locations).await
    }

    async fn observation(
        &self,
        location: &Location,
        _language: Language,
    ) -> Result<Observation, UpstreamError> {
        self.answer(|r| r.observations.get(&location.loc_id).cloned().unwrap_or_default())
            .await
    }

    async fn forecast(
        &self,
        location: &Location,
        _language: Language,
    ) -> Result<Forecast, UpstreamError> {
        self.answer(|r| r.forecasts.get(&location.loc_id).cloned().unwrap_or_default())
            .await
    }

    async fn almanac(
        &self,
        location: &Location,
        _language: Language,
    ) -> Result<Almanac, UpstreamError> {
        self.answer(|r| r.almanacs.get(&location.loc_id).cloned().unwrap_or_default())
            .await
    }

    async fn alerts(&self, location: &Location) -> Result<Vec<Alert>, UpstreamError> {
        self.alert_fetches.fetch_add(1, Ordering::Relaxed);
        self.answer(|r| r.alerts.get(&location.loc_id).cloned().unwrap_or_default())
            .await
    }
}
