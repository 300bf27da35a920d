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

//! Provider seam between the data store and a concrete weather API client.

use async_trait::async_trait;

use crate::error::UpstreamError;
use crate::model::{Language, Location, LocationSet};
use crate::store::records::{Alert, Almanac, Forecast, Observation};

/// Upstream source of locations and weather data.
///
/// Implementations may fail or stall at any time; the data store bounds every
/// call with a timeout and substitutes fallback records on failure.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Resolve the primary location and its nearby locations.
    async fn locations(&self) -> Result<LocationSet, UpstreamError>;

    /// Current conditions at `location`.
    async fn observation(
        &self,
        location: &Location,
        language: Language,
    ) -> Result<Observation, UpstreamError>;

    /// 36-hour and extended forecast for `location`.
    async fn forecast(
        &self,
        location: &Location,
        language: Language,
    ) -> Result<Forecast, UpstreamError>;

    /// Sun times and moon phases for `location`.
    async fn almanac(
        &self,
        location: &Location,
        language: Language,
    ) -> Result<Almanac, UpstreamError>;

    /// Active alerts for `location`, in provider order.
    async fn alerts(&self, location: &Location) -> Result<Vec<Alert>, UpstreamError>;
}
