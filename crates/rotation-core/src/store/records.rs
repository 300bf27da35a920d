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

//! Weather records held by the data store.
//!
//! Every value an upstream may omit is an `Option`; the catalog renders
//! `None` as a placeholder literal so slide layouts never lose a field.

use std::fmt;

use chrono::{DateTime, Utc};

/// Weather icon shown when the upstream has no icon code.
pub const FALLBACK_ICON: u32 = 44;

/// Current conditions at one location.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Observation {
    pub temperature: Option<i32>,
    pub relative_humidity: Option<i32>,
    pub pressure_altimeter: Option<f64>,
    pub wind_speed: Option<i32>,
    pub wind_direction_cardinal: Option<String>,
    pub wind_gust: Option<i32>,
    pub phrase: Option<String>,
    pub icon_code: Option<u32>,
}

impl Observation {
    /// Record substituted when the upstream is unavailable.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            icon_code: Some(FALLBACK_ICON),
            ..Self::default()
        }
    }
}

/// A named forecast period ("Tonight", "Tomorrow").
#[derive(Debug, Clone, PartialEq)]
pub struct Period {
    pub name: Option<String>,
    pub narrative: Option<String>,
}

/// One day of the extended forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct DayForecast {
    /// Short day name ("MON", "LUN").
    pub name: Option<String>,
    pub high: Option<i32>,
    pub low: Option<i32>,
    pub icon_code: Option<u32>,
    pub phrase: Option<String>,
}

/// 36-hour periods and extended daily forecast for one location.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forecast {
    pub periods: Vec<Period>,
    pub days: Vec<DayForecast>,
}

impl Forecast {
    pub const PERIODS: usize = 3;
    pub const DAYS: usize = 7;

    /// Record substituted when the upstream is unavailable.
    #[must_use]
    pub fn fallback() -> Self {
        Self::default()
    }
}

/// Sunrise and sunset for one day.
#[derive(Debug, Clone, PartialEq)]
pub struct AlmanacDay {
    pub day_of_week: Option<String>,
    pub sunrise: Option<String>,
    pub sunset: Option<String>,
}

/// An upcoming principal moon phase.
#[derive(Debug, Clone, PartialEq)]
pub struct MoonPhase {
    pub name: String,
    pub date: String,
}

/// Almanac data for one location: two days of sun times and the next moon phases.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Almanac {
    pub days: Vec<AlmanacDay>,
    pub moon_phases: Vec<MoonPhase>,
}

impl Almanac {
    pub const DAYS: usize = 2;
    pub const MOON_PHASES: usize = 4;

    /// Record substituted when the upstream is unavailable.
    #[must_use]
    pub fn fallback() -> Self {
        Self::default()
    }
}

/// Alert significance, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Severity {
    #[default]
    None,
    Advisory,
    Watch,
    Warning,
}

impl Severity {
    /// Normalise a provider significance code.
    ///
    /// Statements (`S`) and special marine warnings are shown as advisories.
    #[must_use]
    pub fn from_significance(code: &str, event_description: &str) -> Self {
        if event_description == "Special Marine Warning" {
            return Severity::Advisory;
        }
        match code {
            "W" => Severity::Warning,
            "A" => Severity::Watch,
            "Y" | "S" => Severity::Advisory,
            _ => Severity::None,
        }
    }

    /// Single-letter code used for alert artwork.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Severity::Warning => "W",
            Severity::Watch => "A",
            Severity::Advisory => "Y",
            Severity::None => "N",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Warning => "Warning",
            Severity::Watch => "Watch",
            Severity::Advisory => "Advisory",
            Severity::None => "None",
        };
        f.write_str(name)
    }
}

/// Whether an alert is new or an update to an earlier issuance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MessageType {
    #[default]
    New,
    Update,
}

/// An active weather alert for one location.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub severity: Severity,
    pub phenomena: String,
    pub event_description: String,
    pub message_type: MessageType,
    pub headline: String,
    /// One-line summary shown on the alert slide.
    pub summary: String,
    pub source: String,
    pub expires_at: DateTime<Utc>,
}

impl Alert {
    /// Key identifying the alert by content rather than by instance.
    #[must_use]
    pub fn content_key(&self) -> String {
        format!(
            "{}|{}|{}|{:?}|{}|{}",
            self.severity.code(),
            self.phenomena,
            self.event_description,
            self.message_type,
            self.summary,
            self.expires_at.timestamp()
        )
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Stable sort by descending severity; provider order breaks ties.
pub fn sort_by_severity(alerts: &mut [Alert]) {
    alerts.sort_by(|a, b| b.severity.cmp(&a.severity));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn alert(code: &str, summary: &str) -> Alert {
        Alert {
            severity: Severity::from_significance(code, ""),
            phenomena: "TO".to_string(),
            event_description: summary.to_string(),
            message_type: MessageType::New,
            headline: summary.to_string(),
            summary: summary.to_string(),
            source: "National Weather Service".to_string(),
            expires_at: Utc::now() + Duration::seconds(600),
        }
    }

    #[test]
    fn test_severity_order() {
        assert!(Severity::Warning > Severity::Watch);
        assert!(Severity::Watch > Severity::Advisory);
        assert!(Severity::Advisory > Severity::None);
    }

    #[test]
    fn test_significance_normalisation() {
        assert_eq!(Severity::from_significance("S", "Special Weather Statement"), Severity::Advisory);
        assert_eq!(Severity::from_significance("W", "Special Marine Warning"), Severity::Advisory);
        assert_eq!(Severity::from_significance("Q", ""), Severity::None);
    }

    #[test]
    fn test_sort_is_stable_within_tier() {
        let mut alerts = vec![
            alert("Y", "first advisory"),
            alert("W", "first warning"),
            alert("Y", "second advisory"),
            alert("W", "second warning"),
        ];
        sort_by_severity(&mut alerts);
        let order: Vec<_> = alerts.iter().map(|a| a.summary.as_str()).collect();
        assert_eq!(
            order,
            ["first warning", "second warning", "first advisory", "second advisory"]
        );
    }

    #[test]
    fn test_content_key_ignores_instance() {
        let a = alert("W", "Tornado Warning");
        let b = a.clone();
        assert_eq!(a.content_key(), b.content_key());

        let mut c = a.clone();
        c.message_type = MessageType::Update;
        assert_ne!(a.content_key(), c.content_key());
    }
}
