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

//! Resolution of field data bindings into display text.

use crate::model::{DataBinding, Language, Location, Metric};
use crate::store::Snapshot;

/// Placeholder for a missing numeric value.
pub const MISSING_NUMBER: &str = "--";

/// Placeholder for a missing almanac value.
pub const MISSING_ALMANAC: &str = "N/A";

/// Display text for a bound field against `snapshot`.
///
/// Missing upstream values render as placeholders; the result is never empty.
#[must_use]
pub fn resolve(binding: &DataBinding, snapshot: &Snapshot) -> String {
    let location = snapshot.locations.resolve(binding.location);
    let language = binding.language;
    let loc_id = location.loc_id.as_str();

    match binding.metric {
        Metric::City => city(&location, language),
        Metric::Temperature => number(snapshot.observation(loc_id, language).temperature),
        Metric::Humidity => match snapshot.observation(loc_id, language).relative_humidity {
            Some(h) => format!("{h}%"),
            None => MISSING_NUMBER.to_string(),
        },
        Metric::Pressure => match snapshot.observation(loc_id, language).pressure_altimeter {
            Some(p) => format!("{p:.2}"),
            None => MISSING_NUMBER.to_string(),
        },
        Metric::Wind => {
            let obs = snapshot.observation(loc_id, language);
            match (&obs.wind_direction_cardinal, obs.wind_speed) {
                (_, Some(0)) => calm(language).to_string(),
                (Some(card), Some(speed)) => format!("{card} {speed}"),
                (None, Some(speed)) => speed.to_string(),
                (_, None) => MISSING_NUMBER.to_string(),
            }
        }
        Metric::WindGust => match snapshot.observation(loc_id, language).wind_gust {
            Some(g) if g > 0 => format!("{g} mph"),
            _ => no_gusts(language).to_string(),
        },
        Metric::Condition => text(snapshot.observation(loc_id, language).phrase.clone(), language),
        Metric::PeriodName(i) => {
            let forecast = snapshot.forecast(loc_id, language);
            text(forecast.periods.get(i).and_then(|p| p.name.clone()), language)
        }
        Metric::Narrative(i) => {
            let forecast = snapshot.forecast(loc_id, language);
            text(forecast.periods.get(i).and_then(|p| p.narrative.clone()), language)
        }
        Metric::DayName(i) => {
            let forecast = snapshot.forecast(loc_id, language);
            forecast
                .days
                .get(i)
                .and_then(|d| d.name.clone())
                .unwrap_or_else(|| MISSING_NUMBER.to_string())
        }
        Metric::High(i) => number(snapshot.forecast(loc_id, language).days.get(i).and_then(|d| d.high)),
        Metric::Low(i) => number(snapshot.forecast(loc_id, language).days.get(i).and_then(|d| d.low)),
        Metric::Phrase(i) => {
            let forecast = snapshot.forecast(loc_id, language);
            text(forecast.days.get(i).and_then(|d| d.phrase.clone()), language)
        }
        Metric::DayOfWeek(i) => almanac_text(
            snapshot
                .almanac(loc_id, language)
                .days
                .get(i)
                .and_then(|d| d.day_of_week.clone()),
        ),
        Metric::Sunrise(i) => almanac_text(
            snapshot
                .almanac(loc_id, language)
                .days
                .get(i)
                .and_then(|d| d.sunrise.clone()),
        ),
        Metric::Sunset(i) => almanac_text(
            snapshot
                .almanac(loc_id, language)
                .days
                .get(i)
                .and_then(|d| d.sunset.clone()),
        ),
        Metric::MoonPhase(i) => almanac_text(
            snapshot
                .almanac(loc_id, language)
                .moon_phases
                .get(i)
                .map(|m| m.name.clone()),
        ),
        Metric::MoonDate(i) => almanac_text(
            snapshot
                .almanac(loc_id, language)
                .moon_phases
                .get(i)
                .map(|m| m.date.clone()),
        ),
    }
}

/// Weather icon code for the location a binding points at.
///
/// Day-indexed metrics use the forecast day's icon, everything else the
/// current observation.
#[must_use]
pub fn icon_code(binding: &DataBinding, snapshot: &Snapshot) -> u32 {
    let location = snapshot.locations.resolve(binding.location);
    let icon = match binding.metric {
        Metric::Phrase(i) => snapshot
            .forecast(&location.loc_id, binding.language)
            .days
            .get(i)
            .and_then(|d| d.icon_code),
        _ => snapshot.observation(&location.loc_id, binding.language).icon_code,
    };
    icon.unwrap_or(crate::store::records::FALLBACK_ICON)
}

fn city(location: &Location, language: Language) -> String {
    if location.loc_id.starts_with(Location::DEFAULT_ID) || location.city.is_empty() {
        language.not_available().to_string()
    } else {
        location.city.clone()
    }
}

fn number(value: Option<i32>) -> String {
    value.map_or_else(|| MISSING_NUMBER.to_string(), |v| v.to_string())
}

fn text(value: Option<String>, language: Language) -> String {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => language.not_available().to_string(),
    }
}

fn almanac_text(value: Option<String>) -> String {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => MISSING_ALMANAC.to_string(),
    }
}

fn calm(language: Language) -> &'static str {
    match language {
        Language::English => "Calm",
        Language::Spanish => "Calma",
    }
}

fn no_gusts(language: Language) -> &'static str {
    match language {
        Language::English => "None",
        Language::Spanish => "Ninguna",
    }
}
