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

//! Upcoming moon phases from the icalendar37 lunar calendar.

use chrono::{Datelike, NaiveDate};
use rotation_core::store::MoonPhase;
use rotation_core::{Language, UpstreamError};
use serde_json::Value;

use super::CachedFetcher;

const LUNAR_URL: &str = "https://www.icalendar37.net/lunar/api/";

/// Phases shown on the almanac slide.
const PHASES_SHOWN: usize = 4;

/// The next principal moon phases on or after the start of `today`'s month.
///
/// Reads the current month and, if it holds fewer than four principal phases,
/// the following one.
pub async fn next_phases(
    fetcher: &CachedFetcher,
    today: NaiveDate,
    language: Language,
) -> Result<Vec<MoonPhase>, UpstreamError> {
    let (year, month) = (today.year(), today.month());
    let mut phases = principal_phases(&fetcher.get(&url(year, month, language)).await?, year, month);

    if phases.len() < PHASES_SHOWN {
        let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
        let next = fetcher.get(&url(next_year, next_month, language)).await?;
        phases.extend(principal_phases(&next, next_year, next_month));
    }

    phases.truncate(PHASES_SHOWN);
    Ok(phases)
}

fn url(year: i32, month: u32, language: Language) -> String {
    let lang = match language {
        Language::English => "en",
        Language::Spanish => "es",
    };
    format!("{LUNAR_URL}?lang={lang}&month={month}&year={year}")
}

/// Principal phases of one month in day order.
///
/// Days are keyed by number in the response; a truthy `isPhaseLimit` marks a
/// principal phase.
fn principal_phases(month_data: &Value, year: i32, month: u32) -> Vec<MoonPhase> {
    let Some(days) = month_data.get("phase").and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut limits: Vec<(u32, &Value)> = days
        .iter()
        .filter_map(|(day, info)| Some((day.parse().ok()?, info)))
        .filter(|(_, info)| is_truthy(info.get("isPhaseLimit")))
        .collect();
    limits.sort_by_key(|(day, _)| *day);

    limits
        .into_iter()
        .filter_map(|(day, info)| {
            let date = NaiveDate::from_ymd_opt(year, month, day)?;
            let name = info
                .get("phaseName")
                .and_then(Value::as_str)?
                .split_whitespace()
                .next()?;
            Some(MoonPhase {
                name: name.to_string(),
                date: date.format("%b %-d").to_string(),
            })
        })
        .collect()
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        _ => false,
    }
}
