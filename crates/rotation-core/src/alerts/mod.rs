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

//! Alert monitor.
//!
//! Watches the primary location's alerts and keeps the reserved alert slide
//! in step with them: inserted when an alert appears, updated when the top
//! alert changes, removed when alerts clear or the top alert expires. A new
//! top-tier warning sounds the warning cue once.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{info, warn};
use tokio_util::sync::CancellationToken;

use crate::display::AudioCue;
use crate::model::{AssetRef, FieldDescriptor, SlideDescriptor};
use crate::rotator::{RotationControl, ALERT_ID};
use crate::scheduler::PostRefreshHook;
use crate::store::records::sort_by_severity;
use crate::store::{Alert, DataStore, MessageType, Severity, Snapshot};

/// Alerts listed on the alert slide.
pub const ALERTS_SHOWN: usize = 3;

const ALERT_SLIDE_SECS: u32 = 10;

/// Outcome of one alert poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertDecision {
    /// No alerts for the primary location.
    Cleared,
    /// Top alert is the one already shown.
    Unchanged,
    /// Top alert has passed its expiration time.
    Expired,
    /// Alert slide inserted or replaced.
    Changed { warning: bool },
}

#[derive(Debug, Default)]
struct MonitorState {
    last_key: Option<String>,
    present: bool,
}

/// Keeps the reserved alert slide in step with the data store.
pub struct AlertMonitor {
    store: Arc<DataStore>,
    control: Arc<dyn RotationControl>,
    audio: Arc<dyn AudioCue>,
    state: Mutex<MonitorState>,
}

impl std::fmt::Debug for AlertMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertMonitor")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl AlertMonitor {
    #[must_use]
    pub fn new(
        store: Arc<DataStore>,
        control: Arc<dyn RotationControl>,
        audio: Arc<dyn AudioCue>,
    ) -> Self {
        Self {
            store,
            control,
            audio,
            state: Mutex::new(MonitorState::default()),
        }
    }

    /// Check the latest snapshot now.
    pub fn poll(&self) -> AlertDecision {
        self.evaluate(&self.store.snapshot(), Utc::now())
    }

    /// Decide what the alert slot should show for `snapshot` at `now`.
    pub fn evaluate(&self, snapshot: &Snapshot, now: DateTime<Utc>) -> AlertDecision {
        let Ok(mut state) = self.state.lock() else {
            warn!("Alert monitor state poisoned; skipping poll");
            return AlertDecision::Unchanged;
        };

        let mut alerts = snapshot.primary_alerts().to_vec();
        if alerts.is_empty() {
            if state.present {
                info!("Alerts cleared for {}", snapshot.locations.primary.city);
                self.control.remove_reserved();
            }
            *state = MonitorState::default();
            return AlertDecision::Cleared;
        }

        sort_by_severity(&mut alerts);
        let top = &alerts[0];

        if top.is_expired(now) {
            info!("Top alert expired: {}", top.event_description);
            self.control.remove_reserved();
            *state = MonitorState::default();
            return AlertDecision::Expired;
        }

        let key = top.content_key();
        if state.last_key.as_deref() == Some(key.as_str()) {
            return AlertDecision::Unchanged;
        }

        let shown = alerts.len().min(ALERTS_SHOWN);
        info!(
            "Alert slide now shows {} ({}), {} alert(s) listed",
            top.event_description, top.severity, shown
        );
        self.control.upsert_reserved(alert_slide(&alerts[..shown]));
        state.last_key = Some(key);
        state.present = true;

        let warning = top.severity == Severity::Warning;
        if warning {
            self.audio.play_warning();
        }
        AlertDecision::Changed { warning }
    }

    /// Poll every `period` until cancelled.
    pub async fn run(self: Arc<Self>, period: Duration, cancel_token: CancellationToken) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.poll();
                }
                () = cancel_token.cancelled() => {
                    info!("Alert monitor stopped");
                    return;
                }
            }
        }
    }
}

impl PostRefreshHook for AlertMonitor {
    fn after_refresh(&self, snapshot: &Snapshot) {
        self.evaluate(snapshot, Utc::now());
    }
}

/// Headline shown on the alert slide.
#[must_use]
pub fn alert_title(alert: &Alert) -> String {
    let title = alert.event_description.to_uppercase();
    if alert.severity == Severity::Warning && alert.message_type == MessageType::Update {
        format!("{title} UPDATE")
    } else {
        title
    }
}

/// The reserved slide describing `alerts`, most severe first.
#[must_use]
pub fn alert_slide(alerts: &[Alert]) -> SlideDescriptor {
    let severity = alerts.first().map_or(Severity::None, |a| a.severity);
    let mut slide = SlideDescriptor::new(
        ALERT_ID,
        AssetRef::new(format!("./images/Plus_Bulletin_{}.png", severity.code())),
        ALERT_SLIDE_SECS,
    );
    if let Some(top) = alerts.first() {
        slide.title = alert_title(top);
        slide
            .fields
            .push(FieldDescriptor::label("alertTitle", "alertTitle", &slide.title));
    }
    for (i, alert) in alerts.iter().take(ALERTS_SHOWN).enumerate() {
        let n = i + 1;
        slide.fields.push(FieldDescriptor::label(
            format!("alertSummary{n}"),
            format!("alertSummary alertSummary-{}", alert.severity.code()),
            &alert.summary,
        ));
    }
    slide
}
