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

//! Refresh scheduler.
//!
//! Data refreshes are expensive and reshuffle content, so they only begin
//! while the splash slide is on screen. A cadence timer marks a refresh as
//! pending; the splash slide's foreground hook wakes the scheduler, which
//! refreshes if one is pending and then always rebuilds the catalog and
//! reconciles the rotation so field text never goes stale.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info};
use tokio::sync::Notify;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::catalog::{Package, SlideCatalog};
use crate::error::CatalogError;
use crate::rotator::RotationControl;
use crate::store::{DataStore, Snapshot};

/// Work to run after every completed data refresh, in registration order.
pub trait PostRefreshHook: Send + Sync {
    fn after_refresh(&self, snapshot: &Snapshot);
}

/// Coordinates data refreshes with the rotation's safe point.
pub struct RefreshScheduler {
    store: Arc<DataStore>,
    catalog: SlideCatalog,
    packages: Vec<Package>,
    control: Arc<dyn RotationControl>,
    hooks: Vec<Arc<dyn PostRefreshHook>>,
    safe_point: Arc<Notify>,
    pending: AtomicBool,
    period: Duration,
}

impl std::fmt::Debug for RefreshScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshScheduler")
            .field("packages", &self.packages)
            .field("period", &self.period)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

impl RefreshScheduler {
    /// A scheduler refreshing every `period`, woken by `safe_point` whenever
    /// the safe slide becomes foreground. The first safe point always
    /// refreshes.
    pub fn new(
        store: Arc<DataStore>,
        catalog: SlideCatalog,
        packages: Vec<Package>,
        control: Arc<dyn RotationControl>,
        safe_point: Arc<Notify>,
        period: Duration,
    ) -> Result<Self, CatalogError> {
        if packages.is_empty() {
            return Err(CatalogError::NoPackages);
        }
        Ok(Self {
            store,
            catalog,
            packages,
            control,
            hooks: Vec::new(),
            safe_point,
            pending: AtomicBool::new(true),
            period,
        })
    }

    /// Register a hook; hooks run in the order they were added.
    pub fn add_hook(&mut self, hook: Arc<dyn PostRefreshHook>) {
        self.hooks.push(hook);
    }

    /// Mark a data refresh as due at the next safe point.
    pub fn request_refresh(&self) {
        self.pending.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_refresh_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    /// Work done each time the safe slide comes up.
    pub async fn on_safe_point(&self) -> Result<(), CatalogError> {
        let refreshed = self.pending.swap(false, Ordering::SeqCst);
        if refreshed {
            info!("Refreshing weather data at safe point");
            self.store.refresh().await;
        }

        // Read only after the refresh has published, never mid-refresh.
        let snapshot = self.store.snapshot();
        let slides = self.catalog.rebuild(&snapshot, &self.packages)?;
        debug!("Reconciling {} catalog slides", slides.len());
        self.control.reconcile(slides);

        if refreshed {
            for hook in &self.hooks {
                hook.after_refresh(&snapshot);
            }
        }
        Ok(())
    }

    /// Drive the cadence timer and safe-point handling until cancelled.
    pub async fn run(self: Arc<Self>, cancel_token: CancellationToken) {
        let mut cadence = interval_at(Instant::now() + self.period, self.period);
        cadence.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cadence.tick() => {
                    debug!("Refresh due; waiting for the safe point");
                    self.request_refresh();
                }
                () = self.safe_point.notified() => {
                    if let Err(e) = self.on_safe_point().await {
                        error!("Catalog rebuild failed: {}", e);
                    }
                }
                () = cancel_token.cancelled() => {
                    info!("Refresh scheduler stopped");
                    return;
                }
            }
        }
    }
}
