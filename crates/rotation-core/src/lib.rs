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

//! Slide rotation and data refresh orchestration for rotating weather displays.
//!
//! The crate owns the lifecycle of a rotating, changing sequence of
//! full-screen slides while weather data is refreshed underneath them. It is
//! split into layers that can be used on their own or composed:
//!
//! - **Store**: weather records per location with fallback substitution, and
//!   the [`WeatherProvider`] seam to a concrete API client
//! - **Catalog**: builds slide descriptors from content packages and a data
//!   snapshot
//! - **Rotator**: the slide state machine and its async driver
//! - **Alerts**: keeps the reserved alert slide in step with active alerts
//! - **Scheduler**: refreshes data and rebuilds slides at the rotation's safe
//!   point
//!
//! Rendering, map animation and audio are supplied by the host through the
//! traits in [`display`].
//!
//! # Quick Start
//!
//! Use the [`Kiosk`] type for full-stack operation:
//!
//! ```no_run
//! use std::sync::Arc;
//! use rotation_core::{Collaborators, Kiosk, KioskConfig, Package};
//! use rotation_core::display::NullOutput;
//! use rotation_core::model::LocationSet;
//! use rotation_core::store::StaticProvider;
//!
//! #[tokio::main]
//! async fn main() {
//!     let provider = Arc::new(StaticProvider::new(LocationSet::fallback()));
//!     let output = Arc::new(NullOutput);
//!     let kiosk = Kiosk::start(
//!         KioskConfig {
//!             packages: vec![Package::Core, Package::Spanish],
//!             ..Default::default()
//!         },
//!         provider,
//!         Collaborators {
//!             renderer: output.clone(),
//!             maps: output.clone(),
//!             audio: output,
//!         },
//!     )
//!     .unwrap();
//!
//!     kiosk.wait_ready().await;
//!     if let Some(state) = kiosk.rotation().snapshot().await {
//!         println!("Showing {:?}", state.current_id);
//!     }
//!     kiosk.shutdown().await;
//! }
//! ```
//!
//! # Using the Catalog Alone
//!
//! ```
//! use rotation_core::catalog::{Package, SlideCatalog};
//! use rotation_core::model::LocationSet;
//! use rotation_core::store::Snapshot;
//!
//! let catalog = SlideCatalog::new("neighborhood");
//! let snapshot = Snapshot::new(LocationSet::fallback());
//! let slides = catalog.rebuild(&snapshot, &[Package::MiniCore]).unwrap();
//! assert_eq!(slides[0].id, "MiniCore_UpNext");
//! ```

pub mod alerts;
pub mod catalog;
pub mod display;
pub mod error;
pub mod model;
pub mod rotator;
pub mod scheduler;
pub mod store;

#[cfg(test)]
mod testing;

use std::sync::Arc;
use std::time::Duration;

use log::info;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub use alerts::{AlertDecision, AlertMonitor};
pub use catalog::{lead_in_slides, Package, SlideCatalog, SPLASH_ID};
pub use display::{AudioCue, MapAnimationController, Renderer, SlideObserver, VocalDucking};
pub use error::{CatalogError, KioskError, RotationError, UpstreamError};
pub use model::{Language, Location, LocationSet, SlideDescriptor};
pub use rotator::{RotationControl, RotationSnapshot, RotatorHandle, RotatorOutputs, SlideRotator};
pub use scheduler::{PostRefreshHook, RefreshScheduler};
pub use store::{DataStore, Snapshot, StoreConfig, WeatherProvider};

/// Configuration for the full-stack kiosk.
#[derive(Debug, Clone)]
pub struct KioskConfig {
    /// Background artwork set.
    pub locale: String,
    /// Station name shown on the affiliate slide.
    pub affiliate_name: String,
    /// Enabled packages, in rotation order.
    pub packages: Vec<Package>,
    pub store: StoreConfig,
    /// How often weather data is refreshed.
    pub refresh_interval: Duration,
    /// How often alerts are re-checked between refreshes.
    pub alert_poll_interval: Duration,
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            locale: "neighborhood".to_string(),
            affiliate_name: "Weatherscan".to_string(),
            packages: vec![Package::Core],
            store: StoreConfig::default(),
            refresh_interval: Duration::from_secs(300),
            alert_poll_interval: Duration::from_secs(60),
        }
    }
}

/// Output surfaces supplied by the host.
#[derive(Clone)]
pub struct Collaborators {
    pub renderer: Arc<dyn Renderer>,
    pub maps: Arc<dyn MapAnimationController>,
    pub audio: Arc<dyn AudioCue>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// Full-stack kiosk that wires all layers together.
///
/// The rotation starts on the loading slide straight away. The first pass
/// over the splash slide fetches data and fills in the content slides.
pub struct Kiosk {
    store: Arc<DataStore>,
    rotation: RotatorHandle,
    scheduler: Arc<RefreshScheduler>,
    alerts: Arc<AlertMonitor>,
    cancel_token: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl std::fmt::Debug for Kiosk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kiosk")
            .field("store", &self.store)
            .field("rotation", &self.rotation)
            .finish_non_exhaustive()
    }
}

impl Kiosk {
    /// Start the rotation, refresh scheduler and alert monitor.
    ///
    /// Must be called within a Tokio runtime.
    pub fn start(
        config: KioskConfig,
        provider: Arc<dyn WeatherProvider>,
        collaborators: Collaborators,
    ) -> Result<Self, KioskError> {
        if config.packages.is_empty() {
            return Err(CatalogError::NoPackages.into());
        }

        let store = Arc::new(DataStore::new(provider, config.store));
        let cancel_token = CancellationToken::new();

        let mut rotator = SlideRotator::new(
            lead_in_slides(&config.affiliate_name),
            RotatorOutputs {
                renderer: collaborators.renderer,
                maps: collaborators.maps,
            },
        )?;
        rotator.add_observer(Arc::new(VocalDucking::new(Arc::clone(&collaborators.audio))));

        let safe_point = Arc::new(Notify::new());
        let notify = Arc::clone(&safe_point);
        rotator.on_foreground(SPLASH_ID, Box::new(move || notify.notify_one()));

        let (rotation, rotation_task) = RotatorHandle::spawn(rotator);
        let control: Arc<dyn RotationControl> = Arc::new(rotation.clone());

        let alerts = Arc::new(AlertMonitor::new(
            Arc::clone(&store),
            Arc::clone(&control),
            collaborators.audio,
        ));

        let mut scheduler = RefreshScheduler::new(
            Arc::clone(&store),
            SlideCatalog::new(config.locale),
            config.packages,
            control,
            safe_point,
            config.refresh_interval,
        )?;
        scheduler.add_hook(alerts.clone());
        let scheduler = Arc::new(scheduler);

        let tasks = vec![
            rotation_task,
            tokio::spawn(Arc::clone(&scheduler).run(cancel_token.child_token())),
            tokio::spawn(
                Arc::clone(&alerts).run(config.alert_poll_interval, cancel_token.child_token()),
            ),
        ];

        info!("Kiosk started");
        Ok(Self {
            store,
            rotation,
            scheduler,
            alerts,
            cancel_token,
            tasks,
        })
    }

    #[must_use]
    pub fn store(&self) -> &Arc<DataStore> {
        &self.store
    }

    #[must_use]
    pub fn rotation(&self) -> &RotatorHandle {
        &self.rotation
    }

    #[must_use]
    pub fn alerts(&self) -> &Arc<AlertMonitor> {
        &self.alerts
    }

    /// Refresh data at the next safe point instead of waiting for the cadence.
    pub fn request_refresh(&self) {
        self.scheduler.request_refresh();
    }

    /// Resolves once the first data refresh has completed.
    pub async fn wait_ready(&self) {
        self.store.is_ready().await;
    }

    /// Stop every background task and wait for them to finish.
    pub async fn shutdown(self) {
        self.cancel_token.cancel();
        self.rotation.shutdown();
        for task in self.tasks {
            let _ = task.await;
        }
        info!("Kiosk stopped");
    }
}
