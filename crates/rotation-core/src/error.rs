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

//! Error taxonomy for the orchestration core.
//!
//! Upstream failures are recovered inside the data store and never reach the
//! catalog or the rotator. Catalog errors indicate a configuration problem and
//! are reported at startup. Rotation errors guard construction only; runtime
//! range violations are clamped and recovered.

use thiserror::Error;

/// A data fetch against a weather or location upstream failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("upstream unavailable: {0}")]
    Unavailable(String),

    #[error("upstream request timed out after {0} seconds")]
    Timeout(u64),

    #[error("malformed upstream response: {0}")]
    Malformed(String),
}

/// The catalog was given input it cannot turn into slides.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("unknown package: {0}")]
    UnknownPackage(String),

    #[error("no packages enabled")]
    NoPackages,

    #[error("missing data for location '{0}' after fallback substitution")]
    MissingLocation(String),
}

/// The rotator was constructed in a state it cannot rotate through.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RotationError {
    #[error("rotation requires at least one lead-in slide")]
    EmptyLeadIn,

    #[error("duplicate lead-in slide id: {0}")]
    DuplicateLeadIn(String),
}

/// Startup failure of the full-stack kiosk.
#[derive(Debug, Error)]
pub enum KioskError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Rotation(#[from] RotationError),
}
