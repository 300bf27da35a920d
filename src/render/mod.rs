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

//! Headless output surfaces for running the kiosk without a display.

pub mod console;
pub mod music;

pub use console::{ConsoleMaps, ConsoleRenderer};
pub use music::BackgroundMusic;

use std::sync::Arc;

use rotation_core::Collaborators;

/// Console renderer and map controller with a background music model at `volume`.
pub fn console_collaborators(volume: f32) -> Collaborators {
    Collaborators {
        renderer: Arc::new(ConsoleRenderer::default()),
        maps: Arc::new(ConsoleMaps),
        audio: Arc::new(BackgroundMusic::new(volume)),
    }
}
