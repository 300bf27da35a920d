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

//! Background music volume model.
//!
//! No audio is played; the model tracks the volume the music would be at so
//! ducking during narrated slides and the alert tone show up in the log.

use std::sync::Mutex;

use log::{debug, info};
use rotation_core::display::AudioCue;

/// Volume the music drops to while a slide is narrated.
pub const DUCKED_VOLUME: f32 = 0.06;

#[derive(Debug)]
struct MusicState {
    volume: f32,
    /// Volume to return to, while ducked.
    saved: Option<f32>,
}

/// Background music that ducks under narration.
#[derive(Debug)]
pub struct BackgroundMusic {
    state: Mutex<MusicState>,
}

impl BackgroundMusic {
    pub fn new(volume: f32) -> Self {
        Self {
            state: Mutex::new(MusicState {
                volume: volume.clamp(0.0, 1.0),
                saved: None,
            }),
        }
    }
}

impl AudioCue for BackgroundMusic {
    fn play_warning(&self) {
        info!("Playing warning tone");
    }

    fn duck(&self) {
        if let Ok(mut state) = self.state.lock() {
            if state.saved.is_none() {
                state.saved = Some(state.volume);
                state.volume = DUCKED_VOLUME.min(state.volume);
                debug!("Music ducked to {:.2}", state.volume);
            }
        }
    }

    fn restore(&self) {
        if let Ok(mut state) = self.state.lock() {
            if let Some(volume) = state.saved.take() {
                state.volume = volume;
                debug!("Music restored to {:.2}", volume);
            }
        }
    }
}
