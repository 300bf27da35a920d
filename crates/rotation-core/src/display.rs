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

//! Interfaces to the visual, map and audio layers.
//!
//! The core never draws anything. It drives these collaborators, which the
//! host application implements for its output surface.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use log::debug;

use crate::model::{MapBinding, SlideDescriptor};

/// Slide visual layer, keyed by slide id.
pub trait Renderer: Send + Sync {
    /// Create the render state for a slide. Called once per id until unmounted.
    fn mount(&self, slide: &SlideDescriptor);

    fn unmount(&self, id: &str);

    fn set_foreground(&self, id: &str);

    fn set_background(&self, id: &str);

    /// Replace the text of an already mounted slide's fields.
    fn update_fields(&self, id: &str, field_values: &[(String, String)]);

    /// Redraw the artwork and field styling of an already mounted slide.
    fn update_assets(&self, slide: &SlideDescriptor);
}

/// Animated map engine.
pub trait MapAnimationController: Send + Sync {
    fn start(&self, map: &MapBinding);

    fn stop(&self, map: &MapBinding);
}

/// Audible cues and background music.
pub trait AudioCue: Send + Sync {
    /// Sound the alert warning tone.
    fn play_warning(&self);

    /// Lower the background music volume.
    fn duck(&self);

    /// Return the background music to its configured volume.
    fn restore(&self);
}

/// Notified when slides enter and leave the foreground.
pub trait SlideObserver: Send + Sync {
    fn slide_activated(&self, slide: &SlideDescriptor);

    fn slide_deactivated(&self, _slide: &SlideDescriptor) {}
}

/// Ducks the background music while a narrated slide is showing.
///
/// During a fade the incoming and outgoing slides are both in front, so the
/// music comes back only once no narrated slide remains.
pub struct VocalDucking {
    audio: Arc<dyn AudioCue>,
    narrated: Mutex<HashSet<String>>,
}

impl std::fmt::Debug for VocalDucking {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VocalDucking").finish_non_exhaustive()
    }
}

impl VocalDucking {
    #[must_use]
    pub fn new(audio: Arc<dyn AudioCue>) -> Self {
        Self {
            audio,
            narrated: Mutex::new(HashSet::new()),
        }
    }
}

impl SlideObserver for VocalDucking {
    fn slide_activated(&self, slide: &SlideDescriptor) {
        if !slide.vocal_local {
            return;
        }
        if let Ok(mut narrated) = self.narrated.lock() {
            let first = narrated.is_empty();
            narrated.insert(slide.id.clone());
            if first {
                debug!("Ducking music for {}", slide.id);
                self.audio.duck();
            }
        }
    }

    fn slide_deactivated(&self, slide: &SlideDescriptor) {
        if !slide.vocal_local {
            return;
        }
        if let Ok(mut narrated) = self.narrated.lock() {
            if narrated.remove(&slide.id) && narrated.is_empty() {
                debug!("Restoring music after {}", slide.id);
                self.audio.restore();
            }
        }
    }
}

/// Output that discards every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOutput;

impl Renderer for NullOutput {
    fn mount(&self, _slide: &SlideDescriptor) {}
    fn unmount(&self, _id: &str) {}
    fn set_foreground(&self, _id: &str) {}
    fn set_background(&self, _id: &str) {}
    fn update_fields(&self, _id: &str, _field_values: &[(String, String)]) {}
    fn update_assets(&self, _slide: &SlideDescriptor) {}
}

impl MapAnimationController for NullOutput {
    fn start(&self, _map: &MapBinding) {}
    fn stop(&self, _map: &MapBinding) {}
}

impl AudioCue for NullOutput {
    fn play_warning(&self) {}
    fn duck(&self) {}
    fn restore(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AssetRef;

    #[derive(Default)]
    struct Audio(Mutex<Vec<&'static str>>);

    impl AudioCue for Audio {
        fn play_warning(&self) {
            self.0.lock().unwrap().push("warning");
        }
        fn duck(&self) {
            self.0.lock().unwrap().push("duck");
        }
        fn restore(&self) {
            self.0.lock().unwrap().push("restore");
        }
    }

    #[test]
    fn test_vocal_ducking_only_for_vocal_slides() {
        let audio = Arc::new(Audio::default());
        let ducking = VocalDucking::new(audio.clone());

        let plain = SlideDescriptor::new("Core_Radar", AssetRef::new("bg.png"), 10);
        let mut vocal = SlideDescriptor::new("Core_Now", AssetRef::new("bg.png"), 10);
        vocal.vocal_local = true;

        ducking.slide_activated(&plain);
        ducking.slide_deactivated(&plain);
        ducking.slide_activated(&vocal);
        ducking.slide_deactivated(&vocal);

        assert_eq!(*audio.0.lock().unwrap(), ["duck", "restore"]);
    }

    #[test]
    fn test_overlapping_narrated_slides_keep_music_ducked() {
        let audio = Arc::new(Audio::default());
        let ducking = VocalDucking::new(audio.clone());

        let mut now = SlideDescriptor::new("Core_Now", AssetRef::new("bg.png"), 10);
        now.vocal_local = true;
        let mut next = SlideDescriptor::new("Core_thirtysixHour1", AssetRef::new("bg.png"), 10);
        next.vocal_local = true;

        ducking.slide_activated(&now);
        ducking.slide_activated(&next);
        ducking.slide_deactivated(&now);
        assert_eq!(*audio.0.lock().unwrap(), ["duck"]);

        ducking.slide_deactivated(&next);
        assert_eq!(*audio.0.lock().unwrap(), ["duck", "restore"]);
    }
}
