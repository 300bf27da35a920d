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

//! Renderer and map controller that report slide activity through the log.

use std::collections::HashMap;
use std::sync::Mutex;

use log::{debug, info};
use rotation_core::display::{MapAnimationController, Renderer};
use rotation_core::model::{MapBinding, SlideDescriptor};

/// Title, artwork and current field text of a mounted slide.
#[derive(Debug, Clone)]
struct MountedSlide {
    title: String,
    background: String,
    fields: Vec<(String, String)>,
}

/// Logs the foreground slide with its field text.
#[derive(Debug, Default)]
pub struct ConsoleRenderer {
    mounted: Mutex<HashMap<String, MountedSlide>>,
}

impl ConsoleRenderer {
    fn text_of(&self, id: &str) -> Option<MountedSlide> {
        self.mounted.lock().ok()?.get(id).cloned()
    }
}

impl Renderer for ConsoleRenderer {
    fn mount(&self, slide: &SlideDescriptor) {
        debug!("Mount {} ({}s)", slide.id, slide.duration_secs);
        if let Ok(mut mounted) = self.mounted.lock() {
            mounted.insert(
                slide.id.clone(),
                MountedSlide {
                    title: slide.title.clone(),
                    background: slide.background.to_string(),
                    fields: slide.field_values(),
                },
            );
        }
    }

    fn unmount(&self, id: &str) {
        debug!("Unmount {}", id);
        if let Ok(mut mounted) = self.mounted.lock() {
            mounted.remove(id);
        }
    }

    fn set_foreground(&self, id: &str) {
        let Some(slide) = self.text_of(id) else {
            info!("▶ {}", id);
            return;
        };
        info!("▶ {} {}", id, slide.title);
        debug!("    background: {}", slide.background);
        for (field, text) in slide.fields.iter().filter(|(_, text)| !text.is_empty()) {
            debug!("    {}: {}", field, text);
        }
    }

    fn set_background(&self, id: &str) {
        debug!("Background {}", id);
    }

    fn update_fields(&self, id: &str, field_values: &[(String, String)]) {
        debug!("Update {} ({} fields)", id, field_values.len());
        if let Ok(mut mounted) = self.mounted.lock() {
            if let Some(slide) = mounted.get_mut(id) {
                slide.fields = field_values.to_vec();
            }
        }
    }

    fn update_assets(&self, slide: &SlideDescriptor) {
        debug!("Repaint {} with {}", slide.id, slide.background);
        if let Ok(mut mounted) = self.mounted.lock() {
            if let Some(entry) = mounted.get_mut(&slide.id) {
                entry.background = slide.background.to_string();
            }
        }
    }
}

/// Logs map animation start and stop.
#[derive(Debug, Default)]
pub struct ConsoleMaps;

impl MapAnimationController for ConsoleMaps {
    fn start(&self, map: &MapBinding) {
        info!(
            "Map {} animating at ({:.2}, {:.2}) zoom {}",
            map.map_id, map.center.0, map.center.1, map.zoom
        );
    }

    fn stop(&self, map: &MapBinding) {
        debug!("Map {} stopped", map.map_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rotation_core::model::AssetRef;

    #[test]
    fn test_tracks_mounted_slides() {
        let renderer = ConsoleRenderer::default();
        renderer.mount(&SlideDescriptor::new("Splash", AssetRef::new("./images/Splash.png"), 10));
        renderer.mount(&SlideDescriptor::new("Core_Now", AssetRef::new("./images/Now.png"), 10));
        renderer.set_foreground("Splash");
        assert!(renderer.text_of("Core_Now").is_some());

        renderer.unmount("Core_Now");
        assert!(renderer.text_of("Core_Now").is_none());
        assert!(renderer.text_of("Splash").is_some());
    }

    #[test]
    fn test_update_replaces_field_text() {
        let renderer = ConsoleRenderer::default();
        renderer.mount(&SlideDescriptor::new("Alert", AssetRef::new("./images/Alert.png"), 10));
        renderer.update_fields("Alert", &[("alertTitle".to_string(), "TORNADO WARNING".to_string())]);

        let slide = renderer.text_of("Alert").unwrap();
        assert_eq!(slide.fields, vec![("alertTitle".to_string(), "TORNADO WARNING".to_string())]);
    }

    #[test]
    fn test_update_assets_replaces_background() {
        let renderer = ConsoleRenderer::default();
        let warning = SlideDescriptor::new("Alert", AssetRef::new("./images/Plus_Bulletin_W.png"), 10);
        renderer.mount(&warning);
        let advisory = SlideDescriptor {
            background: AssetRef::new("./images/Plus_Bulletin_Y.png"),
            ..warning
        };
        renderer.update_assets(&advisory);

        let slide = renderer.text_of("Alert").unwrap();
        assert_eq!(slide.background, "./images/Plus_Bulletin_Y.png");
    }
}
