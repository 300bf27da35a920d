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

//! Recording collaborators shared by the integration tests.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::sync::{Arc, Mutex};

use rotation_core::display::{AudioCue, MapAnimationController, Renderer};
use rotation_core::model::{AssetRef, MapBinding, SlideDescriptor};
use rotation_core::{Collaborators, RotatorOutputs};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Mount(String),
    Unmount(String),
    Foreground(String),
    Background(String),
    Update(String),
    Assets(String),
    MapStart(String),
    MapStop(String),
    Warning,
    Duck,
    Restore,
}

#[derive(Debug, Default)]
pub struct Recorder {
    calls: Mutex<Vec<Call>>,
}

impl Recorder {
    pub fn take(&self) -> Vec<Call> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Renderer for Recorder {
    fn mount(&self, slide: &SlideDescriptor) {
        self.push(Call::Mount(slide.id.clone()));
    }
    fn unmount(&self, id: &str) {
        self.push(Call::Unmount(id.to_string()));
    }
    fn set_foreground(&self, id: &str) {
        self.push(Call::Foreground(id.to_string()));
    }
    fn set_background(&self, id: &str) {
        self.push(Call::Background(id.to_string()));
    }
    fn update_fields(&self, id: &str, _field_values: &[(String, String)]) {
        self.push(Call::Update(id.to_string()));
    }
    fn update_assets(&self, slide: &SlideDescriptor) {
        self.push(Call::Assets(slide.id.clone()));
    }
}

impl MapAnimationController for Recorder {
    fn start(&self, map: &MapBinding) {
        self.push(Call::MapStart(map.map_id.clone()));
    }
    fn stop(&self, map: &MapBinding) {
        self.push(Call::MapStop(map.map_id.clone()));
    }
}

impl AudioCue for Recorder {
    fn play_warning(&self) {
        self.push(Call::Warning);
    }
    fn duck(&self) {
        self.push(Call::Duck);
    }
    fn restore(&self) {
        self.push(Call::Restore);
    }
}

pub fn outputs(recorder: &Arc<Recorder>) -> RotatorOutputs {
    RotatorOutputs {
        renderer: recorder.clone(),
        maps: recorder.clone(),
    }
}

pub fn collaborators(recorder: &Arc<Recorder>) -> Collaborators {
    Collaborators {
        renderer: recorder.clone(),
        maps: recorder.clone(),
        audio: recorder.clone(),
    }
}

pub fn slide(id: &str, duration_secs: u32) -> SlideDescriptor {
    SlideDescriptor::new(id, AssetRef::new(format!("{id}.png")), duration_secs)
}
