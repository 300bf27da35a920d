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

//! Recording collaborators for unit tests.

use std::sync::{Arc, Mutex};

use crate::display::{AudioCue, MapAnimationController, Renderer};
use crate::model::{AssetRef, MapBinding, SlideDescriptor};
use crate::rotator::{RotationControl, RotatorOutputs};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderCall {
    Mount(String),
    Unmount(String),
    Foreground(String),
    Background(String),
    Update(String),
    /// Slide id and the background it was handed.
    Assets(String, String),
    MapStart(String),
    MapStop(String),
}

#[derive(Debug, Default)]
pub struct RecordingRenderer {
    calls: Mutex<Vec<RenderCall>>,
}

impl RecordingRenderer {
    pub fn take(&self) -> Vec<RenderCall> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }

    /// Calls that mention `id`.
    pub fn calls_for(&self, id: &str) -> Vec<RenderCall> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| match c {
                RenderCall::Mount(i)
                | RenderCall::Unmount(i)
                | RenderCall::Foreground(i)
                | RenderCall::Background(i)
                | RenderCall::Update(i)
                | RenderCall::Assets(i, _)
                | RenderCall::MapStart(i)
                | RenderCall::MapStop(i) => i == id || i.starts_with(&format!("{id}-")),
            })
            .cloned()
            .collect()
    }

    fn push(&self, call: RenderCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Renderer for RecordingRenderer {
    fn mount(&self, slide: &SlideDescriptor) {
        self.push(RenderCall::Mount(slide.id.clone()));
    }
    fn unmount(&self, id: &str) {
        self.push(RenderCall::Unmount(id.to_string()));
    }
    fn set_foreground(&self, id: &str) {
        self.push(RenderCall::Foreground(id.to_string()));
    }
    fn set_background(&self, id: &str) {
        self.push(RenderCall::Background(id.to_string()));
    }
    fn update_fields(&self, id: &str, _field_values: &[(String, String)]) {
        self.push(RenderCall::Update(id.to_string()));
    }
    fn update_assets(&self, slide: &SlideDescriptor) {
        self.push(RenderCall::Assets(slide.id.clone(), slide.background.as_str().to_string()));
    }
}

impl MapAnimationController for RecordingRenderer {
    fn start(&self, map: &MapBinding) {
        self.push(RenderCall::MapStart(map.map_id.clone()));
    }
    fn stop(&self, map: &MapBinding) {
        self.push(RenderCall::MapStop(map.map_id.clone()));
    }
}

/// One recorder serving as both renderer and map controller.
pub fn outputs() -> (Arc<RecordingRenderer>, RotatorOutputs) {
    let recorder = Arc::new(RecordingRenderer::default());
    let outputs = RotatorOutputs {
        renderer: recorder.clone(),
        maps: recorder.clone(),
    };
    (recorder, outputs)
}

#[derive(Debug, Default)]
pub struct RecordingAudio {
    pub warnings: Mutex<usize>,
    ducked: Mutex<bool>,
    restores: Mutex<usize>,
}

impl RecordingAudio {
    pub fn warnings(&self) -> usize {
        *self.warnings.lock().unwrap()
    }

    pub fn is_ducked(&self) -> bool {
        *self.ducked.lock().unwrap()
    }

    pub fn restores(&self) -> usize {
        *self.restores.lock().unwrap()
    }
}

impl AudioCue for RecordingAudio {
    fn play_warning(&self) {
        *self.warnings.lock().unwrap() += 1;
    }
    fn duck(&self) {
        *self.ducked.lock().unwrap() = true;
    }
    fn restore(&self) {
        *self.ducked.lock().unwrap() = false;
        *self.restores.lock().unwrap() += 1;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControlCall {
    Reconcile(Vec<String>),
    Upsert(SlideDescriptor),
    Remove,
}

#[derive(Debug, Default)]
pub struct RecordingControl {
    calls: Mutex<Vec<ControlCall>>,
}

impl RecordingControl {
    pub fn calls(&self) -> Vec<ControlCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn upserts(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ControlCall::Upsert(_)))
            .count()
    }

    pub fn removals(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ControlCall::Remove))
            .count()
    }
}

impl RotationControl for RecordingControl {
    fn reconcile(&self, slides: Vec<SlideDescriptor>) {
        let ids = slides.into_iter().map(|s| s.id).collect();
        self.calls.lock().unwrap().push(ControlCall::Reconcile(ids));
    }
    fn upsert_reserved(&self, slide: SlideDescriptor) {
        self.calls.lock().unwrap().push(ControlCall::Upsert(slide));
    }
    fn remove_reserved(&self) {
        self.calls.lock().unwrap().push(ControlCall::Remove);
    }
}

pub fn slide(id: &str, duration_secs: u32) -> SlideDescriptor {
    SlideDescriptor::new(id, AssetRef::new(format!("{id}.png")), duration_secs)
}
