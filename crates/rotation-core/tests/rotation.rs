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

//! Rotation behaviour observed through the renderer.

mod common;

use std::sync::Arc;

use common::{outputs, slide, Call, Recorder};
use rotation_core::catalog::lead_in_slides;
use rotation_core::rotator::ALERT_ID;
use rotation_core::SlideRotator;
use tokio::time::Instant;

fn started(recorder: &Arc<Recorder>) -> (SlideRotator, Instant) {
    let mut rotator = SlideRotator::new(lead_in_slides("WXYZ"), outputs(recorder)).unwrap();
    let now = Instant::now();
    rotator.start(now);
    rotator.end_turn();
    (rotator, now)
}

#[test]
fn test_lead_in_plus_two_content_slides() {
    let recorder = Arc::new(Recorder::default());
    let (mut rotator, now) = started(&recorder);
    assert_eq!(rotator.len(), 3);

    rotator.reconcile(vec![slide("Now", 10), slide("Extended", 10)], now);
    assert_eq!(rotator.len(), 5);
    assert_eq!(rotator.slide_ids()[3], "Now");
}

#[test]
fn test_repeated_reconcile_mounts_nothing() {
    let recorder = Arc::new(Recorder::default());
    let (mut rotator, now) = started(&recorder);
    let slides = vec![slide("Now", 10), slide("Extended", 10)];

    rotator.reconcile(slides.clone(), now);
    recorder.take();
    rotator.reconcile(slides, now);

    let calls = recorder.take();
    assert!(!calls.iter().any(|c| matches!(c, Call::Mount(_) | Call::Unmount(_))));
}

#[test]
fn test_displayed_slide_survives_catalog_rebuild() {
    let recorder = Arc::new(Recorder::default());
    let (mut rotator, now) = started(&recorder);
    rotator.reconcile(vec![slide("Now", 10), slide("Extended", 10)], now);

    while rotator.current_id() != Some("Extended") {
        rotator.advance(now);
        rotator.end_turn();
    }
    recorder.take();

    rotator.reconcile(
        vec![slide("Radar", 20), slide("Now", 10), slide("Extended", 10)],
        now,
    );
    rotator.upsert_reserved(slide("Tornado Warning", 10));

    assert_eq!(rotator.current_id(), Some("Extended"));
    assert_eq!(rotator.slide_ids()[rotator.current_index()], "Extended");
    assert_eq!(rotator.slide_ids()[3], ALERT_ID);
    let calls = recorder.take();
    assert!(!calls.contains(&Call::Foreground("Extended".to_string())));
    assert!(!calls.contains(&Call::Background("Extended".to_string())));
}
