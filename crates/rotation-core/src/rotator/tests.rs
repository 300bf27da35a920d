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

use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::display::VocalDucking;
use crate::model::{AssetRef, FieldDescriptor, MapKind};
use crate::testing::{outputs, slide, RecordingAudio, RecordingRenderer, RenderCall};

fn lead_in() -> Vec<SlideDescriptor> {
    let mut upgrading = slide("Upgrading", 0);
    upgrading.fade_enabled = false;
    let mut splash = slide("Splash", 10);
    splash.fade_enabled = false;
    let affiliate = slide("Affiliate", 10);
    vec![upgrading, splash, affiliate]
}

fn started() -> (Arc<RecordingRenderer>, SlideRotator, Instant) {
    let (recorder, outputs) = outputs();
    let mut rotator = SlideRotator::new(lead_in(), outputs).unwrap();
    let now = Instant::now();
    rotator.start(now);
    rotator.end_turn();
    (recorder, rotator, now)
}

fn advance_to(rotator: &mut SlideRotator, id: &str, now: Instant) {
    for _ in 0..50 {
        if rotator.current_id() == Some(id) {
            return;
        }
        rotator.advance(now);
        rotator.end_turn();
    }
    panic!("{id} never came up");
}

fn no_fade(id: &str) -> SlideDescriptor {
    let mut s = slide(id, 10);
    s.fade_enabled = false;
    s
}

#[test]
fn test_construction_requires_lead_in() {
    let (_, out) = outputs();
    assert_eq!(
        SlideRotator::new(Vec::new(), out.clone()).unwrap_err(),
        RotationError::EmptyLeadIn
    );
    assert_eq!(
        SlideRotator::new(vec![slide("Splash", 1), slide("Splash", 1)], out).unwrap_err(),
        RotationError::DuplicateLeadIn("Splash".to_string())
    );
}

#[test]
fn test_start_shows_first_lead_in_slide() {
    let (recorder, rotator, now) = started();
    assert_eq!(rotator.phase(), RotationPhase::Showing(0));
    assert_eq!(rotator.current_id(), Some("Upgrading"));
    assert_eq!(
        recorder.take(),
        [
            RenderCall::Mount("Upgrading".to_string()),
            RenderCall::Mount("Splash".to_string()),
            RenderCall::Mount("Affiliate".to_string()),
            RenderCall::Foreground("Upgrading".to_string()),
        ]
    );
    assert_eq!(rotator.pending_timer().map(|t| t.due), Some(now));
}

#[test]
fn test_idle_until_started() {
    let (recorder, outputs) = outputs();
    let mut rotator = SlideRotator::new(lead_in(), outputs).unwrap();
    let now = Instant::now();
    rotator.reconcile(vec![slide("Now", 10)], now);
    rotator.advance(now);
    assert_eq!(rotator.phase(), RotationPhase::Idle);
    assert_eq!(rotator.current_id(), None);
    assert!(recorder.take().is_empty());

    rotator.start(now);
    assert_eq!(recorder.calls_for("Now"), [RenderCall::Mount("Now".to_string())]);
}

#[test]
fn test_reconcile_appends_after_lead_in() {
    let (_, mut rotator, now) = started();
    rotator.reconcile(vec![slide("Now", 10), slide("Extended", 10)], now);
    assert_eq!(rotator.len(), 5);
    assert_eq!(rotator.slide_ids()[3], "Now");
    assert_eq!(rotator.slide_ids()[4], "Extended");
}

#[test]
fn test_identical_reconcile_is_silent() {
    let (recorder, mut rotator, now) = started();
    let slides = vec![slide("Now", 10), slide("Extended", 10)];
    rotator.reconcile(slides.clone(), now);
    recorder.take();

    rotator.reconcile(slides, now);
    assert!(recorder.take().is_empty());
}

#[test]
fn test_reconcile_does_not_touch_displayed_slide() {
    let (recorder, mut rotator, now) = started();
    rotator.reconcile(vec![slide("A", 10), slide("Now", 10)], now);
    advance_to(&mut rotator, "Now", now);
    recorder.take();

    let mut changed = slide("Now", 10);
    changed.fields.push(FieldDescriptor::label("Core_nowTemperature", "temperature", "72"));
    rotator.reconcile(vec![slide("B", 10), slide("A", 10), changed], now);

    assert_eq!(rotator.current_id(), Some("Now"));
    assert_eq!(rotator.current_index(), 5);
    let calls = recorder.take();
    assert!(!calls.contains(&RenderCall::Foreground("Now".to_string())));
    assert!(!calls.contains(&RenderCall::Background("Now".to_string())));
    assert!(calls.contains(&RenderCall::Update("Now".to_string())));
    assert!(calls.contains(&RenderCall::Mount("B".to_string())));
    assert!(!calls.contains(&RenderCall::Mount("A".to_string())));
}

#[test]
fn test_double_advance_in_one_turn_steps_once() {
    let (_, mut rotator, now) = started();
    let before = rotator.pending_timer().unwrap();

    rotator.advance(now);
    rotator.advance(now);
    assert_eq!(rotator.current_index(), 1);
    let timer = rotator.pending_timer().unwrap();
    assert_eq!(timer.seq, before.seq + 1);
    assert_eq!(timer.due, now + Duration::from_secs(10));

    rotator.end_turn();
    rotator.advance(now);
    assert_eq!(rotator.current_index(), 2);
}

#[test]
fn test_stale_timer_is_ignored() {
    let (_, mut rotator, now) = started();
    let first = rotator.pending_timer().unwrap();
    rotator.advance(now);
    rotator.end_turn();

    rotator.fire_timer(first.seq, now);
    assert_eq!(rotator.current_index(), 1);

    let current = rotator.pending_timer().unwrap();
    rotator.fire_timer(current.seq, current.due);
    assert_eq!(rotator.current_index(), 2);
}

#[test]
fn test_fade_backgrounds_previous_after_window() {
    let (recorder, mut rotator, now) = started();
    advance_to(&mut rotator, "Splash", now);
    recorder.take();

    rotator.advance(now);
    assert_eq!(recorder.take(), [RenderCall::Foreground("Affiliate".to_string())]);
    assert_eq!(rotator.next_deadline(), Some(now + FADE_DURATION));

    rotator.fire_due(now + FADE_DURATION);
    assert_eq!(recorder.take(), [RenderCall::Background("Splash".to_string())]);
}

#[test]
fn test_no_fade_backgrounds_immediately() {
    let (recorder, mut rotator, now) = started();
    recorder.take();
    rotator.advance(now);
    assert_eq!(
        recorder.take(),
        [
            RenderCall::Foreground("Splash".to_string()),
            RenderCall::Background("Upgrading".to_string()),
        ]
    );
}

#[test]
fn test_removed_current_slide_falls_through_on_next_advance() {
    let (recorder, mut rotator, now) = started();
    rotator.reconcile(vec![no_fade("A"), no_fade("B"), no_fade("C")], now);
    advance_to(&mut rotator, "B", now);
    recorder.take();

    rotator.reconcile(vec![no_fade("A"), no_fade("C")], now);
    assert_eq!(rotator.current_id(), Some("B"));
    assert_eq!(rotator.current_index(), 3);
    assert!(recorder.calls_for("B").is_empty());

    rotator.end_turn();
    rotator.advance(now);
    assert_eq!(rotator.current_id(), Some("C"));
    assert_eq!(
        recorder.calls_for("B"),
        [
            RenderCall::Background("B".to_string()),
            RenderCall::Unmount("B".to_string()),
        ]
    );
}

#[test]
fn test_shrunk_sequence_clamps_and_advances() {
    let (recorder, mut rotator, now) = started();
    rotator.reconcile(vec![no_fade("A"), no_fade("B"), no_fade("C")], now);
    advance_to(&mut rotator, "C", now);
    recorder.take();

    rotator.reconcile(vec![no_fade("A")], now);
    assert_eq!(rotator.len(), 4);
    assert_eq!(rotator.current_id(), Some("Upgrading"));
    assert!(rotator.current_index() < rotator.len());
    assert!(recorder.calls_for("C").contains(&RenderCall::Unmount("C".to_string())));
}

#[test]
fn test_reserved_and_lead_in_ids_skipped_in_content() {
    let (_, mut rotator, now) = started();
    rotator.reconcile(
        vec![slide("Splash", 1), slide(ALERT_ID, 1), slide("A", 1), slide("A", 2)],
        now,
    );
    assert_eq!(rotator.slide_ids(), ["Upgrading", "Splash", "Affiliate", "A"]);
}

#[test]
fn test_upsert_inserts_after_lead_in_then_updates_in_place() {
    let (recorder, mut rotator, now) = started();
    rotator.reconcile(vec![slide("A", 10), slide("B", 10)], now);
    advance_to(&mut rotator, "B", now);
    recorder.take();

    rotator.upsert_reserved(slide("anything", 10));
    assert_eq!(rotator.slide_ids()[3], ALERT_ID);
    assert_eq!(rotator.current_id(), Some("B"));
    assert_eq!(rotator.current_index(), 5);
    assert_eq!(recorder.take(), [RenderCall::Mount(ALERT_ID.to_string())]);

    let mut updated = slide(ALERT_ID, 10);
    updated.fields.push(FieldDescriptor::label("alertTitle", "title", "TORNADO WARNING"));
    rotator.upsert_reserved(updated.clone());
    rotator.upsert_reserved(updated);
    assert_eq!(rotator.len(), 6);
    assert_eq!(
        recorder.take(),
        [
            RenderCall::Assets(ALERT_ID.to_string(), "Alert.png".to_string()),
            RenderCall::Update(ALERT_ID.to_string()),
        ]
    );
}

#[test]
fn test_alert_survives_reconcile() {
    let (_, mut rotator, now) = started();
    rotator.upsert_reserved(slide(ALERT_ID, 10));
    rotator.reconcile(vec![slide("A", 10)], now);
    assert_eq!(rotator.slide_ids(), ["Upgrading", "Splash", "Affiliate", ALERT_ID, "A"]);
}

#[test]
fn test_remove_displayed_alert_advances() {
    let (recorder, mut rotator, now) = started();
    rotator.reconcile(vec![no_fade("A")], now);
    let mut alert = slide(ALERT_ID, 10);
    alert.fade_enabled = false;
    rotator.upsert_reserved(alert);
    advance_to(&mut rotator, ALERT_ID, now);
    rotator.end_turn();
    recorder.take();

    rotator.remove_reserved(now);
    assert_eq!(rotator.current_id(), Some("A"));
    assert_eq!(rotator.slide_ids(), ["Upgrading", "Splash", "Affiliate", "A"]);
    assert_eq!(
        recorder.take(),
        [
            RenderCall::Foreground("A".to_string()),
            RenderCall::Background(ALERT_ID.to_string()),
            RenderCall::Unmount(ALERT_ID.to_string()),
        ]
    );
}

#[test]
fn test_remove_hidden_alert_keeps_current() {
    let (recorder, mut rotator, now) = started();
    rotator.reconcile(vec![slide("A", 10)], now);
    rotator.upsert_reserved(slide(ALERT_ID, 10));
    advance_to(&mut rotator, "A", now);
    rotator.fire_due(now + FADE_DURATION);
    recorder.take();

    rotator.remove_reserved(now);
    assert_eq!(rotator.current_id(), Some("A"));
    assert_eq!(rotator.current_index(), 3);
    assert_eq!(recorder.take(), [RenderCall::Unmount(ALERT_ID.to_string())]);

    rotator.remove_reserved(now);
    assert!(recorder.take().is_empty());
}

#[test]
fn test_map_animation_follows_foreground() {
    let (recorder, mut rotator, now) = started();
    let mut radar = no_fade("Core_Radar");
    radar.map_ref = Some(MapBinding::new("Core_Radar", MapKind::LocalRadar, (40.0, -75.0)));
    rotator.reconcile(vec![radar.clone(), no_fade("Core_Now")], now);
    advance_to(&mut rotator, "Core_Radar", now);
    assert!(recorder
        .take()
        .contains(&RenderCall::MapStart("Core_Radar-radar-map".to_string())));

    radar.title = "Local Doppler".to_string();
    rotator.reconcile(vec![radar, no_fade("Core_Now")], now);
    assert!(recorder.take().is_empty());

    rotator.end_turn();
    rotator.advance(now);
    assert!(recorder
        .take()
        .contains(&RenderCall::MapStop("Core_Radar-radar-map".to_string())));
}

#[test]
fn test_foreground_hook_runs_for_its_slide() {
    let (_, outputs) = outputs();
    let mut rotator = SlideRotator::new(lead_in(), outputs).unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    rotator.on_foreground(
        "Splash",
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    );

    let now = Instant::now();
    rotator.start(now);
    rotator.end_turn();
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    rotator.advance(now);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    rotator.end_turn();
    rotator.advance(now);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_index_stays_in_range_across_reconciles() {
    let (_, mut rotator, now) = started();
    let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = || {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        seed
    };

    for _ in 0..500 {
        match next() % 4 {
            0 => {
                let len = usize::try_from(next() % 8).unwrap();
                let slides = (0..len)
                    .map(|_| slide(&format!("S{}", next() % 10), 1))
                    .collect();
                rotator.reconcile(slides, now);
            }
            1 => rotator.upsert_reserved(slide(ALERT_ID, 1)),
            2 => rotator.remove_reserved(now),
            _ => rotator.advance(now),
        }
        rotator.end_turn();
        assert!(rotator.current_index() < rotator.len());
        assert!(rotator.current_id().is_some());
        assert_eq!(
            rotator.slide_ids().iter().filter(|id| *id == ALERT_ID).count(),
            usize::from(rotator.slide_ids().contains(&ALERT_ID.to_string()))
        );
    }
}

#[test]
fn test_changed_artwork_reaches_renderer() {
    let (recorder, mut rotator, now) = started();
    rotator.reconcile(vec![slide("A", 10)], now);
    recorder.take();

    let mut moved = slide("A", 10);
    moved.background = AssetRef::new("other.png");
    rotator.reconcile(vec![moved.clone()], now);
    assert_eq!(
        recorder.take(),
        [RenderCall::Assets("A".to_string(), "other.png".to_string())]
    );

    rotator.reconcile(vec![moved], now);
    assert!(recorder.take().is_empty());
}

#[test]
fn test_narration_stays_ducked_across_fade_between_vocal_slides() {
    let (_, mut rotator, now) = started();
    let audio = Arc::new(RecordingAudio::default());
    rotator.add_observer(Arc::new(VocalDucking::new(audio.clone())));

    let mut current = no_fade("Core_Now");
    current.vocal_local = true;
    let mut forecast = slide("Core_thirtysixHour1", 10);
    forecast.vocal_local = true;
    rotator.reconcile(vec![current, forecast, no_fade("Core_Radar")], now);

    advance_to(&mut rotator, "Core_Now", now);
    assert!(audio.is_ducked());
    advance_to(&mut rotator, "Core_thirtysixHour1", now);
    rotator.fire_due(now + FADE_DURATION);
    assert!(audio.is_ducked());
    assert_eq!(audio.restores(), 0);

    advance_to(&mut rotator, "Core_Radar", now);
    assert!(!audio.is_ducked());
    assert_eq!(audio.restores(), 1);
}

#[test]
fn test_alert_does_not_jump_ahead_of_detached_successor() {
    let (_, mut rotator, now) = started();
    rotator.reconcile(vec![no_fade("A"), no_fade("B")], now);
    advance_to(&mut rotator, "A", now);
    assert_eq!(rotator.current_index(), 3);

    rotator.reconcile(vec![no_fade("B")], now);
    assert_eq!(rotator.current_id(), Some("A"));
    assert_eq!(rotator.current_index(), 2);

    rotator.upsert_reserved(no_fade(ALERT_ID));
    assert_eq!(rotator.slide_ids(), ["Upgrading", "Splash", "Affiliate", ALERT_ID, "B"]);
    assert_eq!(rotator.current_id(), Some("A"));

    rotator.advance(now);
    assert_eq!(rotator.current_id(), Some("B"));
}
