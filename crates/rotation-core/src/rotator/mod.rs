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

//! Slide rotation state machine.
//!
//! [`SlideRotator`] owns the ordered slide sequence, the current index, the
//! single auto-advance timer and the foreground/background state of every
//! mounted slide. It is synchronous: every operation completes all derived
//! index, timer and render adjustments before returning, and time is passed
//! in by the caller. The async [`driver`] owns a rotator and feeds it commands
//! and timer expirations one turn at a time.

pub mod driver;

pub use driver::{RotationControl, RotatorHandle};

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::time::Instant;

use crate::display::{MapAnimationController, Renderer, SlideObserver};
use crate::error::RotationError;
use crate::model::{MapBinding, SlideDescriptor};

/// Id of the reserved alert slide.
pub const ALERT_ID: &str = "Alert";

/// Length of the cross-fade between two slides.
pub const FADE_DURATION: Duration = Duration::from_secs(1);

/// Callback run when a particular slide becomes foreground.
pub type ForegroundHook = Box<dyn Fn() + Send + Sync>;

/// The outstanding auto-advance timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTimer {
    /// Incremented for every timer scheduled; a replaced timer never fires.
    pub seq: u64,
    pub due: Instant,
}

/// Coarse rotation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationPhase {
    /// Not started; nothing is on screen.
    Idle,
    Showing(usize),
}

/// Point-in-time view of the rotation.
#[derive(Debug, Clone, PartialEq)]
pub struct RotationSnapshot {
    pub phase: RotationPhase,
    pub slide_ids: Vec<String>,
    pub current_index: usize,
    /// Id of the slide on screen, which may have been removed from the
    /// sequence and be waiting for the next advance.
    pub current_id: Option<String>,
    pub pending_timer: Option<PendingTimer>,
}

struct SlideState {
    descriptor: SlideDescriptor,
    foreground: bool,
    running_map: Option<MapBinding>,
}

impl SlideState {
    fn new(descriptor: SlideDescriptor) -> Self {
        Self {
            descriptor,
            foreground: false,
            running_map: None,
        }
    }

    fn id(&self) -> &str {
        &self.descriptor.id
    }
}

/// Collaborators driven by the rotator.
#[derive(Clone)]
pub struct RotatorOutputs {
    pub renderer: Arc<dyn Renderer>,
    pub maps: Arc<dyn MapAnimationController>,
}

impl std::fmt::Debug for RotatorOutputs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatorOutputs").finish_non_exhaustive()
    }
}

/// The slide rotation state machine.
pub struct SlideRotator {
    lead_in_len: usize,
    slides: Vec<SlideState>,
    current_index: usize,
    /// Slide still on screen after a reconcile or removal took it out of the
    /// sequence. `current_index` then points at the slide before the one the
    /// next advance should land on.
    detached: Option<SlideState>,
    /// Slides out of the sequence that stay foreground until the running
    /// cross-fade completes.
    retiring: Vec<SlideState>,
    started: bool,
    timer: Option<PendingTimer>,
    timer_seq: u64,
    fade_due: Option<Instant>,
    advanced_this_turn: bool,
    outputs: RotatorOutputs,
    observers: Vec<Arc<dyn SlideObserver>>,
    foreground_hooks: HashMap<String, Vec<ForegroundHook>>,
}

impl std::fmt::Debug for SlideRotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlideRotator")
            .field("slides", &self.slide_ids())
            .field("current_index", &self.current_index)
            .field("timer", &self.timer)
            .finish_non_exhaustive()
    }
}

impl SlideRotator {
    /// A rotator over `lead_in`, the fixed slides that always open the sequence.
    ///
    /// The first lead-in slide is shown until content arrives.
    pub fn new(lead_in: Vec<SlideDescriptor>, outputs: RotatorOutputs) -> Result<Self, RotationError> {
        if lead_in.is_empty() {
            return Err(RotationError::EmptyLeadIn);
        }
        let mut seen = HashSet::new();
        for slide in &lead_in {
            if slide.id == ALERT_ID || !seen.insert(slide.id.as_str()) {
                return Err(RotationError::DuplicateLeadIn(slide.id.clone()));
            }
        }

        Ok(Self {
            lead_in_len: lead_in.len(),
            slides: lead_in.into_iter().map(SlideState::new).collect(),
            current_index: 0,
            detached: None,
            retiring: Vec::new(),
            started: false,
            timer: None,
            timer_seq: 0,
            fade_due: None,
            advanced_this_turn: false,
            outputs,
            observers: Vec::new(),
            foreground_hooks: HashMap::new(),
        })
    }

    /// Run `hook` every time the slide `id` becomes foreground.
    pub fn on_foreground(&mut self, id: impl Into<String>, hook: ForegroundHook) {
        self.foreground_hooks.entry(id.into()).or_default().push(hook);
    }

    pub fn add_observer(&mut self, observer: Arc<dyn SlideObserver>) {
        self.observers.push(observer);
    }

    #[must_use]
    pub fn phase(&self) -> RotationPhase {
        if self.started {
            RotationPhase::Showing(self.current_index)
        } else {
            RotationPhase::Idle
        }
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    #[must_use]
    pub fn slide_ids(&self) -> Vec<String> {
        self.slides.iter().map(|s| s.descriptor.id.clone()).collect()
    }

    /// Id of the slide currently on screen.
    #[must_use]
    pub fn current_id(&self) -> Option<&str> {
        if !self.started {
            return None;
        }
        match &self.detached {
            Some(state) => Some(state.id()),
            None => self.slides.get(self.current_index).map(SlideState::id),
        }
    }

    #[must_use]
    pub fn pending_timer(&self) -> Option<PendingTimer> {
        self.timer
    }

    #[must_use]
    pub fn snapshot(&self) -> RotationSnapshot {
        RotationSnapshot {
            phase: self.phase(),
            slide_ids: self.slide_ids(),
            current_index: self.current_index,
            current_id: self.current_id().map(str::to_string),
            pending_timer: self.timer,
        }
    }

    /// Earliest instant at which [`fire_due`](Self::fire_due) has work to do.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.timer.map(|t| t.due), self.fade_due) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Mount the current sequence and show the first slide.
    ///
    /// Before this, operations only rearrange the sequence; nothing reaches
    /// the renderer.
    pub fn start(&mut self, now: Instant) {
        if self.started {
            return;
        }
        self.started = true;
        for state in &self.slides {
            self.outputs.renderer.mount(&state.descriptor);
        }
        self.current_index = 0;
        self.activate(0);
        self.schedule(now);
        info!("Rotation started with {} slides", self.slides.len());
    }

    /// Close the current turn. A second [`advance`](Self::advance) within
    /// one turn is ignored.
    pub fn end_turn(&mut self) {
        self.advanced_this_turn = false;
    }

    /// Complete a due cross-fade and run a due auto-advance.
    pub fn fire_due(&mut self, now: Instant) {
        if self.fade_due.is_some_and(|due| due <= now) {
            self.complete_fade();
        }
        if let Some(timer) = self.timer.filter(|t| t.due <= now) {
            self.fire_timer(timer.seq, now);
        }
    }

    /// Advance if `seq` names the outstanding timer; stale timers are ignored.
    pub fn fire_timer(&mut self, seq: u64, now: Instant) {
        match self.timer {
            // Left armed when this turn already advanced; it fires next turn.
            Some(timer) if timer.seq == seq && !self.advanced_this_turn => {
                self.timer = None;
                self.advance(now);
            }
            Some(timer) if timer.seq == seq => {}
            _ => debug!("Ignoring stale timer {}", seq),
        }
    }

    /// Move to the next slide and reschedule the auto-advance timer.
    pub fn advance(&mut self, now: Instant) {
        if !self.started {
            return;
        }
        if self.advanced_this_turn {
            debug!("Advance already taken this turn");
            return;
        }
        self.step(now);
    }

    fn step(&mut self, now: Instant) {
        self.advanced_this_turn = true;
        self.complete_fade();

        let leaving = self.detached.take();
        let next = (self.current_index + 1) % self.slides.len();
        self.current_index = next;
        self.activate(next);
        self.retiring.extend(leaving);

        if self.slides[next].descriptor.fade_enabled {
            self.fade_due = Some(now + FADE_DURATION);
        } else {
            self.background_others();
        }
        self.schedule(now);
        debug!("Showing {} ({})", self.slides[next].id(), next);
    }

    /// Replace the content slides, keeping the lead-in slides and the alert slot.
    ///
    /// Slides whose id survives keep their mounted and animation state; only
    /// new ids are mounted and only vanished ids are unmounted. The slide on
    /// screen is not touched unless the new list drops it, in which case it
    /// stays up until the next scheduled advance.
    pub fn reconcile(&mut self, new_slides: Vec<SlideDescriptor>, now: Instant) {
        let displayed = self.current_id().map(str::to_string);
        let old_index = self.current_index + usize::from(self.detached.is_some());

        let mut old: Vec<SlideState> = std::mem::take(&mut self.slides);
        let mut next: Vec<SlideState> = old.drain(..self.lead_in_len).collect();
        let mut reserved: HashSet<String> = next.iter().map(|s| s.id().to_string()).collect();
        reserved.insert(ALERT_ID.to_string());

        let mut by_id: HashMap<String, SlideState> =
            old.into_iter().map(|s| (s.id().to_string(), s)).collect();
        if let Some(alert) = by_id.remove(ALERT_ID) {
            next.push(alert);
        }
        if let Some(detached) = self.detached.take() {
            by_id.insert(detached.id().to_string(), detached);
        }

        let mut seen = HashSet::new();
        let (mut mounted, mut updated) = (0usize, 0usize);
        for descriptor in new_slides {
            if reserved.contains(&descriptor.id) {
                warn!("Ignoring content slide with reserved id {}", descriptor.id);
                continue;
            }
            if !seen.insert(descriptor.id.clone()) {
                warn!("Ignoring duplicate slide id {}", descriptor.id);
                continue;
            }
            match by_id.remove(&descriptor.id) {
                Some(mut state) => {
                    if self.replace_descriptor(&mut state, descriptor) {
                        updated += 1;
                    }
                    next.push(state);
                }
                None => match self.reclaim(&descriptor.id) {
                    Some(mut state) => {
                        self.replace_descriptor(&mut state, descriptor);
                        next.push(state);
                    }
                    None => {
                        if self.started {
                            self.outputs.renderer.mount(&descriptor);
                        }
                        mounted += 1;
                        next.push(SlideState::new(descriptor));
                    }
                },
            }
        }

        self.slides = next;
        let removed = by_id.len();

        // Whatever is left in `by_id` is gone from the sequence.
        let mut shrank = false;
        for (id, state) in by_id {
            if self.started && displayed.as_deref() == Some(id.as_str()) {
                if old_index < self.slides.len() {
                    self.current_index = old_index - 1;
                } else {
                    self.current_index = self.slides.len() - 1;
                    shrank = true;
                }
                info!("Current slide {} was removed; it stays up until the next advance", id);
                self.detached = Some(state);
            } else {
                self.retire(state);
            }
        }

        if let Some(id) = displayed.as_deref() {
            if let Some(pos) = self.slides.iter().position(|s| s.id() == id) {
                self.current_index = pos;
            }
        }
        self.current_index = self.current_index.min(self.slides.len() - 1);

        info!(
            "Reconciled {} slides: {} mounted, {} updated, {} removed",
            self.slides.len(),
            mounted,
            updated,
            removed
        );

        if shrank {
            warn!("Sequence shrank past the current slide; advancing now");
            self.step(now);
        }
    }

    /// Insert or update the alert slide at its fixed position after the lead-in.
    pub fn upsert_reserved(&mut self, mut slide: SlideDescriptor) {
        slide.id = ALERT_ID.to_string();

        if let Some(pos) = self.position(ALERT_ID) {
            let mut state = self.slides.remove(pos);
            if self.replace_descriptor(&mut state, slide) {
                info!("Alert slide updated in place");
            }
            self.slides.insert(pos, state);
            return;
        }

        let pos = self.lead_in_len;
        let state = match self.reclaim(ALERT_ID) {
            Some(mut state) => {
                self.replace_descriptor(&mut state, slide);
                state
            }
            None => {
                if self.started {
                    self.outputs.renderer.mount(&slide);
                }
                SlideState::new(slide)
            }
        };
        self.slides.insert(pos, state);
        // With a detached slide up, the slide after `current_index` is next;
        // the new alert must not jump ahead of it.
        let displaced = self.current_index >= pos
            || (self.detached.is_some() && self.current_index + 1 == pos);
        if self.started && displaced {
            self.current_index += 1;
        }
        info!("Alert slide inserted at {}", pos);
    }

    /// Remove the alert slide if present. If it is on screen, move on now.
    pub fn remove_reserved(&mut self, now: Instant) {
        let Some(pos) = self.position(ALERT_ID) else {
            return;
        };
        let state = self.slides.remove(pos);
        info!("Alert slide removed");

        let on_screen = self.started && self.detached.is_none() && self.current_index == pos;
        if on_screen {
            self.detached = Some(state);
            self.current_index = pos - 1;
            self.step(now);
            return;
        }

        if self.current_index > pos || (self.detached.is_some() && self.current_index == pos) {
            self.current_index -= 1;
        }
        self.retire(state);
    }

    /// Take back a slide that is fading out so it is not remounted.
    fn reclaim(&mut self, id: &str) -> Option<SlideState> {
        let pos = self.retiring.iter().position(|s| s.id() == id)?;
        Some(self.retiring.remove(pos))
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.slides.iter().position(|s| s.id() == id)
    }

    /// Swap in a new descriptor for a surviving slide, pushing changed field
    /// text and artwork to the renderer. Returns whether anything visible
    /// changed.
    fn replace_descriptor(&self, state: &mut SlideState, descriptor: SlideDescriptor) -> bool {
        if state.descriptor == descriptor {
            return false;
        }
        let values = descriptor.field_values();
        let text_changed = values != state.descriptor.field_values();
        let assets_changed = !descriptor.same_presentation(&state.descriptor);
        if self.started {
            if assets_changed {
                self.outputs.renderer.update_assets(&descriptor);
            }
            if text_changed {
                self.outputs.renderer.update_fields(&descriptor.id, &values);
            }
        }
        state.descriptor = descriptor;
        text_changed || assets_changed
    }

    fn activate(&mut self, index: usize) {
        let state = &mut self.slides[index];
        self.outputs.renderer.set_foreground(state.id());
        state.foreground = true;
        if state.running_map.is_none() {
            if let Some(map) = &state.descriptor.map_ref {
                self.outputs.maps.start(map);
                state.running_map = Some(map.clone());
            }
        }
        for observer in &self.observers {
            observer.slide_activated(&state.descriptor);
        }
        if let Some(hooks) = self.foreground_hooks.get(state.descriptor.id.as_str()) {
            for hook in hooks {
                hook();
            }
        }
    }

    fn deactivate(&self, state: &mut SlideState) {
        if !state.foreground {
            return;
        }
        self.outputs.renderer.set_background(state.id());
        state.foreground = false;
        if let Some(map) = state.running_map.take() {
            self.outputs.maps.stop(&map);
        }
        for observer in &self.observers {
            observer.slide_deactivated(&state.descriptor);
        }
    }

    fn retire(&self, mut state: SlideState) {
        self.deactivate(&mut state);
        if self.started {
            self.outputs.renderer.unmount(state.id());
        }
    }

    fn complete_fade(&mut self) {
        if self.fade_due.take().is_some() {
            self.background_others();
        }
    }

    fn background_others(&mut self) {
        // A detached slide is the one on screen; nothing in the sequence is.
        let keep = self.detached.is_none().then_some(self.current_index);
        let mut slides = std::mem::take(&mut self.slides);
        for (i, state) in slides.iter_mut().enumerate() {
            if Some(i) != keep {
                self.deactivate(state);
            }
        }
        self.slides = slides;
        for state in std::mem::take(&mut self.retiring) {
            self.retire(state);
        }
    }

    fn schedule(&mut self, now: Instant) {
        self.timer_seq += 1;
        let secs = self.slides[self.current_index].descriptor.duration_secs;
        self.timer = Some(PendingTimer {
            seq: self.timer_seq,
            due: now + Duration::from_secs(u64::from(secs)),
        });
    }
}

#[cfg(test)]
mod tests;
