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

//! Async driver for [`SlideRotator`].
//!
//! One task owns the rotator. Commands from other components and timer
//! expirations are applied on that task only, so no operation can observe
//! another half-done. Commands that arrive together are applied as one turn.

use log::{debug, info};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use super::{RotationSnapshot, SlideRotator};
use crate::model::SlideDescriptor;

/// The mutating operations other components may request.
pub trait RotationControl: Send + Sync {
    /// Replace the content slides.
    fn reconcile(&self, slides: Vec<SlideDescriptor>);

    /// Insert or update the alert slide.
    fn upsert_reserved(&self, slide: SlideDescriptor);

    /// Remove the alert slide if present.
    fn remove_reserved(&self);
}

enum Command {
    Reconcile(Vec<SlideDescriptor>),
    UpsertReserved(SlideDescriptor),
    RemoveReserved,
    Advance,
    Snapshot(oneshot::Sender<RotationSnapshot>),
}

/// Handle to a rotator running on its own task.
#[derive(Debug, Clone)]
pub struct RotatorHandle {
    command_tx: mpsc::UnboundedSender<Command>,
    cancel_token: CancellationToken,
}

impl RotatorHandle {
    /// Start `rotator` on a new task and begin showing slides.
    #[must_use]
    pub fn spawn(rotator: SlideRotator) -> (Self, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let cancel_token = CancellationToken::new();
        let task = tokio::spawn(drive(rotator, command_rx, cancel_token.clone()));
        (
            Self {
                command_tx,
                cancel_token,
            },
            task,
        )
    }

    /// Skip to the next slide now.
    pub fn advance(&self) {
        self.send(Command::Advance);
    }

    /// Current rotation state, or `None` once the driver has stopped.
    pub async fn snapshot(&self) -> Option<RotationSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx));
        rx.await.ok()
    }

    /// Stop the driver task.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }

    fn send(&self, command: Command) {
        if self.command_tx.send(command).is_err() {
            debug!("Rotation driver has stopped; command dropped");
        }
    }
}

impl RotationControl for RotatorHandle {
    fn reconcile(&self, slides: Vec<SlideDescriptor>) {
        self.send(Command::Reconcile(slides));
    }

    fn upsert_reserved(&self, slide: SlideDescriptor) {
        self.send(Command::UpsertReserved(slide));
    }

    fn remove_reserved(&self) {
        self.send(Command::RemoveReserved);
    }
}

async fn drive(
    mut rotator: SlideRotator,
    mut command_rx: mpsc::UnboundedReceiver<Command>,
    cancel_token: CancellationToken,
) {
    rotator.start(Instant::now());
    rotator.end_turn();

    loop {
        let deadline = rotator.next_deadline();

        tokio::select! {
            biased;

            () = cancel_token.cancelled() => {
                info!("Rotation driver cancelled");
                return;
            }

            command = command_rx.recv() => {
                let Some(command) = command else {
                    info!("All rotation handles dropped; stopping driver");
                    return;
                };
                let now = Instant::now();
                apply(&mut rotator, command, now);
                while let Ok(command) = command_rx.try_recv() {
                    apply(&mut rotator, command, now);
                }
            }

            () = wait_until(deadline) => {
                rotator.fire_due(Instant::now());
            }
        }

        rotator.end_turn();
    }
}

fn apply(rotator: &mut SlideRotator, command: Command, now: Instant) {
    match command {
        Command::Reconcile(slides) => rotator.reconcile(slides, now),
        Command::UpsertReserved(slide) => rotator.upsert_reserved(slide),
        Command::RemoveReserved => rotator.remove_reserved(now),
        Command::Advance => rotator.advance(now),
        Command::Snapshot(reply) => {
            let _ = reply.send(rotator.snapshot());
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
