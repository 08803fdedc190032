// SPDX-License-Identifier: MPL-2.0
//! Background refill worker.
//!
//! One thread per source. The worker sleeps until woken, then decodes the
//! missing in-window frame nearest to the playback cursor, commits it, evicts
//! everything outside the window and repeats until the window is full.
//!
//! When the codec offers a [`FrameSequence`] the worker owns it for the life
//! of the thread. The window is scanned forward from the cursor, so most
//! decodes continue from the previous frame instead of replaying the file.

use super::store::{FrameStore, WorkerState};
use crate::application::port::{AnimationCodec, FrameSequence};
use crate::error::Result;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

/// Commands sent to the refill thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorkerCommand {
    /// Cursor, budget or cap changed; re-evaluate the window.
    Wake,
    /// Exit the thread.
    Stop,
}

/// Handle to the refill thread.
///
/// The thread is detached: teardown goes through [`FrameStore::shutdown`], so
/// the owner never waits for a decode in progress.
#[derive(Debug)]
pub(crate) struct RefillWorker {
    command_tx: Sender<WorkerCommand>,
}

impl RefillWorker {
    /// Spawns the refill thread for `store`.
    pub(crate) fn spawn(
        store: Arc<FrameStore>,
        codec: Arc<dyn AnimationCodec>,
        data: Arc<[u8]>,
    ) -> Result<Self> {
        // A single pending wake is enough: the worker always re-reads the
        // latest cursor.
        let (command_tx, command_rx) = bounded::<WorkerCommand>(1);

        thread::Builder::new()
            .name("frame-refill".into())
            .spawn(move || {
                refill_loop(&store, codec.as_ref(), &data, &command_rx);
            })?;

        Ok(Self { command_tx })
    }

    /// Nudges the worker. Never blocks; a wake already queued is enough.
    pub(crate) fn wake(&self) {
        let _ = self.command_tx.try_send(WorkerCommand::Wake);
    }

    pub(crate) fn stop(&self) {
        let _ = self.command_tx.try_send(WorkerCommand::Stop);
    }
}

fn refill_loop(
    store: &FrameStore,
    codec: &dyn AnimationCodec,
    data: &Arc<[u8]>,
    commands: &Receiver<WorkerCommand>,
) {
    // Indices that failed to decode are never retried.
    let mut failed: HashSet<usize> = HashSet::new();
    let mut state = WorkerState::Idle;
    let mut sequence: Option<Box<dyn FrameSequence>> = codec.sequence(Arc::clone(data));

    loop {
        if store.is_stopped() {
            break;
        }

        let window = store.snapshot_window(Instant::now());
        if store.commit(None, &window).is_none() {
            break;
        }

        let missing = window
            .indices()
            .find(|index| !failed.contains(index) && !store.is_resident(*index));

        if let Some(index) = missing {
            if state != WorkerState::Filling {
                tracing::debug!(cursor = window.start(), window = window.len(), "refill started");
                state = WorkerState::Filling;
                store.set_state(state);
            }

            let decoded = match sequence.as_mut() {
                Some(sequence) => sequence.decode(index),
                None => codec.decode_frame(data, index),
            };
            match decoded {
                Ok(frame) => {
                    let window = store.snapshot_window(Instant::now());
                    if store.commit(Some((index, Arc::new(frame))), &window).is_none() {
                        break;
                    }
                }
                Err(err) => {
                    tracing::warn!(index, codec = codec.name(), error = %err, "frame decode failed, skipping");
                    failed.insert(index);
                }
            }
            continue;
        }

        if state != WorkerState::Idle {
            tracing::debug!(frames = store.resident_indices().len(), "refill complete");
            state = WorkerState::Idle;
            store.set_state(state);
        }

        let command = match store.pressure_remaining(Instant::now()) {
            // Wake up on our own when the memory-warning cap expires.
            Some(remaining) => match commands.recv_timeout(remaining) {
                Ok(command) => command,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            },
            None => match commands.recv() {
                Ok(command) => command,
                Err(_) => break,
            },
        };

        if command == WorkerCommand::Stop {
            break;
        }
    }

    tracing::debug!("refill worker exited");
}
