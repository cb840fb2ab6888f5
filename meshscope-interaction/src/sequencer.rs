//! Single-slot "next picked point" requests
//!
//! A measurement command asks the [`InteractionSequencer`] for the next
//! picked vertex and awaits the returned [`PointRequest`]. The pointer
//! handler fulfils the request from its own thread without ever blocking.
//! At most one request is outstanding: a new request replaces the old one,
//! whose waiter then resolves with [`Error::PointRequestAbandoned`].
//!
//! Commands hold a [`CommandToken`] from [`InteractionSequencer::begin_command`].
//! Starting another command or calling [`InteractionSequencer::cancel`]
//! retires every earlier token, and a retired token only ever gets
//! abandoned requests, even between two points.

use meshscope_core::{Error, Point3f, Result};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};

/// Whether a command is waiting for a point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequencerState {
    Idle,
    AwaitingPoint,
}

/// Completion handle for one point request
#[derive(Debug)]
#[must_use = "a point request resolves only when awaited"]
pub struct PointRequest {
    receiver: flume::Receiver<Point3f>,
}

impl PointRequest {
    /// Wait for the pointer handler to supply a point
    pub async fn wait(self) -> Result<Point3f> {
        self.receiver
            .into_recv_async()
            .await
            .map_err(|_| Error::PointRequestAbandoned)
    }

    /// Block the current thread until a point is supplied
    pub fn wait_blocking(self) -> Result<Point3f> {
        self.receiver.recv().map_err(|_| Error::PointRequestAbandoned)
    }

    /// Whether the request can still be fulfilled
    pub fn is_pending(&self) -> bool {
        !self.receiver.is_disconnected() && self.receiver.is_empty()
    }
}

/// Identifies one running command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandToken(u64);

#[derive(Debug, Default)]
struct Slot {
    epoch: u64,
    sender: Option<flume::Sender<Point3f>>,
}

impl Slot {
    fn drop_live(&mut self) -> bool {
        self.sender
            .take()
            .is_some_and(|sender| !sender.is_disconnected())
    }
}

/// Owner of the pending point request slot
#[derive(Debug, Default)]
pub struct InteractionSequencer {
    pending: Mutex<Slot>,
}

impl InteractionSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_pending(&self) -> MutexGuard<'_, Slot> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn open(slot: &mut Slot) -> PointRequest {
        let (sender, receiver) = flume::bounded(1);
        if slot.sender.replace(sender).is_some_and(|sender| !sender.is_disconnected()) {
            tracing::warn!("point request superseded by a newer request");
        }
        PointRequest { receiver }
    }

    /// Open a request for the next picked point
    ///
    /// Replaces any outstanding request.
    pub fn request_next_point(&self) -> PointRequest {
        Self::open(&mut self.lock_pending())
    }

    /// Start a new command, abandoning the one that was running
    pub fn begin_command(&self) -> CommandToken {
        let mut slot = self.lock_pending();
        slot.epoch += 1;
        if slot.drop_live() {
            tracing::debug!(epoch = slot.epoch, "running command abandoned");
        }
        CommandToken(slot.epoch)
    }

    /// Whether `token` belongs to the most recently started command
    ///
    /// Turns false once another command starts or [`cancel`](Self::cancel) runs.
    pub fn is_active(&self, token: CommandToken) -> bool {
        self.lock_pending().epoch == token.0
    }

    /// Open a request on behalf of the command holding `token`
    ///
    /// A retired token gets a request that is already abandoned.
    pub fn request_point_for(&self, token: CommandToken) -> PointRequest {
        let mut slot = self.lock_pending();
        if slot.epoch != token.0 {
            tracing::debug!(epoch = token.0, current = slot.epoch, "point request from a retired command");
            let (sender, receiver) = flume::bounded(1);
            drop(sender);
            return PointRequest { receiver };
        }
        Self::open(&mut slot)
    }

    /// Hand `point` to the waiting command
    ///
    /// Returns false without effect when nothing is waiting.
    pub fn fulfill(&self, point: Point3f) -> bool {
        let Some(sender) = self.lock_pending().sender.take() else {
            return false;
        };

        match sender.try_send(point) {
            Ok(()) => {
                tracing::debug!(?point, "point request fulfilled");
                true
            }
            Err(_) => {
                tracing::debug!("point request waiter is gone");
                false
            }
        }
    }

    /// Drop any outstanding request and retire the running command
    ///
    /// The waiter resolves as abandoned. Returns whether a live request was
    /// cancelled.
    pub fn cancel(&self) -> bool {
        let mut slot = self.lock_pending();
        slot.epoch += 1;
        let cancelled = slot.drop_live();
        if cancelled {
            tracing::debug!("point request cancelled");
        }
        cancelled
    }

    pub fn state(&self) -> SequencerState {
        match self.lock_pending().sender.as_ref() {
            Some(sender) if !sender.is_disconnected() => SequencerState::AwaitingPoint,
            _ => SequencerState::Idle,
        }
    }
}
