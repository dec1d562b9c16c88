//! Request/response correlation.
//!
//! Every outbound command is assigned a monotonically increasing
//! [`RequestID`] and parked on a buffered, single-delivery slot. When the
//! connection supervisor decodes an [`ApiResponse`](crate::model::ApiResponse)
//! sequence it hands the whole batch to [`Correlator::publish`], which
//! matches each response against its waiting slot and opportunistically
//! evicts slots whose deadline has already passed — mirroring a swap-remove
//! sweep rather than a background reaper task.

use std::time::Duration;

use tokio::sync::{oneshot, Mutex};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, StreamError};
use crate::model::{ApiResponse, RequestID};

struct Slot {
    id: RequestID,
    deadline: Instant,
    tx: oneshot::Sender<ApiResponse>,
}

struct State {
    next_id: u64,
    slots: Vec<Slot>,
}

/// Parks callers on one-shot slots keyed by [`RequestID`] and resolves them
/// as correlated responses arrive.
pub struct Correlator {
    state: Mutex<State>,
}

impl Correlator {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_id: 0,
                slots: Vec::new(),
            }),
        }
    }

    /// Allocate a new request ID and a receiver that resolves when the
    /// matching response is published, times out, or the slot is evicted.
    /// The returned [`Instant`] is the deadline the caller should race
    /// against in [`Correlator::await_response`].
    pub async fn new_pending(
        &self,
        timeout: Duration,
    ) -> (RequestID, oneshot::Receiver<ApiResponse>, Instant) {
        let mut state = self.state.lock().await;
        let id = RequestID::next(state.next_id);
        state.next_id += 1;

        let deadline = Instant::now() + timeout;
        let (tx, rx) = oneshot::channel();
        state.slots.push(Slot { id, deadline, tx });
        (id, rx, deadline)
    }

    /// Deliver a batch of responses to their matching slots, dropping any
    /// slot whose deadline has already elapsed along the way.
    pub async fn publish(&self, mut responses: Vec<ApiResponse>) {
        if responses.is_empty() {
            return;
        }

        let mut state = self.state.lock().await;
        let now = Instant::now();
        let mut kept = Vec::with_capacity(state.slots.len());

        for slot in state.slots.drain(..) {
            if slot.deadline <= now {
                tracing::debug!(request_id = %slot.id, "evicting expired correlator slot");
                drop(slot.tx);
                continue;
            }

            if let Some(pos) = responses.iter().position(|r| r.request_id == slot.id) {
                let response = responses.swap_remove(pos);
                let _ = slot.tx.send(response);
                continue;
            }

            kept.push(slot);
        }

        state.slots = kept;
    }

    /// Await a previously allocated slot, racing both the request's own
    /// deadline and the connection's cancellation token so a torn-down
    /// session never leaves a caller parked forever.
    pub async fn await_response(
        &self,
        rx: oneshot::Receiver<ApiResponse>,
        deadline: Instant,
        connection_cancel: &CancellationToken,
    ) -> Result<ApiResponse> {
        tokio::select! {
            biased;
            () = connection_cancel.cancelled() => Err(StreamError::ConnectionClosed),
            () = tokio::time::sleep_until(deadline) => Err(StreamError::Timeout),
            result = rx => result.map_err(|_| StreamError::ForcedTimeout),
        }
    }

    #[cfg(test)]
    async fn pending_count(&self) -> usize {
        self.state.lock().await.slots.len()
    }
}

impl Default for Correlator {
    fn default() -> Self {
        Self::new()
    }
}
