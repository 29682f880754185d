use dashmap::DashMap;
use mapped_edits_core::{MappedEditsError, Result};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::message::{Call, Message, Notification, Outcome, RequestId};

/// Sending half of a connection.
///
/// Cheap to clone. Outbound messages are queued and written by the
/// connection in the order they were sent.
#[derive(Clone)]
pub struct Peer {
    inner: Arc<PeerInner>,
}

struct PeerInner {
    next_id: AtomicU64,
    pending: DashMap<RequestId, oneshot::Sender<Outcome>>,
    outbound: mpsc::UnboundedSender<Message>,
    closed: CancellationToken,
}

impl Peer {
    pub(crate) fn new(outbound: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            inner: Arc::new(PeerInner {
                next_id: AtomicU64::new(1),
                pending: DashMap::new(),
                outbound,
                closed: CancellationToken::new(),
            }),
        }
    }

    pub fn notify(&self, notification: Notification) -> Result<()> {
        self.send(Message::Notification { notification })
    }

    /// Sends `call` and waits for its outcome.
    ///
    /// When `token` is cancelled first, the pending call is forgotten, the
    /// remote side is told to cancel, and `Outcome::Cancelled` is returned
    /// without waiting for the reply.
    pub async fn call(&self, call: Call, token: &CancellationToken) -> Result<Outcome> {
        if token.is_cancelled() {
            return Ok(Outcome::Cancelled);
        }

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.inner.pending.insert(id, tx);

        // close() sets the flag before draining, so a late insert is caught here
        if self.is_closed() {
            self.inner.pending.remove(&id);
            return Err(MappedEditsError::Disconnected);
        }
        if let Err(e) = self.send(Message::Request { id, call }) {
            self.inner.pending.remove(&id);
            return Err(e);
        }

        tokio::select! {
            biased;
            () = token.cancelled() => {
                self.inner.pending.remove(&id);
                if let Err(e) = self.send(Message::Cancel { id }) {
                    tracing::debug!("could not forward cancellation of request {}: {}", id, e);
                }
                Ok(Outcome::Cancelled)
            }
            outcome = rx => outcome.map_err(|_| MappedEditsError::Disconnected),
        }
    }

    /// Delivers a response to the waiting caller.
    pub(crate) fn complete(&self, id: RequestId, outcome: Outcome) {
        match self.inner.pending.remove(&id) {
            Some((_, tx)) => {
                if tx.send(outcome).is_err() {
                    tracing::debug!("caller of request {} went away", id);
                }
            }
            None => tracing::debug!("dropping response to unknown or cancelled request {}", id),
        }
    }

    pub(crate) fn send(&self, message: Message) -> Result<()> {
        if self.is_closed() {
            return Err(MappedEditsError::Disconnected);
        }
        self.inner
            .outbound
            .send(message)
            .map_err(|_| MappedEditsError::Disconnected)
    }

    /// Marks the connection closed and fails every pending call.
    pub(crate) fn close(&self) {
        self.inner.closed.cancel();
        // dropping the senders wakes callers with Disconnected
        self.inner.pending.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.is_cancelled()
    }

    /// Resolves once the connection has closed.
    pub async fn closed(&self) {
        self.inner.closed.cancelled().await;
    }

    /// Number of calls still waiting for a response.
    pub fn pending_count(&self) -> usize {
        self.inner.pending.len()
    }
}

impl fmt::Debug for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Peer")
            .field("pending", &self.inner.pending.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}
