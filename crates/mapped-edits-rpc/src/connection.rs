use dashmap::DashMap;
use mapped_edits_core::Result;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::dispatch::Dispatcher;
use crate::framing::{read_frame, write_frame};
use crate::message::{Message, RequestId};
use crate::peer::Peer;

/// Message pump over a reader/writer pair.
///
/// # Examples
///
/// ```no_run
/// use mapped_edits_rpc::{Connection, Dispatcher};
/// use std::sync::Arc;
///
/// # async fn run(dispatcher: Arc<dyn Dispatcher>) -> mapped_edits_core::Result<()> {
/// let (peer, connection) = Connection::new(tokio::io::stdin(), tokio::io::stdout());
/// // hand `peer` to the proxies, then pump until EOF
/// # drop(peer);
/// connection.serve(dispatcher).await
/// # }
/// ```
pub struct Connection<R, W> {
    reader: R,
    writer: W,
    outbound: mpsc::UnboundedReceiver<Message>,
    peer: Peer,
}

impl<R, W> Connection<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(reader: R, writer: W) -> (Peer, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        let peer = Peer::new(tx);
        let connection = Self {
            reader,
            writer,
            outbound: rx,
            peer: peer.clone(),
        };
        (peer, connection)
    }

    /// Pumps messages until the remote side closes the stream.
    ///
    /// On return every in-flight inbound call has been cancelled and every
    /// pending outbound call fails with `Disconnected`.
    pub async fn serve(self, dispatcher: Arc<dyn Dispatcher>) -> Result<()> {
        let Self {
            reader,
            writer,
            outbound,
            peer,
        } = self;

        let writer_task = tokio::spawn(write_loop(writer, outbound, peer.clone()));
        let shutdown = CancellationToken::new();

        let result = read_loop(reader, dispatcher, &peer, &shutdown).await;

        shutdown.cancel();
        peer.close();
        if let Err(e) = writer_task.await {
            tracing::warn!("writer task failed: {}", e);
        }
        result
    }
}

async fn read_loop<R>(
    reader: R,
    dispatcher: Arc<dyn Dispatcher>,
    peer: &Peer,
    shutdown: &CancellationToken,
) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = String::new();
    let inflight: Arc<DashMap<RequestId, CancellationToken>> = Arc::new(DashMap::new());

    loop {
        let body = match read_frame(&mut reader, &mut buf).await? {
            Some(body) => body,
            None => {
                tracing::info!("connection closed by remote side");
                return Ok(());
            }
        };

        let message = match Message::decode(&body) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("dropping malformed frame: {}", e);
                continue;
            }
        };

        match message {
            Message::Request { id, call } => {
                let token = shutdown.child_token();
                inflight.insert(id, token.clone());

                let dispatcher = Arc::clone(&dispatcher);
                let inflight = Arc::clone(&inflight);
                let peer = peer.clone();
                tokio::spawn(async move {
                    let outcome = dispatcher.handle_call(call, token).await;
                    inflight.remove(&id);
                    if let Err(e) = peer.send(Message::Response { id, outcome }) {
                        tracing::debug!("could not reply to request {}: {}", id, e);
                    }
                });
            }
            Message::Response { id, outcome } => peer.complete(id, outcome),
            Message::Notification { notification } => {
                if let Err(e) = dispatcher.handle_notification(notification) {
                    tracing::warn!("notification failed: {}", e);
                }
            }
            Message::Cancel { id } => match inflight.get(&id) {
                Some(token) => token.cancel(),
                None => tracing::debug!("cancel for finished request {}", id),
            },
        }
    }
}

async fn write_loop<W>(mut writer: W, mut outbound: mpsc::UnboundedReceiver<Message>, peer: Peer)
where
    W: AsyncWrite + Unpin,
{
    loop {
        let message = tokio::select! {
            message = outbound.recv() => message,
            () = peer.closed() => None,
        };
        let Some(message) = message else {
            return;
        };

        let body = match message.encode() {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("dropping unencodable message: {}", e);
                continue;
            }
        };
        if let Err(e) = write_frame(&mut writer, &body).await {
            tracing::error!("write failed, closing connection: {}", e);
            peer.close();
            return;
        }
    }
}
