//! Transport between the main side and the extension host.
//!
//! Messages are JSON bodies framed with a `Content-Length` header and carried
//! over any `AsyncRead`/`AsyncWrite` pair: a child process's stdio, or an
//! in-memory duplex pipe when both sides run in one process.
//!
//! A [`Connection`] pumps inbound messages into a [`Dispatcher`]; its
//! [`Peer`] sends notifications and calls in the other direction. Proxies
//! wrap a peer and implement the remote side's shape, so callers never deal
//! with messages directly.
//!
//! Cancellation is out-of-band: cancelling the token of a pending call
//! forgets it locally and sends a `cancel` message, which cancels the token
//! handed to the remote handler.

pub mod connection;
pub mod dispatch;
pub mod framing;
pub mod message;
pub mod peer;
pub mod proxy;

pub use connection::Connection;
pub use dispatch::{Dispatcher, ExtHostDispatcher, MainThreadDispatcher};
pub use message::{Call, Message, Notification, Outcome, RequestId};
pub use peer::Peer;
pub use proxy::{ExtHostProxy, MainThreadProxy};
