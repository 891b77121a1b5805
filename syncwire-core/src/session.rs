//! # Duplex Session
//!
//! A [`Session`] is one open `Synchronize` call with its two directions split apart:
//!
//! * The **outbound** side is an [`Outbound`] handle backed by a bounded channel. The
//!   channel's receiver is the request stream handed to `tonic`, so messages are written in
//!   the order they were enqueued.
//! * The **inbound** side is a stream of resolved [`ServerEvent`]s, fed by a drain task
//!   spawned when the session opens. It can be taken once with [`Session::observe`].
//!
//! Neither side waits on the other: a consumer that never reads inbound events does not
//! stop sends, and a blocked send does not stop the drain task.
//!
//! ## Lifecycle
//!
//! ```text
//! open ──► Open ──► Closed
//!            │        ▲
//!            └────────┘  lifecycle ended, session closed or dropped,
//!                        stream finished or failed
//! ```
//!
//! Closing cancels the session's token. The drain task drops the response stream, the
//! request stream ends, and every pending or later send fails with
//! [`SessionError::Closed`]. Nothing is retried and nothing reconnects.
mod inbound;
mod outbound;

pub use outbound::Outbound;

use crate::{
    BoxError,
    envelope::{Envelope, EnvelopeError, ServerEvent},
    lifecycle::Lifecycle,
    transport::SyncStub,
};
use futures_util::StreamExt;
use http_body::Body as HttpBody;
use inbound::Drain;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::{ReceiverStream, UnboundedReceiverStream};
use tokio_util::sync::CancellationToken;
use tonic::client::GrpcService;

/// Number of outbound messages buffered before `send` waits on backpressure.
pub const CHANNEL_CAPACITY: usize = 32;

/// One resolved server message, or the error raised while receiving it.
pub type InboundItem = Result<ServerEvent, SessionError>;

/// Inbound side of a session.
///
/// Unbounded: the drain task never waits on the consumer, so a slow or absent reader
/// cannot hold up the outbound direction.
pub type InboundStream = UnboundedReceiverStream<InboundItem>;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("The session is closed")]
    Closed,
    #[error("Inbound messages were already taken from this session")]
    AlreadyObserved,
    #[error("The transport did not accept the message within {0:?}")]
    WriteTimeout(Duration),
    #[error("No message received from the server within {0:?}")]
    ReadTimeout(Duration),
    #[error("The sync call did not finish within {0:?}")]
    CallTimeout(Duration),
    #[error("Sync stream failed: {0}")]
    Transport(#[from] tonic::Status),
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Closed,
}

/// An open duplex stream to the sync service.
///
/// Owned by whoever opened it; dropping it closes it.
#[derive(Debug)]
pub struct Session {
    outbound: Outbound,
    inbound: Option<mpsc::UnboundedReceiver<InboundItem>>,
    token: CancellationToken,
    released: CancellationToken,
}

impl Session {
    /// Opens a `Synchronize` call on `stub`, scoped to `lifecycle`.
    ///
    /// Returns immediately: the call is started by a spawned drain task, which then
    /// forwards server messages until the stream ends or the session is cancelled.
    /// Must be called from within a Tokio runtime.
    pub fn open<T>(stub: &SyncStub<T>, lifecycle: &Lifecycle) -> Self
    where
        T: GrpcService<tonic::body::Body> + Clone + Send + 'static,
        T::Future: Send,
        T::Error: Into<BoxError>,
        T::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
        <T::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
    {
        let token = lifecycle.child_token();
        let released = CancellationToken::new();
        let timeouts = stub.timeouts();

        let (outbound_tx, outbound_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        // The request stream finishes as soon as the session is cancelled.
        let requests =
            ReceiverStream::new(outbound_rx).take_until(token.clone().cancelled_owned());

        let drain = Drain {
            client: stub.client(),
            inbound: inbound_tx,
            token: token.clone(),
            released: released.clone(),
            read_timeout: timeouts.read,
            call_timeout: timeouts.call,
        };
        tokio::spawn(drain.run(requests));

        tracing::info!("sync session opened");

        Self {
            outbound: Outbound::new(outbound_tx, token.clone(), timeouts.write),
            inbound: Some(inbound_rx),
            token,
            released,
        }
    }

    /// Sends one envelope. See [`Outbound::send`].
    pub async fn send(&self, envelope: Envelope) -> Result<(), SessionError> {
        self.outbound.send(envelope).await
    }

    /// A handle for sending from other tasks.
    pub fn outbound(&self) -> Outbound {
        self.outbound.clone()
    }

    /// Takes the inbound side of the session.
    ///
    /// The stream yields one item per server message and ends when the session closes.
    /// A transport failure or an expired timeout shows up as a single error item right
    /// before the end. Messages received before this is called are kept. It can only be
    /// taken once.
    pub fn observe(&mut self) -> Result<InboundStream, SessionError> {
        self.inbound
            .take()
            .map(UnboundedReceiverStream::new)
            .ok_or(SessionError::AlreadyObserved)
    }

    pub fn state(&self) -> SessionState {
        if self.token.is_cancelled() {
            SessionState::Closed
        } else {
            SessionState::Open
        }
    }

    /// Resolves once the drain task has exited and the stream is released.
    pub async fn closed(&self) {
        self.released.cancelled().await
    }

    /// Closes the session and waits until the stream is released.
    pub async fn close(self) {
        self.token.cancel();
        self.released.cancelled().await;
        tracing::info!("sync session closed");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
