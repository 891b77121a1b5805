use super::SessionError;
use crate::envelope::Envelope;
use std::time::Duration;
use sync_protocol::ClientMessage;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Send side of a [`Session`](super::Session).
///
/// Cheap to clone; every clone feeds the same outbound stream. Messages sent one after
/// the other through any handle reach the server in that order.
#[derive(Debug, Clone)]
pub struct Outbound {
    tx: mpsc::Sender<ClientMessage>,
    token: CancellationToken,
    write_timeout: Option<Duration>,
}

impl Outbound {
    pub(super) fn new(
        tx: mpsc::Sender<ClientMessage>,
        token: CancellationToken,
        write_timeout: Option<Duration>,
    ) -> Self {
        Self {
            tx,
            token,
            write_timeout,
        }
    }

    /// Validates and enqueues one envelope.
    ///
    /// Waits only while the transport applies backpressure, bounded by the write timeout
    /// when one is configured. Delivery is at most once: if the session closes before the
    /// message is written it is dropped, and nothing acknowledges it afterwards.
    pub async fn send(&self, envelope: Envelope) -> Result<(), SessionError> {
        envelope.validate()?;

        if self.token.is_cancelled() {
            return Err(SessionError::Closed);
        }

        tracing::debug!(
            correlation_id = envelope.correlation_id(),
            type_tag = envelope.type_tag(),
            bytes = envelope.payload().len(),
            "sending envelope"
        );

        let message = envelope.into_client_message();

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(SessionError::Closed),
            sent = self.enqueue(message) => sent,
        }
    }

    async fn enqueue(&self, message: ClientMessage) -> Result<(), SessionError> {
        let send = self.tx.send(message);

        let sent = match self.write_timeout {
            Some(limit) => tokio::time::timeout(limit, send)
                .await
                .map_err(|_| SessionError::WriteTimeout(limit))?,
            None => send.await,
        };

        sent.map_err(|_| SessionError::Closed)
    }

    /// Whether the session stopped accepting messages.
    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled() || self.tx.is_closed()
    }
}
