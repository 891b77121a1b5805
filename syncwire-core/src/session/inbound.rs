//! The drain task: owns the call and forwards server messages to the session's
//! inbound channel until the stream ends or the session is cancelled.
use super::{InboundItem, SessionError};
use crate::{BoxError, envelope::ServerEvent};
use futures_util::Stream;
use http_body::Body as HttpBody;
use std::time::Duration;
use sync_protocol::{ClientMessage, ServerMessage, SyncServiceClient};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tonic::{Streaming, client::GrpcService};

pub(super) struct Drain<T> {
    pub client: SyncServiceClient<T>,
    pub inbound: mpsc::UnboundedSender<InboundItem>,
    pub token: CancellationToken,
    pub released: CancellationToken,
    pub read_timeout: Option<Duration>,
    pub call_timeout: Option<Duration>,
}

impl<T> Drain<T>
where
    T: GrpcService<tonic::body::Body>,
    T::Error: Into<BoxError>,
    T::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <T::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    pub async fn run(mut self, requests: impl Stream<Item = ClientMessage> + Send + 'static) {
        // Whatever way this task exits, the session reports itself released.
        let _released = self.released.clone().drop_guard();

        // The call deadline covers the whole stream, not only the response headers.
        if let Some(limit) = self.call_timeout {
            if tokio::time::timeout(limit, self.serve(requests)).await.is_err() {
                tracing::warn!(?limit, "sync call exceeded its deadline");
                self.forward(Err(SessionError::CallTimeout(limit)));
            }
        } else {
            self.serve(requests).await;
        }

        // Closes the outbound stream too, so no further sends are accepted.
        self.token.cancel();
        tracing::debug!("sync stream released");
    }

    async fn serve(&mut self, requests: impl Stream<Item = ClientMessage> + Send + 'static) {
        let response = tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                tracing::debug!("session cancelled before the stream opened");
                return;
            }
            response = self.client.synchronize(requests) => response,
        };

        match response {
            Ok(response) => {
                tracing::debug!("sync stream opened");
                self.forward_all(response.into_inner()).await;
            }
            Err(status) => {
                tracing::warn!(
                    code = ?status.code(),
                    message = status.message(),
                    "failed to open sync stream"
                );
                self.forward(Err(SessionError::Transport(status)));
            }
        }
    }

    async fn forward_all(&mut self, mut stream: Streaming<ServerMessage>) {
        loop {
            let next = tokio::select! {
                biased;
                _ = self.token.cancelled() => return,
                next = next_message(&mut stream, self.read_timeout) => next,
            };

            match next {
                Ok(Some(message)) => {
                    let event = ServerEvent::try_from(message).map_err(SessionError::from);
                    if let Err(err) = &event {
                        tracing::warn!(%err, "server message could not be resolved");
                    }
                    self.forward(event);
                }
                Ok(None) => {
                    tracing::debug!("server closed the sync stream");
                    return;
                }
                Err(err) => {
                    tracing::warn!(%err, "sync stream failed");
                    self.forward(Err(err));
                    return;
                }
            }
        }
    }

    /// Hands one item to the consumer without waiting on it.
    ///
    /// Items queue up until the inbound stream is observed, and are discarded once it
    /// has been dropped.
    fn forward(&self, item: InboundItem) {
        if let Ok(event) = &item {
            tracing::debug!(?event, "received server event");
        }

        if self.inbound.send(item).is_err() {
            tracing::trace!("inbound consumer is gone, discarding server event");
        }
    }
}

async fn next_message(
    stream: &mut Streaming<ServerMessage>,
    read_timeout: Option<Duration>,
) -> Result<Option<ServerMessage>, SessionError> {
    let message = match read_timeout {
        Some(limit) => tokio::time::timeout(limit, stream.message())
            .await
            .map_err(|_| SessionError::ReadTimeout(limit))?,
        None => stream.message().await,
    };

    message.map_err(SessionError::Transport)
}
