//! # Transport Factory
//!
//! Builds the channel used to reach the sync service and binds it to the generated
//! `SyncService` stub.
//!
//! The factory is purely local: the channel it returns connects lazily on first use,
//! so the only failures that can come out of [`build_client`] are configuration errors
//! (a malformed URL, an unsupported scheme or an invalid header).
//!
//! ## Timeouts
//!
//! Each timeout in [`TransportConfig`] is optional, a zero duration meaning "no timeout":
//!
//! * `call_timeout` bounds a whole call. The channel applies it to the response headers
//!   and the [`Session`](crate::session::Session) applies it to the stream as a whole.
//! * `read_timeout` and `write_timeout` are enforced per message by the session.
pub mod config;
pub mod interceptor;

pub use config::{HeaderSet, ProtocolMode, StreamTimeouts, TransportConfig};
pub use interceptor::{HeaderInterceptor, InvalidHeader};

use crate::BoxError;
use http_body::Body as HttpBody;
use sync_protocol::SyncServiceClient;
use tonic::{
    client::GrpcService,
    service::interceptor::InterceptedService,
    transport::{Channel, Endpoint},
};

/// Transport with the header interceptor layered on top of `S`.
pub type Intercepted<S> = InterceptedService<S, HeaderInterceptor>;

#[derive(Debug, thiserror::Error)]
pub enum BuildClientError {
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: http::uri::InvalidUri,
    },
    #[error("URL '{0}' has no host")]
    MissingHost(String),
    #[error("URL '{url}' cannot be used with {mode:?}, expected an 'http' scheme")]
    UnsupportedScheme { url: String, mode: ProtocolMode },
    #[error(transparent)]
    InvalidHeader(#[from] InvalidHeader),
}

/// A configured handle to the sync service.
///
/// Cloning is cheap: clones share the underlying connection.
#[derive(Debug, Clone)]
pub struct SyncStub<T = Intercepted<Channel>> {
    transport: T,
    timeouts: StreamTimeouts,
}

/// Builds a [`SyncStub`] from `config`.
///
/// Must be called from within a Tokio runtime. No network traffic happens until the
/// first session is opened on the returned stub.
pub fn build_client(config: &TransportConfig) -> Result<SyncStub, BuildClientError> {
    let endpoint = endpoint(config)?;
    let interceptor = HeaderInterceptor::new(&config.headers)?;

    tracing::debug!(
        url = %config.base_url,
        mode = ?config.protocol_mode,
        headers = ?config.headers.iter().map(|(name, _)| name).collect::<Vec<_>>(),
        "built sync transport"
    );

    Ok(SyncStub::from_service(
        endpoint.connect_lazy(),
        interceptor,
        StreamTimeouts::from(config),
    ))
}

fn endpoint(config: &TransportConfig) -> Result<Endpoint, BuildClientError> {
    let url = &config.base_url;
    let uri: http::Uri = url
        .parse()
        .map_err(|source| BuildClientError::InvalidUrl {
            url: url.clone(),
            source,
        })?;

    if uri.host().is_none() {
        return Err(BuildClientError::MissingHost(url.clone()));
    }

    match config.protocol_mode {
        ProtocolMode::Http2PriorKnowledge if uri.scheme_str() != Some("http") => {
            return Err(BuildClientError::UnsupportedScheme {
                url: url.clone(),
                mode: config.protocol_mode,
            });
        }
        ProtocolMode::Http2PriorKnowledge => {}
    }

    let endpoint = Endpoint::from(uri);
    let endpoint = match StreamTimeouts::from(config).call {
        Some(timeout) => endpoint.timeout(timeout),
        None => endpoint,
    };

    Ok(endpoint)
}

impl<S> SyncStub<Intercepted<S>> {
    /// Wraps an existing service (a `Channel`, or an in-process server) with the
    /// header interceptor.
    pub fn from_service(
        service: S,
        interceptor: HeaderInterceptor,
        timeouts: StreamTimeouts,
    ) -> Self {
        Self {
            transport: InterceptedService::new(service, interceptor),
            timeouts,
        }
    }
}

impl<T> SyncStub<T> {
    pub fn timeouts(&self) -> StreamTimeouts {
        self.timeouts
    }
}

impl<T> SyncStub<T>
where
    T: GrpcService<tonic::body::Body> + Clone,
    T::Error: Into<BoxError>,
    T::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <T::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    /// A fresh generated client sharing this stub's transport.
    pub fn client(&self) -> SyncServiceClient<T> {
        SyncServiceClient::new(self.transport.clone())
    }
}
