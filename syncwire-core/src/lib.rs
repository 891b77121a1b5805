//! # Syncwire Core
//!
//! `syncwire-core` opens bidirectional `Synchronize` streams to a sync service and keeps
//! their two directions independent of each other.
//!
//! ## Key Components
//!
//! * **[`transport::build_client`]:** Builds a [`SyncStub`] from a [`TransportConfig`]: a
//!   lazily connected HTTP/2 (prior knowledge) channel with static headers injected into
//!   every request.
//! * **[`Session`]:** One open duplex stream. Sends go through [`Session::send`] or a cloned
//!   [`Outbound`] handle, inbound messages arrive on the stream returned by
//!   [`Session::observe`].
//! * **[`Lifecycle`]:** The owner scope. Ending it cancels every session opened in it and
//!   releases their streams.
//! * **[`Envelope`]:** Correlation id, type tag and payload bytes of one action. Inbound
//!   payloads are resolved into [`SyncPayload`] as soon as they are received.
//!
//! ## Example
//!
//! ```rust,no_run
//! use syncwire_core::{Envelope, HeaderSet, Lifecycle, Session, TransportConfig};
//! use syncwire_core::sync_protocol::CreateCounter;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TransportConfig::new("http://10.0.2.2:5005")
//!     .with_headers(HeaderSet::sync_defaults("", "55", "555"));
//! let stub = syncwire_core::transport::build_client(&config)?;
//!
//! let lifecycle = Lifecycle::new();
//! let session = Session::open(&stub, &lifecycle);
//!
//! let action = CreateCounter { id: 54, name: "Counter".into(), value: 2 };
//! session.send(Envelope::pack("564564", &action)).await?;
//!
//! lifecycle.end();
//! session.closed().await;
//! # Ok(())
//! # }
//! ```
pub mod envelope;
pub mod lifecycle;
pub mod session;
pub mod transport;

pub use envelope::{Envelope, EnvelopeError, ServerEvent, SyncPayload, TypedPayload};
pub use lifecycle::Lifecycle;
pub use session::{InboundStream, Outbound, Session, SessionError, SessionState};
pub use transport::{
    BuildClientError, HeaderSet, ProtocolMode, StreamTimeouts, SyncStub, TransportConfig,
};

// Re-exports
pub use sync_protocol;
pub use tonic;

/// Type alias for the standard boxed error used in generic bounds.
type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
