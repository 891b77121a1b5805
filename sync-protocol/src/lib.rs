//! # Sync Protocol
//!
//! Generated bindings for the `sync.protocol` and `sync.entities` packages.
//!
//! The schema lives in `proto/sync`. Both the client stub and the server trait are
//! generated so that consumers can talk to a real server and tests can stand one up
//! in-process.

pub mod pb {
    pub mod entities {
        tonic::include_proto!("sync.entities");
    }

    pub mod protocol {
        tonic::include_proto!("sync.protocol");
    }
}

pub use pb::entities::{Counter, CreateCounter};
pub use pb::protocol::sync_service_client::SyncServiceClient;
pub use pb::protocol::sync_service_server::{SyncService, SyncServiceServer};
pub use pb::protocol::{ClientMessage, ServerMessage, client_message, server_message};
