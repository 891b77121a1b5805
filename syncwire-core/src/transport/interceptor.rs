//! # Header injection
//!
//! [`HeaderInterceptor`] appends a fixed set of metadata entries to every request going
//! through the channel. It only ever touches the metadata map: the method, the path and
//! the message stream are handled by `tonic` below the interceptor and are never seen here.
use super::config::HeaderSet;
use std::{str::FromStr, sync::Arc};
use tonic::{
    Request, Status,
    metadata::{
        AsciiMetadataKey, AsciiMetadataValue,
        errors::{InvalidMetadataKey, InvalidMetadataValue},
    },
    service::Interceptor,
};

#[derive(thiserror::Error, Debug)]
pub enum InvalidHeader {
    #[error("Invalid metadata (header) key '{key}': '{source}'")]
    Key {
        key: String,
        source: InvalidMetadataKey,
    },
    #[error("Invalid metadata (header) value for key '{key}': '{source}'")]
    Value {
        key: String,
        source: InvalidMetadataValue,
    },
}

/// Interceptor merging a static [`HeaderSet`] into each outgoing request.
///
/// Header names and values are validated once, when the interceptor is built.
#[derive(Debug, Clone)]
pub struct HeaderInterceptor {
    headers: Arc<[(AsciiMetadataKey, AsciiMetadataValue)]>,
}

impl HeaderInterceptor {
    pub fn new(headers: &HeaderSet) -> Result<Self, InvalidHeader> {
        let headers = headers
            .iter()
            .map(|(k, v)| {
                let key = AsciiMetadataKey::from_str(k).map_err(|source| InvalidHeader::Key {
                    key: k.to_string(),
                    source,
                })?;
                let value =
                    AsciiMetadataValue::from_str(v).map_err(|source| InvalidHeader::Value {
                        key: k.to_string(),
                        source,
                    })?;
                Ok((key, value))
            })
            .collect::<Result<Vec<_>, InvalidHeader>>()?;

        Ok(Self {
            headers: headers.into(),
        })
    }
}

impl Interceptor for HeaderInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        let metadata = request.metadata_mut();
        for (key, value) in self.headers.iter() {
            metadata.append(key.clone(), value.clone());
        }

        tracing::trace!(metadata = ?request.metadata(), "outgoing sync request");
        Ok(request)
    }
}
