//! # Envelopes
//!
//! Actions travel to the server wrapped in a self-describing envelope: a correlation id,
//! a type tag naming the payload's schema (e.g. `sync.entities.CreateCounter`) and the
//! protobuf bytes of the payload. On the wire this is a `google.protobuf.Any` inside a
//! `ClientMessage.ActionRequest`.
//!
//! Type tags are resolved exactly once, at the boundary, into the closed [`SyncPayload`]
//! union. Unknown tags are an error, never a pass-through.
use prost::Message;
use prost_types::Any;
use sync_protocol::{
    ClientMessage, Counter, CreateCounter, ServerMessage, client_message, server_message,
};

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("Unknown payload type tag '{0}'")]
    UnknownTypeTag(String),
    #[error("Payload tagged '{found}' cannot be read as '{expected}'")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },
    #[error("Failed to decode '{type_tag}' payload: {source}")]
    Decode {
        type_tag: String,
        source: prost::DecodeError,
    },
    #[error("Server message carries no content")]
    EmptyServerMessage,
}

/// A protobuf message that can travel inside an [`Envelope`].
pub trait TypedPayload: Message + Default {
    /// Fully qualified protobuf name of the message.
    const TYPE_TAG: &'static str;
}

impl TypedPayload for CreateCounter {
    const TYPE_TAG: &'static str = "sync.entities.CreateCounter";
}

impl TypedPayload for Counter {
    const TYPE_TAG: &'static str = "sync.entities.Counter";
}

/// Every payload schema this client understands.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncPayload {
    CreateCounter(CreateCounter),
    Counter(Counter),
}

impl SyncPayload {
    pub fn type_tag(&self) -> &'static str {
        match self {
            SyncPayload::CreateCounter(_) => CreateCounter::TYPE_TAG,
            SyncPayload::Counter(_) => Counter::TYPE_TAG,
        }
    }

    /// Decodes `bytes` as the schema named by `type_tag`.
    ///
    /// Both bare names and `type.googleapis.com/`-style URLs are accepted.
    pub fn decode(type_tag: &str, bytes: &[u8]) -> Result<Self, EnvelopeError> {
        let name = schema_name(type_tag);
        if name == CreateCounter::TYPE_TAG {
            decode_as(bytes).map(SyncPayload::CreateCounter)
        } else if name == Counter::TYPE_TAG {
            decode_as(bytes).map(SyncPayload::Counter)
        } else {
            Err(EnvelopeError::UnknownTypeTag(name.to_string()))
        }
    }

    pub fn from_any(any: &Any) -> Result<Self, EnvelopeError> {
        Self::decode(&any.type_url, &any.value)
    }
}

/// Strips any `domain/` prefix from a type URL.
fn schema_name(type_tag: &str) -> &str {
    type_tag.rsplit('/').next().unwrap_or(type_tag)
}

fn decode_as<P: TypedPayload>(bytes: &[u8]) -> Result<P, EnvelopeError> {
    P::decode(bytes).map_err(|source| EnvelopeError::Decode {
        type_tag: P::TYPE_TAG.to_string(),
        source,
    })
}

/// An outbound action: correlation id, type tag and encoded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    correlation_id: String,
    type_tag: String,
    payload: Vec<u8>,
}

impl Envelope {
    /// Encodes `payload` and tags it with its own schema name.
    pub fn pack<P: TypedPayload>(correlation_id: impl Into<String>, payload: &P) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            type_tag: P::TYPE_TAG.to_string(),
            payload: payload.encode_to_vec(),
        }
    }

    /// Builds an envelope from already encoded parts.
    ///
    /// Nothing is checked here; [`Envelope::validate`] runs before the envelope is sent.
    pub fn from_parts(
        correlation_id: impl Into<String>,
        type_tag: impl Into<String>,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            type_tag: type_tag.into(),
            payload,
        }
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Decodes the payload as `P`, failing if the tag names another schema.
    pub fn unpack<P: TypedPayload>(&self) -> Result<P, EnvelopeError> {
        if schema_name(&self.type_tag) != P::TYPE_TAG {
            return Err(EnvelopeError::TypeMismatch {
                expected: P::TYPE_TAG,
                found: self.type_tag.clone(),
            });
        }
        decode_as(&self.payload)
    }

    /// Resolves the payload into the matching [`SyncPayload`] variant.
    pub fn resolve(&self) -> Result<SyncPayload, EnvelopeError> {
        SyncPayload::decode(&self.type_tag, &self.payload)
    }

    /// Checks that the tag is known and the bytes decode as that schema.
    pub fn validate(&self) -> Result<(), EnvelopeError> {
        self.resolve().map(|_| ())
    }

    pub(crate) fn into_client_message(self) -> ClientMessage {
        ClientMessage {
            message: Some(client_message::Message::ActionRequest(
                client_message::ActionRequest {
                    id: self.correlation_id,
                    action: Some(Any {
                        type_url: self.type_tag,
                        value: self.payload,
                    }),
                },
            )),
        }
    }
}

/// An inbound `ServerMessage` with its payloads resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// Current state of the entities the server holds.
    Snapshot(Vec<SyncPayload>),
    /// Outcome reported by the server for an action. The correlation id is surfaced
    /// as-is; nothing matches it against sent envelopes.
    ActionResult {
        correlation_id: String,
        payload: Option<SyncPayload>,
    },
}

impl TryFrom<ServerMessage> for ServerEvent {
    type Error = EnvelopeError;

    fn try_from(message: ServerMessage) -> Result<Self, Self::Error> {
        match message.message {
            Some(server_message::Message::DataSnapshot(snapshot)) => snapshot
                .entities
                .iter()
                .map(SyncPayload::from_any)
                .collect::<Result<Vec<_>, _>>()
                .map(ServerEvent::Snapshot),
            Some(server_message::Message::ActionResult(result)) => Ok(ServerEvent::ActionResult {
                payload: result.result.as_ref().map(SyncPayload::from_any).transpose()?,
                correlation_id: result.id,
            }),
            None => Err(EnvelopeError::EmptyServerMessage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_counter() -> CreateCounter {
        CreateCounter {
            id: 54,
            name: "Counter".to_string(),
            value: 2,
        }
    }

    #[test]
    fn create_counter_survives_the_trip_through_an_envelope() {
        let envelope = Envelope::pack("564564", &create_counter());

        let ClientMessage {
            message: Some(client_message::Message::ActionRequest(request)),
        } = envelope.into_client_message()
        else {
            panic!("Expected an action request");
        };
        assert_eq!(request.id, "564564");

        let any = request.action.unwrap();
        assert_eq!(any.type_url, "sync.entities.CreateCounter");

        match SyncPayload::from_any(&any).unwrap() {
            SyncPayload::CreateCounter(decoded) => {
                assert_eq!(decoded.id, 54);
                assert_eq!(decoded.name, "Counter");
                assert_eq!(decoded.value, 2);
            }
            other => panic!("Expected CreateCounter, got {other:?}"),
        }
    }

    #[test]
    fn unpack_refuses_a_different_schema() {
        let envelope = Envelope::pack("1", &create_counter());

        let err = envelope.unpack::<Counter>().unwrap_err();

        assert!(matches!(
            err,
            EnvelopeError::TypeMismatch { expected: "sync.entities.Counter", .. }
        ));
        assert_eq!(envelope.unpack::<CreateCounter>().unwrap(), create_counter());
    }

    #[test]
    fn unknown_tags_fail_validation() {
        let envelope = Envelope::from_parts("1", "sync.entities.DeleteCounter", vec![]);

        let err = envelope.validate().unwrap_err();

        assert!(matches!(err, EnvelopeError::UnknownTypeTag(tag) if tag == "sync.entities.DeleteCounter"));
    }

    #[test]
    fn bytes_that_do_not_match_the_tag_fail_validation() {
        // Field 1 declared as length-delimited with a length running past the buffer.
        let envelope = Envelope::from_parts("1", CreateCounter::TYPE_TAG, vec![0x0a, 0x05, 0x01]);

        assert!(matches!(
            envelope.validate(),
            Err(EnvelopeError::Decode { .. })
        ));
    }

    #[test]
    fn type_urls_with_a_domain_prefix_resolve() {
        let any = Any {
            type_url: "type.googleapis.com/sync.entities.Counter".to_string(),
            value: Counter {
                id: 1,
                name: "c".to_string(),
                value: 3,
            }
            .encode_to_vec(),
        };

        let payload = SyncPayload::from_any(&any).unwrap();

        assert_eq!(payload.type_tag(), Counter::TYPE_TAG);
    }

    #[test]
    fn snapshots_resolve_every_entity() {
        let counter = Counter {
            id: 7,
            name: "visits".to_string(),
            value: 11,
        };
        let message = ServerMessage {
            message: Some(server_message::Message::DataSnapshot(
                server_message::DataSnapshot {
                    entities: vec![Any {
                        type_url: Counter::TYPE_TAG.to_string(),
                        value: counter.encode_to_vec(),
                    }],
                },
            )),
        };

        let event = ServerEvent::try_from(message).unwrap();

        assert_eq!(event, ServerEvent::Snapshot(vec![SyncPayload::Counter(counter)]));
    }

    #[test]
    fn empty_server_messages_are_rejected() {
        let err = ServerEvent::try_from(ServerMessage { message: None }).unwrap_err();

        assert!(matches!(err, EnvelopeError::EmptyServerMessage));
    }
}
