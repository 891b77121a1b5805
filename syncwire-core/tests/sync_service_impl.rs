use prost::Message;
use prost_types::Any;
use std::time::Duration;
use sync_protocol::pb::protocol::server_message::{ActionResult, DataSnapshot};
use sync_protocol::{
    ClientMessage, Counter, CreateCounter, ServerMessage, SyncService, client_message,
    server_message,
};
use syncwire_core::TypedPayload;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Code, Request, Response, Status, Streaming, metadata::MetadataMap};

/// What the test server saw, in the order it saw it.
#[derive(Debug)]
pub enum Observed {
    Metadata(MetadataMap),
    Message(ClientMessage),
    InboundClosed,
}

#[derive(Debug, Clone, Copy)]
pub enum Mode {
    /// Answers every `CreateCounter` with the resulting `Counter`.
    Echo,
    /// Sends a snapshot first, then behaves like `Echo`.
    Snapshot,
    /// Reads everything, answers nothing.
    Silent,
    /// Never reads the inbound stream.
    Stalled,
    /// Fails the stream with the given code on the first message.
    FailWith(Code),
    /// Answers with a payload type the client does not know.
    UnknownPayload,
}

#[derive(Clone)]
pub struct SyncServiceImpl {
    mode: Mode,
    observed: mpsc::UnboundedSender<Observed>,
}

impl SyncServiceImpl {
    pub fn new(mode: Mode) -> (Self, mpsc::UnboundedReceiver<Observed>) {
        let (observed, rx) = mpsc::unbounded_channel();
        (Self { mode, observed }, rx)
    }
}

pub fn counter_for(action: &CreateCounter) -> Counter {
    Counter {
        id: action.id,
        name: action.name.clone(),
        value: action.value,
    }
}

fn any_of<P: TypedPayload>(payload: &P) -> Any {
    Any {
        type_url: P::TYPE_TAG.to_string(),
        value: payload.encode_to_vec(),
    }
}

fn reply_to(request: &client_message::ActionRequest) -> ServerMessage {
    let result = request
        .action
        .as_ref()
        .and_then(|any| CreateCounter::decode(any.value.as_slice()).ok())
        .map(|action| any_of(&counter_for(&action)));

    ServerMessage {
        message: Some(server_message::Message::ActionResult(ActionResult {
            id: request.id.clone(),
            result,
        })),
    }
}

#[tonic::async_trait]
impl SyncService for SyncServiceImpl {
    type SynchronizeStream = ReceiverStream<Result<ServerMessage, Status>>;

    async fn synchronize(
        &self,
        request: Request<Streaming<ClientMessage>>,
    ) -> Result<Response<Self::SynchronizeStream>, Status> {
        let _ = self
            .observed
            .send(Observed::Metadata(request.metadata().clone()));

        let mut in_stream = request.into_inner();
        let (tx, rx) = mpsc::channel(16);
        let observed = self.observed.clone();
        let mode = self.mode;

        tokio::spawn(async move {
            match mode {
                Mode::Stalled => {
                    // Keep both directions open without ever polling the inbound side.
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    drop((in_stream, tx));
                    return;
                }
                Mode::Snapshot => {
                    let snapshot = ServerMessage {
                        message: Some(server_message::Message::DataSnapshot(DataSnapshot {
                            entities: vec![any_of(&Counter {
                                id: 1,
                                name: "existing".to_string(),
                                value: 10,
                            })],
                        })),
                    };
                    let _ = tx.send(Ok(snapshot)).await;
                }
                _ => {}
            }

            while let Ok(Some(message)) = in_stream.message().await {
                let reply = match (&mode, &message.message) {
                    (Mode::Silent, _) => None,
                    (Mode::FailWith(code), _) => Some(Err(Status::new(*code, "sync failed"))),
                    (Mode::UnknownPayload, Some(client_message::Message::ActionRequest(req))) => {
                        Some(Ok(ServerMessage {
                            message: Some(server_message::Message::ActionResult(ActionResult {
                                id: req.id.clone(),
                                result: Some(Any {
                                    type_url: "sync.entities.Mystery".to_string(),
                                    value: vec![],
                                }),
                            })),
                        }))
                    }
                    (_, Some(client_message::Message::ActionRequest(req))) => {
                        Some(Ok(reply_to(req)))
                    }
                    (_, None) => None,
                };

                let _ = observed.send(Observed::Message(message));

                let failed = matches!(reply, Some(Err(_)));
                if let Some(reply) = reply {
                    let _ = tx.send(reply).await;
                }
                if failed {
                    break;
                }
            }

            let _ = observed.send(Observed::InboundClosed);
        });

        Ok(Response::new(ReceiverStream::new(rx)))
    }
}
