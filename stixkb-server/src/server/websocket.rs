//! `graphql-transport-ws` endpoint.
//!
//! Each subscribe message runs as its own task holding a cancellation token
//! that is a child of the connection token. A `complete` from the client
//! cancels one operation; closing the socket or shutting the server down
//! cancels all of them. Cancelled streams are drained so that they can
//! release what they hold before being dropped.

use std::borrow::Cow;
use std::collections::HashMap;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use stixkb::auth::Actor;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::auth::TokenAuthenticator;
use crate::graphql::GraphQLSchema;

const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

type Outbox = mpsc::UnboundedSender<Message>;

fn send_json(tx: &Outbox, value: Value) -> bool {
    tx.send(Message::Text(value.to_string().into())).is_ok()
}

fn close(tx: &Outbox, code: u16, reason: impl Into<Cow<'static, str>>) {
    let _ = tx.send(Message::Close(Some(CloseFrame {
        code,
        reason: reason.into(),
    })));
}

pub(super) async fn handle_graphql_ws(
    socket: WebSocket,
    schema: GraphQLSchema,
    authenticator: TokenAuthenticator,
    shutdown: CancellationToken,
) {
    let (mut sink, mut source) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    let writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let closing = matches!(message, Message::Close(_));
            if sink.send(message).await.is_err() || closing {
                break;
            }
        }
    });

    let connection = shutdown.child_token();
    let mut actor: Option<Actor> = None;
    let mut subscriptions: HashMap<String, CancellationToken> = HashMap::new();

    loop {
        let msg = tokio::select! {
            _ = connection.cancelled() => break,
            msg = source.next() => msg,
        };
        let text = match msg {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
            Some(Ok(_)) => continue,
        };
        let Ok(payload) = serde_json::from_str::<Value>(&text) else {
            close(&tx, 4400, "Invalid message received");
            break;
        };
        let msg_type = payload.get("type").and_then(Value::as_str).unwrap_or("");

        match msg_type {
            "connection_init" => {
                if actor.is_some() {
                    close(&tx, 4429, "Too many initialisation requests");
                    break;
                }
                match authenticator.actor_from_init_payload(payload.get("payload")) {
                    Ok(resolved) => {
                        debug!(user_id = ?resolved.user_id, "websocket connection initialised");
                        actor = Some(resolved);
                        if !send_json(&tx, json!({ "type": "connection_ack" })) {
                            break;
                        }
                    }
                    Err(err) => {
                        debug!("websocket connection rejected: {}", err);
                        close(&tx, 4403, "Forbidden");
                        break;
                    }
                }
            }
            "subscribe" => {
                let Some(actor) = actor.clone() else {
                    close(&tx, 4401, "Unauthorized");
                    break;
                };
                let Some(id) = payload.get("id").and_then(Value::as_str) else {
                    continue;
                };
                subscriptions.retain(|_, token| !token.is_cancelled());
                if subscriptions.contains_key(id) {
                    close(&tx, 4409, format!("Subscriber for {} already exists", id));
                    break;
                }
                let request = payload
                    .get("payload")
                    .cloned()
                    .map(serde_json::from_value::<async_graphql::Request>);
                let request = match request {
                    Some(Ok(request)) => request,
                    _ => {
                        send_json(
                            &tx,
                            json!({
                                "id": id,
                                "type": "error",
                                "payload": [{ "message": "Invalid subscribe payload" }]
                            }),
                        );
                        continue;
                    }
                };

                let token = connection.child_token();
                subscriptions.insert(id.to_string(), token.clone());
                tokio::spawn(run_operation(
                    schema.clone(),
                    request.data(actor).data(token.clone()),
                    id.to_string(),
                    token,
                    tx.clone(),
                ));
            }
            "complete" => {
                if let Some(id) = payload.get("id").and_then(Value::as_str) {
                    if let Some(token) = subscriptions.remove(id) {
                        debug!(id, "operation completed by client");
                        token.cancel();
                    }
                }
            }
            "ping" => {
                if !send_json(&tx, json!({ "type": "pong" })) {
                    break;
                }
            }
            "pong" => {}
            other => {
                warn!(message_type = other, "unexpected websocket message");
            }
        }
    }

    connection.cancel();
    drop(tx);
    let _ = writer.await;
}

async fn run_operation(
    schema: GraphQLSchema,
    request: async_graphql::Request,
    id: String,
    token: CancellationToken,
    tx: Outbox,
) {
    let mut stream = Box::pin(schema.execute_stream(request));
    loop {
        let next = tokio::select! {
            _ = token.cancelled() => break,
            next = stream.next() => next,
        };
        match next {
            Some(response) => {
                if !send_json(&tx, json!({ "id": id, "type": "next", "payload": response })) {
                    token.cancel();
                    break;
                }
            }
            None => {
                send_json(&tx, json!({ "id": id, "type": "complete" }));
                token.cancel();
                return;
            }
        }
    }

    // The operation observes the same token; let it finish on its own.
    let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
        while stream.next().await.is_some() {}
    })
    .await;
    if drained.is_err() {
        warn!(id = %id, "operation did not end after cancellation");
    }
}
