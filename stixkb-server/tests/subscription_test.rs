use std::sync::Arc;
use std::time::Duration;

use async_graphql::Request;
use futures_util::StreamExt;
use stixkb::auth::capabilities;
use stixkb::database::test_utils::setup_test_db;
use stixkb::{Actor, AppContext};
use stixkb_server::graphql::{build_schema, GraphQLContext, GraphQLSchema};
use tokio_util::sync::CancellationToken;

async fn setup() -> (GraphQLSchema, Arc<AppContext>, CancellationToken) {
    let db = setup_test_db().await.expect("test database");
    let app = Arc::new(AppContext::new(db));
    let shutdown = CancellationToken::new();
    let schema = build_schema(GraphQLContext::new(app.clone(), shutdown.clone()));
    (schema, app, shutdown)
}

fn analyst(id: &str) -> Actor {
    Actor::user(id, format!("analyst-{}", id))
        .with_capability(capabilities::KNOWLEDGE_KNUPDATE_KNDELETE)
}

async fn add_observable(schema: &GraphQLSchema, actor: Actor) -> String {
    let response = schema
        .execute(
            Request::new(
                r#"mutation {
                    stixCyberObservableAdd(input: { type: "Domain-Name", observable_value: "evil.test" }) { id }
                }"#,
            )
            .data(actor),
        )
        .await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    let data = response.data.into_json().expect("json");
    data["stixCyberObservableAdd"]["id"]
        .as_str()
        .expect("id")
        .to_string()
}

async fn patch_description(schema: &GraphQLSchema, actor: Actor, id: &str, value: &str) {
    let response = schema
        .execute(
            Request::new(format!(
                r#"mutation {{
                    stixCyberObservableEdit(id: "{}") {{
                        fieldPatch(input: {{ key: "description", value: ["{}"] }}) {{ id }}
                    }}
                }}"#,
                id, value
            ))
            .data(actor),
        )
        .await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

fn watch_request(id: &str, actor: Actor, token: CancellationToken) -> Request {
    Request::new(format!(
        r#"subscription {{ stixCyberObservable(id: "{}") {{ id description }} }}"#,
        id
    ))
    .data(actor)
    .data(token)
}

#[tokio::test]
async fn subscription_delivers_edits_of_other_users() {
    let (schema, app, _) = setup().await;
    let id = add_observable(&schema, analyst("u1")).await;

    let token = CancellationToken::new();
    let mut stream = Box::pin(schema.execute_stream(watch_request(&id, analyst("u1"), token.clone())));
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let consumer = tokio::spawn(async move {
        while let Some(response) = stream.next().await {
            if tx.send(response).is_err() {
                break;
            }
        }
    });

    wait_until(|| app.presence().is_editing(&id, "u1")).await;

    patch_description(&schema, analyst("u1"), &id, "own edit").await;
    patch_description(&schema, analyst("u2"), &id, "from u2").await;

    let response = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("an update")
        .expect("stream open");
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    let data = response.data.into_json().expect("json");
    assert_eq!(data["stixCyberObservable"]["description"], "from u2");

    token.cancel();
    tokio::time::timeout(Duration::from_secs(5), consumer)
        .await
        .expect("stream ended")
        .expect("consumer");
    assert!(!app.presence().is_editing(&id, "u1"));
}

#[tokio::test]
async fn rejected_subscription_leaves_no_marker() {
    let (schema, app, _) = setup().await;

    let mut stream = Box::pin(schema.execute_stream(watch_request(
        "missing",
        analyst("u1"),
        CancellationToken::new(),
    )));
    let response = stream.next().await.expect("one response");
    assert_eq!(response.errors.len(), 1);
    assert!(!app.presence().is_editing("missing", "u1"));
}

#[tokio::test]
async fn server_shutdown_ends_subscriptions() {
    let (schema, app, shutdown) = setup().await;
    let id = add_observable(&schema, analyst("u1")).await;

    // No token attached: the stream follows the server shutdown token.
    let request = Request::new(format!(
        r#"subscription {{ stixCyberObservable(id: "{}") {{ id }} }}"#,
        id
    ))
    .data(analyst("u3"));
    let mut stream = Box::pin(schema.execute_stream(request));
    let consumer = tokio::spawn(async move { while stream.next().await.is_some() {} });

    wait_until(|| app.presence().is_editing(&id, "u3")).await;
    shutdown.cancel();

    tokio::time::timeout(Duration::from_secs(5), consumer)
        .await
        .expect("stream ended")
        .expect("consumer");
    assert!(!app.presence().is_editing(&id, "u3"));
}

#[tokio::test]
async fn logout_ends_subscription() {
    let (schema, app, _) = setup().await;
    let id = add_observable(&schema, analyst("u1")).await;

    let mut stream = Box::pin(schema.execute_stream(watch_request(
        &id,
        analyst("u4"),
        CancellationToken::new(),
    )));
    let consumer = tokio::spawn(async move { while stream.next().await.is_some() {} });
    wait_until(|| app.presence().is_editing(&id, "u4")).await;

    let response = schema
        .execute(Request::new("mutation { logout }").data(analyst("u4")))
        .await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);

    tokio::time::timeout(Duration::from_secs(5), consumer)
        .await
        .expect("stream ended")
        .expect("consumer");
    assert!(!app.presence().is_editing(&id, "u4"));
}
