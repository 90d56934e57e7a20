mod common;

use std::time::Duration;

use common::{analyst, observable, reader, setup_context};
use futures_util::StreamExt;
use stixkb::services::{EditInput, EditRequest, ObservableStream};
use stixkb::{Actor, CoreErrorKind};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

const WAIT: Duration = Duration::from_secs(2);

fn patch(value: &str) -> EditInput {
    EditInput {
        key: "description".to_string(),
        value: vec![value.to_string()],
    }
}

async fn next(stream: &mut ObservableStream) -> Option<String> {
    timeout(WAIT, stream.next())
        .await
        .expect("stream stalled")
        .map(|instance| instance.description.unwrap_or_default())
}

#[tokio::test]
async fn test_watch_yields_edits_from_other_users_only() {
    let ctx = setup_context().await;
    let target = observable(ctx.db(), "Domain-Name", "watched.example").await;
    let watcher = analyst("u1");
    let editor = analyst("u2");

    let mut stream = ctx
        .watch_service()
        .watch_observable(watcher.clone(), target.id.clone(), CancellationToken::new())
        .await
        .unwrap();
    assert!(ctx.presence().is_editing(&target.id, "u1"));

    let service = ctx.observable_service();
    service
        .field_patch(EditRequest::new(watcher.clone(), target.id.clone()), patch("mine"))
        .await
        .unwrap();
    service
        .field_patch(EditRequest::new(editor.clone(), target.id.clone()), patch("first"))
        .await
        .unwrap();
    service
        .field_patch(EditRequest::new(editor, target.id.clone()), patch("second"))
        .await
        .unwrap();

    assert_eq!(next(&mut stream).await.as_deref(), Some("first"));
    assert_eq!(next(&mut stream).await.as_deref(), Some("second"));
}

#[tokio::test]
async fn test_watch_ignores_other_observables() {
    let ctx = setup_context().await;
    let target = observable(ctx.db(), "Domain-Name", "one.example").await;
    let other = observable(ctx.db(), "Domain-Name", "two.example").await;
    let editor = analyst("u2");

    let mut stream = ctx
        .watch_service()
        .watch_observable(reader("u1"), target.id.clone(), CancellationToken::new())
        .await
        .unwrap();

    let service = ctx.observable_service();
    service
        .field_patch(EditRequest::new(editor.clone(), other.id.clone()), patch("elsewhere"))
        .await
        .unwrap();
    service
        .field_patch(EditRequest::new(editor, target.id.clone()), patch("here"))
        .await
        .unwrap();

    assert_eq!(next(&mut stream).await.as_deref(), Some("here"));
}

#[tokio::test]
async fn test_logout_ends_the_stream_and_clears_presence() {
    let ctx = setup_context().await;
    let target = observable(ctx.db(), "Domain-Name", "logout.example").await;
    let watcher = reader("u1");

    let mut stream = ctx
        .watch_service()
        .watch_observable(watcher.clone(), target.id.clone(), CancellationToken::new())
        .await
        .unwrap();
    let mut edits = ctx.bus().subscribe(stixkb::bus::BusTopic::ObservableEdit);

    assert!(ctx.logout(&watcher).unwrap() >= 1);
    assert_eq!(next(&mut stream).await, None);
    assert!(!ctx.presence().is_editing(&target.id, "u1"));

    // Remaining watchers hear that the context changed
    let mut saw_release = false;
    while let Ok(Ok(message)) = timeout(WAIT, edits.recv()).await {
        if let stixkb::bus::BusMessage::Edit { user, instance } = message {
            if user.id == "u1" && instance.id == target.id {
                saw_release = true;
                break;
            }
        }
    }
    assert!(saw_release);
}

#[tokio::test]
async fn test_cancellation_ends_the_stream() {
    let ctx = setup_context().await;
    let target = observable(ctx.db(), "Domain-Name", "cancel.example").await;
    let cancel = CancellationToken::new();

    let mut stream = ctx
        .watch_service()
        .watch_observable(reader("u1"), target.id.clone(), cancel.clone())
        .await
        .unwrap();

    assert_eq!(ctx.bus().topic_count(), 1);
    cancel.cancel();
    assert_eq!(next(&mut stream).await, None);
    assert!(!ctx.presence().is_editing(&target.id, "u1"));
    assert_eq!(ctx.bus().topic_count(), 0);
}

#[tokio::test]
async fn test_dropping_the_stream_clears_presence() {
    let ctx = setup_context().await;
    let target = observable(ctx.db(), "Domain-Name", "drop.example").await;

    let stream = ctx
        .watch_service()
        .watch_observable(reader("u1"), target.id.clone(), CancellationToken::new())
        .await
        .unwrap();
    assert!(ctx.presence().is_editing(&target.id, "u1"));

    drop(stream);
    assert!(!ctx.presence().is_editing(&target.id, "u1"));
    assert_eq!(ctx.presence().entity_count(), 0);
}

#[tokio::test]
async fn test_rejected_watch_leaves_no_marker() {
    let ctx = setup_context().await;
    let target = observable(ctx.db(), "Domain-Name", "guarded.example").await;
    let watch = ctx.watch_service();

    let err = watch
        .watch_observable(Actor::anonymous(), target.id.clone(), CancellationToken::new())
        .await
        .err()
        .unwrap();
    assert_eq!(err.kind(), CoreErrorKind::Unauthorized);

    let err = watch
        .watch_observable(Actor::user("u3", "nobody"), target.id.clone(), CancellationToken::new())
        .await
        .err()
        .unwrap();
    assert_eq!(err.kind(), CoreErrorKind::Forbidden);

    let err = watch
        .watch_observable(reader("u1"), "missing".to_string(), CancellationToken::new())
        .await
        .err()
        .unwrap();
    assert_eq!(err.kind(), CoreErrorKind::NotFound);

    assert_eq!(ctx.presence().entity_count(), 0);
}

#[tokio::test]
async fn test_two_watchers_keep_separate_markers() {
    let ctx = setup_context().await;
    let target = observable(ctx.db(), "Domain-Name", "shared.example").await;
    let cancel_one = CancellationToken::new();

    let mut one = ctx
        .watch_service()
        .watch_observable(reader("u1"), target.id.clone(), cancel_one.clone())
        .await
        .unwrap();
    let _two = ctx
        .watch_service()
        .watch_observable(reader("u2"), target.id.clone(), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(ctx.presence().list(&target.id).len(), 2);

    cancel_one.cancel();
    assert_eq!(next(&mut one).await, None);
    let remaining = ctx.presence().list(&target.id);
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].user_id, "u2");
}
