mod common;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::{analyst, day, domain_object, observable, reader, relationship, setup_context};
use stixkb::database::entities::connectors::ConnectorType;
use sea_orm::{EntityTrait, PaginatorTrait};
use stixkb::database::entities::{stix_core_relationships, stix_cyber_observables};
use stixkb::database::entities::works::{self, WorkStatus};
use stixkb::knowledge::{StatsOperation, TimeInterval};
use stixkb::ordering::{ObservablesFilter, ObservablesFiltering, ObservablesOrdering};
use stixkb::pagination::OrderingMode;
use stixkb::services::{
    ConnectorRegistration, EditContextInput, EditInput, EditRequest, ExportAskInput,
    ExportPushInput, FileUpload, ObservableAddInput, ObservableListArgs, RefRelationAddInput,
    RefRelationsAddInput, RelationDeleteInput, TimeSeriesArgs,
};
use stixkb::CoreErrorKind;

fn add_input(entity_type: &str, value: &str) -> ObservableAddInput {
    ObservableAddInput {
        entity_type: entity_type.to_string(),
        observable_value: value.to_string(),
        description: None,
        x_opencti_score: None,
        created_by: None,
        object_marking: Vec::new(),
        object_label: Vec::new(),
    }
}

fn export_connector(id: &str, name: &str) -> ConnectorRegistration {
    ConnectorRegistration {
        id: id.to_string(),
        name: name.to_string(),
        connector_type: ConnectorType::InternalExportFile,
        scope: vec!["application/json".to_string()],
        active: true,
    }
}

#[tokio::test]
async fn test_add_creates_reference_edges_and_publishes() {
    let ctx = setup_context().await;
    let db = ctx.db();
    let label = domain_object(db, "Label", "c2").await;
    let marking = domain_object(db, "Marking-Definition", "TLP:AMBER").await;
    let mut added_rx = ctx.bus().subscribe(stixkb::bus::BusTopic::ObservableAdded);

    let mut input = add_input("Domain-Name", "evil.example");
    input.object_label = vec![label.id.clone()];
    input.object_marking = vec![marking.id.clone()];
    input.x_opencti_score = Some(80);
    let created = ctx
        .observable_service()
        .add(&analyst("u1"), input)
        .await
        .unwrap();
    assert_eq!(created.x_opencti_score, Some(80));

    match added_rx.recv().await.unwrap() {
        stixkb::bus::BusMessage::Added { user, instance } => {
            assert_eq!(user.id, "u1");
            assert_eq!(instance.id, created.id);
        }
        other => panic!("unexpected message {:?}", other),
    }

    let stix = ctx
        .observable_service()
        .to_stix(&reader("u2"), &created)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&stix).unwrap();
    assert_eq!(json["type"], "domain-name");
    assert_eq!(json["labels"], serde_json::json!(["c2"]));
    assert_eq!(json["x_opencti_score"], 80);
}

#[tokio::test]
async fn test_add_validates_input_and_capability() {
    let ctx = setup_context().await;
    let service = ctx.observable_service();

    let err = service
        .add(&reader("u1"), add_input("Domain-Name", "x.org"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), CoreErrorKind::Forbidden);

    let err = service
        .add(&analyst("u1"), add_input("Domain-Name", "  "))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), CoreErrorKind::Validation);

    let mut input = add_input("Domain-Name", "x.org");
    input.x_opencti_score = Some(101);
    let err = service.add(&analyst("u1"), input).await.unwrap_err();
    assert_eq!(err.kind(), CoreErrorKind::Validation);
}

#[tokio::test]
async fn test_add_with_unknown_reference_stores_nothing() {
    let ctx = setup_context().await;
    let db = ctx.db();
    let label = domain_object(db, "Label", "c2").await;

    let mut input = add_input("Domain-Name", "half.example");
    input.object_label = vec![label.id.clone(), "missing-label".to_string()];
    let err = ctx
        .observable_service()
        .add(&analyst("u1"), input)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), CoreErrorKind::NotFound);

    assert_eq!(stix_cyber_observables::Entity::find().count(db).await.unwrap(), 0);
    assert_eq!(stix_core_relationships::Entity::find().count(db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_relations_add_is_all_or_nothing() {
    let ctx = setup_context().await;
    let db = ctx.db();
    let ip = observable(db, "IPv4-Addr", "10.9.9.9").await;
    let label = domain_object(db, "Label", "scanner").await;

    let err = ctx
        .observable_service()
        .relations_add(
            EditRequest::new(analyst("u1"), ip.id.clone()),
            RefRelationsAddInput {
                to_ids: vec![label.id.clone(), "missing-label".to_string()],
                relationship_type: "object-label".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), CoreErrorKind::NotFound);
    assert_eq!(stix_core_relationships::Entity::find().count(db).await.unwrap(), 0);

    ctx.observable_service()
        .relations_add(
            EditRequest::new(analyst("u1"), ip.id.clone()),
            RefRelationsAddInput {
                to_ids: vec![label.id.clone()],
                relationship_type: "object-label".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(stix_core_relationships::Entity::find().count(db).await.unwrap(), 1);
}

#[tokio::test]
async fn test_find_all_searches_filters_and_orders() {
    let ctx = setup_context().await;
    let db = ctx.db();
    let actor = reader("u1");
    let a = observable(db, "Domain-Name", "alpha.example").await;
    let b = observable(db, "Domain-Name", "beta.example").await;
    observable(db, "IPv4-Addr", "192.0.2.1").await;
    let marking = domain_object(db, "Marking-Definition", "TLP:RED").await;
    relationship(db, "object-marking", (&b.id, "Domain-Name"), (&marking.id, "Marking-Definition"), None).await;

    let service = ctx.observable_service();
    let page = service
        .find_all(
            &actor,
            ObservableListArgs {
                types: vec!["Domain-Name".to_string()],
                order_by: Some(ObservablesOrdering::ObservableValue),
                order_mode: OrderingMode::Desc,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let values: Vec<_> = page.nodes().map(|o| o.observable_value.as_str()).collect();
    assert_eq!(values, vec!["beta.example", "alpha.example"]);

    let page = service
        .find_all(
            &actor,
            ObservableListArgs {
                search: Some("alpha".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(page.nodes().map(|o| o.id.clone()).collect::<Vec<_>>(), vec![a.id]);

    let page = service
        .find_all(
            &actor,
            ObservableListArgs {
                filters: vec![ObservablesFiltering {
                    key: ObservablesFilter::MarkingDefinitions,
                    values: vec![marking.id.clone()],
                }],
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(page.nodes().map(|o| o.id.clone()).collect::<Vec<_>>(), vec![b.id]);

    let summary = service
        .number(&actor, vec!["Domain-Name".to_string()], None)
        .await
        .unwrap();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.count, 2);
}

#[tokio::test]
async fn test_time_series_fills_empty_buckets() {
    let ctx = setup_context().await;
    observable(ctx.db(), "Domain-Name", "today.example").await;
    let now = chrono::Utc::now();

    let points = ctx
        .observable_service()
        .time_series(
            &reader("u1"),
            TimeSeriesArgs {
                types: Vec::new(),
                field: "created_at".to_string(),
                operation: StatsOperation::Count,
                start_date: now - chrono::Duration::days(3),
                end_date: now,
                interval: TimeInterval::Day,
            },
        )
        .await
        .unwrap();
    assert_eq!(points.len(), 4);
    assert_eq!(points.iter().map(|p| p.value).sum::<i64>(), 1);
    assert_eq!(points.last().unwrap().value, 1);

    let err = ctx
        .observable_service()
        .time_series(
            &reader("u1"),
            TimeSeriesArgs {
                types: Vec::new(),
                field: "observable_value".to_string(),
                operation: StatsOperation::Count,
                start_date: day(1),
                end_date: day(2),
                interval: TimeInterval::Day,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), CoreErrorKind::Validation);

    let err = ctx
        .observable_service()
        .time_series(
            &reader("u1"),
            TimeSeriesArgs {
                types: Vec::new(),
                field: "created_at".to_string(),
                operation: StatsOperation::Count,
                start_date: now - chrono::Duration::days(365 * 100),
                end_date: now,
                interval: TimeInterval::Day,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), CoreErrorKind::Validation);
    assert!(err.message().contains("buckets"));
}

#[tokio::test]
async fn test_field_patch_publishes_edit_and_rejects_read_only_keys() {
    let ctx = setup_context().await;
    let target = observable(ctx.db(), "Domain-Name", "old.example").await;
    let mut edits = ctx.bus().subscribe(stixkb::bus::BusTopic::ObservableEdit);
    let service = ctx.observable_service();

    let patched = service
        .field_patch(
            EditRequest::new(analyst("u1"), target.id.clone()),
            EditInput {
                key: "observable_value".to_string(),
                value: vec!["new.example".to_string()],
            },
        )
        .await
        .unwrap();
    assert_eq!(patched.observable_value, "new.example");
    let message = edits.recv().await.unwrap();
    assert_eq!(message.user_id(), "u1");

    let err = service
        .field_patch(
            EditRequest::new(analyst("u1"), target.id.clone()),
            EditInput {
                key: "entity_type".to_string(),
                value: vec!["IPv4-Addr".to_string()],
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), CoreErrorKind::Validation);

    let err = service
        .field_patch(
            EditRequest::new(analyst("u1"), "missing"),
            EditInput {
                key: "description".to_string(),
                value: vec![],
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), CoreErrorKind::NotFound);
}

#[tokio::test]
async fn test_context_patch_and_clean() {
    let ctx = setup_context().await;
    let target = observable(ctx.db(), "Domain-Name", "ctx.example").await;
    let service = ctx.observable_service();
    let request = || EditRequest::new(analyst("u1"), target.id.clone());

    service
        .context_patch(
            request(),
            EditContextInput {
                focus_on: Some("description".to_string()),
            },
        )
        .await
        .unwrap();
    let contexts = service.edit_context(&target.id);
    assert_eq!(contexts.len(), 1);
    assert_eq!(contexts[0].focus_on.as_deref(), Some("description"));

    service.context_clean(request()).await.unwrap();
    assert!(service.edit_context(&target.id).is_empty());
    // Cleaning twice is harmless
    service.context_clean(request()).await.unwrap();
}

#[tokio::test]
async fn test_relation_add_and_delete() {
    let ctx = setup_context().await;
    let db = ctx.db();
    let target = observable(db, "IPv4-Addr", "198.51.100.7").await;
    let indicator = domain_object(db, "Indicator", "[ipv4-addr:value = '198.51.100.7']").await;
    relationship(db, "based-on", (&indicator.id, "Indicator"), (&target.id, "IPv4-Addr"), None).await;
    let malware = domain_object(db, "Malware", "Qakbot").await;
    let service = ctx.observable_service();

    let indicators = service.indicators(&reader("u1"), &target.id).await.unwrap();
    assert_eq!(indicators.len(), 1);
    assert_eq!(indicators[0].id, indicator.id);

    let added = service
        .relation_add(
            EditRequest::new(analyst("u1"), target.id.clone()),
            RefRelationAddInput {
                to_id: malware.id.clone(),
                relationship_type: "related-to".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(added.relationship.from_id, target.id);

    let err = service
        .relation_delete(
            EditRequest::new(analyst("u1"), target.id.clone()),
            RelationDeleteInput {
                relation_id: None,
                to_id: Some(malware.id.clone()),
                relationship_type: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), CoreErrorKind::Validation);

    service
        .relation_delete(
            EditRequest::new(analyst("u1"), target.id.clone()),
            RelationDeleteInput {
                relation_id: Some(added.relationship.id.clone()),
                to_id: None,
                relationship_type: None,
            },
        )
        .await
        .unwrap();
    assert!(ctx
        .relationship_service()
        .find_by_id(&reader("u1"), &added.relationship.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_delete_removes_edges_and_presence() {
    let ctx = setup_context().await;
    let db = ctx.db();
    let target = observable(db, "Domain-Name", "gone.example").await;
    let tool = domain_object(db, "Tool", "nmap").await;
    let rel = relationship(db, "related-to", (&target.id, "Domain-Name"), (&tool.id, "Tool"), None).await;
    ctx.presence().set(&target.id, "u2", "bob", None);
    let service = ctx.observable_service();

    let err = service
        .delete(EditRequest::new(reader("u1"), target.id.clone()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), CoreErrorKind::Forbidden);

    let deleted = service
        .delete(EditRequest::new(analyst("u1"), target.id.clone()))
        .await
        .unwrap();
    assert_eq!(deleted, target.id);
    assert!(service.find_by_id(&reader("u1"), &target.id).await.unwrap().is_none());
    assert!(ctx
        .relationship_service()
        .find_by_id(&reader("u1"), &rel.id)
        .await
        .unwrap()
        .is_none());
    assert!(service.edit_context(&target.id).is_empty());
}

#[tokio::test]
async fn test_enrichment_requires_a_matching_connector() {
    let ctx = setup_context().await;
    let target = observable(ctx.db(), "IPv4-Addr", "203.0.113.9").await;
    ctx.register_connectors(vec![ConnectorRegistration {
        id: "abuseipdb".to_string(),
        name: "AbuseIPDB".to_string(),
        connector_type: ConnectorType::InternalEnrichment,
        scope: vec!["IPv4-Addr".to_string()],
        active: true,
    }])
    .await
    .unwrap();
    let service = ctx.observable_service();

    let connectors = service
        .connectors(&reader("u1"), &target.entity_type, true)
        .await
        .unwrap();
    assert_eq!(connectors.len(), 1);

    let work = service
        .ask_enrichment(EditRequest::new(analyst("u1"), target.id.clone()), "abuseipdb")
        .await
        .unwrap();
    assert_eq!(work.entity_id.as_deref(), Some(target.id.as_str()));

    let jobs = service.jobs(&reader("u1"), &target.id, None).await.unwrap();
    assert_eq!(jobs.len(), 1);

    let err = service
        .ask_enrichment(EditRequest::new(analyst("u1"), target.id.clone()), "unknown")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), CoreErrorKind::NotFound);
}

#[tokio::test]
async fn test_export_ask_then_push() {
    let ctx = setup_context().await;
    let actor = analyst("u1");
    let service = ctx.observable_service();

    let none = service
        .export_ask(
            &actor,
            ExportAskInput {
                format: "application/json".to_string(),
                export_type: "simple".to_string(),
                context: None,
                list_args: None,
            },
        )
        .await
        .unwrap();
    assert!(none.is_empty());

    ctx.register_connectors(vec![export_connector("stix-export", "ExportFileStix")])
        .await
        .unwrap();

    let err = service
        .export_ask(
            &actor,
            ExportAskInput {
                format: "application/json".to_string(),
                export_type: "partial".to_string(),
                context: None,
                list_args: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), CoreErrorKind::Validation);

    let works = service
        .export_ask(
            &actor,
            ExportAskInput {
                format: "application/json".to_string(),
                export_type: "full".to_string(),
                context: None,
                list_args: Some(r#"{"types":["Domain-Name"]}"#.to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(works.len(), 1);

    let listing = service.export_files(&actor, None, None).await.unwrap();
    assert_eq!(listing.edges.len(), 1);
    let placeholder = listing.nodes().next().unwrap().clone();
    assert!(placeholder.name.ends_with("_full_Stix-Cyber-Observables_(ExportFileStix).json"));
    assert_eq!(placeholder.work_id.as_deref(), Some(works[0].id.as_str()));

    let stored = service
        .export_push(
            &actor,
            ExportPushInput {
                file: FileUpload {
                    name: placeholder.name.clone(),
                    mime_type: "application/json".to_string(),
                    content_base64: STANDARD.encode(b"{\"objects\":[]}"),
                },
                context: None,
                list_args: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(stored.id, placeholder.id);
    assert_eq!(stored.size, 14);

    let work = works::Entity::find_by_id(works[0].id.clone())
        .one(ctx.db())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(work.status, WorkStatus::Complete.to_string());
}
