#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use stixkb::auth::capabilities;
use stixkb::database::entities::{stix_core_relationships, stix_cyber_observables, stix_domain_objects};
use stixkb::database::test_utils::setup_test_db;
use stixkb::{Actor, AppContext};

pub async fn setup_context() -> AppContext {
    let db = setup_test_db().await.expect("test database");
    AppContext::new(db)
}

pub fn analyst(id: &str) -> Actor {
    Actor::user(id, format!("analyst-{}", id)).with_capabilities([
        capabilities::KNOWLEDGE_KNUPDATE_KNDELETE,
        capabilities::KNOWLEDGE_KNENRICHMENT,
        capabilities::KNOWLEDGE_KNGETEXPORT_KNASKEXPORT,
    ])
}

pub fn reader(id: &str) -> Actor {
    Actor::user(id, format!("reader-{}", id)).with_capability(capabilities::KNOWLEDGE)
}

pub fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
}

pub async fn observable(
    db: &DatabaseConnection,
    entity_type: &str,
    value: &str,
) -> stix_cyber_observables::Model {
    stix_cyber_observables::ActiveModel::new(entity_type.to_string(), value.to_string())
        .insert(db)
        .await
        .expect("insert observable")
}

pub async fn domain_object(
    db: &DatabaseConnection,
    entity_type: &str,
    name: &str,
) -> stix_domain_objects::Model {
    stix_domain_objects::ActiveModel::new(entity_type.to_string(), name.to_string())
        .insert(db)
        .await
        .expect("insert domain object")
}

/// Inserts a relationship directly, bypassing validation.
pub async fn relationship(
    db: &DatabaseConnection,
    relationship_type: &str,
    from: (&str, &str),
    to: (&str, &str),
    start_time: Option<DateTime<Utc>>,
) -> stix_core_relationships::Model {
    let mut model = stix_core_relationships::ActiveModel::new(
        relationship_type.to_string(),
        (from.0.to_string(), from.1.to_string()),
        (to.0.to_string(), to.1.to_string()),
    );
    model.start_time = Set(start_time);
    model.insert(db).await.expect("insert relationship")
}
