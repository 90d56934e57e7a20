use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

/// Reference edges attached to an object rather than knowledge about it.
/// They share the table but never show up in relationship listings.
pub const META_RELATIONSHIP_TYPES: &[&str] = &[
    "created-by",
    "object-marking",
    "object-label",
    "observable_refs",
    "external-reference",
];

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stix_core_relationships")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub relationship_type: String,
    pub from_id: String,
    pub from_type: String,
    pub to_id: String,
    pub to_type: String,
    pub start_time: Option<ChronoDateTimeUtc>,
    pub stop_time: Option<ChronoDateTimeUtc>,
    pub confidence: i32,
    pub description: Option<String>,
    pub inferred: bool,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub fn new(
        relationship_type: String,
        (from_id, from_type): (String, String),
        (to_id, to_type): (String, String),
    ) -> Self {
        let now = chrono::Utc::now();

        Self {
            id: Set(uuid::Uuid::new_v4().to_string()),
            relationship_type: Set(relationship_type),
            from_id: Set(from_id),
            from_type: Set(from_type),
            to_id: Set(to_id),
            to_type: Set(to_type),
            start_time: ActiveValue::NotSet,
            stop_time: ActiveValue::NotSet,
            confidence: Set(15),
            description: ActiveValue::NotSet,
            inferred: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }
}

impl Model {
    pub fn is_meta(&self) -> bool {
        META_RELATIONSHIP_TYPES.contains(&self.relationship_type.as_str())
    }
}
