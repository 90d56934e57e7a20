use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

/// Marker carried in `parent_types` of every cyber-observable.
pub const OBSERVABLE_MARKER: &str = "Stix-Cyber-Observable";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stix_cyber_observables")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub entity_type: String,
    pub observable_value: String,
    pub description: Option<String>,
    pub x_opencti_score: Option<i32>,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub fn new(entity_type: String, observable_value: String) -> Self {
        let now = chrono::Utc::now();

        Self {
            id: Set(uuid::Uuid::new_v4().to_string()),
            entity_type: Set(entity_type),
            observable_value: Set(observable_value),
            description: ActiveValue::NotSet,
            x_opencti_score: ActiveValue::NotSet,
            created_at: Set(now),
            updated_at: Set(now),
        }
    }
}

impl Model {
    pub fn parent_types(&self) -> Vec<String> {
        vec![
            "Basic-Object".to_string(),
            "Stix-Object".to_string(),
            "Stix-Core-Object".to_string(),
            OBSERVABLE_MARKER.to_string(),
        ]
    }
}
