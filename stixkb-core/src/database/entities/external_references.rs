use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

pub const EXTERNAL_REFERENCE_TYPE: &str = "External-Reference";

/// Edge type linking an object to one of its external references.
pub const EXTERNAL_REFERENCE_RELATIONSHIP: &str = "external-reference";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "external_references")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Publisher of the reference, e.g. `mitre-attack` or `cve`
    pub source_name: String,
    pub description: Option<String>,
    pub url: Option<String>,
    /// Identifier inside the source, e.g. `T1059`
    pub external_id: Option<String>,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub fn new(source_name: String) -> Self {
        let now = chrono::Utc::now();

        Self {
            id: Set(uuid::Uuid::new_v4().to_string()),
            source_name: Set(source_name),
            description: ActiveValue::NotSet,
            url: ActiveValue::NotSet,
            external_id: ActiveValue::NotSet,
            created_at: Set(now),
            updated_at: Set(now),
        }
    }
}
