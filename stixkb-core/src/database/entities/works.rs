use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "works")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub work_type: String,
    pub connector_id: String,
    pub entity_id: Option<String>,
    pub context: Option<String>,
    pub status: String,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum WorkType {
    Enrichment,
    Export,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum WorkStatus {
    Wait,
    Progress,
    Complete,
}

impl ActiveModel {
    pub fn new(name: String, work_type: WorkType, connector_id: String) -> Self {
        let now = chrono::Utc::now();

        Self {
            id: Set(uuid::Uuid::new_v4().to_string()),
            name: Set(name),
            work_type: Set(work_type.to_string()),
            connector_id: Set(connector_id),
            entity_id: ActiveValue::NotSet,
            context: ActiveValue::NotSet,
            status: Set(WorkStatus::Wait.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }
}
