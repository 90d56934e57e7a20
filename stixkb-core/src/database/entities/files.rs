use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "files")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    /// `export` or `import`
    pub purpose: String,
    /// Kind of entity the file belongs to, e.g. `stix-observable`
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub context: Option<String>,
    pub mime_type: String,
    pub size: i64,
    #[serde(skip)]
    pub content: Vec<u8>,
    pub list_filters: Option<String>,
    /// `progress` until a connector pushes the content, then `complete`
    pub upload_status: String,
    pub work_id: Option<String>,
    pub last_modified: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub const UPLOAD_PROGRESS: &str = "progress";
pub const UPLOAD_COMPLETE: &str = "complete";

impl ActiveModel {
    pub fn new(name: String, purpose: &str, entity_type: &str, mime_type: String) -> Self {
        Self {
            id: Set(uuid::Uuid::new_v4().to_string()),
            name: Set(name),
            purpose: Set(purpose.to_string()),
            entity_type: Set(entity_type.to_string()),
            entity_id: ActiveValue::NotSet,
            context: ActiveValue::NotSet,
            mime_type: Set(mime_type),
            size: Set(0),
            content: Set(Vec::new()),
            list_filters: ActiveValue::NotSet,
            upload_status: Set(UPLOAD_PROGRESS.to_string()),
            work_id: ActiveValue::NotSet,
            last_modified: Set(chrono::Utc::now()),
        }
    }
}
