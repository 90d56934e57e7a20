use async_graphql::*;
use chrono::{DateTime, Utc};
use stixkb::database::entities::{connectors, files, works};
use stixkb::knowledge::{NumberSummary, TimeSeriesPoint};
use stixkb::presence;
use stixkb::services::FileUpload;

#[derive(SimpleObject, Clone, Debug)]
pub struct Connector {
    pub id: String,
    pub name: String,
    pub connector_type: String,
    pub connector_scope: Vec<String>,
    pub active: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<connectors::Model> for Connector {
    fn from(model: connectors::Model) -> Self {
        Self {
            connector_scope: model.scopes(),
            id: model.id,
            name: model.name,
            connector_type: model.connector_type,
            active: model.active,
            updated_at: model.updated_at,
        }
    }
}

/// Background job queued for a connector
#[derive(SimpleObject, Clone, Debug)]
pub struct Work {
    pub id: String,
    pub name: String,
    pub work_type: String,
    pub connector_id: String,
    pub entity_id: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<works::Model> for Work {
    fn from(model: works::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            work_type: model.work_type,
            connector_id: model.connector_id,
            entity_id: model.entity_id,
            status: model.status,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(SimpleObject, Clone, Debug)]
pub struct File {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub size: i64,
    pub upload_status: String,
    pub work_id: Option<String>,
    pub list_filters: Option<String>,
    pub last_modified: DateTime<Utc>,
}

impl From<files::Model> for File {
    fn from(model: files::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            mime_type: model.mime_type,
            size: model.size,
            upload_status: model.upload_status,
            work_id: model.work_id,
            list_filters: model.list_filters,
            last_modified: model.last_modified,
        }
    }
}

/// File pushed by a connector; `content` is base64
#[derive(InputObject)]
pub struct FileUploadInput {
    pub name: String,
    pub mime_type: String,
    pub content: String,
}

impl From<FileUploadInput> for FileUpload {
    fn from(input: FileUploadInput) -> Self {
        Self {
            name: input.name,
            mime_type: input.mime_type,
            content_base64: input.content,
        }
    }
}

#[derive(SimpleObject, Clone, Debug)]
pub struct EditUserContext {
    pub user_id: String,
    pub name: String,
    pub focus_on: Option<String>,
}

impl From<presence::EditUserContext> for EditUserContext {
    fn from(context: presence::EditUserContext) -> Self {
        Self {
            user_id: context.user_id,
            name: context.name,
            focus_on: context.focus_on,
        }
    }
}

#[derive(SimpleObject, Clone, Debug)]
pub struct TimeSeries {
    pub date: DateTime<Utc>,
    pub value: i64,
}

impl From<TimeSeriesPoint> for TimeSeries {
    fn from(point: TimeSeriesPoint) -> Self {
        Self {
            date: point.date,
            value: point.value,
        }
    }
}

#[derive(SimpleObject, Clone, Debug)]
pub struct StixCyberObservablesNumber {
    pub total: i64,
    pub count: i64,
}

impl From<NumberSummary> for StixCyberObservablesNumber {
    fn from(summary: NumberSummary) -> Self {
        Self {
            total: summary.total as i64,
            count: summary.count as i64,
        }
    }
}
