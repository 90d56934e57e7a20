use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter,
    QueryOrder, Set,
};
use tracing::info;

use crate::database::entities::files::{self, Entity as Files, UPLOAD_COMPLETE};
use crate::errors::{CoreResult, KnowledgeError};
use crate::pagination::{fetch_page, Connection, PageRequest};

pub const PURPOSE_EXPORT: &str = "export";

/// Listing scope of a stored file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileScope {
    pub purpose: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub context: Option<String>,
}

impl FileScope {
    pub fn export_of(entity_type: &str, context: Option<String>) -> Self {
        Self {
            purpose: PURPOSE_EXPORT.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: None,
            context,
        }
    }
}

/// File content pushed by a connector, base64 encoded.
#[derive(Clone, Debug)]
pub struct FileUpload {
    pub name: String,
    pub mime_type: String,
    pub content_base64: String,
}

impl FileUpload {
    pub fn decode(&self) -> Result<Vec<u8>, KnowledgeError> {
        STANDARD
            .decode(self.content_base64.trim())
            .map_err(|e| KnowledgeError::InvalidValue {
                field: "file".to_string(),
                reason: format!("content is not valid base64: {}", e),
            })
    }
}

pub fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "application/json" => "json",
        "text/csv" => "csv",
        "text/plain" => "txt",
        "application/pdf" => "pdf",
        _ => "bin",
    }
}

#[derive(Clone)]
pub struct FileService {
    db: DatabaseConnection,
}

impl FileService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Newest first, scoped by purpose, entity kind, entity and context.
    pub async fn listing(
        &self,
        scope: &FileScope,
        request: PageRequest,
    ) -> CoreResult<Connection<files::Model>> {
        let mut select = Files::find()
            .filter(files::Column::Purpose.eq(scope.purpose.as_str()))
            .filter(files::Column::EntityType.eq(scope.entity_type.as_str()));
        select = match &scope.entity_id {
            Some(id) => select.filter(files::Column::EntityId.eq(id.as_str())),
            None => select.filter(files::Column::EntityId.is_null()),
        };
        if let Some(context) = &scope.context {
            select = select.filter(files::Column::Context.eq(context.as_str()));
        }
        let select = select
            .order_by(files::Column::LastModified, Order::Desc)
            .order_by(files::Column::Id, Order::Asc);
        Ok(fetch_page(&self.db, select, request).await?)
    }

    /// Records a file that a connector is still producing.
    pub async fn create_placeholder(
        &self,
        scope: &FileScope,
        name: String,
        mime_type: &str,
        work_id: &str,
        list_filters: Option<String>,
    ) -> CoreResult<files::Model> {
        let mut file = files::ActiveModel::new(
            name,
            &scope.purpose,
            &scope.entity_type,
            mime_type.to_string(),
        );
        file.entity_id = Set(scope.entity_id.clone());
        file.context = Set(scope.context.clone());
        file.work_id = Set(Some(work_id.to_string()));
        file.list_filters = Set(list_filters);
        Ok(file.insert(&self.db).await?)
    }

    /// Stores pushed content, completing the placeholder of the same name
    /// when one exists.
    pub async fn store(
        &self,
        scope: &FileScope,
        upload: FileUpload,
        list_filters: Option<String>,
    ) -> CoreResult<files::Model> {
        let content = upload.decode()?;
        let size = content.len() as i64;

        let placeholder = Files::find()
            .filter(files::Column::Name.eq(upload.name.as_str()))
            .filter(files::Column::Purpose.eq(scope.purpose.as_str()))
            .filter(files::Column::EntityType.eq(scope.entity_type.as_str()))
            .one(&self.db)
            .await?;

        let stored = match placeholder {
            Some(existing) => {
                let mut active: files::ActiveModel = existing.into();
                active.content = Set(content);
                active.size = Set(size);
                active.mime_type = Set(upload.mime_type);
                active.upload_status = Set(UPLOAD_COMPLETE.to_string());
                active.last_modified = Set(Utc::now());
                if list_filters.is_some() {
                    active.list_filters = Set(list_filters);
                }
                active.update(&self.db).await?
            }
            None => {
                let mut file = files::ActiveModel::new(
                    upload.name,
                    &scope.purpose,
                    &scope.entity_type,
                    upload.mime_type,
                );
                file.entity_id = Set(scope.entity_id.clone());
                file.context = Set(scope.context.clone());
                file.content = Set(content);
                file.size = Set(size);
                file.list_filters = Set(list_filters);
                file.upload_status = Set(UPLOAD_COMPLETE.to_string());
                file.insert(&self.db).await?
            }
        };
        info!(file = %stored.name, size = stored.size, "file stored");
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_base64_is_a_validation_failure() {
        let upload = FileUpload {
            name: "x.json".to_string(),
            mime_type: "application/json".to_string(),
            content_base64: "***".to_string(),
        };
        assert!(matches!(
            upload.decode(),
            Err(KnowledgeError::InvalidValue { .. })
        ));
    }

    #[test]
    fn known_mime_types_get_extensions() {
        assert_eq!(extension_for("application/json"), "json");
        assert_eq!(extension_for("application/x-unknown"), "bin");
    }
}
