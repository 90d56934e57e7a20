use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use tracing::info;

use crate::database::entities::connectors::{self, ConnectorType, Entity as Connectors};
use crate::database::entities::works::{self, Entity as Works, WorkType};
use crate::errors::{CoreResult, KnowledgeError};

/// Connector declaration, as read from configuration.
#[derive(Clone, Debug)]
pub struct ConnectorRegistration {
    pub id: String,
    pub name: String,
    pub connector_type: ConnectorType,
    pub scope: Vec<String>,
    pub active: bool,
}

/// Registered connectors and the works queued for them.
#[derive(Clone)]
pub struct ConnectorService {
    db: DatabaseConnection,
}

impl ConnectorService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Inserts or refreshes a connector.
    pub async fn register(&self, registration: ConnectorRegistration) -> CoreResult<connectors::Model> {
        let model = connectors::ActiveModel::new(
            registration.id.clone(),
            registration.name,
            registration.connector_type,
            &registration.scope,
            registration.active,
        );
        let saved = if Connectors::find_by_id(registration.id.clone())
            .one(&self.db)
            .await?
            .is_some()
        {
            model.update(&self.db).await?
        } else {
            model.insert(&self.db).await?
        };
        info!(
            connector = %saved.name,
            connector_type = %saved.connector_type,
            active = saved.active,
            "connector registered"
        );
        Ok(saved)
    }

    pub async fn find_by_id(&self, id: &str) -> CoreResult<Option<connectors::Model>> {
        Ok(Connectors::find_by_id(id.to_string()).one(&self.db).await?)
    }

    pub async fn list(&self) -> CoreResult<Vec<connectors::Model>> {
        Ok(Connectors::find()
            .order_by_asc(connectors::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// Enrichment connectors whose scope covers `entity_type`.
    pub async fn for_enrichment(
        &self,
        entity_type: &str,
        only_alive: bool,
    ) -> CoreResult<Vec<connectors::Model>> {
        let mut select = Connectors::find().filter(
            connectors::Column::ConnectorType.eq(ConnectorType::InternalEnrichment.to_string()),
        );
        if only_alive {
            select = select.filter(connectors::Column::Active.eq(true));
        }
        let connectors = select
            .order_by_asc(connectors::Column::Name)
            .all(&self.db)
            .await?;
        Ok(connectors
            .into_iter()
            .filter(|c| c.accepts(entity_type))
            .collect())
    }

    /// Active export connectors able to produce `format`.
    pub async fn for_export(&self, format: &str) -> CoreResult<Vec<connectors::Model>> {
        let connectors = Connectors::find()
            .filter(
                connectors::Column::ConnectorType
                    .eq(ConnectorType::InternalExportFile.to_string()),
            )
            .filter(connectors::Column::Active.eq(true))
            .order_by_asc(connectors::Column::Name)
            .all(&self.db)
            .await?;
        Ok(connectors.into_iter().filter(|c| c.accepts(format)).collect())
    }

    /// Checks that `connector_id` can enrich an object of `entity_type`.
    pub async fn enrichment_connector(
        &self,
        connector_id: &str,
        entity_type: &str,
    ) -> CoreResult<connectors::Model> {
        let connector = self
            .find_by_id(connector_id)
            .await?
            .ok_or_else(|| KnowledgeError::not_found("Connector", connector_id))?;
        let usable = connector.kind() == Some(ConnectorType::InternalEnrichment)
            && connector.active
            && connector.accepts(entity_type);
        if !usable {
            return Err(KnowledgeError::UnsupportedConnector {
                connector: connector.name,
                target: entity_type.to_string(),
            }
            .into());
        }
        Ok(connector)
    }

    pub async fn create_work(
        &self,
        connector: &connectors::Model,
        work_type: WorkType,
        entity_id: Option<String>,
        context: Option<String>,
    ) -> CoreResult<works::Model> {
        let name = match work_type {
            WorkType::Enrichment => format!("Manual enrichment ({})", connector.name),
            WorkType::Export => format!("Export ({})", connector.name),
        };
        let mut work = works::ActiveModel::new(name, work_type, connector.id.clone());
        work.entity_id = Set(entity_id);
        work.context = Set(context);
        let work = work.insert(&self.db).await?;
        info!(work_id = %work.id, connector = %connector.name, "work created");
        Ok(work)
    }

    pub async fn update_work_status(&self, work_id: &str, status: works::WorkStatus) -> CoreResult<()> {
        let Some(work) = Works::find_by_id(work_id.to_string()).one(&self.db).await? else {
            return Err(KnowledgeError::not_found("Work", work_id).into());
        };
        let mut active: works::ActiveModel = work.into();
        active.status = Set(status.to_string());
        active.updated_at = Set(Utc::now());
        active.update(&self.db).await?;
        Ok(())
    }

    /// Most recent works about `entity_id`.
    pub async fn works_for_entity(&self, entity_id: &str, first: u64) -> CoreResult<Vec<works::Model>> {
        Ok(Works::find()
            .filter(works::Column::EntityId.eq(entity_id))
            .order_by_desc(works::Column::CreatedAt)
            .order_by_asc(works::Column::Id)
            .limit(first)
            .all(&self.db)
            .await?)
    }
}
