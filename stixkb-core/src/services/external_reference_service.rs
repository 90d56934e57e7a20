use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    Order, QueryFilter, QueryOrder, Set, TransactionTrait, Value,
};
use tracing::{debug, info};

use crate::auth::{capabilities, require_capability, Actor};
use crate::database::entities::external_references::{
    self, Entity as ExternalReferences, EXTERNAL_REFERENCE_RELATIONSHIP, EXTERNAL_REFERENCE_TYPE,
};
use crate::database::entities::stix_core_relationships::{self, Entity as StixCoreRelationships};
use crate::errors::{CoreError, CoreResult, KnowledgeError};
use crate::ordering::ExternalReferencesOrdering;
use crate::pagination::{fetch_page, Connection, OrderingMode, PageSettings};
use crate::services::entity_refs::find_ref;

const TABLE: &str = "external_references";
const ENTITY: &str = "External-Reference";

#[derive(Clone, Debug, Default)]
pub struct ExternalReferenceListArgs {
    /// Only references attached to this object
    pub object_id: Option<String>,
    pub search: Option<String>,
    pub first: Option<i64>,
    pub after: Option<String>,
    pub order_by: ExternalReferencesOrdering,
    pub order_mode: OrderingMode,
}

#[derive(Clone, Debug, Default)]
pub struct ExternalReferenceAddInput {
    pub source_name: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub external_id: Option<String>,
    /// Object the new reference is attached to, in the same write
    pub object_id: Option<String>,
}

/// Citations of an object in outside sources (ATT&CK pages, CVE entries,
/// vendor reports), linked through `external-reference` edges.
#[derive(Clone)]
pub struct ExternalReferenceService {
    db: DatabaseConnection,
    settings: PageSettings,
}

impl ExternalReferenceService {
    pub fn new(db: DatabaseConnection, settings: PageSettings) -> Self {
        Self { db, settings }
    }

    async fn load(&self, id: &str) -> CoreResult<external_references::Model> {
        ExternalReferences::find_by_id(id.to_string())
            .one(&self.db)
            .await?
            .ok_or_else(|| CoreError::not_found(ENTITY, id))
    }

    pub async fn find_by_id(
        &self,
        actor: &Actor,
        id: &str,
    ) -> CoreResult<Option<external_references::Model>> {
        require_capability(actor, capabilities::KNOWLEDGE)?;
        Ok(ExternalReferences::find_by_id(id.to_string())
            .one(&self.db)
            .await?)
    }

    pub async fn list(
        &self,
        actor: &Actor,
        args: ExternalReferenceListArgs,
    ) -> CoreResult<Connection<external_references::Model>> {
        require_capability(actor, capabilities::KNOWLEDGE)?;
        let request = self
            .settings
            .request(args.first, args.after.as_deref())
            .map_err(CoreError::from)?;

        let mut select = ExternalReferences::find();
        if let Some(object_id) = &args.object_id {
            select = select.filter(Expr::cust_with_values(
                format!(
                    "\"{}\".\"id\" IN (SELECT r.to_id FROM stix_core_relationships r WHERE r.relationship_type = ? AND r.from_id = ?)",
                    TABLE
                ),
                [
                    Value::from(EXTERNAL_REFERENCE_RELATIONSHIP),
                    Value::from(object_id.as_str()),
                ],
            ));
        }
        if let Some(search) = args
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            select = select.filter(
                Condition::any()
                    .add(external_references::Column::SourceName.contains(search))
                    .add(external_references::Column::ExternalId.contains(search))
                    .add(external_references::Column::Url.contains(search)),
            );
        }
        let select = select
            .order_by(
                args.order_by.field_path().sort_expr(TABLE),
                args.order_mode.order(),
            )
            .order_by(external_references::Column::Id, Order::Asc);

        let page = fetch_page(&self.db, select, request).await?;
        debug!(
            object_id = ?args.object_id,
            returned = page.edges.len(),
            global_count = page.page_info.global_count,
            "listed external references"
        );
        Ok(page)
    }

    pub async fn add(
        &self,
        actor: &Actor,
        input: ExternalReferenceAddInput,
    ) -> CoreResult<external_references::Model> {
        require_capability(actor, capabilities::KNOWLEDGE_KNUPDATE)?;
        let source_name = input.source_name.trim();
        if source_name.is_empty() {
            return Err(KnowledgeError::InvalidValue {
                field: "source_name".to_string(),
                reason: "must not be empty".to_string(),
            }
            .into());
        }
        let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        let txn = self.db.begin().await?;
        let mut model = external_references::ActiveModel::new(source_name.to_string());
        model.description = Set(non_blank(input.description));
        model.url = Set(non_blank(input.url));
        model.external_id = Set(non_blank(input.external_id));
        let reference = model.insert(&txn).await?;
        if let Some(object_id) = &input.object_id {
            attach(&txn, object_id, &reference).await?;
        }
        txn.commit().await?;

        info!(id = %reference.id, source_name = %reference.source_name, "external reference created");
        Ok(reference)
    }

    /// Attaches reference `id` to `object_id`.
    pub async fn relation_add(
        &self,
        actor: &Actor,
        id: &str,
        object_id: &str,
    ) -> CoreResult<external_references::Model> {
        require_capability(actor, capabilities::KNOWLEDGE_KNUPDATE)?;
        let reference = self.load(id).await?;
        attach(&self.db, object_id, &reference).await?;
        Ok(reference)
    }

    pub async fn relation_delete(
        &self,
        actor: &Actor,
        id: &str,
        object_id: &str,
    ) -> CoreResult<external_references::Model> {
        require_capability(actor, capabilities::KNOWLEDGE_KNUPDATE)?;
        let reference = self.load(id).await?;
        let result = StixCoreRelationships::delete_many()
            .filter(stix_core_relationships::Column::FromId.eq(object_id))
            .filter(stix_core_relationships::Column::ToId.eq(id))
            .filter(
                stix_core_relationships::Column::RelationshipType
                    .eq(EXTERNAL_REFERENCE_RELATIONSHIP),
            )
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(KnowledgeError::not_found(EXTERNAL_REFERENCE_RELATIONSHIP, object_id).into());
        }
        Ok(reference)
    }

    /// Deletes the reference and detaches it from every object.
    pub async fn delete(&self, actor: &Actor, id: &str) -> CoreResult<String> {
        require_capability(actor, capabilities::KNOWLEDGE_KNUPDATE_KNDELETE)?;
        let txn = self.db.begin().await?;
        let detached = StixCoreRelationships::delete_many()
            .filter(stix_core_relationships::Column::ToId.eq(id))
            .filter(
                stix_core_relationships::Column::RelationshipType
                    .eq(EXTERNAL_REFERENCE_RELATIONSHIP),
            )
            .exec(&txn)
            .await?;
        let result = ExternalReferences::delete_by_id(id.to_string())
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(KnowledgeError::not_found(ENTITY, id).into());
        }
        txn.commit().await?;

        info!(id, detached = detached.rows_affected, "external reference deleted");
        Ok(id.to_string())
    }
}

/// Writes the `external-reference` edge from `object_id` to `reference`.
async fn attach<C>(
    db: &C,
    object_id: &str,
    reference: &external_references::Model,
) -> CoreResult<()>
where
    C: ConnectionTrait,
{
    let object = find_ref(db, object_id)
        .await?
        .ok_or_else(|| KnowledgeError::not_found("Stix-Core-Object", object_id))?;

    let existing = StixCoreRelationships::find()
        .filter(stix_core_relationships::Column::FromId.eq(object.id.as_str()))
        .filter(stix_core_relationships::Column::ToId.eq(reference.id.as_str()))
        .filter(
            stix_core_relationships::Column::RelationshipType.eq(EXTERNAL_REFERENCE_RELATIONSHIP),
        )
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(KnowledgeError::DuplicateRelationship {
            relationship_type: EXTERNAL_REFERENCE_RELATIONSHIP.to_string(),
            from: object.id,
            to: reference.id.clone(),
        }
        .into());
    }

    stix_core_relationships::ActiveModel::new(
        EXTERNAL_REFERENCE_RELATIONSHIP.to_string(),
        (object.id, object.entity_type),
        (reference.id.clone(), EXTERNAL_REFERENCE_TYPE.to_string()),
    )
    .insert(db)
    .await?;
    Ok(())
}
