use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    Order, QueryFilter, QueryOrder, Set,
};
use tracing::debug;

use crate::auth::{capabilities, require_capability, Actor};
use crate::database::entities::stix_core_relationships::{
    self, Entity as StixCoreRelationships, META_RELATIONSHIP_TYPES,
};
use crate::errors::{CoreError, CoreResult, KnowledgeError};
use crate::knowledge::{
    DistributionBucket, DistributionField, EntityRef, ResolvedRelationship, StatsOperation,
};
use crate::ordering::RelationshipsOrdering;
use crate::pagination::{fetch_page, Connection, OrderingMode, PageSettings};
use crate::services::entity_refs::{find_ref, resolve_refs};

const TABLE: &str = "stix_core_relationships";

#[derive(Clone, Debug, Default)]
pub struct RelationshipListArgs {
    pub from_id: Option<String>,
    pub to_id: Option<String>,
    /// `None` lists every knowledge relationship, reference edges excluded.
    pub relationship_type: Option<String>,
    pub to_types: Vec<String>,
    /// `Some(false)` drops inferred relationships.
    pub inferred: Option<bool>,
    pub first: Option<i64>,
    pub after: Option<String>,
    pub order_by: RelationshipsOrdering,
    pub order_mode: OrderingMode,
}

#[derive(Clone, Debug)]
pub struct DistributionArgs {
    pub from_id: String,
    pub to_types: Vec<String>,
    pub relationship_type: Option<String>,
    pub inferred: Option<bool>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub field: DistributionField,
    pub operation: StatsOperation,
}

#[derive(Clone, Debug)]
pub struct RelationshipAddInput {
    pub from_id: String,
    pub to_id: String,
    pub relationship_type: String,
    pub start_time: Option<DateTime<Utc>>,
    pub stop_time: Option<DateTime<Utc>>,
    pub confidence: Option<i32>,
    pub description: Option<String>,
}

impl RelationshipAddInput {
    pub fn new(from_id: &str, to_id: &str, relationship_type: &str) -> Self {
        Self {
            from_id: from_id.to_string(),
            to_id: to_id.to_string(),
            relationship_type: relationship_type.to_string(),
            start_time: None,
            stop_time: None,
            confidence: None,
            description: None,
        }
    }
}

#[derive(Clone)]
pub struct StixCoreRelationshipService {
    db: DatabaseConnection,
    settings: PageSettings,
}

impl StixCoreRelationshipService {
    pub fn new(db: DatabaseConnection, settings: PageSettings) -> Self {
        Self { db, settings }
    }

    fn base_filter(
        relationship_type: &Option<String>,
        to_types: &[String],
        inferred: Option<bool>,
    ) -> Condition {
        let mut condition = Condition::all();
        condition = match relationship_type {
            Some(kind) => {
                condition.add(stix_core_relationships::Column::RelationshipType.eq(kind.as_str()))
            }
            None => condition.add(
                stix_core_relationships::Column::RelationshipType
                    .is_not_in(META_RELATIONSHIP_TYPES.iter().copied()),
            ),
        };
        if !to_types.is_empty() {
            condition =
                condition.add(stix_core_relationships::Column::ToType.is_in(to_types.to_vec()));
        }
        if inferred == Some(false) {
            condition = condition.add(stix_core_relationships::Column::Inferred.eq(false));
        }
        condition
    }

    pub async fn list(
        &self,
        actor: &Actor,
        args: RelationshipListArgs,
    ) -> CoreResult<Connection<ResolvedRelationship>> {
        require_capability(actor, capabilities::KNOWLEDGE)?;
        let request = self
            .settings
            .request(args.first, args.after.as_deref())
            .map_err(CoreError::from)?;

        let mut condition =
            Self::base_filter(&args.relationship_type, &args.to_types, args.inferred);
        if let Some(from_id) = &args.from_id {
            condition = condition.add(stix_core_relationships::Column::FromId.eq(from_id.as_str()));
        }
        if let Some(to_id) = &args.to_id {
            condition = condition.add(stix_core_relationships::Column::ToId.eq(to_id.as_str()));
        }

        let select = StixCoreRelationships::find()
            .filter(condition)
            .order_by(
                args.order_by.field_path().sort_expr(TABLE),
                args.order_mode.order(),
            )
            .order_by(stix_core_relationships::Column::Id, Order::Asc);

        let page = fetch_page(&self.db, select, request).await?;
        debug!(
            from_id = ?args.from_id,
            returned = page.edges.len(),
            global_count = page.page_info.global_count,
            "listed relationships"
        );
        self.resolve_page(page).await
    }

    async fn resolve_page(
        &self,
        page: Connection<stix_core_relationships::Model>,
    ) -> CoreResult<Connection<ResolvedRelationship>> {
        let ids: Vec<String> = page
            .nodes()
            .flat_map(|r| [r.from_id.clone(), r.to_id.clone()])
            .collect();
        let refs = resolve_refs(&self.db, ids).await?;
        Ok(page.map(|relationship| ResolvedRelationship {
            from: refs.get(&relationship.from_id).cloned(),
            to: refs.get(&relationship.to_id).cloned(),
            relationship,
        }))
    }

    pub async fn find_by_id(
        &self,
        actor: &Actor,
        id: &str,
    ) -> CoreResult<Option<ResolvedRelationship>> {
        require_capability(actor, capabilities::KNOWLEDGE)?;
        let Some(relationship) = StixCoreRelationships::find_by_id(id.to_string())
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };
        Ok(Some(self.resolve(relationship).await?))
    }

    async fn resolve(
        &self,
        relationship: stix_core_relationships::Model,
    ) -> CoreResult<ResolvedRelationship> {
        let from = find_ref(&self.db, &relationship.from_id).await?;
        let to = find_ref(&self.db, &relationship.to_id).await?;
        Ok(ResolvedRelationship {
            relationship,
            from,
            to,
        })
    }

    /// Groups the relationships of `from_id` by `field`. Buckets are sorted
    /// by value, largest first, then by label.
    pub async fn distribution(
        &self,
        actor: &Actor,
        args: DistributionArgs,
    ) -> CoreResult<Vec<DistributionBucket>> {
        require_capability(actor, capabilities::KNOWLEDGE)?;

        let condition = Self::base_filter(&args.relationship_type, &args.to_types, args.inferred)
            .add(stix_core_relationships::Column::FromId.eq(args.from_id.as_str()));
        let relationships = StixCoreRelationships::find()
            .filter(condition)
            .all(&self.db)
            .await?;

        let in_window = |r: &stix_core_relationships::Model| {
            if args.start_date.is_none() && args.end_date.is_none() {
                return true;
            }
            match r.start_time {
                Some(start) => {
                    args.start_date.map_or(true, |s| start >= s)
                        && args.end_date.map_or(true, |e| start <= e)
                }
                None => false,
            }
        };
        let relationships: Vec<_> = relationships.into_iter().filter(in_window).collect();

        let refs = if args.field == DistributionField::Name {
            resolve_refs(
                &self.db,
                relationships.iter().map(|r| r.to_id.clone()).collect(),
            )
            .await?
        } else {
            HashMap::new()
        };

        let mut totals: HashMap<String, i64> = HashMap::new();
        for relationship in &relationships {
            let label = match args.field {
                DistributionField::EntityType => Some(relationship.to_type.clone()),
                DistributionField::RelationshipType => {
                    Some(relationship.relationship_type.clone())
                }
                DistributionField::Name => refs
                    .get(&relationship.to_id)
                    .map(|to: &EntityRef| to.display_value().to_string()),
            };
            let Some(label) = label else { continue };
            let amount = match args.operation {
                StatsOperation::Count => 1,
                StatsOperation::Sum => i64::from(relationship.confidence),
            };
            *totals.entry(label).or_insert(0) += amount;
        }

        let mut buckets: Vec<DistributionBucket> = totals
            .into_iter()
            .map(|(label, value)| DistributionBucket { label, value })
            .collect();
        buckets.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.label.cmp(&b.label)));
        Ok(buckets)
    }

    /// Same as [`Self::distribution`] with the field given by name.
    pub async fn distribution_by_name(
        &self,
        actor: &Actor,
        field: &str,
        mut args: DistributionArgs,
    ) -> CoreResult<Vec<DistributionBucket>> {
        args.field = field
            .parse()
            .map_err(|_| KnowledgeError::UnsupportedField(field.to_string()))?;
        self.distribution(actor, args).await
    }

    pub async fn add(
        &self,
        actor: &Actor,
        input: RelationshipAddInput,
    ) -> CoreResult<ResolvedRelationship> {
        require_capability(actor, capabilities::KNOWLEDGE_KNUPDATE)?;
        self.create(&self.db, input).await
    }

    /// Creates on `db`, which may be an open transaction, without a
    /// capability check; callers have already checked.
    pub(crate) async fn create<C>(
        &self,
        db: &C,
        input: RelationshipAddInput,
    ) -> CoreResult<ResolvedRelationship>
    where
        C: ConnectionTrait,
    {
        if input.relationship_type.trim().is_empty() {
            return Err(KnowledgeError::InvalidValue {
                field: "relationship_type".to_string(),
                reason: "must not be empty".to_string(),
            }
            .into());
        }
        if let Some(confidence) = input.confidence {
            if !(0..=100).contains(&confidence) {
                return Err(KnowledgeError::InvalidValue {
                    field: "confidence".to_string(),
                    reason: "must be between 0 and 100".to_string(),
                }
                .into());
            }
        }

        let from = find_ref(db, &input.from_id)
            .await?
            .ok_or_else(|| KnowledgeError::not_found("Stix-Core-Object", &input.from_id))?;
        let to = find_ref(db, &input.to_id)
            .await?
            .ok_or_else(|| KnowledgeError::not_found("Stix-Core-Object", &input.to_id))?;

        let existing = StixCoreRelationships::find()
            .filter(stix_core_relationships::Column::RelationshipType.eq(input.relationship_type.as_str()))
            .filter(stix_core_relationships::Column::FromId.eq(from.id.as_str()))
            .filter(stix_core_relationships::Column::ToId.eq(to.id.as_str()))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(KnowledgeError::DuplicateRelationship {
                relationship_type: input.relationship_type,
                from: from.id,
                to: to.id,
            }
            .into());
        }

        let mut model = stix_core_relationships::ActiveModel::new(
            input.relationship_type,
            (from.id.clone(), from.entity_type.clone()),
            (to.id.clone(), to.entity_type.clone()),
        );
        model.start_time = Set(input.start_time);
        model.stop_time = Set(input.stop_time);
        model.description = Set(input.description);
        if let Some(confidence) = input.confidence {
            model.confidence = Set(confidence);
        }
        let relationship = model.insert(db).await?;

        Ok(ResolvedRelationship {
            relationship,
            from: Some(from),
            to: Some(to),
        })
    }

    pub async fn delete(&self, actor: &Actor, id: &str) -> CoreResult<String> {
        require_capability(actor, capabilities::KNOWLEDGE_KNUPDATE_KNDELETE)?;
        let result = StixCoreRelationships::delete_by_id(id.to_string())
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(KnowledgeError::not_found("stix-core-relationship", id).into());
        }
        Ok(id.to_string())
    }

    /// Deletes the relationship `id` only when `entity_id` is one of its ends.
    pub(crate) async fn delete_attached(&self, entity_id: &str, id: &str) -> CoreResult<()> {
        let result = StixCoreRelationships::delete_many()
            .filter(stix_core_relationships::Column::Id.eq(id))
            .filter(
                Condition::any()
                    .add(stix_core_relationships::Column::FromId.eq(entity_id))
                    .add(stix_core_relationships::Column::ToId.eq(entity_id)),
            )
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(KnowledgeError::not_found("stix-core-relationship", id).into());
        }
        Ok(())
    }

    pub(crate) async fn delete_between(
        &self,
        from_id: &str,
        to_id: &str,
        relationship_type: &str,
    ) -> CoreResult<u64> {
        let result = StixCoreRelationships::delete_many()
            .filter(stix_core_relationships::Column::FromId.eq(from_id))
            .filter(stix_core_relationships::Column::ToId.eq(to_id))
            .filter(stix_core_relationships::Column::RelationshipType.eq(relationship_type))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(KnowledgeError::not_found(relationship_type, to_id).into());
        }
        Ok(result.rows_affected)
    }

    /// Removes every relationship touching `entity_id`.
    pub(crate) async fn delete_all_of<C>(&self, db: &C, entity_id: &str) -> CoreResult<u64>
    where
        C: ConnectionTrait,
    {
        let result = StixCoreRelationships::delete_many()
            .filter(
                Condition::any()
                    .add(stix_core_relationships::Column::FromId.eq(entity_id))
                    .add(stix_core_relationships::Column::ToId.eq(entity_id)),
            )
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Objects at the far end of `relationship_type` edges pointing at `to_id`.
    pub(crate) async fn sources_of(
        &self,
        to_id: &str,
        relationship_type: &str,
    ) -> CoreResult<Vec<stix_core_relationships::Model>> {
        Ok(StixCoreRelationships::find()
            .filter(stix_core_relationships::Column::ToId.eq(to_id))
            .filter(stix_core_relationships::Column::RelationshipType.eq(relationship_type))
            .order_by_asc(stix_core_relationships::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    /// Reference edges leaving `from_id`, e.g. markings and labels.
    pub(crate) async fn refs_of(
        &self,
        from_id: &str,
    ) -> CoreResult<Vec<stix_core_relationships::Model>> {
        Ok(StixCoreRelationships::find()
            .filter(stix_core_relationships::Column::FromId.eq(from_id))
            .filter(
                stix_core_relationships::Column::RelationshipType
                    .is_in(META_RELATIONSHIP_TYPES.iter().copied()),
            )
            .order_by_asc(stix_core_relationships::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }
}
