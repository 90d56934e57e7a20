use async_graphql::*;
use chrono::{DateTime, Utc};
use stixkb::database::entities::stix_domain_objects;
use stixkb::knowledge::{self, EntityRef, ResolvedRelationship};
use stixkb::services;

/// Either end of a relationship
#[derive(SimpleObject, Clone, Debug)]
#[graphql(rename_fields = "snake_case")]
pub struct StixCoreObject {
    pub id: String,
    pub entity_type: String,
    pub parent_types: Vec<String>,
    pub name: Option<String>,
    pub observable_value: Option<String>,
    /// `observable_value` for observables, `name` otherwise
    pub display_value: String,
}

impl From<EntityRef> for StixCoreObject {
    fn from(entity: EntityRef) -> Self {
        Self {
            display_value: entity.display_value().to_string(),
            id: entity.id,
            entity_type: entity.entity_type,
            parent_types: entity.parent_types,
            name: entity.name,
            observable_value: entity.observable_value,
        }
    }
}

#[derive(SimpleObject, Clone, Debug)]
#[graphql(rename_fields = "snake_case")]
pub struct StixCoreRelationship {
    pub id: String,
    pub relationship_type: String,
    pub from_id: String,
    pub from_type: String,
    pub to_id: String,
    pub to_type: String,
    pub start_time: Option<DateTime<Utc>>,
    pub stop_time: Option<DateTime<Utc>>,
    pub confidence: i32,
    pub description: Option<String>,
    pub inferred: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// `None` when the source is gone or not visible
    pub from: Option<StixCoreObject>,
    /// `None` when the target is gone or not visible
    pub to: Option<StixCoreObject>,
}

impl From<ResolvedRelationship> for StixCoreRelationship {
    fn from(resolved: ResolvedRelationship) -> Self {
        let r = resolved.relationship;
        Self {
            id: r.id,
            relationship_type: r.relationship_type,
            from_id: r.from_id,
            from_type: r.from_type,
            to_id: r.to_id,
            to_type: r.to_type,
            start_time: r.start_time,
            stop_time: r.stop_time,
            confidence: r.confidence,
            description: r.description,
            inferred: r.inferred,
            created_at: r.created_at,
            updated_at: r.updated_at,
            from: resolved.from.map(Into::into),
            to: resolved.to.map(Into::into),
        }
    }
}

#[derive(InputObject)]
pub struct StixCoreRelationshipAddInput {
    pub from_id: String,
    pub to_id: String,
    #[graphql(name = "relationship_type")]
    pub relationship_type: String,
    #[graphql(name = "start_time")]
    pub start_time: Option<DateTime<Utc>>,
    #[graphql(name = "stop_time")]
    pub stop_time: Option<DateTime<Utc>>,
    pub confidence: Option<i32>,
    pub description: Option<String>,
}

impl From<StixCoreRelationshipAddInput> for services::RelationshipAddInput {
    fn from(input: StixCoreRelationshipAddInput) -> Self {
        Self {
            from_id: input.from_id,
            to_id: input.to_id,
            relationship_type: input.relationship_type,
            start_time: input.start_time,
            stop_time: input.stop_time,
            confidence: input.confidence,
            description: input.description,
        }
    }
}

#[derive(SimpleObject, Clone, Debug)]
#[graphql(rename_fields = "snake_case")]
pub struct StixDomainObject {
    pub id: String,
    pub entity_type: String,
    pub parent_types: Vec<String>,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<stix_domain_objects::Model> for StixDomainObject {
    fn from(model: stix_domain_objects::Model) -> Self {
        Self {
            parent_types: model.parent_types(),
            id: model.id,
            entity_type: model.entity_type,
            name: model.name,
            description: model.description,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(InputObject)]
pub struct StixDomainObjectAddInput {
    #[graphql(name = "type")]
    pub entity_type: String,
    pub name: String,
    pub description: Option<String>,
}

impl From<StixDomainObjectAddInput> for services::DomainObjectAddInput {
    fn from(input: StixDomainObjectAddInput) -> Self {
        Self {
            entity_type: input.entity_type,
            name: input.name,
            description: input.description,
        }
    }
}

#[derive(SimpleObject, Clone, Debug)]
pub struct DistributionBucket {
    pub label: String,
    pub value: i64,
}

impl From<knowledge::DistributionBucket> for DistributionBucket {
    fn from(bucket: knowledge::DistributionBucket) -> Self {
        Self {
            label: bucket.label,
            value: bucket.value,
        }
    }
}
