use async_graphql::*;
use chrono::{DateTime, Utc};
use stixkb::database::entities::stix_cyber_observables;
use stixkb::ordering;
use stixkb::services::{self, RelationshipListArgs};

use super::enums::{OrderingMode, StixCoreRelationshipsOrdering, StixCyberObservablesFilter};
use super::{Connector, EditUserContext, StixCoreRelationshipConnection, StixDomainObject, Work};
use crate::graphql::context::GraphQLContext;
use crate::graphql::errors::core_error_to_graphql_error;

#[derive(SimpleObject, Clone, Debug)]
#[graphql(complex, rename_fields = "snake_case")]
pub struct StixCyberObservable {
    pub id: String,
    pub entity_type: String,
    pub parent_types: Vec<String>,
    pub observable_value: String,
    pub description: Option<String>,
    pub x_opencti_score: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[graphql(skip)]
    pub model: stix_cyber_observables::Model,
}

impl From<stix_cyber_observables::Model> for StixCyberObservable {
    fn from(model: stix_cyber_observables::Model) -> Self {
        Self {
            id: model.id.clone(),
            entity_type: model.entity_type.clone(),
            parent_types: model.parent_types(),
            observable_value: model.observable_value.clone(),
            description: model.description.clone(),
            x_opencti_score: model.x_opencti_score,
            created_at: model.created_at,
            updated_at: model.updated_at,
            model,
        }
    }
}

#[ComplexObject]
impl StixCyberObservable {
    /// Indicators based on this observable
    async fn indicators(&self, ctx: &Context<'_>) -> Result<Vec<StixDomainObject>> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context.actor(ctx);
        let indicators = context
            .app
            .observable_service()
            .indicators(&actor, &self.id)
            .await
            .map_err(core_error_to_graphql_error)?;
        Ok(indicators.into_iter().map(StixDomainObject::from).collect())
    }

    async fn jobs(&self, ctx: &Context<'_>, first: Option<i32>) -> Result<Vec<Work>> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context.actor(ctx);
        let works = context
            .app
            .observable_service()
            .jobs(&actor, &self.id, first.map(i64::from))
            .await
            .map_err(core_error_to_graphql_error)?;
        Ok(works.into_iter().map(Work::from).collect())
    }

    /// Enrichment connectors able to process this observable
    async fn connectors(
        &self,
        ctx: &Context<'_>,
        #[graphql(default = false)] only_alive: bool,
    ) -> Result<Vec<Connector>> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context.actor(ctx);
        let connectors = context
            .app
            .observable_service()
            .connectors(&actor, &self.entity_type, only_alive)
            .await
            .map_err(core_error_to_graphql_error)?;
        Ok(connectors.into_iter().map(Connector::from).collect())
    }

    #[allow(clippy::too_many_arguments)]
    async fn stix_relations(
        &self,
        ctx: &Context<'_>,
        relation_type: Option<String>,
        to_types: Option<Vec<String>>,
        inferred: Option<bool>,
        first: Option<i32>,
        after: Option<String>,
        order_by: Option<StixCoreRelationshipsOrdering>,
        order_mode: Option<OrderingMode>,
    ) -> Result<StixCoreRelationshipConnection> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context.actor(ctx);
        let args = RelationshipListArgs {
            relationship_type: relation_type,
            to_types: to_types.unwrap_or_default(),
            inferred,
            first: first.map(i64::from),
            after,
            order_by: order_by.map(Into::into).unwrap_or_default(),
            order_mode: order_mode.map(Into::into).unwrap_or_default(),
            ..Default::default()
        };
        let page = context
            .app
            .observable_service()
            .stix_relations(&actor, &self.id, args)
            .await
            .map_err(core_error_to_graphql_error)?;
        Ok(page.into())
    }

    /// STIX 2.1 JSON representation
    async fn to_stix(&self, ctx: &Context<'_>) -> Result<String> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context.actor(ctx);
        context
            .app
            .observable_service()
            .to_stix(&actor, &self.model)
            .await
            .map_err(core_error_to_graphql_error)
    }

    /// Users currently editing this observable
    async fn edit_context(&self, ctx: &Context<'_>) -> Result<Vec<EditUserContext>> {
        let context = ctx.data::<GraphQLContext>()?;
        Ok(context
            .app
            .observable_service()
            .edit_context(&self.id)
            .into_iter()
            .map(EditUserContext::from)
            .collect())
    }
}

#[derive(InputObject)]
pub struct StixCyberObservablesFiltering {
    pub key: StixCyberObservablesFilter,
    pub values: Vec<String>,
}

impl From<StixCyberObservablesFiltering> for ordering::ObservablesFiltering {
    fn from(input: StixCyberObservablesFiltering) -> Self {
        Self {
            key: input.key.into(),
            values: input.values,
        }
    }
}

#[derive(InputObject)]
pub struct StixCyberObservableAddInput {
    #[graphql(name = "type")]
    pub entity_type: String,
    #[graphql(name = "observable_value")]
    pub observable_value: String,
    pub description: Option<String>,
    #[graphql(name = "x_opencti_score")]
    pub x_opencti_score: Option<i32>,
    pub created_by: Option<String>,
    pub object_marking: Option<Vec<String>>,
    pub object_label: Option<Vec<String>>,
}

impl From<StixCyberObservableAddInput> for services::ObservableAddInput {
    fn from(input: StixCyberObservableAddInput) -> Self {
        Self {
            entity_type: input.entity_type,
            observable_value: input.observable_value,
            description: input.description,
            x_opencti_score: input.x_opencti_score,
            created_by: input.created_by,
            object_marking: input.object_marking.unwrap_or_default(),
            object_label: input.object_label.unwrap_or_default(),
        }
    }
}

#[derive(InputObject)]
pub struct EditInput {
    pub key: String,
    pub value: Vec<String>,
}

impl From<EditInput> for services::EditInput {
    fn from(input: EditInput) -> Self {
        Self {
            key: input.key,
            value: input.value,
        }
    }
}

#[derive(InputObject)]
pub struct EditContext {
    pub focus_on: Option<String>,
}

#[derive(InputObject)]
pub struct StixRefRelationshipAddInput {
    pub to_id: String,
    #[graphql(name = "relationship_type")]
    pub relationship_type: String,
}

#[derive(InputObject)]
pub struct StixRefRelationshipsAddInput {
    pub to_ids: Vec<String>,
    #[graphql(name = "relationship_type")]
    pub relationship_type: String,
}
