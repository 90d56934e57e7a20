use async_graphql::*;
use chrono::{DateTime, Utc};
use stixkb::knowledge::DistributionField;
use stixkb::services::{
    DistributionArgs, ExternalReferenceListArgs, ObservableListArgs, RelationshipListArgs,
    TimeSeriesArgs,
};
use stixkb::views::{
    self, ExternalReferencesOptions, ExternalReferencesPanel, LinesOptions, QueryState,
    RelationshipLines,
};

use crate::graphql::context::GraphQLContext;
use crate::graphql::errors::{core_error_to_graphql_error, StructuredError};
use crate::graphql::types::{
    DistributionBucket, EntityDistributionPie, EntityExternalReferences, EntityRelationshipsLines,
    ExternalReference, ExternalReferenceConnection, ExternalReferencesOrdering, FileConnection,
    OrderingMode, PieVariant, StatsOperation, StixCoreRelationship,
    StixCoreRelationshipConnection, StixCoreRelationshipsOrdering, StixCyberObservable,
    StixCyberObservableConnection, StixCyberObservablesFiltering, StixCyberObservablesNumber,
    StixCyberObservablesOrdering, StixDomainObject, TimeInterval, TimeSeries,
};

pub struct Query;

fn parse_field(field: &str) -> Result<DistributionField> {
    field
        .parse()
        .map_err(|_| StructuredError::validation("field", format!("unsupported field {}", field)))
}

#[Object]
impl Query {
    async fn stix_cyber_observable(
        &self,
        ctx: &Context<'_>,
        id: String,
    ) -> Result<Option<StixCyberObservable>> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context.actor(ctx);
        let observable = context
            .app
            .observable_service()
            .find_by_id(&actor, &id)
            .await
            .map_err(core_error_to_graphql_error)?;
        Ok(observable.map(StixCyberObservable::from))
    }

    #[allow(clippy::too_many_arguments)]
    async fn stix_cyber_observables(
        &self,
        ctx: &Context<'_>,
        search: Option<String>,
        types: Option<Vec<String>>,
        filters: Option<Vec<StixCyberObservablesFiltering>>,
        first: Option<i32>,
        after: Option<String>,
        order_by: Option<StixCyberObservablesOrdering>,
        order_mode: Option<OrderingMode>,
    ) -> Result<StixCyberObservableConnection> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context.actor(ctx);
        let args = ObservableListArgs {
            search,
            types: types.unwrap_or_default(),
            filters: filters
                .unwrap_or_default()
                .into_iter()
                .map(Into::into)
                .collect(),
            first: first.map(i64::from),
            after,
            order_by: order_by.map(Into::into),
            order_mode: order_mode.map(Into::into).unwrap_or_default(),
        };
        let page = context
            .app
            .observable_service()
            .find_all(&actor, args)
            .await
            .map_err(core_error_to_graphql_error)?;
        Ok(page.into())
    }

    #[allow(clippy::too_many_arguments)]
    async fn stix_cyber_observables_time_series(
        &self,
        ctx: &Context<'_>,
        #[graphql(name = "type")] types: Option<Vec<String>>,
        field: String,
        operation: StatsOperation,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        interval: TimeInterval,
    ) -> Result<Vec<TimeSeries>> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context.actor(ctx);
        let points = context
            .app
            .observable_service()
            .time_series(
                &actor,
                TimeSeriesArgs {
                    types: types.unwrap_or_default(),
                    field,
                    operation: operation.into(),
                    start_date,
                    end_date,
                    interval: interval.into(),
                },
            )
            .await
            .map_err(core_error_to_graphql_error)?;
        Ok(points.into_iter().map(TimeSeries::from).collect())
    }

    async fn stix_cyber_observables_number(
        &self,
        ctx: &Context<'_>,
        #[graphql(name = "type")] types: Option<Vec<String>>,
        end_date: Option<DateTime<Utc>>,
    ) -> Result<StixCyberObservablesNumber> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context.actor(ctx);
        let summary = context
            .app
            .observable_service()
            .number(&actor, types.unwrap_or_default(), end_date)
            .await
            .map_err(core_error_to_graphql_error)?;
        Ok(summary.into())
    }

    async fn stix_cyber_observables_export_files(
        &self,
        ctx: &Context<'_>,
        first: Option<i32>,
        context: Option<String>,
    ) -> Result<FileConnection> {
        let gql = ctx.data::<GraphQLContext>()?;
        let actor = gql.actor(ctx);
        let files = gql
            .app
            .observable_service()
            .export_files(&actor, first.map(i64::from), context)
            .await
            .map_err(core_error_to_graphql_error)?;
        Ok(files.into())
    }

    #[allow(clippy::too_many_arguments)]
    async fn stix_core_relationships(
        &self,
        ctx: &Context<'_>,
        from_id: Option<String>,
        to_id: Option<String>,
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
            from_id,
            to_id,
            relationship_type: relation_type,
            to_types: to_types.unwrap_or_default(),
            inferred,
            first: first.map(i64::from),
            after,
            order_by: order_by.map(Into::into).unwrap_or_default(),
            order_mode: order_mode.map(Into::into).unwrap_or_default(),
        };
        let page = context
            .app
            .relationship_service()
            .list(&actor, args)
            .await
            .map_err(core_error_to_graphql_error)?;
        Ok(page.into())
    }

    async fn stix_core_relationship(
        &self,
        ctx: &Context<'_>,
        id: String,
    ) -> Result<Option<StixCoreRelationship>> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context.actor(ctx);
        let relationship = context
            .app
            .relationship_service()
            .find_by_id(&actor, &id)
            .await
            .map_err(core_error_to_graphql_error)?;
        Ok(relationship.map(<StixCoreRelationship as From<_>>::from))
    }

    #[allow(clippy::too_many_arguments)]
    async fn stix_core_relationships_distribution(
        &self,
        ctx: &Context<'_>,
        from_id: String,
        to_types: Option<Vec<String>>,
        relation_type: Option<String>,
        inferred: Option<bool>,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
        field: String,
        #[graphql(default_with = "StatsOperation::Count")] operation: StatsOperation,
    ) -> Result<Vec<DistributionBucket>> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context.actor(ctx);
        let args = DistributionArgs {
            from_id,
            to_types: to_types.unwrap_or_default(),
            relationship_type: relation_type,
            inferred,
            start_date,
            end_date,
            field: DistributionField::EntityType,
            operation: operation.into(),
        };
        let buckets = context
            .app
            .relationship_service()
            .distribution_by_name(&actor, &field, args)
            .await
            .map_err(core_error_to_graphql_error)?;
        Ok(buckets.into_iter().map(DistributionBucket::from).collect())
    }

    async fn stix_domain_object(
        &self,
        ctx: &Context<'_>,
        id: String,
    ) -> Result<Option<StixDomainObject>> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context.actor(ctx);
        let object = context
            .app
            .domain_object_service()
            .find_by_id(&actor, &id)
            .await
            .map_err(core_error_to_graphql_error)?;
        Ok(object.map(StixDomainObject::from))
    }

    #[allow(clippy::too_many_arguments)]
    async fn external_references(
        &self,
        ctx: &Context<'_>,
        object_id: Option<String>,
        search: Option<String>,
        first: Option<i32>,
        after: Option<String>,
        order_by: Option<ExternalReferencesOrdering>,
        order_mode: Option<OrderingMode>,
    ) -> Result<ExternalReferenceConnection> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context.actor(ctx);
        let args = ExternalReferenceListArgs {
            object_id,
            search,
            first: first.map(i64::from),
            after,
            order_by: order_by.map(Into::into).unwrap_or_default(),
            order_mode: order_mode.map(Into::into).unwrap_or_default(),
        };
        let page = context
            .app
            .external_reference_service()
            .list(&actor, args)
            .await
            .map_err(core_error_to_graphql_error)?;
        Ok(page.into())
    }

    async fn external_reference(
        &self,
        ctx: &Context<'_>,
        id: String,
    ) -> Result<Option<ExternalReference>> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context.actor(ctx);
        let reference = context
            .app
            .external_reference_service()
            .find_by_id(&actor, &id)
            .await
            .map_err(core_error_to_graphql_error)?;
        Ok(reference.map(ExternalReference::from))
    }

    /// External references panel of an entity, newest first.
    async fn entity_external_references(
        &self,
        ctx: &Context<'_>,
        entity_id: String,
        first: Option<i32>,
    ) -> Result<EntityExternalReferences> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context.actor(ctx);

        let mut options = ExternalReferencesOptions::new(entity_id);
        options.max_page_size = context.app.page_settings().max_page_size;
        if let Some(first) = first {
            options.page_size = first.max(0) as u64;
        }
        let mut pagination = views::ExternalReferencesPagination::new(options);

        let result = context
            .app
            .external_reference_service()
            .list(&actor, pagination.initial_request())
            .await;
        let panel = match result {
            Ok(page) => {
                pagination.apply_page(page);
                ExternalReferencesPanel::from_pagination(&pagination)
            }
            Err(err) => {
                ExternalReferencesPanel::from_state(QueryState::Failed(err.message().to_string()))
            }
        };
        Ok(panel.into())
    }

    /// Relationship list panel of an entity. Query failures are reported in
    /// the panel state.
    #[allow(clippy::too_many_arguments)]
    async fn entity_relationships_lines(
        &self,
        ctx: &Context<'_>,
        entity_id: String,
        relation_type: Option<String>,
        to_types: Option<Vec<String>>,
        first: Option<i32>,
        order_by: Option<StixCoreRelationshipsOrdering>,
        order_mode: Option<OrderingMode>,
    ) -> Result<EntityRelationshipsLines> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context.actor(ctx);

        let mut options = LinesOptions::new(entity_id);
        options.max_page_size = context.app.page_settings().max_page_size;
        options.relationship_type = relation_type;
        options.to_types = to_types.unwrap_or_default();
        if let Some(order_by) = order_by {
            options.order_by = order_by.into();
        }
        if let Some(order_mode) = order_mode {
            options.order_mode = order_mode.into();
        }
        if let Some(first) = first {
            options.page_size = first.max(0) as u64;
        }
        let mut pagination = views::LinesPagination::new(options);

        let result = context
            .app
            .relationship_service()
            .list(&actor, pagination.initial_request())
            .await;
        let lines = match result {
            Ok(page) => {
                pagination.apply_page(page);
                RelationshipLines::from_pagination(&pagination)
            }
            Err(err) => RelationshipLines::from_state(QueryState::Failed(err.message().to_string())),
        };
        Ok(lines.into())
    }

    /// Distribution pie panel of an entity
    #[allow(clippy::too_many_arguments)]
    async fn entity_distribution_pie(
        &self,
        ctx: &Context<'_>,
        entity_id: String,
        entity_type: String,
        #[graphql(default)] widget_id: String,
        relation_type: Option<String>,
        to_types: Option<Vec<String>>,
        field: String,
        #[graphql(default_with = "StatsOperation::Count")] operation: StatsOperation,
        #[graphql(default_with = "PieVariant::Default")] variant: PieVariant,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
    ) -> Result<EntityDistributionPie> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context.actor(ctx);
        let field = parse_field(&field)?;
        let args = DistributionArgs {
            from_id: entity_id,
            to_types: to_types.unwrap_or_default(),
            relationship_type: relation_type,
            inferred: Some(false),
            start_date,
            end_date,
            field,
            operation: operation.into(),
        };
        let state = QueryState::from_result(
            context
                .app
                .relationship_service()
                .distribution(&actor, args)
                .await,
        );
        let pie = views::DistributionPie::new(
            &actor,
            &entity_type,
            &widget_id,
            field,
            variant.into(),
            state,
        );
        Ok(pie.into())
    }
}
