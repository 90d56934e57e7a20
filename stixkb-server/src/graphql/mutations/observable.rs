use async_graphql::*;
use stixkb::services::{
    EditContextInput, EditRequest, ExportAskInput, ExportPushInput, RefRelationAddInput,
    RefRelationsAddInput, RelationDeleteInput,
};

use crate::graphql::context::GraphQLContext;
use crate::graphql::errors::core_error_to_graphql_error;
use crate::graphql::types::{
    EditContext, EditInput, File, FileUploadInput, StixCoreRelationship, StixCyberObservable,
    StixCyberObservableAddInput, StixRefRelationshipAddInput, StixRefRelationshipsAddInput, Work,
};

#[derive(Default)]
pub struct ObservableMutation;

#[Object]
impl ObservableMutation {
    /// Edit operations on one observable
    async fn stix_cyber_observable_edit(&self, id: String) -> StixCyberObservableEditMutations {
        StixCyberObservableEditMutations { id }
    }

    async fn stix_cyber_observable_add(
        &self,
        ctx: &Context<'_>,
        input: StixCyberObservableAddInput,
    ) -> Result<StixCyberObservable> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context.actor(ctx);
        let observable = context
            .app
            .observable_service()
            .add(&actor, input.into())
            .await
            .map_err(core_error_to_graphql_error)?;
        Ok(StixCyberObservable::from(observable))
    }

    /// Queues an export of the observable list on every export connector
    async fn stix_cyber_observables_export_ask(
        &self,
        ctx: &Context<'_>,
        format: String,
        export_type: String,
        context: Option<String>,
        list_args: Option<String>,
    ) -> Result<Vec<Work>> {
        let gql = ctx.data::<GraphQLContext>()?;
        let actor = gql.actor(ctx);
        let works = gql
            .app
            .observable_service()
            .export_ask(
                &actor,
                ExportAskInput {
                    format,
                    export_type,
                    context,
                    list_args,
                },
            )
            .await
            .map_err(core_error_to_graphql_error)?;
        Ok(works.into_iter().map(Work::from).collect())
    }

    /// Stores a finished export pushed back by a connector
    async fn stix_cyber_observables_export_push(
        &self,
        ctx: &Context<'_>,
        file: FileUploadInput,
        context: Option<String>,
        list_args: Option<String>,
    ) -> Result<File> {
        let gql = ctx.data::<GraphQLContext>()?;
        let actor = gql.actor(ctx);
        let stored = gql
            .app
            .observable_service()
            .export_push(
                &actor,
                ExportPushInput {
                    file: file.into(),
                    context,
                    list_args,
                },
            )
            .await
            .map_err(core_error_to_graphql_error)?;
        Ok(File::from(stored))
    }
}

pub struct StixCyberObservableEditMutations {
    id: String,
}

impl StixCyberObservableEditMutations {
    fn request<'c>(&self, ctx: &'c Context<'_>) -> Result<(&'c GraphQLContext, EditRequest)> {
        let context = ctx.data::<GraphQLContext>()?;
        Ok((context, EditRequest::new(context.actor(ctx), self.id.clone())))
    }
}

#[Object]
impl StixCyberObservableEditMutations {
    /// Deletes the observable and returns its id
    async fn delete(&self, ctx: &Context<'_>) -> Result<String> {
        let (context, request) = self.request(ctx)?;
        context
            .app
            .observable_service()
            .delete(request)
            .await
            .map_err(core_error_to_graphql_error)
    }

    async fn field_patch(
        &self,
        ctx: &Context<'_>,
        input: EditInput,
    ) -> Result<StixCyberObservable> {
        let (context, request) = self.request(ctx)?;
        let observable = context
            .app
            .observable_service()
            .field_patch(request, input.into())
            .await
            .map_err(core_error_to_graphql_error)?;
        Ok(observable.into())
    }

    /// Marks the caller as editing the observable
    async fn context_patch(
        &self,
        ctx: &Context<'_>,
        input: Option<EditContext>,
    ) -> Result<StixCyberObservable> {
        let (context, request) = self.request(ctx)?;
        let input = EditContextInput {
            focus_on: input.and_then(|input| input.focus_on),
        };
        let observable = context
            .app
            .observable_service()
            .context_patch(request, input)
            .await
            .map_err(core_error_to_graphql_error)?;
        Ok(observable.into())
    }

    async fn context_clean(&self, ctx: &Context<'_>) -> Result<StixCyberObservable> {
        let (context, request) = self.request(ctx)?;
        let observable = context
            .app
            .observable_service()
            .context_clean(request)
            .await
            .map_err(core_error_to_graphql_error)?;
        Ok(observable.into())
    }

    async fn relation_add(
        &self,
        ctx: &Context<'_>,
        input: StixRefRelationshipAddInput,
    ) -> Result<StixCoreRelationship> {
        let (context, request) = self.request(ctx)?;
        let relationship = context
            .app
            .observable_service()
            .relation_add(
                request,
                RefRelationAddInput {
                    to_id: input.to_id,
                    relationship_type: input.relationship_type,
                },
            )
            .await
            .map_err(core_error_to_graphql_error)?;
        Ok(relationship.into())
    }

    async fn relations_add(
        &self,
        ctx: &Context<'_>,
        input: StixRefRelationshipsAddInput,
    ) -> Result<StixCyberObservable> {
        let (context, request) = self.request(ctx)?;
        let observable = context
            .app
            .observable_service()
            .relations_add(
                request,
                RefRelationsAddInput {
                    to_ids: input.to_ids,
                    relationship_type: input.relationship_type,
                },
            )
            .await
            .map_err(core_error_to_graphql_error)?;
        Ok(observable.into())
    }

    /// Removes an edge, either by relationship id or by target and type
    async fn relation_delete(
        &self,
        ctx: &Context<'_>,
        relation_id: Option<String>,
        to_id: Option<String>,
        #[graphql(name = "relationType")] relationship_type: Option<String>,
    ) -> Result<StixCyberObservable> {
        let (context, request) = self.request(ctx)?;
        let observable = context
            .app
            .observable_service()
            .relation_delete(
                request,
                RelationDeleteInput {
                    relation_id,
                    to_id,
                    relationship_type,
                },
            )
            .await
            .map_err(core_error_to_graphql_error)?;
        Ok(observable.into())
    }

    async fn ask_enrichment(&self, ctx: &Context<'_>, connector_id: String) -> Result<Work> {
        let (context, request) = self.request(ctx)?;
        let work = context
            .app
            .observable_service()
            .ask_enrichment(request, &connector_id)
            .await
            .map_err(core_error_to_graphql_error)?;
        Ok(work.into())
    }
}
