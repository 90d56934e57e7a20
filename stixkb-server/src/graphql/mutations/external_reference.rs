use async_graphql::*;

use crate::graphql::context::GraphQLContext;
use crate::graphql::errors::core_error_to_graphql_error;
use crate::graphql::types::{ExternalReference, ExternalReferenceAddInput};

#[derive(Default)]
pub struct ExternalReferenceMutation;

#[Object]
impl ExternalReferenceMutation {
    async fn external_reference_add(
        &self,
        ctx: &Context<'_>,
        input: ExternalReferenceAddInput,
    ) -> Result<ExternalReference> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context.actor(ctx);
        let reference = context
            .app
            .external_reference_service()
            .add(&actor, input.into())
            .await
            .map_err(core_error_to_graphql_error)?;
        Ok(ExternalReference::from(reference))
    }

    async fn external_reference_edit(&self, id: String) -> ExternalReferenceEditMutations {
        ExternalReferenceEditMutations { id }
    }
}

pub struct ExternalReferenceEditMutations {
    id: String,
}

#[Object]
impl ExternalReferenceEditMutations {
    /// Attaches the reference to an object
    async fn relation_add(&self, ctx: &Context<'_>, object_id: String) -> Result<ExternalReference> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context.actor(ctx);
        let reference = context
            .app
            .external_reference_service()
            .relation_add(&actor, &self.id, &object_id)
            .await
            .map_err(core_error_to_graphql_error)?;
        Ok(ExternalReference::from(reference))
    }

    async fn relation_delete(
        &self,
        ctx: &Context<'_>,
        object_id: String,
    ) -> Result<ExternalReference> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context.actor(ctx);
        let reference = context
            .app
            .external_reference_service()
            .relation_delete(&actor, &self.id, &object_id)
            .await
            .map_err(core_error_to_graphql_error)?;
        Ok(ExternalReference::from(reference))
    }

    /// Deletes the reference and returns its id
    async fn delete(&self, ctx: &Context<'_>) -> Result<String> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context.actor(ctx);
        context
            .app
            .external_reference_service()
            .delete(&actor, &self.id)
            .await
            .map_err(core_error_to_graphql_error)
    }
}
