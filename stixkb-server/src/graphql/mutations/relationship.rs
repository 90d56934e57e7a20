use async_graphql::*;

use crate::graphql::context::GraphQLContext;
use crate::graphql::errors::core_error_to_graphql_error;
use crate::graphql::types::{StixCoreRelationship, StixCoreRelationshipAddInput};

#[derive(Default)]
pub struct RelationshipMutation;

#[Object]
impl RelationshipMutation {
    async fn stix_core_relationship_add(
        &self,
        ctx: &Context<'_>,
        input: StixCoreRelationshipAddInput,
    ) -> Result<StixCoreRelationship> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context.actor(ctx);
        let relationship = context
            .app
            .relationship_service()
            .add(&actor, input.into())
            .await
            .map_err(core_error_to_graphql_error)?;
        Ok(<StixCoreRelationship as From<_>>::from(relationship))
    }

    async fn stix_core_relationship_edit(&self, id: String) -> StixCoreRelationshipEditMutations {
        StixCoreRelationshipEditMutations { id }
    }
}

pub struct StixCoreRelationshipEditMutations {
    id: String,
}

#[Object]
impl StixCoreRelationshipEditMutations {
    /// Deletes the relationship and returns its id
    async fn delete(&self, ctx: &Context<'_>) -> Result<String> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context.actor(ctx);
        context
            .app
            .relationship_service()
            .delete(&actor, &self.id)
            .await
            .map_err(core_error_to_graphql_error)
    }
}
