use async_graphql::*;

use crate::graphql::context::GraphQLContext;
use crate::graphql::errors::core_error_to_graphql_error;
use crate::graphql::types::{StixDomainObject, StixDomainObjectAddInput};

#[derive(Default)]
pub struct DomainObjectMutation;

#[Object]
impl DomainObjectMutation {
    async fn stix_domain_object_add(
        &self,
        ctx: &Context<'_>,
        input: StixDomainObjectAddInput,
    ) -> Result<StixDomainObject> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context.actor(ctx);
        let object = context
            .app
            .domain_object_service()
            .add(&actor, input.into())
            .await
            .map_err(core_error_to_graphql_error)?;
        Ok(StixDomainObject::from(object))
    }
}
