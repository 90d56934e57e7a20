use async_graphql::*;

use crate::graphql::context::GraphQLContext;
use crate::graphql::errors::core_error_to_graphql_error;

#[derive(Default)]
pub struct SessionMutation;

#[Object]
impl SessionMutation {
    /// Ends the caller's session. Open watches of the caller terminate and
    /// release their edit markers. Returns the caller id.
    async fn logout(&self, ctx: &Context<'_>) -> Result<String> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context.actor(ctx);
        context
            .app
            .logout(&actor)
            .map_err(core_error_to_graphql_error)?;
        Ok(actor.require_user_id().map_err(core_error_to_graphql_error)?.to_string())
    }
}
