use async_graphql::*;
use futures_util::{Stream, StreamExt};

use crate::graphql::context::GraphQLContext;
use crate::graphql::errors::core_error_to_graphql_error;
use crate::graphql::types::StixCyberObservable;

pub struct Subscription;

#[Subscription]
impl Subscription {
    /// Edits of one observable made by other users. While subscribed the
    /// caller appears in the observable's edit context.
    async fn stix_cyber_observable(
        &self,
        ctx: &Context<'_>,
        id: String,
    ) -> Result<impl Stream<Item = StixCyberObservable>> {
        let context = ctx.data::<GraphQLContext>()?;
        let actor = context.actor(ctx);
        let stream = context
            .app
            .watch_service()
            .watch_observable(actor, id, context.subscription_token(ctx))
            .await
            .map_err(core_error_to_graphql_error)?;
        Ok(stream.map(StixCyberObservable::from))
    }
}
