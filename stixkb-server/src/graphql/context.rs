use std::sync::Arc;

use stixkb::auth::Actor;
use stixkb::AppContext;
use tokio_util::sync::CancellationToken;

/// Schema-wide data. The acting user and, for subscriptions, the
/// cancellation token are attached per request.
#[derive(Clone)]
pub struct GraphQLContext {
    pub app: Arc<AppContext>,
    shutdown: CancellationToken,
}

impl GraphQLContext {
    pub fn new(app: Arc<AppContext>, shutdown: CancellationToken) -> Self {
        Self { app, shutdown }
    }

    /// Actor of the request, anonymous when the transport attached none.
    pub fn actor(&self, ctx: &async_graphql::Context<'_>) -> Actor {
        ctx.data_opt::<Actor>()
            .cloned()
            .unwrap_or_else(Actor::anonymous)
    }

    /// Token ending a subscription stream: the one attached by the
    /// transport, or a child of the server shutdown token.
    pub fn subscription_token(&self, ctx: &async_graphql::Context<'_>) -> CancellationToken {
        ctx.data_opt::<CancellationToken>()
            .cloned()
            .unwrap_or_else(|| self.shutdown.child_token())
    }
}
