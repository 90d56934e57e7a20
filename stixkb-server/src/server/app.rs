use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_graphql::{Pos, Response};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    extract::{State, WebSocketUpgrade},
    http::HeaderMap,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use serde_json::json;
use stixkb::AppContext;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use super::websocket::handle_graphql_ws;
use crate::auth::TokenAuthenticator;
use crate::config::PlatformConfig;
use crate::graphql::errors::core_error_to_graphql_error;
use crate::graphql::{build_schema, GraphQLContext, GraphQLSchema};

#[derive(Clone)]
pub struct AppState {
    pub graphql_schema: GraphQLSchema,
    pub authenticator: TokenAuthenticator,
    pub shutdown: CancellationToken,
}

pub fn create_app(
    app: Arc<AppContext>,
    config: &PlatformConfig,
    shutdown: CancellationToken,
) -> Result<Router> {
    let graphql_schema = build_schema(GraphQLContext::new(app, shutdown.clone()));
    let state = AppState {
        graphql_schema,
        authenticator: TokenAuthenticator::new(&config.effective_users()),
        shutdown,
    };

    let methods = [
        axum::http::Method::GET,
        axum::http::Method::POST,
        axum::http::Method::OPTIONS,
    ];
    let cors = match config.server.cors_origin.as_deref() {
        Some(origin) => CorsLayer::new()
            .allow_origin(
                origin
                    .parse::<axum::http::HeaderValue>()
                    .map_err(|e| anyhow!("Invalid CORS origin: {}", e))?,
            )
            .allow_methods(methods)
            .allow_headers(Any)
            .allow_credentials(false),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
            .allow_credentials(false),
    };

    let app = Router::new()
        .route("/health", get(health_check))
        .route(
            "/graphql",
            get(graphql_playground)
                .post(graphql_handler)
                .options(|| async { axum::http::StatusCode::OK }),
        )
        .route("/graphql/ws", get(graphql_ws_handler))
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(state);

    Ok(app)
}

async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn graphql_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let actor = match state.authenticator.actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(err) => {
            tracing::debug!("Rejected GraphQL request: {}", err);
            let error = core_error_to_graphql_error(err).into_server_error(Pos::default());
            return Response::from_errors(vec![error]).into();
        }
    };
    tracing::debug!(user_id = ?actor.user_id, "GraphQL request received");
    let response = state
        .graphql_schema
        .execute(req.into_inner().data(actor))
        .await;
    tracing::debug!("GraphQL request completed");
    response.into()
}

async fn graphql_playground() -> impl IntoResponse {
    Html(async_graphql::http::playground_source(
        async_graphql::http::GraphQLPlaygroundConfig::new("/graphql")
            .subscription_endpoint("/graphql/ws"),
    ))
}

async fn graphql_ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.protocols(["graphql-transport-ws"])
        .on_upgrade(move |socket| async move {
            handle_graphql_ws(
                socket,
                state.graphql_schema,
                state.authenticator,
                state.shutdown,
            )
            .await;
        })
}
