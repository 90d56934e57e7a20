use std::collections::HashMap;
use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, HeaderMap};
use serde_json::Value;
use stixkb::auth::Actor;
use stixkb::errors::CoreError;

use crate::config::UserConfig;

/// Maps static bearer tokens to actors.
#[derive(Clone, Debug, Default)]
pub struct TokenAuthenticator {
    actors: Arc<HashMap<String, Actor>>,
}

impl TokenAuthenticator {
    pub fn new(users: &[UserConfig]) -> Self {
        let actors = users
            .iter()
            .map(|user| {
                let actor = Actor::user(user.id.clone(), user.name.clone())
                    .with_capabilities(user.capabilities.iter().cloned());
                (user.token.clone(), actor)
            })
            .collect();
        Self {
            actors: Arc::new(actors),
        }
    }

    pub fn actor_for_token(&self, token: &str) -> Result<Actor, CoreError> {
        self.actors
            .get(token)
            .cloned()
            .ok_or_else(|| CoreError::unauthorized("Invalid authentication token"))
    }

    /// Anonymous without an `Authorization` header, an error for an unknown
    /// token.
    pub fn actor_from_headers(&self, headers: &HeaderMap) -> Result<Actor, CoreError> {
        let Some(value) = headers.get(AUTHORIZATION) else {
            return Ok(Actor::anonymous());
        };
        let value = value
            .to_str()
            .map_err(|_| CoreError::unauthorized("Malformed Authorization header"))?;
        self.actor_for_token(bearer(value))
    }

    /// Reads the token of a `connection_init` payload, either
    /// `{"authorization": "Bearer ..."}` or `{"token": "..."}`.
    pub fn actor_from_init_payload(&self, payload: Option<&Value>) -> Result<Actor, CoreError> {
        let token = payload.and_then(|payload| {
            ["authorization", "Authorization", "token"]
                .iter()
                .find_map(|key| payload.get(*key).and_then(Value::as_str))
        });
        match token {
            Some(token) => self.actor_for_token(bearer(token)),
            None => Ok(Actor::anonymous()),
        }
    }
}

fn bearer(value: &str) -> &str {
    let value = value.trim();
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .unwrap_or(value)
        .trim()
}
