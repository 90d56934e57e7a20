use std::collections::BTreeSet;

use crate::errors::{CoreError, CoreResult};

/// Named platform capabilities. `BYPASS` grants every other capability.
pub mod capabilities {
    pub const BYPASS: &str = "BYPASS";
    pub const KNOWLEDGE: &str = "KNOWLEDGE";
    pub const KNOWLEDGE_KNUPDATE: &str = "KNOWLEDGE_KNUPDATE";
    pub const KNOWLEDGE_KNUPDATE_KNDELETE: &str = "KNOWLEDGE_KNUPDATE_KNDELETE";
    pub const KNOWLEDGE_KNENRICHMENT: &str = "KNOWLEDGE_KNENRICHMENT";
    pub const KNOWLEDGE_KNGETEXPORT_KNASKEXPORT: &str = "KNOWLEDGE_KNGETEXPORT_KNASKEXPORT";
    pub const EXPLORE: &str = "EXPLORE";
    pub const EXPLORE_EXUPDATE: &str = "EXPLORE_EXUPDATE";
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Actor {
    pub user_id: Option<String>,
    pub name: String,
    capabilities: BTreeSet<String>,
    is_system: bool,
}

impl Actor {
    pub fn user(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            name: name.into(),
            capabilities: BTreeSet::new(),
            is_system: false,
        }
    }

    pub fn anonymous() -> Self {
        Self {
            user_id: None,
            name: "anonymous".to_string(),
            capabilities: BTreeSet::new(),
            is_system: false,
        }
    }

    pub fn system() -> Self {
        Self {
            user_id: None,
            name: "system".to_string(),
            capabilities: BTreeSet::new(),
            is_system: true,
        }
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.insert(capability.into());
        self
    }

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities
            .extend(capabilities.into_iter().map(Into::into));
        self
    }

    pub fn capabilities(&self) -> impl Iterator<Item = &str> {
        self.capabilities.iter().map(String::as_str)
    }

    pub fn is_system(&self) -> bool {
        self.is_system
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_system || self.user_id.is_some()
    }

    /// Returns the user id or an `Unauthorized` error for anonymous callers.
    pub fn require_user_id(&self) -> CoreResult<&str> {
        self.user_id
            .as_deref()
            .ok_or_else(|| CoreError::unauthorized("Authentication required"))
    }
}

/// Capability check evaluated before anything permission-gated is built.
///
/// Capabilities are hierarchical by prefix: holding `KNOWLEDGE_KNUPDATE`
/// implies `KNOWLEDGE`, holding `KNOWLEDGE` alone does not imply
/// `KNOWLEDGE_KNUPDATE`.
pub fn has_capability(actor: &Actor, capability: &str) -> bool {
    if actor.is_system || actor.capabilities.contains(capabilities::BYPASS) {
        return true;
    }
    actor.capabilities.iter().any(|held| {
        held == capability
            || (held.starts_with(capability)
                && held.as_bytes().get(capability.len()) == Some(&b'_'))
    })
}

pub trait Authorizer {
    fn authorize(&self, actor: &Actor, capability: &str) -> CoreResult<()>;
}

pub struct CapabilityAuthorizer;

impl Authorizer for CapabilityAuthorizer {
    fn authorize(&self, actor: &Actor, capability: &str) -> CoreResult<()> {
        if !actor.is_authenticated() {
            return Err(CoreError::unauthorized("Authentication required"));
        }
        if has_capability(actor, capability) {
            Ok(())
        } else {
            Err(CoreError::forbidden(format!(
                "Missing capability {}",
                capability
            ))
            .with_field("capability", capability))
        }
    }
}

/// Shorthand for the default capability check used by every service.
pub fn require_capability(actor: &Actor, capability: &str) -> CoreResult<()> {
    CapabilityAuthorizer.authorize(actor, capability)
}

#[cfg(test)]
mod tests {
    use super::capabilities::*;
    use super::*;
    use crate::errors::CoreErrorKind;

    #[test]
    fn bypass_grants_everything() {
        let admin = Actor::user("u1", "admin").with_capability(BYPASS);
        assert!(has_capability(&admin, EXPLORE_EXUPDATE));
        assert!(has_capability(&admin, KNOWLEDGE_KNUPDATE_KNDELETE));
    }

    #[test]
    fn child_capability_implies_parent() {
        let editor = Actor::user("u2", "editor").with_capability(KNOWLEDGE_KNUPDATE);
        assert!(has_capability(&editor, KNOWLEDGE));
        assert!(has_capability(&editor, KNOWLEDGE_KNUPDATE));
        assert!(!has_capability(&editor, KNOWLEDGE_KNUPDATE_KNDELETE));
        assert!(!has_capability(&editor, EXPLORE_EXUPDATE));
    }

    #[test]
    fn prefix_without_separator_is_not_a_parent() {
        let reader = Actor::user("u3", "reader").with_capability("EXPLOREX");
        assert!(!has_capability(&reader, EXPLORE));
    }

    #[test]
    fn authorizer_distinguishes_anonymous_from_forbidden() {
        let authorizer = CapabilityAuthorizer;
        let err = authorizer
            .authorize(&Actor::anonymous(), KNOWLEDGE)
            .expect_err("anonymous must fail");
        assert_eq!(err.kind(), CoreErrorKind::Unauthorized);

        let reader = Actor::user("u4", "reader").with_capability(KNOWLEDGE);
        let err = authorizer
            .authorize(&reader, KNOWLEDGE_KNUPDATE)
            .expect_err("reader cannot update");
        assert_eq!(err.kind(), CoreErrorKind::Forbidden);
        assert!(authorizer.authorize(&reader, KNOWLEDGE).is_ok());
    }

    #[test]
    fn system_actor_is_authenticated() {
        let actor = Actor::system();
        assert!(actor.is_system());
        assert!(actor.is_authenticated());
        assert!(actor.require_user_id().is_err());
    }
}
