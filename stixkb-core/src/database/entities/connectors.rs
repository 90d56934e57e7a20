use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "connectors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub connector_type: String,
    /// Comma separated entity types (enrichment) or mime types (export).
    pub scope: String,
    pub active: bool,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, AsRefStr, Serialize, Deserialize)]
pub enum ConnectorType {
    #[strum(serialize = "INTERNAL_ENRICHMENT")]
    #[serde(rename = "INTERNAL_ENRICHMENT")]
    InternalEnrichment,
    #[strum(serialize = "INTERNAL_EXPORT_FILE")]
    #[serde(rename = "INTERNAL_EXPORT_FILE")]
    InternalExportFile,
}

impl ActiveModel {
    pub fn new(
        id: String,
        name: String,
        connector_type: ConnectorType,
        scope: &[String],
        active: bool,
    ) -> Self {
        Self {
            id: Set(id),
            name: Set(name),
            connector_type: Set(connector_type.to_string()),
            scope: Set(scope.join(",")),
            active: Set(active),
            updated_at: Set(chrono::Utc::now()),
        }
    }
}

impl Model {
    pub fn scopes(&self) -> Vec<String> {
        self.scope
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Scope matching is case-insensitive; an empty scope accepts everything.
    pub fn accepts(&self, target: &str) -> bool {
        let scopes = self.scopes();
        scopes.is_empty() || scopes.iter().any(|s| s.eq_ignore_ascii_case(target))
    }

    pub fn kind(&self) -> Option<ConnectorType> {
        self.connector_type.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connector(scope: &str) -> Model {
        Model {
            id: "c".to_string(),
            name: "c".to_string(),
            connector_type: ConnectorType::InternalEnrichment.to_string(),
            scope: scope.to_string(),
            active: true,
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn scope_matching_ignores_case() {
        let model = connector("IPv4-Addr, Domain-Name");
        assert!(model.accepts("ipv4-addr"));
        assert!(!model.accepts("StixFile"));
        assert!(connector("").accepts("anything"));
    }

    #[test]
    fn connector_type_parses() {
        assert_eq!(
            connector("").kind(),
            Some(ConnectorType::InternalEnrichment)
        );
    }
}
