use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

use crate::auth::{capabilities, require_capability, Actor};
use crate::database::entities::stix_domain_objects::{self, Entity as StixDomainObjects};
use crate::errors::{CoreResult, KnowledgeError};

#[derive(Clone, Debug)]
pub struct DomainObjectAddInput {
    pub entity_type: String,
    pub name: String,
    pub description: Option<String>,
}

/// Domain objects referenced by observables: indicators, identities,
/// marking definitions, labels.
#[derive(Clone)]
pub struct StixDomainObjectService {
    db: DatabaseConnection,
}

impl StixDomainObjectService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_by_id(
        &self,
        actor: &Actor,
        id: &str,
    ) -> CoreResult<Option<stix_domain_objects::Model>> {
        require_capability(actor, capabilities::KNOWLEDGE)?;
        Ok(StixDomainObjects::find_by_id(id.to_string())
            .one(&self.db)
            .await?)
    }

    pub async fn add(
        &self,
        actor: &Actor,
        input: DomainObjectAddInput,
    ) -> CoreResult<stix_domain_objects::Model> {
        require_capability(actor, capabilities::KNOWLEDGE_KNUPDATE)?;
        if input.entity_type.trim().is_empty() {
            return Err(KnowledgeError::InvalidValue {
                field: "type".to_string(),
                reason: "must not be empty".to_string(),
            }
            .into());
        }
        if input.name.trim().is_empty() {
            return Err(KnowledgeError::InvalidValue {
                field: "name".to_string(),
                reason: "must not be empty".to_string(),
            }
            .into());
        }

        let mut model = stix_domain_objects::ActiveModel::new(input.entity_type, input.name);
        model.description = Set(input.description);
        Ok(model.insert(&self.db).await?)
    }
}
