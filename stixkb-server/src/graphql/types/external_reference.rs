use async_graphql::*;
use chrono::{DateTime, Utc};
use stixkb::database::entities::external_references;
use stixkb::pagination::Connection;
use stixkb::services;

use super::PageInfo;

#[derive(SimpleObject, Clone, Debug)]
#[graphql(rename_fields = "snake_case")]
pub struct ExternalReference {
    pub id: String,
    pub source_name: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub external_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<external_references::Model> for ExternalReference {
    fn from(model: external_references::Model) -> Self {
        Self {
            id: model.id,
            source_name: model.source_name,
            description: model.description,
            url: model.url,
            external_id: model.external_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(SimpleObject, Clone)]
pub struct ExternalReferenceEdge {
    pub cursor: String,
    pub node: ExternalReference,
}

#[derive(SimpleObject, Clone)]
pub struct ExternalReferenceConnection {
    pub edges: Vec<ExternalReferenceEdge>,
    pub page_info: PageInfo,
}

impl From<Connection<external_references::Model>> for ExternalReferenceConnection {
    fn from(page: Connection<external_references::Model>) -> Self {
        Self {
            edges: page
                .edges
                .into_iter()
                .map(|edge| ExternalReferenceEdge {
                    cursor: edge.cursor,
                    node: edge.node.into(),
                })
                .collect(),
            page_info: page.page_info.into(),
        }
    }
}

#[derive(InputObject)]
#[graphql(rename_fields = "snake_case")]
pub struct ExternalReferenceAddInput {
    pub source_name: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub external_id: Option<String>,
    /// Object the reference is attached to on creation
    #[graphql(name = "objectId")]
    pub object_id: Option<String>,
}

impl From<ExternalReferenceAddInput> for services::ExternalReferenceAddInput {
    fn from(input: ExternalReferenceAddInput) -> Self {
        Self {
            source_name: input.source_name,
            description: input.description,
            url: input.url,
            external_id: input.external_id,
            object_id: input.object_id,
        }
    }
}
