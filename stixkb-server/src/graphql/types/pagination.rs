use async_graphql::SimpleObject;
use stixkb::database::entities::{files, stix_cyber_observables};
use stixkb::knowledge::ResolvedRelationship;
use stixkb::pagination::{self, Connection};

use super::{File, StixCoreRelationship, StixCyberObservable};

#[derive(SimpleObject, Clone, Debug)]
pub struct PageInfo {
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub global_count: i64,
}

impl From<pagination::PageInfo> for PageInfo {
    fn from(info: pagination::PageInfo) -> Self {
        Self {
            start_cursor: info.start_cursor,
            end_cursor: info.end_cursor,
            has_next_page: info.has_next_page,
            has_previous_page: info.has_previous_page,
            global_count: info.global_count as i64,
        }
    }
}

#[derive(SimpleObject, Clone)]
pub struct StixCyberObservableEdge {
    pub cursor: String,
    pub node: StixCyberObservable,
}

#[derive(SimpleObject, Clone)]
pub struct StixCyberObservableConnection {
    pub edges: Vec<StixCyberObservableEdge>,
    pub page_info: PageInfo,
}

impl From<Connection<stix_cyber_observables::Model>> for StixCyberObservableConnection {
    fn from(page: Connection<stix_cyber_observables::Model>) -> Self {
        Self {
            edges: page
                .edges
                .into_iter()
                .map(|edge| StixCyberObservableEdge {
                    cursor: edge.cursor,
                    node: edge.node.into(),
                })
                .collect(),
            page_info: page.page_info.into(),
        }
    }
}

#[derive(SimpleObject, Clone)]
pub struct StixCoreRelationshipEdge {
    pub cursor: String,
    pub node: StixCoreRelationship,
}

#[derive(SimpleObject, Clone)]
pub struct StixCoreRelationshipConnection {
    pub edges: Vec<StixCoreRelationshipEdge>,
    pub page_info: PageInfo,
}

impl From<Connection<ResolvedRelationship>> for StixCoreRelationshipConnection {
    fn from(page: Connection<ResolvedRelationship>) -> Self {
        Self {
            edges: page
                .edges
                .into_iter()
                .map(|edge| StixCoreRelationshipEdge {
                    cursor: edge.cursor,
                    node: edge.node.into(),
                })
                .collect(),
            page_info: page.page_info.into(),
        }
    }
}

#[derive(SimpleObject, Clone)]
pub struct FileEdge {
    pub cursor: String,
    pub node: File,
}

#[derive(SimpleObject, Clone)]
pub struct FileConnection {
    pub edges: Vec<FileEdge>,
    pub page_info: PageInfo,
}

impl From<Connection<files::Model>> for FileConnection {
    fn from(page: Connection<files::Model>) -> Self {
        Self {
            edges: page
                .edges
                .into_iter()
                .map(|edge| FileEdge {
                    cursor: edge.cursor,
                    node: edge.node.into(),
                })
                .collect(),
            page_info: page.page_info.into(),
        }
    }
}
