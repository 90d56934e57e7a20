//! Forward cursor pagination shared by every list operation.
//!
//! Cursors are opaque to clients: base64 of `arrayconnection:<offset>`, where
//! the offset is the absolute position of the edge in the ordered result.
//! A page fetches one extra row to learn whether another page follows.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sea_orm::{
    DatabaseConnection, DbErr, EntityTrait, Order, PaginatorTrait, QuerySelect, Select,
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::errors::{KnowledgeError, KnowledgeResult};

const CURSOR_PREFIX: &str = "arrayconnection:";

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderingMode {
    #[default]
    Asc,
    Desc,
}

impl OrderingMode {
    pub fn order(self) -> Order {
        match self {
            OrderingMode::Asc => Order::Asc,
            OrderingMode::Desc => Order::Desc,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSettings {
    pub default_page_size: u64,
    pub max_page_size: u64,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            default_page_size: 25,
            max_page_size: 500,
        }
    }
}

impl PageSettings {
    /// Resolves `first`/`after` into an absolute window.
    pub fn request(&self, first: Option<i64>, after: Option<&str>) -> KnowledgeResult<PageRequest> {
        let first = match first {
            None => self.default_page_size,
            Some(n) if n < 0 => {
                return Err(KnowledgeError::InvalidValue {
                    field: "first".to_string(),
                    reason: "must not be negative".to_string(),
                })
            }
            Some(n) => (n as u64).min(self.max_page_size),
        };
        let offset = match after {
            Some(cursor) => decode_cursor(cursor)? + 1,
            None => 0,
        };
        Ok(PageRequest { first, offset })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub first: u64,
    pub offset: u64,
}

impl PageRequest {
    pub fn first(first: u64) -> Self {
        Self { first, offset: 0 }
    }
}

pub fn encode_cursor(offset: u64) -> String {
    STANDARD.encode(format!("{}{}", CURSOR_PREFIX, offset))
}

pub fn decode_cursor(cursor: &str) -> KnowledgeResult<u64> {
    let invalid = || KnowledgeError::InvalidCursor(cursor.to_string());
    let raw = STANDARD.decode(cursor).map_err(|_| invalid())?;
    let text = String::from_utf8(raw).map_err(|_| invalid())?;
    text.strip_prefix(CURSOR_PREFIX)
        .and_then(|offset| offset.parse::<u64>().ok())
        .ok_or_else(invalid)
}

#[derive(Clone, Debug, Serialize)]
pub struct Edge<T> {
    pub cursor: String,
    pub node: T,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub global_count: u64,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
    pub page_info: PageInfo,
}

impl<T> Connection<T> {
    pub fn empty() -> Self {
        Self {
            edges: Vec::new(),
            page_info: PageInfo::default(),
        }
    }

    /// Builds a page from rows fetched with `limit(first + 1)`.
    pub fn from_rows(mut rows: Vec<T>, request: PageRequest, global_count: u64) -> Self {
        let has_next_page = rows.len() as u64 > request.first;
        rows.truncate(request.first as usize);

        let edges: Vec<Edge<T>> = rows
            .into_iter()
            .enumerate()
            .map(|(index, node)| Edge {
                cursor: encode_cursor(request.offset + index as u64),
                node,
            })
            .collect();

        let page_info = PageInfo {
            start_cursor: edges.first().map(|e| e.cursor.clone()),
            end_cursor: edges.last().map(|e| e.cursor.clone()),
            has_next_page,
            has_previous_page: request.offset > 0,
            global_count,
        };

        Self { edges, page_info }
    }

    /// Builds a page by slicing an already ordered in-memory result.
    pub fn from_slice(all: Vec<T>, request: PageRequest) -> Self {
        let global_count = all.len() as u64;
        let rows: Vec<T> = all
            .into_iter()
            .skip(request.offset as usize)
            .take(request.first as usize + 1)
            .collect();
        Self::from_rows(rows, request, global_count)
    }

    pub fn map<U, F>(self, mut f: F) -> Connection<U>
    where
        F: FnMut(T) -> U,
    {
        Connection {
            edges: self
                .edges
                .into_iter()
                .map(|edge| Edge {
                    cursor: edge.cursor,
                    node: f(edge.node),
                })
                .collect(),
            page_info: self.page_info,
        }
    }

    pub fn nodes(&self) -> impl Iterator<Item = &T> {
        self.edges.iter().map(|edge| &edge.node)
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Runs a count and a windowed fetch for an ordered select.
pub async fn fetch_page<E>(
    db: &DatabaseConnection,
    select: Select<E>,
    request: PageRequest,
) -> Result<Connection<E::Model>, DbErr>
where
    E: EntityTrait,
    E::Model: Sync,
{
    let global_count = select.clone().count(db).await?;
    let rows = select
        .offset(request.offset)
        .limit(request.first + 1)
        .all(db)
        .await?;
    Ok(Connection::from_rows(rows, request, global_count))
}
