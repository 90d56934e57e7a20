//! View model of the relationship list panel of an entity.
//!
//! "Load more" goes through [`CumulativePages`]: a larger refetch replacing
//! the visible rows while it fits under the page cap, an appended next page
//! past it. A relationship created from the panel triggers a refetch sized so
//! the new row fits.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::CoreResult;
use crate::knowledge::ResolvedRelationship;
use crate::ordering::RelationshipsOrdering;
use crate::pagination::{Connection, OrderingMode, PageInfo, PageSettings};
use crate::services::RelationshipListArgs;
use crate::views::paging::{CumulativePages, LoadMoreMode, PageWindow, PanelRow};

pub const PLACEHOLDER_ROWS: usize = 5;
pub const DEFAULT_PAGE_SIZE: u64 = 25;
pub const EMPTY_MESSAGE: &str = "No entities of this type has been found.";

/// Outcome of a query as seen by a panel.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryState<T> {
    /// No answer yet
    Pending,
    Ready(T),
    Failed(String),
}

impl<T> QueryState<T> {
    pub fn from_result(result: CoreResult<T>) -> Self {
        match result {
            Ok(value) => QueryState::Ready(value),
            Err(err) => QueryState::Failed(err.message().to_string()),
        }
    }
}

impl PanelRow for ResolvedRelationship {
    fn row_id(&self) -> &str {
        &self.relationship.id
    }
}

#[derive(Clone, Debug)]
pub struct LinesOptions {
    pub entity_id: String,
    pub relationship_type: Option<String>,
    pub to_types: Vec<String>,
    pub order_by: RelationshipsOrdering,
    pub order_mode: OrderingMode,
    pub page_size: u64,
    /// Cap the store applies to `first`
    pub max_page_size: u64,
}

impl LinesOptions {
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            relationship_type: None,
            to_types: Vec::new(),
            order_by: RelationshipsOrdering::StartTime,
            order_mode: OrderingMode::Asc,
            page_size: DEFAULT_PAGE_SIZE,
            max_page_size: PageSettings::default().max_page_size,
        }
    }

    fn args(&self, first: u64, after: Option<String>) -> RelationshipListArgs {
        RelationshipListArgs {
            from_id: Some(self.entity_id.clone()),
            relationship_type: self.relationship_type.clone(),
            to_types: self.to_types.clone(),
            first: Some(first as i64),
            after,
            order_by: self.order_by,
            order_mode: self.order_mode,
            ..Default::default()
        }
    }
}

/// Next "load more" query and how its answer is applied.
#[derive(Clone, Debug)]
pub struct LoadMoreRequest {
    pub window: PageWindow,
    pub args: RelationshipListArgs,
}

impl LoadMoreRequest {
    pub fn mode(&self) -> LoadMoreMode {
        self.window.mode
    }

    pub fn target_count(&self) -> u64 {
        self.window.target_count
    }
}

#[derive(Clone, Debug)]
pub struct LinesPagination {
    options: LinesOptions,
    pages: CumulativePages<ResolvedRelationship>,
}

impl LinesPagination {
    pub fn new(options: LinesOptions) -> Self {
        let pages = CumulativePages::new(options.page_size, options.max_page_size);
        Self { options, pages }
    }

    pub fn options(&self) -> &LinesOptions {
        &self.options
    }

    pub fn initial_request(&self) -> RelationshipListArgs {
        self.options.args(self.pages.page_size(), None)
    }

    pub fn visible_count(&self) -> u64 {
        self.pages.visible_count()
    }

    pub fn page_info(&self) -> Option<&PageInfo> {
        self.pages.page_info()
    }

    pub fn has_more(&self) -> bool {
        self.pages.has_more()
    }

    /// `None` until a page is loaded, or once everything is visible.
    pub fn load_more_request(&self, page_size: u64) -> Option<LoadMoreRequest> {
        let window = self.pages.next_window(page_size)?;
        let args = self.options.args(window.first, window.after.clone());
        Some(LoadMoreRequest { window, args })
    }

    pub fn refetch_after_create(&self) -> RelationshipListArgs {
        self.options
            .args(self.pages.refetch_after_create_first(), None)
    }

    /// Replaces the visible rows with `page`, keeping the first occurrence
    /// of any id.
    pub fn apply_page(&mut self, page: Connection<ResolvedRelationship>) {
        self.pages.apply_page(page);
    }

    pub fn apply_load_more(
        &mut self,
        request: &LoadMoreRequest,
        page: Connection<ResolvedRelationship>,
    ) {
        self.pages.apply_window(&request.window, page);
    }

    pub fn visible(&self) -> Option<&Connection<ResolvedRelationship>> {
        self.pages.visible()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRow {
    pub relationship_id: String,
    pub relationship_type: String,
    /// Display value of the object at the other end
    pub primary: String,
    /// Translation key of its type
    pub secondary: String,
    pub icon: String,
    pub link: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub stop_time: Option<DateTime<Utc>>,
    /// Relationship the row popover edits or deletes
    pub popover_target: String,
}

const RESTRICTED: &str = "Restricted";

impl LineRow {
    pub fn from_relationship(resolved: &ResolvedRelationship) -> Self {
        let relationship = &resolved.relationship;
        let (primary, secondary, icon, link) = match &resolved.to {
            Some(to) => (
                to.display_value().to_string(),
                to.type_label_key(),
                to.entity_type.clone(),
                resolve_link(&to.entity_type, to.is_observable())
                    .map(|base| format!("{}/{}", base, to.id)),
            ),
            None => (
                RESTRICTED.to_string(),
                format!("entity_{}", relationship.to_type),
                relationship.to_type.clone(),
                None,
            ),
        };
        Self {
            relationship_id: relationship.id.clone(),
            relationship_type: relationship.relationship_type.clone(),
            primary,
            secondary,
            icon,
            link,
            start_time: relationship.start_time,
            stop_time: relationship.stop_time,
            popover_target: relationship.id.clone(),
        }
    }
}

/// Route prefix of an entity type's detail page.
pub fn resolve_link(entity_type: &str, is_observable: bool) -> Option<&'static str> {
    if is_observable {
        return Some("/dashboard/observations/observables");
    }
    match entity_type {
        "Attack-Pattern" => Some("/dashboard/techniques/attack_patterns"),
        "Campaign" => Some("/dashboard/threats/campaigns"),
        "Course-Of-Action" => Some("/dashboard/techniques/courses_of_action"),
        "Incident" => Some("/dashboard/events/incidents"),
        "Indicator" => Some("/dashboard/observations/indicators"),
        "Infrastructure" => Some("/dashboard/observations/infrastructures"),
        "Intrusion-Set" => Some("/dashboard/threats/intrusion_sets"),
        "Malware" => Some("/dashboard/arsenal/malwares"),
        "Organization" => Some("/dashboard/entities/organizations"),
        "Report" => Some("/dashboard/analysis/reports"),
        "Sector" => Some("/dashboard/entities/sectors"),
        "Threat-Actor" => Some("/dashboard/threats/threat_actors"),
        "Tool" => Some("/dashboard/arsenal/tools"),
        "Vulnerability" => Some("/dashboard/arsenal/vulnerabilities"),
        _ => None,
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum RelationshipLines {
    Loading {
        placeholders: usize,
    },
    Empty {
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    Loaded {
        rows: Vec<LineRow>,
        has_more: bool,
        global_count: u64,
    },
    Failed {
        message: String,
    },
}

impl RelationshipLines {
    pub fn from_state(state: QueryState<Connection<ResolvedRelationship>>) -> Self {
        match state {
            QueryState::Pending => RelationshipLines::Loading {
                placeholders: PLACEHOLDER_ROWS,
            },
            QueryState::Failed(message) => RelationshipLines::Failed { message },
            QueryState::Ready(page) if page.is_empty() => RelationshipLines::Empty {
                message: EMPTY_MESSAGE.to_string(),
            },
            QueryState::Ready(page) => RelationshipLines::Loaded {
                rows: page.nodes().map(LineRow::from_relationship).collect(),
                has_more: page.page_info.has_next_page,
                global_count: page.page_info.global_count,
            },
        }
    }

    pub fn from_pagination(pagination: &LinesPagination) -> Self {
        match pagination.visible() {
            Some(page) => Self::from_state(QueryState::Ready(page.clone())),
            None => Self::from_state(QueryState::Pending),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::entities::stix_core_relationships;
    use crate::database::entities::stix_cyber_observables::OBSERVABLE_MARKER;
    use crate::errors::CoreError;
    use crate::knowledge::EntityRef;
    use crate::pagination::PageRequest;

    fn resolved(id: &str, value: &str) -> ResolvedRelationship {
        let now = Utc::now();
        ResolvedRelationship {
            relationship: stix_core_relationships::Model {
                id: id.to_string(),
                relationship_type: "related-to".to_string(),
                from_id: "src".to_string(),
                from_type: "IPv4-Addr".to_string(),
                to_id: format!("to-{}", id),
                to_type: "Domain-Name".to_string(),
                start_time: None,
                stop_time: None,
                confidence: 15,
                description: None,
                inferred: false,
                created_at: now,
                updated_at: now,
            },
            from: None,
            to: Some(EntityRef {
                id: format!("to-{}", id),
                entity_type: "Domain-Name".to_string(),
                parent_types: vec![OBSERVABLE_MARKER.to_string()],
                name: None,
                observable_value: Some(value.to_string()),
            }),
        }
    }

    fn page(ids: &[&str], has_next: bool) -> Connection<ResolvedRelationship> {
        let nodes: Vec<_> = ids.iter().map(|id| resolved(id, id)).collect();
        let mut page = Connection::from_rows(nodes, PageRequest::first(ids.len() as u64), 10);
        page.page_info.has_next_page = has_next;
        page
    }

    #[test]
    fn pending_renders_five_placeholders() {
        assert_eq!(
            RelationshipLines::from_state(QueryState::Pending),
            RelationshipLines::Loading { placeholders: 5 }
        );
    }

    #[test]
    fn empty_page_renders_message_not_placeholders() {
        let lines = RelationshipLines::from_state(QueryState::Ready(Connection::empty()));
        assert_eq!(
            lines,
            RelationshipLines::Empty {
                message: EMPTY_MESSAGE.to_string()
            }
        );
    }

    #[test]
    fn failures_are_explicit() {
        let state = QueryState::<Connection<ResolvedRelationship>>::from_result(Err(
            CoreError::unavailable("store offline"),
        ));
        assert_eq!(
            RelationshipLines::from_state(state),
            RelationshipLines::Failed {
                message: "store offline".to_string()
            }
        );
    }

    #[test]
    fn rows_use_the_display_value_and_type_key() {
        let lines = RelationshipLines::from_state(QueryState::Ready(page(&["r1"], false)));
        let RelationshipLines::Loaded { rows, .. } = lines else {
            panic!("expected rows");
        };
        assert_eq!(rows[0].primary, "r1");
        assert_eq!(rows[0].secondary, "observable_Domain-Name");
        assert_eq!(
            rows[0].link.as_deref(),
            Some("/dashboard/observations/observables/to-r1")
        );
        assert_eq!(rows[0].popover_target, "r1");
    }

    #[test]
    fn load_more_is_cumulative_and_replaces_rows() {
        let mut pagination = LinesPagination::new(LinesOptions::new("src"));
        assert!(pagination.load_more_request(25).is_none());
        assert_eq!(pagination.initial_request().first, Some(25));
        assert_eq!(pagination.initial_request().after, None);

        pagination.apply_page(page(&["a", "b"], true));
        let more = pagination.load_more_request(2).expect("more available");
        assert_eq!(more.target_count(), 4);
        assert_eq!(more.mode(), LoadMoreMode::Refetch);
        assert_eq!(more.args.first, Some(4));
        assert_eq!(more.args.after, None);

        pagination.apply_load_more(&more, page(&["a", "b", "c", "d"], false));
        assert_eq!(pagination.visible_count(), 4);
        assert!(pagination.load_more_request(2).is_none());
    }

    #[test]
    fn duplicate_ids_are_dropped() {
        let mut pagination = LinesPagination::new(LinesOptions::new("src"));
        pagination.apply_page(page(&["a", "b", "a"], false));
        assert_eq!(pagination.visible_count(), 2);
    }

    #[test]
    fn refetch_after_create_makes_room_for_the_new_row() {
        let mut options = LinesOptions::new("src");
        options.page_size = 2;
        let mut pagination = LinesPagination::new(options);
        pagination.apply_page(page(&["a", "b"], false));
        assert_eq!(pagination.refetch_after_create().first, Some(3));
    }

    #[test]
    fn load_more_past_the_cap_continues_after_the_last_row() {
        let mut options = LinesOptions::new("src");
        options.page_size = 2;
        options.max_page_size = 3;
        let mut pagination = LinesPagination::new(options);
        pagination.apply_page(page(&["a", "b"], true));

        let more = pagination.load_more_request(2).expect("more available");
        assert_eq!(more.mode(), LoadMoreMode::Append);
        assert_eq!(more.args.first, Some(2));
        assert_eq!(more.args.after, Some(more.window.previous_end_cursor.clone()));

        pagination.apply_load_more(&more, page(&["c", "d"], false));
        assert_eq!(pagination.visible_count(), 4);
        assert!(!pagination.has_more());
    }
}
