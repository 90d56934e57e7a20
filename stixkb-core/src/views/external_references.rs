//! View model of the external references panel of an entity.

use serde::Serialize;

use crate::database::entities::external_references;
use crate::ordering::ExternalReferencesOrdering;
use crate::pagination::{Connection, OrderingMode, PageSettings};
use crate::services::ExternalReferenceListArgs;
use crate::views::paging::{CumulativePages, PageWindow, PanelRow};
use crate::views::relationship_lines::{QueryState, PLACEHOLDER_ROWS};

pub const TITLE: &str = "External references";
pub const DEFAULT_PAGE_SIZE: u64 = 200;
pub const EMPTY_MESSAGE: &str = "No external references for this entity.";

impl PanelRow for external_references::Model {
    fn row_id(&self) -> &str {
        &self.id
    }
}

#[derive(Clone, Debug)]
pub struct ExternalReferencesOptions {
    pub entity_id: String,
    pub order_by: ExternalReferencesOrdering,
    pub order_mode: OrderingMode,
    pub page_size: u64,
    pub max_page_size: u64,
}

impl ExternalReferencesOptions {
    /// Newest first, two hundred at a time.
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            order_by: ExternalReferencesOrdering::CreatedAt,
            order_mode: OrderingMode::Desc,
            page_size: DEFAULT_PAGE_SIZE,
            max_page_size: PageSettings::default().max_page_size,
        }
    }

    fn args(&self, first: u64, after: Option<String>) -> ExternalReferenceListArgs {
        ExternalReferenceListArgs {
            object_id: Some(self.entity_id.clone()),
            first: Some(first as i64),
            after,
            order_by: self.order_by,
            order_mode: self.order_mode,
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug)]
pub struct ExternalReferencesLoadMore {
    pub window: PageWindow,
    pub args: ExternalReferenceListArgs,
}

#[derive(Clone, Debug)]
pub struct ExternalReferencesPagination {
    options: ExternalReferencesOptions,
    pages: CumulativePages<external_references::Model>,
}

impl ExternalReferencesPagination {
    pub fn new(options: ExternalReferencesOptions) -> Self {
        let pages = CumulativePages::new(options.page_size, options.max_page_size);
        Self { options, pages }
    }

    pub fn options(&self) -> &ExternalReferencesOptions {
        &self.options
    }

    pub fn initial_request(&self) -> ExternalReferenceListArgs {
        self.options.args(self.pages.page_size(), None)
    }

    pub fn load_more_request(&self) -> Option<ExternalReferencesLoadMore> {
        let window = self.pages.next_window(self.pages.page_size())?;
        let args = self.options.args(window.first, window.after.clone());
        Some(ExternalReferencesLoadMore { window, args })
    }

    /// Refetch issued after a reference was attached from the panel.
    pub fn refetch_after_create(&self) -> ExternalReferenceListArgs {
        self.options
            .args(self.pages.refetch_after_create_first(), None)
    }

    pub fn apply_page(&mut self, page: Connection<external_references::Model>) {
        self.pages.apply_page(page);
    }

    pub fn apply_load_more(
        &mut self,
        request: &ExternalReferencesLoadMore,
        page: Connection<external_references::Model>,
    ) {
        self.pages.apply_window(&request.window, page);
    }

    pub fn visible(&self) -> Option<&Connection<external_references::Model>> {
        self.pages.visible()
    }

    pub fn visible_count(&self) -> u64 {
        self.pages.visible_count()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalReferenceRow {
    pub id: String,
    /// Source name, followed by the id inside the source when known
    pub primary: String,
    pub secondary: String,
    pub avatar_letter: String,
    pub link: Option<String>,
}

impl ExternalReferenceRow {
    pub fn from_reference(reference: &external_references::Model) -> Self {
        let primary = match reference.external_id.as_deref() {
            Some(external_id) => format!("{} - {}", reference.source_name, external_id),
            None => reference.source_name.clone(),
        };
        let secondary = reference
            .url
            .clone()
            .or_else(|| reference.description.clone())
            .unwrap_or_default();
        let avatar_letter = reference
            .source_name
            .chars()
            .next()
            .map(|c| c.to_uppercase().to_string())
            .unwrap_or_default();
        Self {
            id: reference.id.clone(),
            primary,
            secondary,
            avatar_letter,
            link: reference.url.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum ExternalReferencesPanel {
    Loading {
        placeholders: usize,
    },
    Empty {
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    Loaded {
        rows: Vec<ExternalReferenceRow>,
        has_more: bool,
        global_count: u64,
    },
    Failed {
        message: String,
    },
}

impl ExternalReferencesPanel {
    pub fn title(&self) -> &'static str {
        TITLE
    }

    pub fn from_state(state: QueryState<Connection<external_references::Model>>) -> Self {
        match state {
            QueryState::Pending => ExternalReferencesPanel::Loading {
                placeholders: PLACEHOLDER_ROWS,
            },
            QueryState::Failed(message) => ExternalReferencesPanel::Failed { message },
            QueryState::Ready(page) if page.is_empty() => ExternalReferencesPanel::Empty {
                message: EMPTY_MESSAGE.to_string(),
            },
            QueryState::Ready(page) => ExternalReferencesPanel::Loaded {
                rows: page
                    .nodes()
                    .map(ExternalReferenceRow::from_reference)
                    .collect(),
                has_more: page.page_info.has_next_page,
                global_count: page.page_info.global_count,
            },
        }
    }

    pub fn from_pagination(pagination: &ExternalReferencesPagination) -> Self {
        match pagination.visible() {
            Some(page) => Self::from_state(QueryState::Ready(page.clone())),
            None => Self::from_state(QueryState::Pending),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::pagination::PageRequest;
    use crate::views::LoadMoreMode;

    fn reference(id: &str, external_id: Option<&str>, url: Option<&str>) -> external_references::Model {
        let now = Utc::now();
        external_references::Model {
            id: id.to_string(),
            source_name: "mitre-attack".to_string(),
            description: Some("Command and Scripting Interpreter".to_string()),
            url: url.map(str::to_string),
            external_id: external_id.map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn defaults_match_the_panel() {
        let pagination = ExternalReferencesPagination::new(ExternalReferencesOptions::new("obj"));
        let args = pagination.initial_request();
        assert_eq!(args.first, Some(200));
        assert_eq!(args.object_id.as_deref(), Some("obj"));
        assert_eq!(args.order_by, ExternalReferencesOrdering::CreatedAt);
        assert_eq!(args.order_mode, OrderingMode::Desc);

        let panel = ExternalReferencesPanel::from_pagination(&pagination);
        assert_eq!(panel, ExternalReferencesPanel::Loading { placeholders: 5 });
        assert_eq!(panel.title(), "External references");
    }

    #[test]
    fn rows_prefer_the_url_and_show_the_source_id() {
        let with_url = ExternalReferenceRow::from_reference(&reference(
            "a",
            Some("T1059"),
            Some("https://attack.mitre.org/techniques/T1059"),
        ));
        assert_eq!(with_url.primary, "mitre-attack - T1059");
        assert_eq!(with_url.secondary, "https://attack.mitre.org/techniques/T1059");
        assert_eq!(with_url.avatar_letter, "M");

        let bare = ExternalReferenceRow::from_reference(&reference("b", None, None));
        assert_eq!(bare.primary, "mitre-attack");
        assert_eq!(bare.secondary, "Command and Scripting Interpreter");
        assert_eq!(bare.link, None);
    }

    #[test]
    fn empty_page_renders_message() {
        assert_eq!(
            ExternalReferencesPanel::from_state(QueryState::Ready(Connection::empty())),
            ExternalReferencesPanel::Empty {
                message: EMPTY_MESSAGE.to_string()
            }
        );
    }

    #[test]
    fn load_more_appends_past_a_small_cap() {
        let mut options = ExternalReferencesOptions::new("obj");
        options.page_size = 2;
        options.max_page_size = 3;
        let mut pagination = ExternalReferencesPagination::new(options);

        let all: Vec<_> = (0..5)
            .map(|n| reference(&format!("r{}", n), None, None))
            .collect();
        pagination.apply_page(Connection::from_slice(all.clone(), PageRequest::first(2)));

        let more = pagination.load_more_request().expect("more available");
        assert_eq!(more.window.mode, LoadMoreMode::Append);
        assert_eq!(more.args.first, Some(2));
        assert!(more.args.after.is_some());

        pagination.apply_load_more(
            &more,
            Connection::from_slice(all, PageRequest { first: 2, offset: 2 }),
        );
        assert_eq!(pagination.visible_count(), 4);
    }
}
