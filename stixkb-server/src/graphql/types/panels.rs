//! Headless renderings of the entity panels.

use async_graphql::*;
use chrono::{DateTime, Utc};
use stixkb::views::{self, DistributionPie, ExternalReferencesPanel, PieContent, RelationshipLines};

use super::enums::PieVariant;

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
pub enum PanelState {
    Loading,
    Empty,
    Loaded,
    Failed,
}

#[derive(SimpleObject, Clone, Debug)]
pub struct RelationshipLine {
    pub relationship_id: String,
    pub relationship_type: String,
    pub primary: String,
    pub secondary: String,
    pub icon: String,
    pub link: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub stop_time: Option<DateTime<Utc>>,
    pub popover_target: String,
}

impl From<views::LineRow> for RelationshipLine {
    fn from(row: views::LineRow) -> Self {
        Self {
            relationship_id: row.relationship_id,
            relationship_type: row.relationship_type,
            primary: row.primary,
            secondary: row.secondary,
            icon: row.icon,
            link: row.link,
            start_time: row.start_time,
            stop_time: row.stop_time,
            popover_target: row.popover_target,
        }
    }
}

#[derive(SimpleObject, Clone, Debug)]
pub struct EntityRelationshipsLines {
    pub state: PanelState,
    /// Skeleton rows shown while loading
    pub placeholders: i32,
    pub message: Option<String>,
    pub rows: Vec<RelationshipLine>,
    pub has_more: bool,
    pub global_count: i64,
}

impl From<RelationshipLines> for EntityRelationshipsLines {
    fn from(lines: RelationshipLines) -> Self {
        let empty = |state, placeholders, message| Self {
            state,
            placeholders,
            message,
            rows: Vec::new(),
            has_more: false,
            global_count: 0,
        };
        match lines {
            RelationshipLines::Loading { placeholders } => {
                empty(PanelState::Loading, placeholders as i32, None)
            }
            RelationshipLines::Empty { message } => empty(PanelState::Empty, 0, Some(message)),
            RelationshipLines::Failed { message } => empty(PanelState::Failed, 0, Some(message)),
            RelationshipLines::Loaded {
                rows,
                has_more,
                global_count,
            } => Self {
                state: PanelState::Loaded,
                placeholders: 0,
                message: None,
                rows: rows.into_iter().map(Into::into).collect(),
                has_more,
                global_count: global_count as i64,
            },
        }
    }
}

#[derive(SimpleObject, Clone, Debug)]
pub struct ExternalReferenceLine {
    pub id: String,
    pub primary: String,
    pub secondary: String,
    pub avatar_letter: String,
    pub link: Option<String>,
}

impl From<views::ExternalReferenceRow> for ExternalReferenceLine {
    fn from(row: views::ExternalReferenceRow) -> Self {
        Self {
            id: row.id,
            primary: row.primary,
            secondary: row.secondary,
            avatar_letter: row.avatar_letter,
            link: row.link,
        }
    }
}

#[derive(SimpleObject, Clone, Debug)]
pub struct EntityExternalReferences {
    pub title: String,
    pub state: PanelState,
    pub placeholders: i32,
    pub message: Option<String>,
    pub rows: Vec<ExternalReferenceLine>,
    pub has_more: bool,
    pub global_count: i64,
}

impl From<ExternalReferencesPanel> for EntityExternalReferences {
    fn from(panel: ExternalReferencesPanel) -> Self {
        let title = panel.title().to_string();
        let empty = |state, placeholders, message| Self {
            title: title.clone(),
            state,
            placeholders,
            message,
            rows: Vec::new(),
            has_more: false,
            global_count: 0,
        };
        match panel {
            ExternalReferencesPanel::Loading { placeholders } => {
                empty(PanelState::Loading, placeholders as i32, None)
            }
            ExternalReferencesPanel::Empty { message } => {
                empty(PanelState::Empty, 0, Some(message))
            }
            ExternalReferencesPanel::Failed { message } => {
                empty(PanelState::Failed, 0, Some(message))
            }
            ExternalReferencesPanel::Loaded {
                rows,
                has_more,
                global_count,
            } => Self {
                title: title.clone(),
                state: PanelState::Loaded,
                placeholders: 0,
                message: None,
                rows: rows.into_iter().map(Into::into).collect(),
                has_more,
                global_count: global_count as i64,
            },
        }
    }
}

#[derive(SimpleObject, Clone, Debug)]
pub struct PieSlice {
    pub label: String,
    pub value: i64,
    pub color: String,
    pub percent_label: String,
}

#[derive(SimpleObject, Clone, Debug)]
pub struct ReconfigureAction {
    pub widget_id: String,
    pub field: String,
}

#[derive(SimpleObject, Clone, Debug)]
pub struct EntityDistributionPie {
    pub title: String,
    pub variant: PieVariant,
    pub height: String,
    pub min_height: Option<String>,
    pub chrome: bool,
    pub state: PanelState,
    pub message: Option<String>,
    pub slices: Vec<PieSlice>,
    /// Present only when the viewer may change the widget
    pub reconfigure: Option<ReconfigureAction>,
}

impl From<DistributionPie> for EntityDistributionPie {
    fn from(pie: DistributionPie) -> Self {
        let (state, message, slices) = match pie.content {
            PieContent::Loading => (PanelState::Loading, None, Vec::new()),
            PieContent::Empty { message } => (PanelState::Empty, Some(message), Vec::new()),
            PieContent::Failed { message } => (PanelState::Failed, Some(message), Vec::new()),
            PieContent::Chart { slices } => (PanelState::Loaded, None, slices),
        };
        Self {
            title: pie.title,
            variant: pie.variant.into(),
            height: pie.layout.height,
            min_height: pie.layout.min_height,
            chrome: pie.layout.chrome,
            state,
            message,
            slices: slices
                .into_iter()
                .map(|slice| PieSlice {
                    label: slice.label,
                    value: slice.value,
                    color: slice.color,
                    percent_label: slice.percent_label,
                })
                .collect(),
            reconfigure: pie.reconfigure.map(|action| ReconfigureAction {
                widget_id: action.widget_id,
                field: action.field,
            }),
        }
    }
}
