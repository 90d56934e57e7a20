//! View model of the relationship distribution pie.

use serde::Serialize;
use strum::{Display, EnumString};

use super::colors::item_color;
use super::relationship_lines::{QueryState, EMPTY_MESSAGE};
use crate::auth::{capabilities, has_capability, Actor};
use crate::knowledge::{DistributionBucket, DistributionField};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PieVariant {
    /// Embedded in an entity overview
    #[default]
    Default,
    /// Widget on an exploration workspace
    Explore,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PieLayout {
    pub height: String,
    pub min_height: Option<String>,
    /// Paper, title and padding around the chart
    pub chrome: bool,
}

impl PieVariant {
    pub fn layout(self) -> PieLayout {
        match self {
            PieVariant::Explore => PieLayout {
                height: "90%".to_string(),
                min_height: Some("250px".to_string()),
                chrome: false,
            },
            PieVariant::Default => PieLayout {
                height: "280px".to_string(),
                min_height: None,
                chrome: true,
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PieSlice {
    pub label: String,
    pub value: i64,
    pub color: String,
    pub percent_label: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum PieContent {
    Loading,
    Empty { message: String },
    Chart { slices: Vec<PieSlice> },
    Failed { message: String },
}

impl PieContent {
    pub fn from_state(state: QueryState<Vec<DistributionBucket>>) -> Self {
        match state {
            QueryState::Pending => PieContent::Loading,
            QueryState::Failed(message) => PieContent::Failed { message },
            QueryState::Ready(buckets) if buckets.is_empty() => PieContent::Empty {
                message: EMPTY_MESSAGE.to_string(),
            },
            QueryState::Ready(buckets) => PieContent::Chart {
                slices: slices(&buckets),
            },
        }
    }
}

pub fn slices(buckets: &[DistributionBucket]) -> Vec<PieSlice> {
    let total: i64 = buckets.iter().map(|bucket| bucket.value).sum();
    buckets
        .iter()
        .map(|bucket| PieSlice {
            label: bucket.label.clone(),
            value: bucket.value,
            color: item_color(&bucket.label),
            percent_label: percent_label(bucket.value, total),
        })
        .collect()
}

fn percent_label(value: i64, total: i64) -> String {
    if total == 0 {
        return "0%".to_string();
    }
    format!("{}%", (value as f64 / total as f64 * 100.0).round() as i64)
}

/// Lets the widget owner change what the pie aggregates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconfigureAction {
    pub widget_id: String,
    pub field: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionPie {
    pub title: String,
    pub variant: PieVariant,
    pub layout: PieLayout,
    pub content: PieContent,
    pub reconfigure: Option<ReconfigureAction>,
}

impl DistributionPie {
    pub fn new(
        actor: &Actor,
        entity_type: &str,
        widget_id: &str,
        field: DistributionField,
        variant: PieVariant,
        state: QueryState<Vec<DistributionBucket>>,
    ) -> Self {
        let reconfigure = (variant == PieVariant::Explore
            && has_capability(actor, capabilities::EXPLORE_EXUPDATE))
        .then(|| ReconfigureAction {
            widget_id: widget_id.to_string(),
            field: field.to_string(),
        });

        Self {
            title: format!("Distribution: entity_{}", entity_type),
            variant,
            layout: variant.layout(),
            content: PieContent::from_state(state),
            reconfigure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(label: &str, value: i64) -> DistributionBucket {
        DistributionBucket {
            label: label.to_string(),
            value,
        }
    }

    fn explorer() -> Actor {
        Actor::user("u1", "analyst")
            .with_capabilities([capabilities::KNOWLEDGE, capabilities::EXPLORE_EXUPDATE])
    }

    #[test]
    fn percentages_are_rounded() {
        let slices = slices(&[bucket("Malware", 2), bucket("Tool", 1)]);
        assert_eq!(slices[0].percent_label, "67%");
        assert_eq!(slices[1].percent_label, "33%");
        assert_eq!(slices[0].color, "#e91e63");
    }

    #[test]
    fn zero_total_gives_zero_percent() {
        let slices = slices(&[bucket("Malware", 0)]);
        assert_eq!(slices[0].percent_label, "0%");
    }

    #[test]
    fn states_map_to_content() {
        assert_eq!(PieContent::from_state(QueryState::Pending), PieContent::Loading);
        assert_eq!(
            PieContent::from_state(QueryState::Ready(Vec::new())),
            PieContent::Empty {
                message: EMPTY_MESSAGE.to_string()
            }
        );
        assert_eq!(
            PieContent::from_state(QueryState::Failed("boom".to_string())),
            PieContent::Failed {
                message: "boom".to_string()
            }
        );
    }

    #[test]
    fn reconfigure_needs_explore_variant_and_capability() {
        let reader = Actor::user("u2", "reader").with_capability(capabilities::KNOWLEDGE);
        let make = |actor: &Actor, variant| {
            DistributionPie::new(
                actor,
                "Malware",
                "w1",
                DistributionField::EntityType,
                variant,
                QueryState::Pending,
            )
        };

        let pie = make(&explorer(), PieVariant::Explore);
        assert_eq!(
            pie.reconfigure,
            Some(ReconfigureAction {
                widget_id: "w1".to_string(),
                field: "entity_type".to_string(),
            })
        );
        assert!(make(&explorer(), PieVariant::Default).reconfigure.is_none());
        assert!(make(&reader, PieVariant::Explore).reconfigure.is_none());
    }

    #[test]
    fn variant_only_changes_layout() {
        let explore = DistributionPie::new(
            &explorer(),
            "Malware",
            "w1",
            DistributionField::EntityType,
            PieVariant::Explore,
            QueryState::Ready(vec![bucket("Tool", 3)]),
        );
        let default = DistributionPie::new(
            &explorer(),
            "Malware",
            "w1",
            DistributionField::EntityType,
            PieVariant::Default,
            QueryState::Ready(vec![bucket("Tool", 3)]),
        );
        assert_eq!(explore.content, default.content);
        assert_eq!(explore.layout.height, "90%");
        assert_eq!(default.layout.height, "280px");
        assert_eq!(default.title, "Distribution: entity_Malware");
    }
}
