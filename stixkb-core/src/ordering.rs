//! Sort and filter keys exposed to clients, and the indexed field paths they
//! resolve to.
//!
//! Paths into attributes of related objects carry the `rel_` prefix:
//! `rel_<relationship_type>.<attribute>`. Every enum value maps to exactly one
//! path through an exhaustive match, so adding a variant without a mapping
//! fails to compile.

use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::Value;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

pub const REL_INDEX_PREFIX: &str = "rel_";

const RELATIONSHIPS_TABLE: &str = "stix_core_relationships";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldPath {
    Column(&'static str),
    Relation {
        relationship_type: &'static str,
        attribute: RelAttribute,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum RelAttribute {
    #[strum(serialize = "internal_id")]
    InternalId,
    #[strum(serialize = "definition")]
    Definition,
    #[strum(serialize = "value")]
    Value,
}

impl FieldPath {
    pub fn index_key(&self) -> String {
        match self {
            FieldPath::Column(column) => column.to_string(),
            FieldPath::Relation {
                relationship_type,
                attribute,
            } => format!("{}{}.{}", REL_INDEX_PREFIX, relationship_type, attribute),
        }
    }

    /// Sort expression evaluated per row of `table`.
    ///
    /// Relation paths sort by the smallest attribute value among the related
    /// objects, rows without any related object sort first in ascending order.
    pub fn sort_expr(&self, table: &str) -> SimpleExpr {
        match self {
            FieldPath::Column(column) => Expr::cust(format!("\"{}\".\"{}\"", table, column)),
            FieldPath::Relation {
                relationship_type,
                attribute,
            } => {
                let target = match attribute {
                    RelAttribute::InternalId => "r.to_id".to_string(),
                    RelAttribute::Definition | RelAttribute::Value => {
                        "(SELECT d.name FROM stix_domain_objects d WHERE d.id = r.to_id)"
                            .to_string()
                    }
                };
                Expr::cust(format!(
                    "(SELECT MIN({target}) FROM {rels} r WHERE r.relationship_type = '{rel}' AND r.from_id = \"{table}\".\"id\")",
                    target = target,
                    rels = RELATIONSHIPS_TABLE,
                    rel = relationship_type,
                    table = table,
                ))
            }
        }
    }

    /// Membership condition: the row (of `table`) has any of `values` at
    /// this path. Relations match in either direction.
    pub fn filter_expr(&self, table: &str, values: &[String]) -> SimpleExpr {
        if values.is_empty() {
            return Expr::cust("1 = 0");
        }
        let placeholders = vec!["?"; values.len()].join(", ");
        match self {
            FieldPath::Column(column) => Expr::cust_with_values(
                format!("\"{}\".\"{}\" IN ({})", table, column, placeholders),
                values.iter().cloned().map(Value::from),
            ),
            FieldPath::Relation {
                relationship_type,
                attribute,
            } => {
                let (outgoing, incoming) = match attribute {
                    RelAttribute::InternalId => (
                        format!("r.to_id IN ({})", placeholders),
                        format!("r.from_id IN ({})", placeholders),
                    ),
                    RelAttribute::Definition | RelAttribute::Value => (
                        format!(
                            "r.to_id IN (SELECT d.id FROM stix_domain_objects d WHERE d.name IN ({}))",
                            placeholders
                        ),
                        format!(
                            "r.from_id IN (SELECT d.id FROM stix_domain_objects d WHERE d.name IN ({}))",
                            placeholders
                        ),
                    ),
                };
                let bound = values
                    .iter()
                    .chain(values.iter())
                    .cloned()
                    .map(Value::from)
                    .collect::<Vec<_>>();
                Expr::cust_with_values(
                    format!(
                        "EXISTS (SELECT 1 FROM {rels} r WHERE r.relationship_type = '{rel}' AND ((r.from_id = \"{table}\".\"id\" AND {outgoing}) OR (r.to_id = \"{table}\".\"id\" AND {incoming})))",
                        rels = RELATIONSHIPS_TABLE,
                        rel = relationship_type,
                        table = table,
                        outgoing = outgoing,
                        incoming = incoming,
                    ),
                    bound,
                )
            }
        }
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
pub enum ObservablesOrdering {
    #[strum(serialize = "entity_type")]
    EntityType,
    #[strum(serialize = "observable_value")]
    ObservableValue,
    #[strum(serialize = "created_at")]
    CreatedAt,
    #[strum(serialize = "updated_at")]
    UpdatedAt,
    #[strum(serialize = "x_opencti_score")]
    Score,
    #[strum(serialize = "markingDefinitions")]
    MarkingDefinitions,
    #[strum(serialize = "labels")]
    Labels,
}

impl ObservablesOrdering {
    pub fn field_path(self) -> FieldPath {
        match self {
            ObservablesOrdering::EntityType => FieldPath::Column("entity_type"),
            ObservablesOrdering::ObservableValue => FieldPath::Column("observable_value"),
            ObservablesOrdering::CreatedAt => FieldPath::Column("created_at"),
            ObservablesOrdering::UpdatedAt => FieldPath::Column("updated_at"),
            ObservablesOrdering::Score => FieldPath::Column("x_opencti_score"),
            ObservablesOrdering::MarkingDefinitions => FieldPath::Relation {
                relationship_type: "object-marking",
                attribute: RelAttribute::Definition,
            },
            ObservablesOrdering::Labels => FieldPath::Relation {
                relationship_type: "object-label",
                attribute: RelAttribute::Value,
            },
        }
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
pub enum ObservablesFilter {
    #[strum(serialize = "createdBy")]
    CreatedBy,
    #[strum(serialize = "markingDefinitions")]
    MarkingDefinitions,
    #[strum(serialize = "labels")]
    Labels,
    #[strum(serialize = "relatedTo")]
    RelatedTo,
    #[strum(serialize = "observablesContained")]
    ObservablesContained,
}

impl ObservablesFilter {
    pub fn field_path(self) -> FieldPath {
        let relationship_type = match self {
            ObservablesFilter::CreatedBy => "created-by",
            ObservablesFilter::MarkingDefinitions => "object-marking",
            ObservablesFilter::Labels => "object-label",
            ObservablesFilter::RelatedTo => "related-to",
            ObservablesFilter::ObservablesContained => "observable_refs",
        };
        FieldPath::Relation {
            relationship_type,
            attribute: RelAttribute::InternalId,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservablesFiltering {
    pub key: ObservablesFilter,
    pub values: Vec<String>,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
pub enum RelationshipsOrdering {
    #[strum(serialize = "relationship_type")]
    RelationshipType,
    #[strum(serialize = "entity_type")]
    ToType,
    #[strum(serialize = "start_time")]
    StartTime,
    #[strum(serialize = "stop_time")]
    StopTime,
    #[strum(serialize = "created_at")]
    CreatedAt,
    #[strum(serialize = "updated_at")]
    UpdatedAt,
    #[strum(serialize = "confidence")]
    Confidence,
}

impl Default for RelationshipsOrdering {
    fn default() -> Self {
        RelationshipsOrdering::StartTime
    }
}

impl RelationshipsOrdering {
    pub fn field_path(self) -> FieldPath {
        match self {
            RelationshipsOrdering::RelationshipType => FieldPath::Column("relationship_type"),
            RelationshipsOrdering::ToType => FieldPath::Column("to_type"),
            RelationshipsOrdering::StartTime => FieldPath::Column("start_time"),
            RelationshipsOrdering::StopTime => FieldPath::Column("stop_time"),
            RelationshipsOrdering::CreatedAt => FieldPath::Column("created_at"),
            RelationshipsOrdering::UpdatedAt => FieldPath::Column("updated_at"),
            RelationshipsOrdering::Confidence => FieldPath::Column("confidence"),
        }
    }
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
pub enum ExternalReferencesOrdering {
    #[strum(serialize = "source_name")]
    SourceName,
    #[strum(serialize = "external_id")]
    ExternalId,
    #[strum(serialize = "url")]
    Url,
    #[default]
    #[strum(serialize = "created_at")]
    CreatedAt,
}

impl ExternalReferencesOrdering {
    pub fn field_path(self) -> FieldPath {
        match self {
            ExternalReferencesOrdering::SourceName => FieldPath::Column("source_name"),
            ExternalReferencesOrdering::ExternalId => FieldPath::Column("external_id"),
            ExternalReferencesOrdering::Url => FieldPath::Column("url"),
            ExternalReferencesOrdering::CreatedAt => FieldPath::Column("created_at"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn every_observable_ordering_has_a_distinct_path() {
        let keys: Vec<String> = ObservablesOrdering::iter()
            .map(|o| o.field_path().index_key())
            .collect();
        let unique: HashSet<&String> = keys.iter().collect();
        assert_eq!(keys.len(), unique.len());
        assert!(keys.contains(&"rel_object-marking.definition".to_string()));
        assert!(keys.contains(&"rel_object-label.value".to_string()));
    }

    #[test]
    fn every_observable_filter_is_a_relation_path() {
        let expected = [
            (ObservablesFilter::CreatedBy, "rel_created-by.internal_id"),
            (
                ObservablesFilter::MarkingDefinitions,
                "rel_object-marking.internal_id",
            ),
            (ObservablesFilter::Labels, "rel_object-label.internal_id"),
            (ObservablesFilter::RelatedTo, "rel_related-to.internal_id"),
            (
                ObservablesFilter::ObservablesContained,
                "rel_observable_refs.internal_id",
            ),
        ];
        assert_eq!(ObservablesFilter::iter().count(), expected.len());
        for (filter, key) in expected {
            assert_eq!(filter.field_path().index_key(), key);
            assert!(key.starts_with(REL_INDEX_PREFIX));
        }
    }

    #[test]
    fn relationship_orderings_are_columns() {
        for ordering in RelationshipsOrdering::iter() {
            assert!(matches!(ordering.field_path(), FieldPath::Column(_)));
        }
        assert_eq!(RelationshipsOrdering::default(), RelationshipsOrdering::StartTime);
    }

    #[test]
    fn external_reference_orderings_default_to_creation() {
        assert_eq!(
            ExternalReferencesOrdering::default(),
            ExternalReferencesOrdering::CreatedAt
        );
        assert_eq!(
            ExternalReferencesOrdering::SourceName.field_path().index_key(),
            "source_name"
        );
    }

    #[test]
    fn enum_names_parse_back() {
        for ordering in ObservablesOrdering::iter() {
            let parsed: ObservablesOrdering = ordering.to_string().parse().unwrap();
            assert_eq!(parsed, ordering);
        }
    }
}
