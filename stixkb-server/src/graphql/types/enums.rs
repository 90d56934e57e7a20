//! GraphQL mirrors of the core enums. Item names follow the platform's
//! public schema.

use async_graphql::Enum;

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
#[graphql(remote = "stixkb::ordering::ObservablesOrdering")]
pub enum StixCyberObservablesOrdering {
    #[graphql(name = "entity_type")]
    EntityType,
    #[graphql(name = "observable_value")]
    ObservableValue,
    #[graphql(name = "created_at")]
    CreatedAt,
    #[graphql(name = "updated_at")]
    UpdatedAt,
    #[graphql(name = "x_opencti_score")]
    Score,
    #[graphql(name = "markingDefinitions")]
    MarkingDefinitions,
    #[graphql(name = "labels")]
    Labels,
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
#[graphql(remote = "stixkb::ordering::ObservablesFilter")]
pub enum StixCyberObservablesFilter {
    #[graphql(name = "createdBy")]
    CreatedBy,
    #[graphql(name = "markedBy")]
    MarkingDefinitions,
    #[graphql(name = "labelledBy")]
    Labels,
    #[graphql(name = "relatedTo")]
    RelatedTo,
    #[graphql(name = "observablesContained")]
    ObservablesContained,
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
#[graphql(remote = "stixkb::ordering::RelationshipsOrdering")]
pub enum StixCoreRelationshipsOrdering {
    #[graphql(name = "relationship_type")]
    RelationshipType,
    #[graphql(name = "entity_type")]
    ToType,
    #[graphql(name = "start_time")]
    StartTime,
    #[graphql(name = "stop_time")]
    StopTime,
    #[graphql(name = "created_at")]
    CreatedAt,
    #[graphql(name = "updated_at")]
    UpdatedAt,
    #[graphql(name = "confidence")]
    Confidence,
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
#[graphql(remote = "stixkb::ordering::ExternalReferencesOrdering")]
pub enum ExternalReferencesOrdering {
    #[graphql(name = "source_name")]
    SourceName,
    #[graphql(name = "external_id")]
    ExternalId,
    #[graphql(name = "url")]
    Url,
    #[graphql(name = "created_at")]
    CreatedAt,
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
#[graphql(remote = "stixkb::pagination::OrderingMode")]
pub enum OrderingMode {
    #[graphql(name = "asc")]
    Asc,
    #[graphql(name = "desc")]
    Desc,
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
#[graphql(remote = "stixkb::knowledge::StatsOperation")]
pub enum StatsOperation {
    #[graphql(name = "count")]
    Count,
    #[graphql(name = "sum")]
    Sum,
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
#[graphql(remote = "stixkb::knowledge::TimeInterval")]
pub enum TimeInterval {
    #[graphql(name = "day")]
    Day,
    #[graphql(name = "week")]
    Week,
    #[graphql(name = "month")]
    Month,
    #[graphql(name = "year")]
    Year,
}

#[derive(Enum, Copy, Clone, Eq, PartialEq, Debug)]
#[graphql(remote = "stixkb::views::PieVariant")]
pub enum PieVariant {
    #[graphql(name = "default")]
    Default,
    #[graphql(name = "explore")]
    Explore,
}
