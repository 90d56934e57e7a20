//! Shared shapes of the knowledge layer: entity references, resolved
//! relationships and aggregation results.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::database::entities::stix_core_relationships;
use crate::database::entities::stix_cyber_observables::{self, OBSERVABLE_MARKER};
use crate::database::entities::stix_domain_objects;
use crate::errors::{KnowledgeError, KnowledgeResult};

/// Largest time series a single query may ask for.
pub const MAX_TIME_SERIES_POINTS: u64 = 5_000;

/// Any object a relationship can point at.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRef {
    pub id: String,
    pub entity_type: String,
    pub parent_types: Vec<String>,
    pub name: Option<String>,
    pub observable_value: Option<String>,
}

impl EntityRef {
    pub fn is_observable(&self) -> bool {
        self.parent_types.iter().any(|t| t == OBSERVABLE_MARKER)
    }

    /// `observable_value` for observables, `name` for everything else.
    pub fn display_value(&self) -> &str {
        let value = if self.is_observable() {
            &self.observable_value
        } else {
            &self.name
        };
        value.as_deref().unwrap_or_default()
    }

    /// Translation key of the entity type label.
    pub fn type_label_key(&self) -> String {
        if self.is_observable() {
            format!("observable_{}", self.entity_type)
        } else {
            format!("entity_{}", self.entity_type)
        }
    }
}

impl From<&stix_cyber_observables::Model> for EntityRef {
    fn from(model: &stix_cyber_observables::Model) -> Self {
        Self {
            id: model.id.clone(),
            entity_type: model.entity_type.clone(),
            parent_types: model.parent_types(),
            name: None,
            observable_value: Some(model.observable_value.clone()),
        }
    }
}

impl From<&stix_domain_objects::Model> for EntityRef {
    fn from(model: &stix_domain_objects::Model) -> Self {
        Self {
            id: model.id.clone(),
            entity_type: model.entity_type.clone(),
            parent_types: model.parent_types(),
            name: Some(model.name.clone()),
            observable_value: None,
        }
    }
}

/// A relationship with both ends resolved. An end is `None` when the
/// referenced object no longer exists.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResolvedRelationship {
    pub relationship: stix_core_relationships::Model,
    pub from: Option<EntityRef>,
    pub to: Option<EntityRef>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DistributionBucket {
    pub label: String,
    pub value: i64,
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
pub enum StatsOperation {
    #[default]
    Count,
    /// Sum of relationship confidence
    Sum,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
pub enum DistributionField {
    /// Type of the object at the other end
    #[strum(serialize = "entity_type")]
    EntityType,
    #[strum(serialize = "relationship_type")]
    RelationshipType,
    /// Display value of the object at the other end
    #[strum(serialize = "name")]
    Name,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
pub enum TimeInterval {
    Day,
    Week,
    Month,
    Year,
}

impl TimeInterval {
    /// Start of the bucket containing `at`. Weeks start on Monday.
    pub fn bucket_start(self, at: DateTime<Utc>) -> DateTime<Utc> {
        let date = at.date_naive();
        let start = match self {
            TimeInterval::Day => date,
            TimeInterval::Week => {
                date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
            }
            TimeInterval::Month => first_of_month(date.year(), date.month()),
            TimeInterval::Year => first_of_month(date.year(), 1),
        };
        midnight(start)
    }

    pub fn next(self, bucket: DateTime<Utc>) -> DateTime<Utc> {
        let date = bucket.date_naive();
        let next = match self {
            TimeInterval::Day => date + Duration::days(1),
            TimeInterval::Week => date + Duration::days(7),
            TimeInterval::Month => date.checked_add_months(Months::new(1)).unwrap_or(date),
            TimeInterval::Year => date.checked_add_months(Months::new(12)).unwrap_or(date),
        };
        midnight(next)
    }

    /// Number of whole intervals between two bucket starts.
    pub fn buckets_between(self, from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
        let months = |at: DateTime<Utc>| i64::from(at.year()) * 12 + i64::from(at.month0());
        match self {
            TimeInterval::Day => (to.date_naive() - from.date_naive()).num_days(),
            TimeInterval::Week => (to.date_naive() - from.date_naive()).num_days() / 7,
            TimeInterval::Month => months(to) - months(from),
            TimeInterval::Year => i64::from(to.year()) - i64::from(from.year()),
        }
    }
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default())
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TimeSeriesPoint {
    pub date: DateTime<Utc>,
    pub value: i64,
}

/// Number of buckets covering `[start, end]`, zero for an inverted window.
pub fn time_series_len(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    interval: TimeInterval,
) -> KnowledgeResult<u64> {
    if end < start {
        return Ok(0);
    }
    let origin = interval.bucket_start(start);
    let count = interval.buckets_between(origin, interval.bucket_start(end)) + 1;
    let count = u64::try_from(count).unwrap_or(0);
    if count > MAX_TIME_SERIES_POINTS {
        return Err(KnowledgeError::InvalidValue {
            field: "interval".to_string(),
            reason: format!(
                "{} buckets requested, at most {} allowed",
                count, MAX_TIME_SERIES_POINTS
            ),
        });
    }
    Ok(count)
}

/// Counts timestamps into contiguous buckets covering `[start, end]`,
/// empty buckets included. Windows spanning more than
/// [`MAX_TIME_SERIES_POINTS`] buckets are rejected.
pub fn bucketize(
    timestamps: impl IntoIterator<Item = DateTime<Utc>>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    interval: TimeInterval,
) -> KnowledgeResult<Vec<TimeSeriesPoint>> {
    let count = time_series_len(start, end, interval)?;
    let origin = interval.bucket_start(start);
    let mut points = Vec::with_capacity(count as usize);
    let mut cursor = origin;
    for _ in 0..count {
        points.push(TimeSeriesPoint {
            date: cursor,
            value: 0,
        });
        cursor = interval.next(cursor);
    }
    for ts in timestamps {
        if ts < start || ts > end {
            continue;
        }
        let index = interval.buckets_between(origin, interval.bucket_start(ts));
        if let Some(point) = usize::try_from(index).ok().and_then(|i| points.get_mut(i)) {
            point.value += 1;
        }
    }
    Ok(points)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct NumberSummary {
    /// All matching objects
    pub total: u64,
    /// Matching objects created at or before the end date
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observable_ref() -> EntityRef {
        EntityRef {
            id: "o1".to_string(),
            entity_type: "Domain-Name".to_string(),
            parent_types: vec!["Stix-Core-Object".to_string(), OBSERVABLE_MARKER.to_string()],
            name: None,
            observable_value: Some("example.com".to_string()),
        }
    }

    #[test]
    fn display_value_follows_the_marker() {
        let observable = observable_ref();
        assert_eq!(observable.display_value(), "example.com");
        assert_eq!(observable.type_label_key(), "observable_Domain-Name");

        let domain = EntityRef {
            id: "m1".to_string(),
            entity_type: "Malware".to_string(),
            parent_types: vec!["Stix-Domain-Object".to_string()],
            name: Some("Emotet".to_string()),
            observable_value: Some("ignored".to_string()),
        };
        assert_eq!(domain.display_value(), "Emotet");
        assert_eq!(domain.type_label_key(), "entity_Malware");
    }

    #[test]
    fn week_buckets_start_on_monday() {
        // 2024-03-14 is a Thursday
        let at = Utc.with_ymd_and_hms(2024, 3, 14, 17, 30, 0).unwrap();
        let start = TimeInterval::Week.bucket_start(at);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap());
        assert_eq!(
            TimeInterval::Month.next(TimeInterval::Month.bucket_start(at)),
            Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn bucketize_fills_gaps() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 3, 23, 0, 0).unwrap();
        let hits = vec![
            Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 3, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 2, 3, 9, 0, 0).unwrap(),
        ];
        let points = bucketize(hits, start, end, TimeInterval::Day).unwrap();
        let values: Vec<i64> = points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![2, 0, 1]);
    }

    #[test]
    fn bucketize_places_months_and_years() {
        let start = Utc.with_ymd_and_hms(2023, 11, 20, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 2, 2, 0, 0, 0).unwrap();
        let hits = vec![
            Utc.with_ymd_and_hms(2023, 12, 31, 23, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
        ];
        let months = bucketize(hits.clone(), start, end, TimeInterval::Month).unwrap();
        let values: Vec<i64> = months.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![0, 1, 0, 1]);
        assert_eq!(
            months[0].date,
            Utc.with_ymd_and_hms(2023, 11, 1, 0, 0, 0).unwrap()
        );

        let years = bucketize(hits, start, end, TimeInterval::Year).unwrap();
        let values: Vec<i64> = years.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![1, 1]);
    }

    #[test]
    fn bucketize_rejects_oversized_windows() {
        let start = Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(9999, 12, 31, 0, 0, 0).unwrap();
        assert!(matches!(
            bucketize(Vec::new(), start, end, TimeInterval::Day),
            Err(KnowledgeError::InvalidValue { .. })
        ));
        let since = Utc.with_ymd_and_hms(1900, 6, 1, 0, 0, 0).unwrap();
        let until = Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap();
        let years = bucketize(Vec::new(), since, until, TimeInterval::Year).unwrap();
        assert_eq!(years.len(), 125);
    }
}
