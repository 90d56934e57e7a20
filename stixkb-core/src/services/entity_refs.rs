use std::collections::HashMap;

use sea_orm::{ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};

use crate::database::entities::{stix_cyber_observables, stix_domain_objects};
use crate::knowledge::EntityRef;

/// Looks an id up in both object tables.
pub async fn find_ref<C>(db: &C, id: &str) -> Result<Option<EntityRef>, DbErr>
where
    C: ConnectionTrait,
{
    if let Some(observable) = stix_cyber_observables::Entity::find_by_id(id.to_string())
        .one(db)
        .await?
    {
        return Ok(Some(EntityRef::from(&observable)));
    }
    Ok(stix_domain_objects::Entity::find_by_id(id.to_string())
        .one(db)
        .await?
        .as_ref()
        .map(EntityRef::from))
}

/// Batch variant of [`find_ref`]; unknown ids are absent from the map.
pub async fn resolve_refs(
    db: &DatabaseConnection,
    ids: Vec<String>,
) -> Result<HashMap<String, EntityRef>, DbErr> {
    let mut refs = HashMap::new();
    if ids.is_empty() {
        return Ok(refs);
    }

    let observables = stix_cyber_observables::Entity::find()
        .filter(stix_cyber_observables::Column::Id.is_in(ids.clone()))
        .all(db)
        .await?;
    for observable in &observables {
        refs.insert(observable.id.clone(), EntityRef::from(observable));
    }

    let domain_objects = stix_domain_objects::Entity::find()
        .filter(stix_domain_objects::Column::Id.is_in(ids))
        .all(db)
        .await?;
    for object in &domain_objects {
        refs.insert(object.id.clone(), EntityRef::from(object));
    }

    Ok(refs)
}
