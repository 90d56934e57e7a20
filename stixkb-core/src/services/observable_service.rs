use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde_json::{json, Value as JsonValue};
use tracing::{debug, info, warn};

use crate::auth::{capabilities, require_capability, Actor};
use crate::bus::EventBus;
use crate::database::entities::external_references::{self, EXTERNAL_REFERENCE_RELATIONSHIP};
use crate::database::entities::stix_cyber_observables::{self, Entity as StixCyberObservables};
use crate::database::entities::works::{WorkStatus, WorkType};
use crate::database::entities::{connectors, files, stix_domain_objects, works};
use crate::errors::{CoreError, CoreResult, KnowledgeError};
use crate::knowledge::{
    bucketize, time_series_len, NumberSummary, ResolvedRelationship, StatsOperation, TimeInterval,
    TimeSeriesPoint,
};
use crate::ordering::{ObservablesFiltering, ObservablesOrdering};
use crate::pagination::{fetch_page, Connection, OrderingMode, PageSettings};
use crate::presence::{EditContextRegistry, EditUserContext};
use crate::services::connector_service::ConnectorService;
use crate::services::file_service::{extension_for, FileScope, FileService, FileUpload};
use crate::services::relationship_service::{
    RelationshipAddInput, RelationshipListArgs, StixCoreRelationshipService,
};

const TABLE: &str = "stix_cyber_observables";
const ENTITY: &str = "Stix-Cyber-Observable";

/// Entity kind under which observable list exports are filed.
pub const EXPORT_ENTITY_KIND: &str = "stix-observable";

/// Who is editing which observable. Handed to every edit handler by value.
#[derive(Clone, Debug)]
pub struct EditRequest {
    pub actor: Actor,
    pub id: String,
}

impl EditRequest {
    pub fn new(actor: Actor, id: impl Into<String>) -> Self {
        Self {
            actor,
            id: id.into(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ObservableListArgs {
    pub search: Option<String>,
    pub types: Vec<String>,
    pub filters: Vec<ObservablesFiltering>,
    pub first: Option<i64>,
    pub after: Option<String>,
    pub order_by: Option<ObservablesOrdering>,
    pub order_mode: OrderingMode,
}

#[derive(Clone, Debug)]
pub struct TimeSeriesArgs {
    pub types: Vec<String>,
    pub field: String,
    pub operation: StatsOperation,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub interval: TimeInterval,
}

#[derive(Clone, Debug, Default)]
pub struct ObservableAddInput {
    pub entity_type: String,
    pub observable_value: String,
    pub description: Option<String>,
    pub x_opencti_score: Option<i32>,
    pub created_by: Option<String>,
    pub object_marking: Vec<String>,
    pub object_label: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct EditInput {
    pub key: String,
    pub value: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct EditContextInput {
    pub focus_on: Option<String>,
}

#[derive(Clone, Debug)]
pub struct RefRelationAddInput {
    pub to_id: String,
    pub relationship_type: String,
}

#[derive(Clone, Debug)]
pub struct RefRelationsAddInput {
    pub to_ids: Vec<String>,
    pub relationship_type: String,
}

#[derive(Clone, Debug, Default)]
pub struct RelationDeleteInput {
    pub relation_id: Option<String>,
    pub to_id: Option<String>,
    pub relationship_type: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ExportAskInput {
    pub format: String,
    pub export_type: String,
    pub context: Option<String>,
    pub list_args: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ExportPushInput {
    pub file: FileUpload,
    pub context: Option<String>,
    pub list_args: Option<String>,
}

#[derive(Clone)]
pub struct StixCyberObservableService {
    db: DatabaseConnection,
    bus: EventBus,
    presence: EditContextRegistry,
    relationships: StixCoreRelationshipService,
    connectors: ConnectorService,
    files: FileService,
    settings: PageSettings,
}

impl StixCyberObservableService {
    pub fn new(
        db: DatabaseConnection,
        bus: EventBus,
        presence: EditContextRegistry,
        settings: PageSettings,
    ) -> Self {
        Self {
            relationships: StixCoreRelationshipService::new(db.clone(), settings),
            connectors: ConnectorService::new(db.clone()),
            files: FileService::new(db.clone()),
            db,
            bus,
            presence,
            settings,
        }
    }

    async fn load(&self, id: &str) -> CoreResult<stix_cyber_observables::Model> {
        StixCyberObservables::find_by_id(id.to_string())
            .one(&self.db)
            .await?
            .ok_or_else(|| CoreError::not_found(ENTITY, id))
    }

    /// Checks the capability, then loads the edited observable.
    async fn authorize(
        &self,
        request: &EditRequest,
        capability: &str,
    ) -> CoreResult<stix_cyber_observables::Model> {
        require_capability(&request.actor, capability)?;
        self.load(&request.id).await
    }

    // ----- Queries ---------------------------------------------------------

    pub async fn find_by_id(
        &self,
        actor: &Actor,
        id: &str,
    ) -> CoreResult<Option<stix_cyber_observables::Model>> {
        require_capability(actor, capabilities::KNOWLEDGE)?;
        Ok(StixCyberObservables::find_by_id(id.to_string())
            .one(&self.db)
            .await?)
    }

    pub async fn find_all(
        &self,
        actor: &Actor,
        args: ObservableListArgs,
    ) -> CoreResult<Connection<stix_cyber_observables::Model>> {
        require_capability(actor, capabilities::KNOWLEDGE)?;
        let request = self
            .settings
            .request(args.first, args.after.as_deref())
            .map_err(CoreError::from)?;

        let mut select = StixCyberObservables::find();
        if let Some(search) = args
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            select = select.filter(
                Condition::any()
                    .add(stix_cyber_observables::Column::ObservableValue.contains(search))
                    .add(stix_cyber_observables::Column::Description.contains(search)),
            );
        }
        if !args.types.is_empty() {
            select = select.filter(stix_cyber_observables::Column::EntityType.is_in(args.types));
        }
        for filter in &args.filters {
            select = select.filter(filter.key.field_path().filter_expr(TABLE, &filter.values));
        }

        let ordering = args.order_by.unwrap_or(ObservablesOrdering::CreatedAt);
        let select = select
            .order_by(ordering.field_path().sort_expr(TABLE), args.order_mode.order())
            .order_by(stix_cyber_observables::Column::Id, Order::Asc);

        Ok(fetch_page(&self.db, select, request).await?)
    }

    pub async fn number(
        &self,
        actor: &Actor,
        types: Vec<String>,
        end_date: Option<DateTime<Utc>>,
    ) -> CoreResult<NumberSummary> {
        require_capability(actor, capabilities::KNOWLEDGE)?;
        let mut select = StixCyberObservables::find();
        if !types.is_empty() {
            select = select.filter(stix_cyber_observables::Column::EntityType.is_in(types));
        }
        let total = select.clone().count(&self.db).await?;
        let count = match end_date {
            Some(end) => {
                select
                    .filter(stix_cyber_observables::Column::CreatedAt.lte(end))
                    .count(&self.db)
                    .await?
            }
            None => total,
        };
        Ok(NumberSummary { total, count })
    }

    pub async fn time_series(
        &self,
        actor: &Actor,
        args: TimeSeriesArgs,
    ) -> CoreResult<Vec<TimeSeriesPoint>> {
        require_capability(actor, capabilities::KNOWLEDGE)?;
        if args.operation != StatsOperation::Count {
            return Err(KnowledgeError::InvalidValue {
                field: "operation".to_string(),
                reason: format!("{} is not supported for time series", args.operation),
            }
            .into());
        }
        let pick: fn(&stix_cyber_observables::Model) -> DateTime<Utc> = match args.field.as_str()
        {
            "created_at" => |m| m.created_at,
            "updated_at" => |m| m.updated_at,
            other => return Err(KnowledgeError::UnsupportedField(other.to_string()).into()),
        };

        time_series_len(args.start_date, args.end_date, args.interval)?;

        let mut select = StixCyberObservables::find();
        if !args.types.is_empty() {
            select = select.filter(stix_cyber_observables::Column::EntityType.is_in(args.types));
        }
        let observables = select.all(&self.db).await?;
        Ok(bucketize(
            observables.iter().map(pick),
            args.start_date,
            args.end_date,
            args.interval,
        )?)
    }

    pub async fn export_files(
        &self,
        actor: &Actor,
        first: Option<i64>,
        context: Option<String>,
    ) -> CoreResult<Connection<files::Model>> {
        require_capability(actor, capabilities::KNOWLEDGE_KNGETEXPORT_KNASKEXPORT)?;
        let request = self.settings.request(first, None).map_err(CoreError::from)?;
        self.files
            .listing(&FileScope::export_of(EXPORT_ENTITY_KIND, context), request)
            .await
    }

    // ----- Field resolvers -------------------------------------------------

    /// Indicators built on the observable (`Indicator --based-on--> observable`).
    pub async fn indicators(
        &self,
        actor: &Actor,
        id: &str,
    ) -> CoreResult<Vec<stix_domain_objects::Model>> {
        require_capability(actor, capabilities::KNOWLEDGE)?;
        let sources: Vec<String> = self
            .relationships
            .sources_of(id, "based-on")
            .await?
            .into_iter()
            .map(|r| r.from_id)
            .collect();
        if sources.is_empty() {
            return Ok(Vec::new());
        }
        Ok(stix_domain_objects::Entity::find()
            .filter(stix_domain_objects::Column::Id.is_in(sources))
            .filter(stix_domain_objects::Column::EntityType.eq("Indicator"))
            .order_by_asc(stix_domain_objects::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    pub async fn jobs(
        &self,
        actor: &Actor,
        id: &str,
        first: Option<i64>,
    ) -> CoreResult<Vec<works::Model>> {
        require_capability(actor, capabilities::KNOWLEDGE)?;
        let request = self.settings.request(first, None).map_err(CoreError::from)?;
        self.connectors.works_for_entity(id, request.first).await
    }

    pub async fn connectors(
        &self,
        actor: &Actor,
        entity_type: &str,
        only_alive: bool,
    ) -> CoreResult<Vec<connectors::Model>> {
        require_capability(actor, capabilities::KNOWLEDGE)?;
        self.connectors.for_enrichment(entity_type, only_alive).await
    }

    pub async fn stix_relations(
        &self,
        actor: &Actor,
        id: &str,
        mut args: RelationshipListArgs,
    ) -> CoreResult<Connection<ResolvedRelationship>> {
        args.from_id = Some(id.to_string());
        self.relationships.list(actor, args).await
    }

    pub fn edit_context(&self, id: &str) -> Vec<EditUserContext> {
        self.presence.list(id)
    }

    /// STIX 2.1 JSON bundle entry for the observable.
    pub async fn to_stix(
        &self,
        actor: &Actor,
        observable: &stix_cyber_observables::Model,
    ) -> CoreResult<String> {
        require_capability(actor, capabilities::KNOWLEDGE)?;
        let stix_type = match observable.entity_type.as_str() {
            "StixFile" => "file".to_string(),
            other => other.to_lowercase(),
        };
        let mut object = json!({
            "id": format!("{}--{}", stix_type, observable.id),
            "type": stix_type,
            "spec_version": "2.1",
            "value": observable.observable_value,
            "x_opencti_id": observable.id,
            "x_opencti_type": observable.entity_type,
            "created": observable.created_at.to_rfc3339(),
            "modified": observable.updated_at.to_rfc3339(),
        });
        if let Some(description) = &observable.description {
            object["x_opencti_description"] = json!(description);
        }
        if let Some(score) = observable.x_opencti_score {
            object["x_opencti_score"] = json!(score);
        }

        let refs = self.relationships.refs_of(&observable.id).await?;
        let mut markings = Vec::new();
        let mut label_ids = Vec::new();
        let mut external_ids = Vec::new();
        for reference in refs {
            match reference.relationship_type.as_str() {
                "created-by" => {
                    object["created_by_ref"] = json!(format!("identity--{}", reference.to_id));
                }
                "object-marking" => {
                    markings.push(JsonValue::from(format!(
                        "marking-definition--{}",
                        reference.to_id
                    )));
                }
                "object-label" => label_ids.push(reference.to_id),
                EXTERNAL_REFERENCE_RELATIONSHIP => external_ids.push(reference.to_id),
                _ => {}
            }
        }
        if !markings.is_empty() {
            object["object_marking_refs"] = JsonValue::Array(markings);
        }
        if !label_ids.is_empty() {
            let labels: Vec<String> = stix_domain_objects::Entity::find()
                .filter(stix_domain_objects::Column::Id.is_in(label_ids))
                .order_by_asc(stix_domain_objects::Column::Name)
                .all(&self.db)
                .await?
                .into_iter()
                .map(|label| label.name)
                .collect();
            object["labels"] = json!(labels);
        }
        if !external_ids.is_empty() {
            let references: Vec<JsonValue> = external_references::Entity::find()
                .filter(external_references::Column::Id.is_in(external_ids))
                .order_by_asc(external_references::Column::CreatedAt)
                .all(&self.db)
                .await?
                .into_iter()
                .map(|reference| {
                    let mut entry = json!({ "source_name": reference.source_name });
                    if let Some(url) = reference.url {
                        entry["url"] = json!(url);
                    }
                    if let Some(external_id) = reference.external_id {
                        entry["external_id"] = json!(external_id);
                    }
                    if let Some(description) = reference.description {
                        entry["description"] = json!(description);
                    }
                    entry
                })
                .collect();
            object["external_references"] = JsonValue::Array(references);
        }

        serde_json::to_string(&object)
            .map_err(|e| CoreError::internal(format!("Failed to serialise STIX object: {}", e)))
    }

    // ----- Mutations -------------------------------------------------------

    pub async fn add(
        &self,
        actor: &Actor,
        input: ObservableAddInput,
    ) -> CoreResult<stix_cyber_observables::Model> {
        require_capability(actor, capabilities::KNOWLEDGE_KNUPDATE)?;
        if input.entity_type.trim().is_empty() {
            return Err(KnowledgeError::InvalidValue {
                field: "type".to_string(),
                reason: "must not be empty".to_string(),
            }
            .into());
        }
        if input.observable_value.trim().is_empty() {
            return Err(KnowledgeError::InvalidValue {
                field: "observable_value".to_string(),
                reason: "must not be empty".to_string(),
            }
            .into());
        }
        let score = input
            .x_opencti_score
            .map(|score| validate_score(score.to_string().as_str()))
            .transpose()?;

        let txn = self.db.begin().await?;

        let mut model =
            stix_cyber_observables::ActiveModel::new(input.entity_type, input.observable_value);
        model.description = Set(input.description.filter(|d| !d.is_empty()));
        model.x_opencti_score = Set(score);
        let observable = model.insert(&txn).await?;

        let references = input
            .created_by
            .into_iter()
            .map(|id| (id, "created-by"))
            .chain(input.object_marking.into_iter().map(|id| (id, "object-marking")))
            .chain(input.object_label.into_iter().map(|id| (id, "object-label")));
        for (to_id, relationship_type) in references {
            self.relationships
                .create(
                    &txn,
                    RelationshipAddInput::new(&observable.id, &to_id, relationship_type),
                )
                .await?;
        }

        txn.commit().await?;

        info!(id = %observable.id, entity_type = %observable.entity_type, "observable created");
        self.bus.notify_added(actor, observable.clone());
        Ok(observable)
    }

    pub async fn delete(&self, request: EditRequest) -> CoreResult<String> {
        self.authorize(&request, capabilities::KNOWLEDGE_KNUPDATE_KNDELETE)
            .await?;
        let txn = self.db.begin().await?;
        let detached = self.relationships.delete_all_of(&txn, &request.id).await?;
        StixCyberObservables::delete_by_id(request.id.clone())
            .exec(&txn)
            .await?;
        txn.commit().await?;
        let cleared = self.presence.remove_entity(&request.id);
        info!(
            id = %request.id,
            detached,
            cleared_contexts = cleared,
            "observable deleted"
        );
        self.bus.notify_deleted(&request.actor, request.id.clone());
        Ok(request.id)
    }

    pub async fn field_patch(
        &self,
        request: EditRequest,
        input: EditInput,
    ) -> CoreResult<stix_cyber_observables::Model> {
        let observable = self
            .authorize(&request, capabilities::KNOWLEDGE_KNUPDATE)
            .await?;
        let mut active: stix_cyber_observables::ActiveModel = observable.into();
        let first = input.value.first().map(String::as_str);

        match input.key.as_str() {
            "observable_value" => {
                let value = first.map(str::trim).filter(|v| !v.is_empty()).ok_or_else(|| {
                    KnowledgeError::InvalidValue {
                        field: input.key.clone(),
                        reason: "must not be empty".to_string(),
                    }
                })?;
                active.observable_value = Set(value.to_string());
            }
            "description" => {
                active.description = Set(first.filter(|v| !v.is_empty()).map(str::to_string));
            }
            "x_opencti_score" => {
                let score = first
                    .filter(|v| !v.is_empty())
                    .map(validate_score)
                    .transpose()?;
                active.x_opencti_score = Set(score);
            }
            other => return Err(KnowledgeError::ReadOnlyField(other.to_string()).into()),
        }
        active.updated_at = Set(Utc::now());
        let observable = active.update(&self.db).await?;

        debug!(id = %observable.id, key = %input.key, "observable patched");
        self.bus.notify_edit(&request.actor, observable.clone());
        Ok(observable)
    }

    pub async fn context_patch(
        &self,
        request: EditRequest,
        input: EditContextInput,
    ) -> CoreResult<stix_cyber_observables::Model> {
        let observable = self
            .authorize(&request, capabilities::KNOWLEDGE_KNUPDATE)
            .await?;
        let user_id = request.actor.require_user_id()?;
        self.presence
            .set(&request.id, user_id, &request.actor.name, input.focus_on);
        self.bus.notify_edit(&request.actor, observable.clone());
        Ok(observable)
    }

    /// Clearing a context that is not set is not an error.
    pub async fn context_clean(
        &self,
        request: EditRequest,
    ) -> CoreResult<stix_cyber_observables::Model> {
        let observable = self
            .authorize(&request, capabilities::KNOWLEDGE_KNUPDATE)
            .await?;
        let user_id = request.actor.require_user_id()?;
        if self.presence.clear(&request.id, user_id) {
            debug!(id = %request.id, user_id, "edit context cleared");
        }
        self.bus.notify_edit(&request.actor, observable.clone());
        Ok(observable)
    }

    pub async fn relation_add(
        &self,
        request: EditRequest,
        input: RefRelationAddInput,
    ) -> CoreResult<ResolvedRelationship> {
        let observable = self
            .authorize(&request, capabilities::KNOWLEDGE_KNUPDATE)
            .await?;
        let relationship = self
            .relationships
            .create(
                &self.db,
                RelationshipAddInput::new(&request.id, &input.to_id, &input.relationship_type),
            )
            .await?;
        self.bus.notify_edit(&request.actor, observable);
        Ok(relationship)
    }

    pub async fn relations_add(
        &self,
        request: EditRequest,
        input: RefRelationsAddInput,
    ) -> CoreResult<stix_cyber_observables::Model> {
        let observable = self
            .authorize(&request, capabilities::KNOWLEDGE_KNUPDATE)
            .await?;
        // All or nothing: a failing target leaves no edge behind.
        let txn = self.db.begin().await?;
        for to_id in &input.to_ids {
            self.relationships
                .create(
                    &txn,
                    RelationshipAddInput::new(&request.id, to_id, &input.relationship_type),
                )
                .await?;
        }
        txn.commit().await?;
        self.bus.notify_edit(&request.actor, observable.clone());
        Ok(observable)
    }

    /// Deletes by relationship id, or by target and type when no id is given.
    pub async fn relation_delete(
        &self,
        request: EditRequest,
        input: RelationDeleteInput,
    ) -> CoreResult<stix_cyber_observables::Model> {
        let observable = self
            .authorize(&request, capabilities::KNOWLEDGE_KNUPDATE)
            .await?;
        match (input.relation_id, input.to_id, input.relationship_type) {
            (Some(relation_id), _, _) => {
                self.relationships
                    .delete_attached(&request.id, &relation_id)
                    .await?;
            }
            (None, Some(to_id), Some(relationship_type)) => {
                self.relationships
                    .delete_between(&request.id, &to_id, &relationship_type)
                    .await?;
            }
            _ => {
                return Err(CoreError::validation(
                    "relationId, or toId together with relationship_type, is required",
                ))
            }
        }
        self.bus.notify_edit(&request.actor, observable.clone());
        Ok(observable)
    }

    pub async fn ask_enrichment(
        &self,
        request: EditRequest,
        connector_id: &str,
    ) -> CoreResult<works::Model> {
        let observable = self
            .authorize(&request, capabilities::KNOWLEDGE_KNENRICHMENT)
            .await?;
        let connector = self
            .connectors
            .enrichment_connector(connector_id, &observable.entity_type)
            .await?;
        self.connectors
            .create_work(&connector, WorkType::Enrichment, Some(observable.id), None)
            .await
    }

    /// Queues one export work per active export connector handling `format`.
    pub async fn export_ask(
        &self,
        actor: &Actor,
        input: ExportAskInput,
    ) -> CoreResult<Vec<works::Model>> {
        require_capability(actor, capabilities::KNOWLEDGE_KNGETEXPORT_KNASKEXPORT)?;
        if !matches!(input.export_type.as_str(), "simple" | "full") {
            return Err(KnowledgeError::InvalidValue {
                field: "exportType".to_string(),
                reason: format!("unknown export type {}", input.export_type),
            }
            .into());
        }
        validate_list_args(input.list_args.as_deref())?;

        let connectors = self.connectors.for_export(&input.format).await?;
        if connectors.is_empty() {
            warn!(format = %input.format, "no export connector available");
            return Ok(Vec::new());
        }

        let scope = FileScope::export_of(EXPORT_ENTITY_KIND, input.context.clone());
        let timestamp = Utc::now().format("%Y%m%d%H%M%S");
        let mut works = Vec::with_capacity(connectors.len());
        for connector in connectors {
            let work = self
                .connectors
                .create_work(&connector, WorkType::Export, None, input.context.clone())
                .await?;
            let name = format!(
                "{}_{}_Stix-Cyber-Observables_({}).{}",
                timestamp,
                input.export_type,
                connector.name,
                extension_for(&input.format)
            );
            self.files
                .create_placeholder(
                    &scope,
                    name,
                    &input.format,
                    &work.id,
                    input.list_args.clone(),
                )
                .await?;
            works.push(work);
        }
        Ok(works)
    }

    /// Stores an export produced by a connector and completes its work.
    pub async fn export_push(
        &self,
        actor: &Actor,
        input: ExportPushInput,
    ) -> CoreResult<files::Model> {
        require_capability(actor, capabilities::KNOWLEDGE_KNGETEXPORT_KNASKEXPORT)?;
        validate_list_args(input.list_args.as_deref())?;
        let scope = FileScope::export_of(EXPORT_ENTITY_KIND, input.context);
        let stored = self.files.store(&scope, input.file, input.list_args).await?;
        if let Some(work_id) = &stored.work_id {
            self.connectors
                .update_work_status(work_id, WorkStatus::Complete)
                .await?;
        }
        Ok(stored)
    }
}

fn validate_score(raw: &str) -> Result<i32, KnowledgeError> {
    let invalid = |reason: &str| KnowledgeError::InvalidValue {
        field: "x_opencti_score".to_string(),
        reason: reason.to_string(),
    };
    let score: i32 = raw
        .trim()
        .parse()
        .map_err(|_| invalid("must be an integer"))?;
    if !(0..=100).contains(&score) {
        return Err(invalid("must be between 0 and 100"));
    }
    Ok(score)
}

fn validate_list_args(list_args: Option<&str>) -> Result<(), KnowledgeError> {
    if let Some(raw) = list_args {
        serde_json::from_str::<JsonValue>(raw).map_err(|e| KnowledgeError::InvalidValue {
            field: "listArgs".to_string(),
            reason: e.to_string(),
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_are_bounded() {
        assert_eq!(validate_score("50").unwrap(), 50);
        assert!(validate_score("101").is_err());
        assert!(validate_score("high").is_err());
    }

    #[test]
    fn list_args_must_be_json() {
        assert!(validate_list_args(None).is_ok());
        assert!(validate_list_args(Some(r#"{"search":"x"}"#)).is_ok());
        assert!(validate_list_args(Some("{nope")).is_err());
    }
}
