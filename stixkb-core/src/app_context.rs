use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tracing::info;

use crate::auth::Actor;
use crate::bus::EventBus;
use crate::errors::CoreResult;
use crate::pagination::PageSettings;
use crate::presence::EditContextRegistry;
use crate::services::{
    ConnectorRegistration, ConnectorService, ExternalReferenceService, StixCoreRelationshipService,
    StixCyberObservableService, StixDomainObjectService, WatchService,
};

pub const DEFAULT_BUS_BUFFER: usize = 1024;

/// Shared application context exposing the knowledge services to the
/// GraphQL layer. Cloning is cheap; every clone shares the bus and the
/// presence registry.
#[derive(Clone)]
pub struct AppContext {
    db: DatabaseConnection,
    bus: EventBus,
    presence: EditContextRegistry,
    settings: PageSettings,
    observable_service: Arc<StixCyberObservableService>,
    relationship_service: Arc<StixCoreRelationshipService>,
    domain_object_service: Arc<StixDomainObjectService>,
    external_reference_service: Arc<ExternalReferenceService>,
    connector_service: Arc<ConnectorService>,
    watch_service: Arc<WatchService>,
}

impl AppContext {
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_settings(db, PageSettings::default(), DEFAULT_BUS_BUFFER)
    }

    pub fn with_settings(db: DatabaseConnection, settings: PageSettings, bus_buffer: usize) -> Self {
        let bus = EventBus::new(bus_buffer);
        let presence = EditContextRegistry::new();

        let observable_service = Arc::new(StixCyberObservableService::new(
            db.clone(),
            bus.clone(),
            presence.clone(),
            settings,
        ));
        let relationship_service = Arc::new(StixCoreRelationshipService::new(db.clone(), settings));
        let domain_object_service = Arc::new(StixDomainObjectService::new(db.clone()));
        let external_reference_service =
            Arc::new(ExternalReferenceService::new(db.clone(), settings));
        let connector_service = Arc::new(ConnectorService::new(db.clone()));
        let watch_service = Arc::new(WatchService::new(
            db.clone(),
            bus.clone(),
            presence.clone(),
        ));

        Self {
            db,
            bus,
            presence,
            settings,
            observable_service,
            relationship_service,
            domain_object_service,
            external_reference_service,
            connector_service,
            watch_service,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn presence(&self) -> &EditContextRegistry {
        &self.presence
    }

    pub fn page_settings(&self) -> PageSettings {
        self.settings
    }

    pub fn observable_service(&self) -> Arc<StixCyberObservableService> {
        self.observable_service.clone()
    }

    pub fn relationship_service(&self) -> Arc<StixCoreRelationshipService> {
        self.relationship_service.clone()
    }

    pub fn domain_object_service(&self) -> Arc<StixDomainObjectService> {
        self.domain_object_service.clone()
    }

    pub fn external_reference_service(&self) -> Arc<ExternalReferenceService> {
        self.external_reference_service.clone()
    }

    pub fn watch_service(&self) -> Arc<WatchService> {
        self.watch_service.clone()
    }

    pub async fn register_connectors(
        &self,
        registrations: Vec<ConnectorRegistration>,
    ) -> CoreResult<usize> {
        let count = registrations.len();
        for registration in registrations {
            self.connector_service.register(registration).await?;
        }
        info!(count, "connectors registered");
        Ok(count)
    }

    /// Ends every watch stream of the actor.
    pub fn logout(&self, actor: &Actor) -> CoreResult<usize> {
        let user_id = actor.require_user_id()?;
        let delivered = self.bus.disconnect(user_id);
        info!(user_id, delivered, "user disconnected");
        Ok(delivered)
    }
}
