pub mod connector_service;
pub mod domain_object_service;
pub mod entity_refs;
pub mod external_reference_service;
pub mod file_service;
pub mod observable_service;
pub mod relationship_service;
pub mod watch_service;

pub use connector_service::{ConnectorRegistration, ConnectorService};
pub use domain_object_service::{DomainObjectAddInput, StixDomainObjectService};
pub use external_reference_service::{
    ExternalReferenceAddInput, ExternalReferenceListArgs, ExternalReferenceService,
};
pub use file_service::{FileScope, FileService, FileUpload};
pub use observable_service::{
    EditContextInput, EditInput, EditRequest, ExportAskInput, ExportPushInput,
    ObservableAddInput, ObservableListArgs, RefRelationAddInput, RefRelationsAddInput,
    RelationDeleteInput, StixCyberObservableService, TimeSeriesArgs,
};
pub use relationship_service::{
    DistributionArgs, RelationshipAddInput, RelationshipListArgs, StixCoreRelationshipService,
};
pub use watch_service::{ObservableStream, WatchService};
