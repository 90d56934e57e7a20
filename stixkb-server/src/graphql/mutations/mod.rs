mod domain_object;
mod external_reference;
mod observable;
mod relationship;
mod session;

use async_graphql::*;

pub use external_reference::ExternalReferenceEditMutations;
pub use observable::StixCyberObservableEditMutations;
pub use relationship::StixCoreRelationshipEditMutations;

/// Mutation root combining every mutation group
#[derive(Default, MergedObject)]
pub struct Mutation(
    pub observable::ObservableMutation,
    pub relationship::RelationshipMutation,
    pub domain_object::DomainObjectMutation,
    pub external_reference::ExternalReferenceMutation,
    pub session::SessionMutation,
);
