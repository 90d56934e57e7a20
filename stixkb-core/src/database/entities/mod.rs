pub mod connectors;
pub mod external_references;
pub mod files;
pub mod stix_core_relationships;
pub mod stix_cyber_observables;
pub mod stix_domain_objects;
pub mod works;
