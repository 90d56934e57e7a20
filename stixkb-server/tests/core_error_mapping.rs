use async_graphql::{Error, Value};

use stixkb::errors::CoreError;
use stixkb_server::graphql::errors::core_error_to_graphql_error;

fn extension_value<'a>(error: &'a Error, key: &str) -> Option<&'a Value> {
    error.extensions.as_ref().and_then(|ext| ext.get(key))
}

#[test]
fn core_error_maps_to_graphql_codes() {
    let cases = [
        (CoreError::validation("invalid"), "VALIDATION_FAILED"),
        (CoreError::conflict("duplicate edge"), "CONFLICT"),
        (CoreError::forbidden("nope"), "FORBIDDEN"),
        (CoreError::unauthorized("auth"), "UNAUTHORIZED"),
        (CoreError::unavailable("bus down"), "SERVICE_ERROR"),
        (CoreError::internal("boom"), "INTERNAL_ERROR"),
    ];
    for (error, code) in cases {
        let mapped = core_error_to_graphql_error(error);
        assert_eq!(extension_value(&mapped, "code"), Some(&Value::from(code)));
    }
}

#[test]
fn not_found_error_includes_fields() {
    let error = core_error_to_graphql_error(CoreError::not_found("Stix-Cyber-Observable", "o-12"));
    assert_eq!(
        extension_value(&error, "code"),
        Some(&Value::from("NOT_FOUND"))
    );
    assert_eq!(
        extension_value(&error, "entity"),
        Some(&Value::from("Stix-Cyber-Observable"))
    );
    assert_eq!(extension_value(&error, "id"), Some(&Value::from("o-12")));
    assert_eq!(error.message, "Stix-Cyber-Observable o-12 not found");
}

#[test]
fn extra_fields_become_extensions() {
    let error = core_error_to_graphql_error(
        CoreError::validation("read-only field").with_field("key", "entity_type"),
    );
    assert_eq!(
        extension_value(&error, "key"),
        Some(&Value::from("entity_type"))
    );
}
