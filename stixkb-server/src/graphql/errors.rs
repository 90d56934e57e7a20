use async_graphql::{Error, ErrorExtensions};
use stixkb::errors::{CoreError, CoreErrorKind};

/// Structured error builder for consistent error handling
pub struct StructuredError;

impl StructuredError {
    /// Create a "not found" error
    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Error {
        Error::new(format!("{} {} not found", resource, id)).extend_with(|_, e| {
            e.set("code", CoreErrorKind::NotFound.code());
            e.set("entity", resource);
            e.set("id", id.to_string());
        })
    }

    /// Create an "unauthorized" error
    pub fn unauthorized(message: impl Into<String>) -> Error {
        Error::new(message.into()).extend_with(|_, e| {
            e.set("code", CoreErrorKind::Unauthorized.code());
        })
    }

    /// Create a "validation failed" error
    pub fn validation(field: &str, message: impl Into<String>) -> Error {
        Error::new(format!(
            "Validation failed for '{}': {}",
            field,
            message.into()
        ))
        .extend_with(|_, e| {
            e.set("code", CoreErrorKind::Validation.code());
            e.set("field", field);
        })
    }

    /// Create an "internal error"
    pub fn internal(message: impl Into<String>) -> Error {
        Error::new(message.into()).extend_with(|_, e| {
            e.set("code", CoreErrorKind::Internal.code());
        })
    }

    pub fn from_core_error(error: CoreError) -> Error {
        core_error_to_graphql_error(error)
    }
}

/// Maps a core error to a GraphQL error carrying its code and fields as
/// extensions.
pub fn core_error_to_graphql_error(error: CoreError) -> Error {
    let code = error.kind().code();
    let fields = error.fields().cloned();
    if error.kind() == CoreErrorKind::Internal {
        tracing::error!(error = %error, "internal error while resolving");
    }
    Error::new(error.message()).extend_with(move |_, e| {
        e.set("code", code);
        if let Some(fields) = &fields {
            for (key, value) in fields {
                e.set(key.as_str(), value.as_str());
            }
        }
    })
}
