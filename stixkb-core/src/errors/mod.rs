//! Error types for stixkb-core
//!
//! - **CoreError**: transport-neutral error with a kind, a message and
//!   optional structured fields. Every service returns `CoreResult`.
//! - **KnowledgeError**: domain failures of the knowledge layer, converted
//!   into `CoreError` at service boundaries.
//!
//! ```rust
//! use stixkb::errors::{CoreError, CoreErrorKind, KnowledgeError};
//!
//! let err: CoreError = KnowledgeError::not_found("Stix-Cyber-Observable", "42").into();
//! assert_eq!(err.kind(), CoreErrorKind::NotFound);
//! ```

pub mod core_error;
pub mod knowledge;

pub use core_error::{CoreError, CoreErrorKind, CoreResult};
pub use knowledge::KnowledgeError;

/// Result type alias for knowledge operations
pub type KnowledgeResult<T> = Result<T, KnowledgeError>;
