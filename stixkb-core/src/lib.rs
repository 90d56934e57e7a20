pub mod app_context;
pub use app_context::AppContext;

pub mod auth;
pub mod bus;
pub mod database;
pub mod errors;
pub mod knowledge;
pub mod ordering;
pub mod pagination;
pub mod presence;
pub mod services;
pub mod utils;
pub mod views;

pub use auth::Actor;
pub use errors::{CoreError, CoreErrorKind, CoreResult};
