pub mod auth;
pub mod config;
pub mod graphql;
pub mod server;
