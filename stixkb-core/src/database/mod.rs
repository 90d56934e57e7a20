pub mod connection;
pub mod entities;
pub mod migrations;
pub mod test_utils;

pub use connection::{establish_connection, get_database_url};
