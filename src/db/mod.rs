mod connection;
pub mod helpers;
pub mod migrations;
pub mod models;
mod repositories;

pub use connection::Database;
