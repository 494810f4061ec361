mod connection;
mod migrations;
mod queries;

pub use connection::Database;
