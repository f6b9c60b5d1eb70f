//! Database layer: schema, models, catalog persistence and read queries

pub mod account;
pub mod catalog;
pub mod init;
pub mod models;

pub use init::init_database;
