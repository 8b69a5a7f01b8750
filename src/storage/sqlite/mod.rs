// File: src/storage/sqlite/mod.rs

mod config;
mod convert;
mod entries;
mod schema;
mod store;
mod tree_heads;

pub use config::SqliteConfig;
pub use store::SqliteLogStore;
