pub mod import;
pub mod models;
mod queries;
mod sqlite;
mod store;

pub use sqlite::Database;
pub use store::CatalogStore;
