pub mod connection;
mod mappers;
mod queries;
mod rows;
pub mod sqlite_outbox;

pub use connection::{Database, DbPool};
pub use sqlite_outbox::SqliteOutbox;
