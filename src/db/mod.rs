pub mod core;
mod job;
pub mod property;
mod schema;

// Re-export Database and essential types
pub use self::core::Database;
pub use self::property::{DuplicateLink, PropertyRecord, PropertyStatus};
pub use sqlx::Row;
