pub mod repository;
pub mod sqlite;

pub use repository::ProgressRepository;
pub use sqlite::{ProgressDbError, SqliteProgressDb};
