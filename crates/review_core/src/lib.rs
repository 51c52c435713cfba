//! Review persistence for annual performance reviews.
//!
//! Maps `Review` records onto the SQLite `reviews` table, validates fields
//! at assignment time and keeps one shared instance per stored row.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;

pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::review::{
    EmployeeId, Review, ReviewId, ReviewRow, ReviewValidationError, MIN_REVIEW_YEAR,
};
pub use repo::employee_repo::EmployeeLookup;
pub use repo::review_repo::{
    RepoError, RepoResult, ReviewRepository, SharedReview, SqliteReviewStore,
};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
