//! Repository layer for reviews and the employee reference check.
//!
//! # Responsibility
//! - Keep SQL for `reviews` inside the persistence boundary.
//! - Own the identity cache that maps review ids to shared instances.
//!
//! # Invariants
//! - Storage failures are returned to the caller untranslated (`RepoError::Db`).
//! - The repository never creates or writes the `employees` table.

pub mod employee_repo;
pub mod review_repo;
