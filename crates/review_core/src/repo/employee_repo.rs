//! Read-only access to the external `employees` table.
//!
//! The employee entity is owned elsewhere; reviews only need to know
//! whether an id exists when `employee_id` is assigned.

use crate::model::review::EmployeeId;
use crate::repo::review_repo::RepoResult;
use rusqlite::{Connection, OptionalExtension};

/// Existence check used to validate review foreign keys.
pub trait EmployeeLookup {
    fn employee_exists(&self, id: EmployeeId) -> RepoResult<bool>;
}

impl EmployeeLookup for Connection {
    fn employee_exists(&self, id: EmployeeId) -> RepoResult<bool> {
        let found = self
            .query_row("SELECT id FROM employees WHERE id = ?1;", [id], |row| {
                row.get::<_, i64>(0)
            })
            .optional()?;
        Ok(found.is_some())
    }
}
