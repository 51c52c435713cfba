//! Review entity and field validation.
//!
//! # Responsibility
//! - Hold one performance-review record mirrored from the `reviews` table.
//! - Validate `year`, `summary` and `employee_id` at assignment time.
//!
//! # Invariants
//! - `year >= MIN_REVIEW_YEAR`.
//! - `summary` is not blank after trimming; the original text is kept as-is.
//! - `employee_id` referenced an existing employee when it was assigned.
//! - `id` is `None` until the row is inserted and again after it is deleted.

use crate::repo::employee_repo::EmployeeLookup;
use crate::repo::review_repo::{RepoError, RepoResult};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Primary key of a row in `reviews`.
pub type ReviewId = i64;

/// Primary key of a row in `employees`.
pub type EmployeeId = i64;

/// Earliest review year accepted by validation.
pub const MIN_REVIEW_YEAR: i64 = 2000;

/// Field-level rule violations detected before any storage access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewValidationError {
    YearTooEarly { year: i64 },
    BlankSummary,
}

impl Display for ReviewValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::YearTooEarly { year } => {
                write!(f, "year must be >= {MIN_REVIEW_YEAR}, got {year}")
            }
            Self::BlankSummary => write!(f, "summary must be a non-empty string"),
        }
    }
}

impl Error for ReviewValidationError {}

/// Raw four-column row shape `(id, year, summary, employee_id)`.
///
/// This is the contract other components rely on when joining or
/// displaying reviews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewRow {
    pub id: ReviewId,
    pub year: i64,
    pub summary: String,
    pub employee_id: EmployeeId,
}

/// One annual performance review written for an employee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    id: Option<ReviewId>,
    year: i64,
    summary: String,
    employee_id: EmployeeId,
}

impl Review {
    /// Builds an unpersisted review after validating every field.
    ///
    /// # Errors
    /// - `RepoError::Validation` for an early year or blank summary.
    /// - `RepoError::UnknownEmployee` when `employee_id` has no row in `employees`.
    /// - `RepoError::Db` when the employee lookup itself fails.
    pub fn new(
        year: i64,
        summary: impl Into<String>,
        employee_id: EmployeeId,
        employees: &impl EmployeeLookup,
    ) -> RepoResult<Self> {
        Self::with_id(None, year, summary, employee_id, employees)
    }

    /// Validating constructor that also carries a known primary key.
    ///
    /// Used when hydrating a row that is not cached yet.
    pub(crate) fn with_id(
        id: Option<ReviewId>,
        year: i64,
        summary: impl Into<String>,
        employee_id: EmployeeId,
        employees: &impl EmployeeLookup,
    ) -> RepoResult<Self> {
        let summary = summary.into();
        validate_year(year)?;
        validate_summary(&summary)?;
        ensure_employee_exists(employee_id, employees)?;

        Ok(Self {
            id,
            year,
            summary,
            employee_id,
        })
    }

    /// Trusted constructor for data just read back from storage.
    ///
    /// Skips validation entirely, including the employee lookup.
    pub(crate) fn from_trusted_row(row: ReviewRow) -> Self {
        Self {
            id: Some(row.id),
            year: row.year,
            summary: row.summary,
            employee_id: row.employee_id,
        }
    }

    pub fn id(&self) -> Option<ReviewId> {
        self.id
    }

    pub fn year(&self) -> i64 {
        self.year
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn employee_id(&self) -> EmployeeId {
        self.employee_id
    }

    /// Returns whether this instance currently mirrors a stored row.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Sets the review year. The previous value is kept on error.
    pub fn set_year(&mut self, year: i64) -> RepoResult<()> {
        validate_year(year)?;
        self.year = year;
        Ok(())
    }

    /// Sets the summary text. The previous value is kept on error.
    pub fn set_summary(&mut self, summary: impl Into<String>) -> RepoResult<()> {
        let summary = summary.into();
        validate_summary(&summary)?;
        self.summary = summary;
        Ok(())
    }

    /// Points the review at another employee.
    ///
    /// Runs a synchronous existence query against `employees`.
    pub fn set_employee_id(
        &mut self,
        employee_id: EmployeeId,
        employees: &impl EmployeeLookup,
    ) -> RepoResult<()> {
        ensure_employee_exists(employee_id, employees)?;
        self.employee_id = employee_id;
        Ok(())
    }

    /// Returns the storage row for a persisted review, `None` otherwise.
    pub fn to_row(&self) -> Option<ReviewRow> {
        self.id.map(|id| ReviewRow {
            id,
            year: self.year,
            summary: self.summary.clone(),
            employee_id: self.employee_id,
        })
    }

    pub(crate) fn set_id(&mut self, id: Option<ReviewId>) {
        self.id = id;
    }
}

impl Display for Review {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.id {
            Some(id) => write!(f, "<Review {id}: ")?,
            None => write!(f, "<Review None: ")?,
        }
        write!(
            f,
            "{}, {}, Employee: {}>",
            self.year, self.summary, self.employee_id
        )
    }
}

/// Checks the lower bound on review years.
pub fn validate_year(year: i64) -> Result<(), ReviewValidationError> {
    if year < MIN_REVIEW_YEAR {
        return Err(ReviewValidationError::YearTooEarly { year });
    }
    Ok(())
}

/// Rejects empty and whitespace-only summaries.
pub fn validate_summary(summary: &str) -> Result<(), ReviewValidationError> {
    if summary.trim().is_empty() {
        return Err(ReviewValidationError::BlankSummary);
    }
    Ok(())
}

fn ensure_employee_exists(
    employee_id: EmployeeId,
    employees: &impl EmployeeLookup,
) -> RepoResult<()> {
    if employees.employee_exists(employee_id)? {
        Ok(())
    } else {
        Err(RepoError::UnknownEmployee(employee_id))
    }
}
