//! Review repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide insert-only `save`, `update`, `delete` and lookups over `reviews`.
//! - Keep one canonical shared instance per persisted review id.
//!
//! # Invariants
//! - The cache holds at most one instance per id; hydration refreshes it in place.
//! - `save` on a persisted review and `delete` on an unpersisted one are no-ops,
//!   while `update` on an unpersisted review is an error.
//! - Every write runs as a single autocommitted statement.
//! - Ids are never reused, even after the highest row is deleted.
//! - Caller-held borrows of a shared review surface as `InstanceBorrowed`, never a panic.

use crate::db::DbError;
use crate::model::review::{EmployeeId, Review, ReviewId, ReviewRow, ReviewValidationError};
use log::debug;
use rusqlite::{params, Connection, Row};
use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

const REVIEW_SELECT_SQL: &str = "SELECT id, year, summary, employee_id FROM reviews";

const CREATE_REVIEWS_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS reviews (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    year INTEGER,
    summary TEXT,
    employee_id INTEGER,
    FOREIGN KEY (employee_id) REFERENCES employees(id)
);";

/// Shared handle to the canonical in-memory review for one row.
pub type SharedReview = Rc<RefCell<Review>>;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for review validation, state and persistence failures.
#[derive(Debug)]
pub enum RepoError {
    Validation(ReviewValidationError),
    /// `employee_id` does not match any row in `employees`.
    UnknownEmployee(EmployeeId),
    /// The operation needs a review that has already been saved.
    NotPersisted,
    /// The shared instance is borrowed by the caller while the store needs it.
    InstanceBorrowed(Option<ReviewId>),
    MissingRequiredTable(&'static str),
    Db(DbError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::UnknownEmployee(id) => {
                write!(f, "employee_id {id} must reference a persisted employee")
            }
            Self::NotPersisted => write!(f, "cannot update a review without an id"),
            Self::InstanceBorrowed(Some(id)) => write!(f, "review {id} is already borrowed"),
            Self::InstanceBorrowed(None) => write!(f, "review instance is already borrowed"),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::UnknownEmployee(_)
            | Self::NotPersisted
            | Self::InstanceBorrowed(_)
            | Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<ReviewValidationError> for RepoError {
    fn from(value: ReviewValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for review persistence and identity mapping.
pub trait ReviewRepository {
    /// Ensures the `reviews` table exists.
    fn create_table(&self) -> RepoResult<()>;
    /// Drops the `reviews` table and forgets every cached instance.
    fn drop_table(&mut self) -> RepoResult<()>;
    /// Inserts an unpersisted review; returns persisted ones unchanged.
    fn save(&mut self, review: &SharedReview) -> RepoResult<SharedReview>;
    /// Validates, builds and saves a new review in one call.
    fn create(
        &mut self,
        year: i64,
        summary: &str,
        employee_id: EmployeeId,
    ) -> RepoResult<SharedReview>;
    /// Returns the canonical instance for a stored row.
    fn instance_from_row(&mut self, row: ReviewRow) -> RepoResult<SharedReview>;
    /// Gets one review by primary key.
    fn find_by_id(&mut self, id: ReviewId) -> RepoResult<Option<SharedReview>>;
    /// Overwrites the stored row with the instance's current fields.
    fn update(&mut self, review: &SharedReview) -> RepoResult<()>;
    /// Deletes the stored row and marks the instance unpersisted.
    fn delete(&mut self, review: &SharedReview) -> RepoResult<()>;
    /// Lists every stored review in table scan order.
    fn get_all(&mut self) -> RepoResult<Vec<SharedReview>>;
}

/// SQLite-backed review store owning the identity cache.
///
/// Not `Send`: callers needing concurrent access must serialize it themselves.
pub struct SqliteReviewStore<'conn> {
    conn: &'conn Connection,
    all: HashMap<ReviewId, SharedReview>,
}

impl<'conn> SqliteReviewStore<'conn> {
    /// Constructs a store on a connection that already has an `employees` table.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        if !table_exists(conn, "employees")? {
            return Err(RepoError::MissingRequiredTable("employees"));
        }
        Ok(Self {
            conn,
            all: HashMap::new(),
        })
    }

    /// Builds an unpersisted review validated against this store's connection.
    pub fn new_review(
        &self,
        year: i64,
        summary: &str,
        employee_id: EmployeeId,
    ) -> RepoResult<SharedReview> {
        let review = Review::new(year, summary, employee_id, self.conn)?;
        Ok(Rc::new(RefCell::new(review)))
    }

    /// Returns the cached instance for `id` without touching storage.
    pub fn cached(&self, id: ReviewId) -> Option<SharedReview> {
        self.all.get(&id).map(Rc::clone)
    }

    pub fn cache_len(&self) -> usize {
        self.all.len()
    }
}

impl ReviewRepository for SqliteReviewStore<'_> {
    fn create_table(&self) -> RepoResult<()> {
        self.conn.execute_batch(CREATE_REVIEWS_TABLE_SQL)?;
        debug!("event=review_create_table module=repo status=ok");
        Ok(())
    }

    fn drop_table(&mut self) -> RepoResult<()> {
        self.conn.execute_batch("DROP TABLE IF EXISTS reviews;")?;
        let evicted = self.all.len();
        self.all.clear();
        debug!("event=review_drop_table module=repo status=ok evicted={evicted}");
        Ok(())
    }

    fn save(&mut self, review: &SharedReview) -> RepoResult<SharedReview> {
        if borrow_review(review)?.is_persisted() {
            return Ok(Rc::clone(review));
        }

        let id = {
            let mut current = borrow_review_mut(review)?;
            self.conn.execute(
                "INSERT INTO reviews (year, summary, employee_id) VALUES (?1, ?2, ?3);",
                params![current.year(), current.summary(), current.employee_id()],
            )?;
            let id = self.conn.last_insert_rowid();
            current.set_id(Some(id));
            id
        };

        self.all.insert(id, Rc::clone(review));
        debug!("event=review_save module=repo status=ok id={id}");
        Ok(Rc::clone(review))
    }

    fn create(
        &mut self,
        year: i64,
        summary: &str,
        employee_id: EmployeeId,
    ) -> RepoResult<SharedReview> {
        let review = self.new_review(year, summary, employee_id)?;
        self.save(&review)
    }

    fn instance_from_row(&mut self, row: ReviewRow) -> RepoResult<SharedReview> {
        let id = row.id;
        if let Some(cached) = self.all.get(&id) {
            let mut current = cached
                .try_borrow_mut()
                .map_err(|_| RepoError::InstanceBorrowed(Some(id)))?;
            *current = Review::from_trusted_row(row);
            drop(current);
            return Ok(Rc::clone(cached));
        }

        let review = Review::with_id(
            Some(id),
            row.year,
            row.summary,
            row.employee_id,
            self.conn,
        )?;
        let review = Rc::new(RefCell::new(review));
        self.all.insert(id, Rc::clone(&review));
        Ok(review)
    }

    fn find_by_id(&mut self, id: ReviewId) -> RepoResult<Option<SharedReview>> {
        let row = {
            let mut stmt = self
                .conn
                .prepare(&format!("{REVIEW_SELECT_SQL} WHERE id = ?1;"))?;
            let mut rows = stmt.query([id])?;
            match rows.next()? {
                Some(row) => Some(parse_review_row(row)?),
                None => None,
            }
        };

        row.map(|row| self.instance_from_row(row)).transpose()
    }

    fn update(&mut self, review: &SharedReview) -> RepoResult<()> {
        let id = {
            let current = borrow_review(review)?;
            let id = current.id().ok_or(RepoError::NotPersisted)?;
            self.conn.execute(
                "UPDATE reviews
                 SET year = ?1, summary = ?2, employee_id = ?3
                 WHERE id = ?4;",
                params![current.year(), current.summary(), current.employee_id(), id],
            )?;
            id
        };

        self.all.insert(id, Rc::clone(review));
        debug!("event=review_update module=repo status=ok id={id}");
        Ok(())
    }

    fn delete(&mut self, review: &SharedReview) -> RepoResult<()> {
        let id = borrow_review(review)?.id();
        let Some(id) = id else {
            return Ok(());
        };

        let mut current = borrow_review_mut(review)?;
        self.conn.execute("DELETE FROM reviews WHERE id = ?1;", [id])?;
        self.all.remove(&id);
        current.set_id(None);
        debug!("event=review_delete module=repo status=ok id={id}");
        Ok(())
    }

    fn get_all(&mut self) -> RepoResult<Vec<SharedReview>> {
        let rows = {
            let mut stmt = self.conn.prepare(&format!("{REVIEW_SELECT_SQL};"))?;
            let mut rows = stmt.query([])?;
            let mut parsed = Vec::new();
            while let Some(row) = rows.next()? {
                parsed.push(parse_review_row(row)?);
            }
            parsed
        };

        rows.into_iter()
            .map(|row| self.instance_from_row(row))
            .collect()
    }
}

fn borrow_review(review: &SharedReview) -> RepoResult<Ref<'_, Review>> {
    review
        .try_borrow()
        .map_err(|_| RepoError::InstanceBorrowed(None))
}

fn borrow_review_mut(review: &SharedReview) -> RepoResult<RefMut<'_, Review>> {
    review
        .try_borrow_mut()
        .map_err(|_| RepoError::InstanceBorrowed(None))
}

/// NULL in any column is a storage error; the schema does not forbid it.
fn parse_review_row(row: &Row<'_>) -> RepoResult<ReviewRow> {
    Ok(ReviewRow {
        id: row.get("id")?,
        year: row.get("year")?,
        summary: row.get("summary")?,
        employee_id: row.get("employee_id")?,
    })
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
