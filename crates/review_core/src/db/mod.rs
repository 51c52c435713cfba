//! SQLite connection bootstrap for review storage.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections for the review store.
//! - Wrap driver failures in one storage error type.
//!
//! # Invariants
//! - Every connection handed out has foreign key enforcement enabled.
//! - Connections stay in autocommit mode; each statement commits on its own.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Storage failure raised by the underlying SQLite connection.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
