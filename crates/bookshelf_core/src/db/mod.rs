//! Catalog storage: connection bootstrap, SQL functions and schema upgrades.
//!
//! # Responsibility
//! - Hand out connections that already satisfy what the repositories assume
//!   (foreign keys on, catalog functions registered, schema current).
//! - Refuse files that a newer binary wrote or that hold books pointing at
//!   missing authors.
//!
//! # Invariants
//! - `PRAGMA user_version` equals the last applied catalog migration.
//! - A failed upgrade leaves the file at its previous version.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod functions;
pub mod migrations;
mod open;

pub(crate) use functions::CONTAINS_FN;
pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Catalog storage failure.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file was written by a newer binary.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// One upgrade step failed; the transaction was rolled back.
    MigrationFailed {
        version: u32,
        name: &'static str,
        source: rusqlite::Error,
    },
    /// Upgraded file still holds books whose author row is gone.
    DanglingAuthorReferences { book_count: u64 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "catalog schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::MigrationFailed {
                version,
                name,
                source,
            } => write!(f, "catalog migration {version:04}_{name} failed: {source}"),
            Self::DanglingAuthorReferences { book_count } => write!(
                f,
                "catalog holds {book_count} book(s) referencing missing authors"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::MigrationFailed { source: err, .. } => Some(err),
            Self::UnsupportedSchemaVersion { .. } | Self::DanglingAuthorReferences { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
