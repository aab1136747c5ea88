//! Catalog schema upgrades.
//!
//! # Invariants
//! - Steps are numbered `1..=latest_version()` without gaps.
//! - All pending steps run in one transaction together with the
//!   author-reference check; either everything commits or nothing does.
//! - `0001` creates `authors` and `books` (`books.isbn` UNIQUE,
//!   `books.author_id` references `authors.id`).

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "init",
        sql: include_str!("0001_init.sql"),
    },
    Migration {
        version: 2,
        name: "book_indexes",
        sql: include_str!("0002_book_indexes.sql"),
    },
];

/// Where a file's stored version sits relative to this binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SchemaState {
    Current,
    Behind { from: u32 },
    Ahead { found: u32 },
}

fn schema_state(found: u32) -> SchemaState {
    let latest = latest_version();
    match found.cmp(&latest) {
        std::cmp::Ordering::Equal => SchemaState::Current,
        std::cmp::Ordering::Less => SchemaState::Behind { from: found },
        std::cmp::Ordering::Greater => SchemaState::Ahead { found },
    }
}

/// Highest catalog schema version this binary can write.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Brings the catalog schema up to `latest_version()`.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the file is ahead of this binary.
/// - `MigrationFailed` naming the step that broke.
/// - `DanglingAuthorReferences` when upgraded data violates the
///   book-to-author reference.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let found = conn.pragma_query_value(None, "user_version", |row| row.get::<_, u32>(0))?;
    let from = match schema_state(found) {
        SchemaState::Current => {
            debug!("event=db_migrate module=db status=noop version={found}");
            return Ok(());
        }
        SchemaState::Ahead { found } => {
            return Err(DbError::UnsupportedSchemaVersion {
                db_version: found,
                latest_supported: latest_version(),
            });
        }
        SchemaState::Behind { from } => from,
    };

    let tx = conn.transaction()?;
    for step in MIGRATIONS.iter().filter(|step| step.version > from) {
        tx.execute_batch(step.sql)
            .and_then(|()| tx.pragma_update(None, "user_version", step.version))
            .map_err(|source| DbError::MigrationFailed {
                version: step.version,
                name: step.name,
                source,
            })?;
        debug!(
            "event=db_migrate module=db status=step version={} name={}",
            step.version, step.name
        );
    }
    ensure_book_authors_resolve(&tx)?;
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={from} to_version={}",
        latest_version()
    );
    Ok(())
}

/// Files written before the foreign key existed may hold orphaned books.
fn ensure_book_authors_resolve(conn: &Connection) -> DbResult<()> {
    let dangling: i64 = conn.query_row(
        "SELECT COUNT(*)
         FROM books
         WHERE author_id NOT IN (SELECT id FROM authors);",
        [],
        |row| row.get(0),
    )?;
    if dangling > 0 {
        return Err(DbError::DanglingAuthorReferences {
            book_count: dangling as u64,
        });
    }
    Ok(())
}
