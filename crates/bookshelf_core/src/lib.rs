//! Core catalog logic for Bookshelf: authors, books and the rules between
//! them. This crate is the single source of truth for business invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::CatalogConfig;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::author::{Author, AuthorId, AuthorPatch, NewAuthor};
pub use model::book::{Book, BookDetail, BookId, BookPatch, Genre, NewBook};
pub use model::isbn::{generate_isbn, validate_isbn, IsbnGenerator, RandomIsbnGenerator};
pub use model::page::{Page, PageRequest};
pub use model::validation::{parse_date, parse_day, ValidationError};
pub use repo::author_repo::{AuthorFilter, AuthorRepository, SqliteAuthorRepository};
pub use repo::book_repo::{BookFilter, BookRepository, SqliteBookRepository};
pub use repo::{RepoError, RepoResult};
pub use service::author_service::{AuthorService, AuthorServiceError};
pub use service::book_service::{BookService, BookServiceError};
pub use service::ErrorClass;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
