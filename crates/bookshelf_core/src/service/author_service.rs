//! Author use-case service.
//!
//! # Responsibility
//! - Provide create/get/list/update/delete for authors.
//! - Refuse to delete an author while books reference it.
//!
//! # Invariants
//! - `delete_author` rejects whenever a dependent book is visible at check
//!   time, and the repository re-checks inside the delete transaction.
//! - Returned records are read back from storage after writes.

use super::ErrorClass;
use crate::model::author::{Author, AuthorId, AuthorPatch, NewAuthor};
use crate::model::page::{Page, PageRequest};
use crate::model::validation::ValidationError;
use crate::repo::author_repo::{AuthorFilter, AuthorListQuery, AuthorRepository};
use crate::repo::book_repo::BookRepository;
use crate::repo::RepoError;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for author use-cases.
#[derive(Debug)]
pub enum AuthorServiceError {
    NotFound(AuthorId),
    /// Delete refused; `book_count` books still reference the author.
    BlockedByDependency {
        author_id: AuthorId,
        book_count: u64,
    },
    Validation(ValidationError),
    Repo(RepoError),
    /// Write succeeded but read-back did not find the row.
    InconsistentState(&'static str),
}

impl AuthorServiceError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::NotFound(_) => ErrorClass::NotFound,
            Self::BlockedByDependency { .. } | Self::Validation(_) => ErrorClass::BadRequest,
            Self::Repo(_) | Self::InconsistentState(_) => ErrorClass::Internal,
        }
    }
}

impl Display for AuthorServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "Author with ID {id} not found"),
            Self::BlockedByDependency {
                author_id,
                book_count,
            } => write!(
                f,
                "Cannot delete author with ID {author_id} because they have {book_count} associated books. Delete the books first or reassign them to another author."
            ),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent author state: {details}"),
        }
    }
}

impl Error for AuthorServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for AuthorServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for AuthorServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::AuthorNotFound(id) => Self::NotFound(id),
            RepoError::AuthorHasBooks {
                author_id,
                book_count,
            } => Self::BlockedByDependency {
                author_id,
                book_count,
            },
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

pub type AuthorServiceResult<T> = Result<T, AuthorServiceError>;

/// Author service over author and book repositories.
///
/// The book repository is consulted only by the delete guard.
pub struct AuthorService<A: AuthorRepository, B: BookRepository> {
    authors: A,
    books: B,
}

impl<A: AuthorRepository, B: BookRepository> AuthorService<A, B> {
    pub fn new(authors: A, books: B) -> Self {
        Self { authors, books }
    }

    pub fn create_author(&self, input: NewAuthor) -> AuthorServiceResult<Author> {
        let author = Author::new(input);
        let id = self.authors.create_author(&author)?;
        info!("event=author_create module=service status=ok author_id={id}");
        self.authors
            .get_author(id)?
            .ok_or(AuthorServiceError::InconsistentState(
                "created author not found in read-back",
            ))
    }

    /// Resolves an author by id or fails with `NotFound`.
    pub fn get_author(&self, id: AuthorId) -> AuthorServiceResult<Author> {
        self.authors
            .get_author(id)?
            .ok_or(AuthorServiceError::NotFound(id))
    }

    pub fn list_authors(
        &self,
        filter: AuthorFilter,
        page: PageRequest,
    ) -> AuthorServiceResult<Page<Author>> {
        let window = page.resolve()?;
        let total = self.authors.count_authors(&filter)?;
        let query = AuthorListQuery {
            filter,
            limit: Some(window.limit),
            offset: window.offset(),
        };
        let data = self.authors.list_authors(&query)?;
        Ok(Page::new(data, total, window))
    }

    /// Applies a partial update and returns the stored result.
    pub fn update_author(&self, id: AuthorId, patch: AuthorPatch) -> AuthorServiceResult<Author> {
        let mut author = self.get_author(id)?;
        if patch.is_empty() {
            return Ok(author);
        }
        author.apply(patch);
        self.authors.update_author(&author)?;
        info!("event=author_update module=service status=ok author_id={id}");
        self.authors
            .get_author(id)?
            .ok_or(AuthorServiceError::InconsistentState(
                "updated author not found in read-back",
            ))
    }

    /// Deletes an author with no dependent books.
    ///
    /// # Errors
    /// - `NotFound` when the author does not exist.
    /// - `BlockedByDependency` when at least one book references it.
    pub fn delete_author(&self, id: AuthorId) -> AuthorServiceResult<()> {
        self.get_author(id)?;
        self.ensure_no_dependent_books(id)?;
        self.authors.delete_author(id).inspect_err(|err| {
            if let RepoError::AuthorHasBooks { book_count, .. } = err {
                warn!(
                    "event=author_delete module=service status=blocked stage=commit author_id={id} book_count={book_count}"
                );
            }
        })?;
        info!("event=author_delete module=service status=ok author_id={id}");
        Ok(())
    }

    fn ensure_no_dependent_books(&self, id: AuthorId) -> AuthorServiceResult<()> {
        let book_count = self.books.count_books_by_author(id)?;
        if book_count > 0 {
            warn!(
                "event=author_delete module=service status=blocked stage=check author_id={id} book_count={book_count}"
            );
            return Err(AuthorServiceError::BlockedByDependency {
                author_id: id,
                book_count,
            });
        }
        Ok(())
    }
}
