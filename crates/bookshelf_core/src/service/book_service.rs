//! Book use-case service.
//!
//! # Responsibility
//! - Provide create/get/list/update/delete for books.
//! - Resolve author references before writes and populate them on reads.
//! - Fill in a generated ISBN when the caller omits one.
//!
//! # Invariants
//! - A book is never persisted with an author id that does not resolve.
//! - A caller-supplied ISBN is stored verbatim; only a missing or blank one
//!   is generated.

use super::ErrorClass;
use crate::model::author::{Author, AuthorId};
use crate::model::book::{Book, BookDetail, BookId, BookPatch, NewBook};
use crate::model::isbn::{IsbnGenerator, RandomIsbnGenerator};
use crate::model::page::{Page, PageRequest};
use crate::model::validation::ValidationError;
use crate::repo::author_repo::AuthorRepository;
use crate::repo::book_repo::{BookFilter, BookListQuery, BookRepository};
use crate::repo::RepoError;
use log::{debug, info};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for book use-cases.
#[derive(Debug)]
pub enum BookServiceError {
    NotFound(BookId),
    /// Referenced author does not exist.
    InvalidReference(AuthorId),
    /// Another book already uses this ISBN.
    DuplicateIsbn(String),
    Validation(ValidationError),
    Repo(RepoError),
    /// Stored data contradicts a just-checked invariant.
    InconsistentState(&'static str),
}

impl BookServiceError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::NotFound(_) => ErrorClass::NotFound,
            Self::InvalidReference(_) | Self::Validation(_) => ErrorClass::BadRequest,
            Self::DuplicateIsbn(_) => ErrorClass::Conflict,
            Self::Repo(_) | Self::InconsistentState(_) => ErrorClass::Internal,
        }
    }
}

impl Display for BookServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "Book with ID {id} not found"),
            Self::InvalidReference(id) => write!(f, "Author with ID {id} not found"),
            Self::DuplicateIsbn(isbn) => write!(f, "Duplicate key error: isbn `{isbn}`"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent book state: {details}"),
        }
    }
}

impl Error for BookServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for BookServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for BookServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::BookNotFound(id) => Self::NotFound(id),
            RepoError::AuthorNotFound(id) => Self::InvalidReference(id),
            RepoError::DuplicateIsbn(isbn) => Self::DuplicateIsbn(isbn),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

pub type BookServiceResult<T> = Result<T, BookServiceError>;

/// Book service over book and author repositories.
pub struct BookService<B: BookRepository, A: AuthorRepository, G: IsbnGenerator = RandomIsbnGenerator>
{
    books: B,
    authors: A,
    isbn_generator: G,
}

impl<B: BookRepository, A: AuthorRepository> BookService<B, A, RandomIsbnGenerator> {
    /// Creates a service that generates random ISBNs.
    pub fn new(books: B, authors: A) -> Self {
        Self::with_isbn_generator(books, authors, RandomIsbnGenerator)
    }
}

impl<B: BookRepository, A: AuthorRepository, G: IsbnGenerator> BookService<B, A, G> {
    pub fn with_isbn_generator(books: B, authors: A, isbn_generator: G) -> Self {
        Self {
            books,
            authors,
            isbn_generator,
        }
    }

    /// Creates a book after resolving its author.
    ///
    /// # Errors
    /// - `InvalidReference` when the author does not exist; nothing is stored.
    /// - `DuplicateIsbn` when the ISBN is already taken.
    pub fn create_book(&self, input: NewBook) -> BookServiceResult<BookDetail> {
        let author = self.resolve_author_reference(input.author_id)?;

        let isbn = match input.isbn.clone().filter(|value| !value.trim().is_empty()) {
            Some(isbn) => isbn,
            None => {
                let generated = self.isbn_generator.generate();
                debug!("event=isbn_generate module=service status=ok isbn={generated}");
                generated
            }
        };

        let book = Book::new(input, isbn);
        let id = self.books.create_book(&book)?;
        info!(
            "event=book_create module=service status=ok book_id={id} author_id={}",
            author.id
        );

        let stored = self
            .books
            .get_book(id)?
            .ok_or(BookServiceError::InconsistentState(
                "created book not found in read-back",
            ))?;
        Ok(BookDetail::new(stored, author))
    }

    /// Resolves a book by id or fails with `NotFound`.
    pub fn get_book(&self, id: BookId) -> BookServiceResult<BookDetail> {
        let book = self.find_book(id)?;
        let author = self.load_book_author(book.author_id)?;
        Ok(BookDetail::new(book, author))
    }

    pub fn list_books(
        &self,
        filter: BookFilter,
        page: PageRequest,
    ) -> BookServiceResult<Page<BookDetail>> {
        let window = page.resolve()?;
        let total = self.books.count_books(&filter)?;
        let query = BookListQuery {
            filter,
            limit: Some(window.limit),
            offset: window.offset(),
        };
        let books = self.books.list_books(&query)?;

        let mut authors: HashMap<AuthorId, Author> = HashMap::new();
        let mut data = Vec::with_capacity(books.len());
        for book in books {
            let author = match authors.get(&book.author_id) {
                Some(author) => author.clone(),
                None => {
                    let author = self.load_book_author(book.author_id)?;
                    authors.insert(author.id, author.clone());
                    author
                }
            };
            data.push(BookDetail::new(book, author));
        }

        Ok(Page::new(data, total, window))
    }

    /// Applies a partial update; a new author reference is resolved first.
    pub fn update_book(&self, id: BookId, patch: BookPatch) -> BookServiceResult<BookDetail> {
        if let Some(author_id) = patch.author_id {
            self.resolve_author_reference(author_id)?;
        }

        let mut book = self.find_book(id)?;
        book.apply(patch);
        self.books.update_book(&book)?;
        info!("event=book_update module=service status=ok book_id={id}");

        let stored = self
            .books
            .get_book(id)?
            .ok_or(BookServiceError::InconsistentState(
                "updated book not found in read-back",
            ))?;
        let author = self.load_book_author(stored.author_id)?;
        Ok(BookDetail::new(stored, author))
    }

    /// Deletes a book unconditionally.
    pub fn delete_book(&self, id: BookId) -> BookServiceResult<()> {
        self.books.delete_book(id)?;
        info!("event=book_delete module=service status=ok book_id={id}");
        Ok(())
    }

    fn find_book(&self, id: BookId) -> BookServiceResult<Book> {
        self.books
            .get_book(id)?
            .ok_or(BookServiceError::NotFound(id))
    }

    fn resolve_author_reference(&self, author_id: AuthorId) -> BookServiceResult<Author> {
        self.authors
            .get_author(author_id)?
            .ok_or(BookServiceError::InvalidReference(author_id))
    }

    fn load_book_author(&self, author_id: AuthorId) -> BookServiceResult<Author> {
        self.authors
            .get_author(author_id)?
            .ok_or(BookServiceError::InconsistentState(
                "book references a missing author",
            ))
    }
}
