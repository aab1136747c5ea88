//! `bookshelf` command-line entry point.
//!
//! # Responsibility
//! - Map subcommands onto the core author/book services.
//! - Print results as pretty JSON and failures as one stderr line.
//!
//! # Invariants
//! - Exit code is derived from the failure class only.

mod args;

use args::{AuthorCommand, BookCommand, Cli, Command, PagingArgs};
use bookshelf_core::db::{open_db, DbError};
use bookshelf_core::{
    generate_isbn, parse_date, parse_day, AuthorFilter, AuthorPatch, AuthorService,
    AuthorServiceError, BookFilter, BookPatch, BookService, BookServiceError, CatalogConfig,
    ErrorClass, LoggingError, NewAuthor, NewBook, PageRequest, RepoError,
    SqliteAuthorRepository, SqliteBookRepository, ValidationError,
};
use clap::Parser;
use log::error;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::process::ExitCode;

#[derive(Debug)]
enum CliError {
    Logging(LoggingError),
    Db(DbError),
    Repo(RepoError),
    Validation(ValidationError),
    Author(AuthorServiceError),
    Book(BookServiceError),
    Output(serde_json::Error),
}

impl CliError {
    fn class(&self) -> ErrorClass {
        match self {
            Self::Validation(_) => ErrorClass::BadRequest,
            Self::Author(err) => err.class(),
            Self::Book(err) => err.class(),
            Self::Logging(_) | Self::Db(_) | Self::Repo(_) | Self::Output(_) => {
                ErrorClass::Internal
            }
        }
    }

    fn exit_code(&self) -> u8 {
        match self.class() {
            ErrorClass::BadRequest => 2,
            ErrorClass::NotFound => 3,
            ErrorClass::Conflict => 4,
            ErrorClass::Internal => 1,
        }
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Logging(err) => write!(f, "logging: {err}"),
            Self::Db(err) => write!(f, "database: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Author(err) => write!(f, "{err}"),
            Self::Book(err) => write!(f, "{err}"),
            Self::Output(err) => write!(f, "output: {err}"),
        }
    }
}

impl From<LoggingError> for CliError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for CliError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<ValidationError> for CliError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<AuthorServiceError> for CliError {
    fn from(value: AuthorServiceError) -> Self {
        Self::Author(value)
    }
}

impl From<BookServiceError> for CliError {
    fn from(value: BookServiceError) -> Self {
        Self::Book(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Output(value)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(
                "event=cli_command module=cli status=error class={} status_code={} message={}",
                err.class().as_str(),
                err.class().status_code(),
                err
            );
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    if let Command::Isbn { count } = cli.command {
        for _ in 0..count {
            println!("{}", generate_isbn());
        }
        return Ok(());
    }

    let mut config = CatalogConfig::from_env();
    if let Some(db) = cli.db {
        config = config.with_db_path(db);
    }
    config.init_logging()?;

    let conn = open_db(&config.db_path)?;
    let authors = AuthorService::new(
        SqliteAuthorRepository::try_new(&conn)?,
        SqliteBookRepository::try_new(&conn)?,
    );
    let books = BookService::new(
        SqliteBookRepository::try_new(&conn)?,
        SqliteAuthorRepository::try_new(&conn)?,
    );

    match cli.command {
        Command::Author(command) => run_author(&authors, command),
        Command::Book(command) => run_book(&books, command),
        Command::Isbn { .. } => Ok(()),
    }
}

fn run_author(
    service: &AuthorService<SqliteAuthorRepository<'_>, SqliteBookRepository<'_>>,
    command: AuthorCommand,
) -> Result<(), CliError> {
    match command {
        AuthorCommand::Add {
            first_name,
            last_name,
            bio,
            birth_date,
        } => {
            let input = NewAuthor {
                first_name,
                last_name,
                bio,
                birth_date: optional_date("birthDate", birth_date)?,
            };
            print_json(&service.create_author(input)?)
        }
        AuthorCommand::Get { id } => print_json(&service.get_author(id)?),
        AuthorCommand::List {
            first_name,
            last_name,
            paging,
        } => {
            let filter = AuthorFilter {
                first_name,
                last_name,
            };
            print_json(&service.list_authors(filter, page_request(paging))?)
        }
        AuthorCommand::Update {
            id,
            first_name,
            last_name,
            bio,
            birth_date,
        } => {
            let patch = AuthorPatch {
                first_name,
                last_name,
                bio,
                birth_date: optional_date("birthDate", birth_date)?,
            };
            print_json(&service.update_author(id, patch)?)
        }
        AuthorCommand::Delete { id } => {
            service.delete_author(id)?;
            print_json(&serde_json::json!({ "deleted": id }))
        }
    }
}

fn run_book(
    service: &BookService<SqliteBookRepository<'_>, SqliteAuthorRepository<'_>>,
    command: BookCommand,
) -> Result<(), CliError> {
    match command {
        BookCommand::Add {
            title,
            author,
            isbn,
            published_date,
            genre,
        } => {
            let input = NewBook {
                isbn,
                published_date: optional_date("publishedDate", published_date)?,
                genre,
                ..NewBook::new(title, author)
            };
            print_json(&service.create_book(input)?)
        }
        BookCommand::Get { id } => print_json(&service.get_book(id)?),
        BookCommand::List {
            title,
            isbn,
            author,
            genre,
            published_on,
            paging,
        } => {
            let filter = BookFilter {
                title,
                isbn,
                author_id: author,
                genre,
                published_on: day_filter(published_on)?,
            };
            print_json(&service.list_books(filter, page_request(paging))?)
        }
        BookCommand::Update {
            id,
            title,
            author,
            isbn,
            published_date,
            genre,
        } => {
            let patch = BookPatch {
                title,
                isbn,
                published_date: optional_date("publishedDate", published_date)?,
                genre,
                author_id: author,
            };
            print_json(&service.update_book(id, patch)?)
        }
        BookCommand::Delete { id } => {
            service.delete_book(id)?;
            print_json(&serde_json::json!({ "deleted": id }))
        }
    }
}

fn optional_date(
    field: &'static str,
    value: Option<String>,
) -> Result<Option<chrono::DateTime<chrono::Utc>>, ValidationError> {
    value.map(|raw| parse_date(field, &raw)).transpose()
}

/// `--published-on` names a calendar day; no timezone conversion applies.
fn day_filter(value: Option<String>) -> Result<Option<chrono::NaiveDate>, ValidationError> {
    value.map(|raw| parse_day("publishedOn", &raw)).transpose()
}

fn page_request(paging: PagingArgs) -> PageRequest {
    PageRequest {
        page: paging.page,
        limit: paging.limit,
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
