use bookshelf_core::db::open_db_in_memory;
use bookshelf_core::model::isbn::isbn13_check_digit;
use bookshelf_core::{
    parse_date, Author, AuthorService, BookFilter, BookPatch, BookService, BookServiceError,
    ErrorClass, Genre, IsbnGenerator, NewAuthor, NewBook, PageRequest, SqliteAuthorRepository,
    SqliteBookRepository, ValidationError,
};
use chrono::NaiveDate;
use regex::Regex;
use rusqlite::Connection;
use uuid::Uuid;

type Books<'c> = BookService<SqliteBookRepository<'c>, SqliteAuthorRepository<'c>>;

fn book_service(conn: &Connection) -> Books<'_> {
    BookService::new(
        SqliteBookRepository::try_new(conn).unwrap(),
        SqliteAuthorRepository::try_new(conn).unwrap(),
    )
}

fn seed_author(conn: &Connection, first_name: &str, last_name: &str) -> Author {
    let authors = AuthorService::new(
        SqliteAuthorRepository::try_new(conn).unwrap(),
        SqliteBookRepository::try_new(conn).unwrap(),
    );
    authors
        .create_author(NewAuthor {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            ..NewAuthor::default()
        })
        .unwrap()
}

fn book_rows(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM books;", [], |row| row.get(0))
        .unwrap()
}

struct FixedIsbn(&'static str);

impl IsbnGenerator for FixedIsbn {
    fn generate(&self) -> String {
        self.0.to_string()
    }
}

#[test]
fn create_without_isbn_generates_valid_identifier() {
    let conn = open_db_in_memory().unwrap();
    let author = seed_author(&conn, "Ursula", "Le Guin");
    let service = book_service(&conn);

    let created = service
        .create_book(NewBook::new("The Dispossessed", author.id))
        .unwrap();

    let shape = Regex::new(r"^978-\d-\d{4}-\d{4}-\d$").unwrap();
    assert!(shape.is_match(&created.isbn), "bad isbn {}", created.isbn);

    let digits: Vec<u8> = created
        .isbn
        .bytes()
        .filter(u8::is_ascii_digit)
        .map(|digit| digit - b'0')
        .collect();
    assert_eq!(digits.len(), 13);
    let payload: [u8; 12] = digits[..12].try_into().unwrap();
    assert_eq!(isbn13_check_digit(&payload), digits[12]);

    assert_eq!(created.author, author);
    assert_eq!(service.get_book(created.id).unwrap(), created);
}

#[test]
fn blank_isbn_is_replaced_by_generator() {
    let conn = open_db_in_memory().unwrap();
    let author = seed_author(&conn, "Ursula", "Le Guin");
    let service = BookService::with_isbn_generator(
        SqliteBookRepository::try_new(&conn).unwrap(),
        SqliteAuthorRepository::try_new(&conn).unwrap(),
        FixedIsbn("978-0-306-40615-7"),
    );

    let created = service
        .create_book(NewBook {
            isbn: Some("   ".to_string()),
            ..NewBook::new("A Wizard of Earthsea", author.id)
        })
        .unwrap();
    assert_eq!(created.isbn, "978-0-306-40615-7");
}

#[test]
fn explicit_isbn_is_stored_verbatim() {
    let conn = open_db_in_memory().unwrap();
    let author = seed_author(&conn, "Ursula", "Le Guin");
    let service = book_service(&conn);

    let created = service
        .create_book(NewBook {
            isbn: Some("978-3-16-148410-0".to_string()),
            ..NewBook::new("The Lathe of Heaven", author.id)
        })
        .unwrap();
    assert_eq!(created.isbn, "978-3-16-148410-0");
    assert_eq!(service.get_book(created.id).unwrap().isbn, "978-3-16-148410-0");
}

#[test]
fn create_with_invalid_isbn_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let author = seed_author(&conn, "Ursula", "Le Guin");
    let service = book_service(&conn);

    let err = service
        .create_book(NewBook {
            isbn: Some("978-3-16-148410-1".to_string()),
            ..NewBook::new("Broken", author.id)
        })
        .unwrap_err();
    assert!(matches!(
        err,
        BookServiceError::Validation(ValidationError::InvalidIsbn(_))
    ));
    assert_eq!(book_rows(&conn), 0);
}

#[test]
fn create_with_missing_author_persists_nothing() {
    let conn = open_db_in_memory().unwrap();
    let service = book_service(&conn);

    let missing = Uuid::new_v4();
    let err = service
        .create_book(NewBook::new("Orphan", missing))
        .unwrap_err();
    assert!(matches!(err, BookServiceError::InvalidReference(id) if id == missing));
    assert_eq!(err.class(), ErrorClass::BadRequest);
    assert_eq!(err.to_string(), format!("Author with ID {missing} not found"));
    assert_eq!(book_rows(&conn), 0);
}

#[test]
fn duplicate_isbn_is_a_conflict() {
    let conn = open_db_in_memory().unwrap();
    let author = seed_author(&conn, "Ursula", "Le Guin");
    let service = book_service(&conn);

    let input = NewBook {
        isbn: Some("978-0-306-40615-7".to_string()),
        ..NewBook::new("First", author.id)
    };
    service.create_book(input.clone()).unwrap();

    let err = service
        .create_book(NewBook {
            title: "Second".to_string(),
            ..input
        })
        .unwrap_err();
    assert!(matches!(err, BookServiceError::DuplicateIsbn(ref isbn) if isbn == "978-0-306-40615-7"));
    assert_eq!(err.class(), ErrorClass::Conflict);
    assert_eq!(book_rows(&conn), 1);
}

#[test]
fn get_missing_book_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = book_service(&conn);

    let missing = Uuid::new_v4();
    let err = service.get_book(missing).unwrap_err();
    assert!(matches!(err, BookServiceError::NotFound(id) if id == missing));
    assert_eq!(err.to_string(), format!("Book with ID {missing} not found"));
}

#[test]
fn list_populates_authors_and_filters_by_criteria() {
    let conn = open_db_in_memory().unwrap();
    let le_guin = seed_author(&conn, "Ursula", "Le Guin");
    let tolkien = seed_author(&conn, "John", "Tolkien");
    let service = book_service(&conn);

    service
        .create_book(NewBook {
            genre: Some(Genre::ScienceFiction),
            ..NewBook::new("The Left Hand of Darkness", le_guin.id)
        })
        .unwrap();
    service
        .create_book(NewBook {
            genre: Some(Genre::Fantasy),
            ..NewBook::new("The Hobbit", tolkien.id)
        })
        .unwrap();
    service
        .create_book(NewBook {
            genre: Some(Genre::Fantasy),
            ..NewBook::new("The Silmarillion", tolkien.id)
        })
        .unwrap();

    let all = service
        .list_books(BookFilter::default(), PageRequest::default())
        .unwrap();
    assert_eq!(all.total, 3);
    assert_eq!(all.data[0].author, le_guin);
    assert_eq!(all.data[1].author, tolkien);

    let by_title = service
        .list_books(
            BookFilter {
                title: Some("HOBBIT".to_string()),
                ..BookFilter::default()
            },
            PageRequest::default(),
        )
        .unwrap();
    assert_eq!(by_title.total, 1);
    assert_eq!(by_title.data[0].title, "The Hobbit");

    let by_genre = service
        .list_books(
            BookFilter {
                genre: Some("fiction".to_string()),
                ..BookFilter::default()
            },
            PageRequest::default(),
        )
        .unwrap();
    assert_eq!(by_genre.total, 1);
    assert_eq!(by_genre.data[0].genre, Some(Genre::ScienceFiction));

    let by_author = service
        .list_books(
            BookFilter {
                author_id: Some(tolkien.id),
                ..BookFilter::default()
            },
            PageRequest::new(1, 1),
        )
        .unwrap();
    assert_eq!(by_author.total, 2);
    assert_eq!(by_author.data.len(), 1);
    assert_eq!(by_author.data[0].title, "The Hobbit");
}

#[test]
fn published_date_filter_matches_whole_utc_day() {
    let conn = open_db_in_memory().unwrap();
    let author = seed_author(&conn, "Ursula", "Le Guin");
    let service = book_service(&conn);

    let cases = [
        ("Start of day", "2020-06-15T00:00:00Z"),
        ("End of day", "2020-06-15T23:59:59.999Z"),
        ("Next day", "2020-06-16T00:00:00Z"),
        ("Previous day", "2020-06-14T23:59:59Z"),
    ];
    for (title, date) in cases {
        service
            .create_book(NewBook {
                published_date: Some(parse_date("publishedDate", date).unwrap()),
                ..NewBook::new(title, author.id)
            })
            .unwrap();
    }
    service
        .create_book(NewBook::new("Undated", author.id))
        .unwrap();

    let page = service
        .list_books(
            BookFilter {
                published_on: NaiveDate::from_ymd_opt(2020, 6, 15),
                ..BookFilter::default()
            },
            PageRequest::default(),
        )
        .unwrap();
    let titles: Vec<_> = page.data.iter().map(|book| book.title.as_str()).collect();
    assert_eq!(titles, vec!["Start of day", "End of day"]);
    assert_eq!(page.total, 2);
}

#[test]
fn update_moves_book_to_existing_author() {
    let conn = open_db_in_memory().unwrap();
    let first = seed_author(&conn, "Ursula", "Le Guin");
    let second = seed_author(&conn, "Octavia", "Butler");
    let service = book_service(&conn);
    let created = service
        .create_book(NewBook::new("Kindred", first.id))
        .unwrap();

    let updated = service
        .update_book(
            created.id,
            BookPatch {
                author_id: Some(second.id),
                genre: Some(Genre::ScienceFiction),
                ..BookPatch::default()
            },
        )
        .unwrap();
    assert_eq!(updated.author, second);
    assert_eq!(updated.title, "Kindred");
    assert_eq!(updated.isbn, created.isbn);
    assert_eq!(updated.genre, Some(Genre::ScienceFiction));
}

#[test]
fn update_with_missing_author_leaves_book_unchanged() {
    let conn = open_db_in_memory().unwrap();
    let author = seed_author(&conn, "Octavia", "Butler");
    let service = book_service(&conn);
    let created = service
        .create_book(NewBook::new("Kindred", author.id))
        .unwrap();

    let missing = Uuid::new_v4();
    let err = service
        .update_book(
            created.id,
            BookPatch {
                author_id: Some(missing),
                title: Some("Renamed".to_string()),
                ..BookPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, BookServiceError::InvalidReference(id) if id == missing));

    let stored = service.get_book(created.id).unwrap();
    assert_eq!(stored.title, "Kindred");
    assert_eq!(stored.author, author);
}

#[test]
fn update_missing_book_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = book_service(&conn);

    let missing = Uuid::new_v4();
    let err = service
        .update_book(
            missing,
            BookPatch {
                title: Some("Nothing".to_string()),
                ..BookPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, BookServiceError::NotFound(id) if id == missing));
}

#[test]
fn delete_removes_book_and_second_delete_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let author = seed_author(&conn, "Octavia", "Butler");
    let service = book_service(&conn);
    let created = service
        .create_book(NewBook::new("Parable of the Sower", author.id))
        .unwrap();

    service.delete_book(created.id).unwrap();
    assert!(matches!(
        service.get_book(created.id).unwrap_err(),
        BookServiceError::NotFound(_)
    ));

    let err = service.delete_book(created.id).unwrap_err();
    assert!(matches!(err, BookServiceError::NotFound(id) if id == created.id));
    assert_eq!(err.class(), ErrorClass::NotFound);
}
