//! Book domain model and the closed genre set.
//!
//! # Invariants
//! - `isbn` passes [`validate_isbn`] and is stored verbatim.
//! - `author_id` references exactly one author.

use super::author::{Author, AuthorId};
use super::isbn::validate_isbn;
use super::validation::{require_text, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Stable book identity.
pub type BookId = Uuid;

/// Fixed book genre enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Genre {
    Fantasy,
    #[serde(rename = "Science Fiction")]
    ScienceFiction,
    Thriller,
    Romance,
    Mystery,
    Horror,
    Biography,
    History,
    Children,
    #[serde(rename = "Young Adult")]
    YoungAdult,
    Comic,
    Other,
}

impl Genre {
    pub const ALL: [Genre; 12] = [
        Genre::Fantasy,
        Genre::ScienceFiction,
        Genre::Thriller,
        Genre::Romance,
        Genre::Mystery,
        Genre::Horror,
        Genre::Biography,
        Genre::History,
        Genre::Children,
        Genre::YoungAdult,
        Genre::Comic,
        Genre::Other,
    ];

    /// Human-readable label; also the persisted form.
    pub fn label(self) -> &'static str {
        match self {
            Genre::Fantasy => "Fantasy",
            Genre::ScienceFiction => "Science Fiction",
            Genre::Thriller => "Thriller",
            Genre::Romance => "Romance",
            Genre::Mystery => "Mystery",
            Genre::Horror => "Horror",
            Genre::Biography => "Biography",
            Genre::History => "History",
            Genre::Children => "Children",
            Genre::YoungAdult => "Young Adult",
            Genre::Comic => "Comic",
            Genre::Other => "Other",
        }
    }
}

impl Display for Genre {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Genre {
    type Err = ValidationError;

    /// Accepts labels and snake/kebab-case names, case-insensitively.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let key = fold_genre_key(value);
        Genre::ALL
            .into_iter()
            .find(|genre| fold_genre_key(genre.label()) == key)
            .ok_or_else(|| ValidationError::UnknownGenre(value.to_string()))
    }
}

fn fold_genre_key(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Persisted book record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub isbn: String,
    pub published_date: Option<DateTime<Utc>>,
    pub genre: Option<Genre>,
    #[serde(rename = "author")]
    pub author_id: AuthorId,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create-book input. A missing `isbn` is generated by the service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    pub title: String,
    pub isbn: Option<String>,
    pub published_date: Option<DateTime<Utc>>,
    pub genre: Option<Genre>,
    #[serde(rename = "author")]
    pub author_id: AuthorId,
}

impl NewBook {
    pub fn new(title: impl Into<String>, author_id: AuthorId) -> Self {
        Self {
            title: title.into(),
            isbn: None,
            published_date: None,
            genre: None,
            author_id,
        }
    }
}

/// Partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPatch {
    pub title: Option<String>,
    pub isbn: Option<String>,
    pub published_date: Option<DateTime<Utc>>,
    pub genre: Option<Genre>,
    #[serde(rename = "author")]
    pub author_id: Option<AuthorId>,
}

impl Book {
    /// Builds a book from input whose `isbn` has already been resolved.
    pub fn new(input: NewBook, isbn: String) -> Self {
        let now = Utc::now().timestamp_millis();
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            isbn,
            published_date: input.published_date,
            genre: input.genre,
            author_id: input.author_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_nil() || self.author_id.is_nil() {
            return Err(ValidationError::NilId);
        }
        require_text("title", &self.title)?;
        validate_isbn(&self.isbn)
    }

    pub fn apply(&mut self, patch: BookPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(isbn) = patch.isbn {
            self.isbn = isbn;
        }
        if let Some(published_date) = patch.published_date {
            self.published_date = Some(published_date);
        }
        if let Some(genre) = patch.genre {
            self.genre = Some(genre);
        }
        if let Some(author_id) = patch.author_id {
            self.author_id = author_id;
        }
    }
}

/// Book read model with its author resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDetail {
    pub id: BookId,
    pub title: String,
    pub isbn: String,
    pub published_date: Option<DateTime<Utc>>,
    pub genre: Option<Genre>,
    pub author: Author,
    pub created_at: i64,
    pub updated_at: i64,
}

impl BookDetail {
    pub fn new(book: Book, author: Author) -> Self {
        Self {
            id: book.id,
            title: book.title,
            isbn: book.isbn,
            published_date: book.published_date,
            genre: book.genre,
            author,
            created_at: book.created_at,
            updated_at: book.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Book, Genre, NewBook};
    use crate::model::validation::ValidationError;
    use uuid::Uuid;

    #[test]
    fn genre_parses_labels_and_snake_case() {
        assert_eq!("Science Fiction".parse::<Genre>(), Ok(Genre::ScienceFiction));
        assert_eq!("young_adult".parse::<Genre>(), Ok(Genre::YoungAdult));
        assert_eq!("HORROR".parse::<Genre>(), Ok(Genre::Horror));
    }

    #[test]
    fn genre_rejects_unknown_values() {
        let err = "Poetry".parse::<Genre>().unwrap_err();
        assert_eq!(err, ValidationError::UnknownGenre("Poetry".to_string()));
        assert!(err.to_string().contains("Young Adult"));
    }

    #[test]
    fn genre_serializes_as_label() {
        let json = serde_json::to_value(Genre::ScienceFiction).unwrap();
        assert_eq!(json, "Science Fiction");
    }

    #[test]
    fn validate_rejects_bad_isbn_and_blank_title() {
        let author_id = Uuid::new_v4();
        let mut book = Book::new(NewBook::new("Dune", author_id), "not-an-isbn".to_string());
        assert!(matches!(
            book.validate(),
            Err(ValidationError::InvalidIsbn(_))
        ));

        book.isbn = "978-3-16-148410-0".to_string();
        book.title = " ".to_string();
        assert_eq!(book.validate(), Err(ValidationError::BlankField("title")));
    }
}
