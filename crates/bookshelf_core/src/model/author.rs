//! Author domain model.
//!
//! # Invariants
//! - `id` is stable and never reused.
//! - `first_name` and `last_name` are non-blank.

use super::validation::{require_text, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable author identity.
pub type AuthorId = Uuid;

/// Persisted author record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: AuthorId,
    pub first_name: String,
    pub last_name: String,
    pub bio: Option<String>,
    pub birth_date: Option<DateTime<Utc>>,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds. Refreshed by storage on every update.
    pub updated_at: i64,
}

/// Create-author input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAuthor {
    pub first_name: String,
    pub last_name: String,
    pub bio: Option<String>,
    pub birth_date: Option<DateTime<Utc>>,
}

/// Partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub birth_date: Option<DateTime<Utc>>,
}

impl AuthorPatch {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.bio.is_none()
            && self.birth_date.is_none()
    }
}

impl Author {
    /// Builds a new author with a generated id and current timestamps.
    pub fn new(input: NewAuthor) -> Self {
        let now = Utc::now().timestamp_millis();
        Self {
            id: Uuid::new_v4(),
            first_name: input.first_name,
            last_name: input.last_name,
            bio: input.bio,
            birth_date: input.birth_date,
            created_at: now,
            updated_at: now,
        }
    }

    /// Builds a new author with a caller-provided id.
    ///
    /// Used by import paths and tests that need deterministic ids.
    pub fn with_id(id: AuthorId, input: NewAuthor) -> Result<Self, ValidationError> {
        if id.is_nil() {
            return Err(ValidationError::NilId);
        }
        let mut author = Self::new(input);
        author.id = id;
        Ok(author)
    }

    /// Checks field-level invariants before persistence.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_nil() {
            return Err(ValidationError::NilId);
        }
        require_text("firstName", &self.first_name)?;
        require_text("lastName", &self.last_name)?;
        Ok(())
    }

    /// Applies the set fields of `patch` in place.
    pub fn apply(&mut self, patch: AuthorPatch) {
        if let Some(first_name) = patch.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            self.last_name = last_name;
        }
        if let Some(bio) = patch.bio {
            self.bio = Some(bio);
        }
        if let Some(birth_date) = patch.birth_date {
            self.birth_date = Some(birth_date);
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::{Author, AuthorPatch, NewAuthor};
    use crate::model::validation::ValidationError;
    use uuid::Uuid;

    fn jane() -> NewAuthor {
        NewAuthor {
            first_name: "Jane".to_string(),
            last_name: "Austen".to_string(),
            ..NewAuthor::default()
        }
    }

    #[test]
    fn validate_rejects_blank_last_name() {
        let mut author = Author::new(jane());
        author.last_name = "  ".to_string();
        assert_eq!(
            author.validate(),
            Err(ValidationError::BlankField("lastName"))
        );
    }

    #[test]
    fn with_id_rejects_nil_uuid() {
        assert_eq!(
            Author::with_id(Uuid::nil(), jane()),
            Err(ValidationError::NilId)
        );
    }

    #[test]
    fn apply_only_touches_set_fields() {
        let mut author = Author::new(jane());
        author.apply(AuthorPatch {
            bio: Some("Novelist".to_string()),
            ..AuthorPatch::default()
        });
        assert_eq!(author.first_name, "Jane");
        assert_eq!(author.bio.as_deref(), Some("Novelist"));
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let author = Author::new(jane());
        let json = serde_json::to_value(&author).unwrap();
        assert_eq!(json["firstName"], "Jane");
        assert_eq!(json["lastName"], "Austen");
        assert!(json["birthDate"].is_null());
    }
}
