//! Catalog domain model.
//!
//! # Responsibility
//! - Define author/book records, their create/patch inputs and read models.
//! - Own field-level validation and ISBN generation.
//!
//! # Invariants
//! - Every record is identified by a stable, non-nil UUID.
//! - A book's `isbn` satisfies the ISBN-10/ISBN-13 checksum rule.

pub mod author;
pub mod book;
pub mod isbn;
pub mod page;
pub mod validation;
