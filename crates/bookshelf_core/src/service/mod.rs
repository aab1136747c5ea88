//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into author/book use-cases.
//! - Own the referential-integrity guard and ISBN fill-in.
//! - Classify failures so outer surfaces can map them without matching on
//!   every variant.

pub mod author_service;
pub mod book_service;

/// Coarse failure class for boundary mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Caller can correct the request.
    BadRequest,
    NotFound,
    /// Request collides with existing state (duplicate ISBN).
    Conflict,
    Internal,
}

impl ErrorClass {
    /// HTTP-style status code for the class.
    pub fn status_code(self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::Internal => 500,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::BadRequest => "bad_request",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Internal => "internal",
        }
    }
}
