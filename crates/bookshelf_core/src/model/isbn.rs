//! ISBN generation and structural validation.
//!
//! # Responsibility
//! - Generate fresh `978-d-dddd-dddd-c` identifiers for books created
//!   without one.
//! - Validate caller-supplied ISBN-10/ISBN-13 strings.
//!
//! # Invariants
//! - Generation is pure: no I/O and no uniqueness guarantee. Uniqueness is
//!   the `books.isbn` UNIQUE constraint.
//! - The check digit is `(10 - (sum mod 10)) mod 10` with weights 1,3,1,3...

use super::validation::ValidationError;
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

/// Fixed product-code prefix of generated identifiers.
pub const ISBN_PREFIX: &str = "978";
/// Number of random digits following the prefix.
pub const ISBN_BODY_DIGITS: usize = 9;
const ISBN13_PAYLOAD_DIGITS: usize = ISBN_PREFIX.len() + ISBN_BODY_DIGITS;

static ISBN_SHAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9](?:[0-9 \-]*[0-9X])?$").expect("valid isbn regex"));

/// Source of identifiers for books created without one.
pub trait IsbnGenerator {
    fn generate(&self) -> String;
}

/// Default generator backed by the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIsbnGenerator;

impl IsbnGenerator for RandomIsbnGenerator {
    fn generate(&self) -> String {
        generate_isbn()
    }
}

/// Generates one identifier using the thread-local RNG.
pub fn generate_isbn() -> String {
    generate_isbn_with(&mut rand::thread_rng())
}

/// Generates one identifier from the provided random source.
pub fn generate_isbn_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut payload = [0_u8; ISBN13_PAYLOAD_DIGITS];
    let (prefix, body) = payload.split_at_mut(ISBN_PREFIX.len());
    for (slot, digit) in prefix.iter_mut().zip(ISBN_PREFIX.bytes()) {
        *slot = digit - b'0';
    }
    for slot in body.iter_mut() {
        *slot = rng.gen_range(0..10);
    }
    let check = isbn13_check_digit(&payload);

    let body: String = payload[ISBN_PREFIX.len()..]
        .iter()
        .map(|digit| char::from(b'0' + digit))
        .collect();
    format!(
        "{ISBN_PREFIX}-{}-{}-{}-{check}",
        &body[0..1],
        &body[1..5],
        &body[5..ISBN_BODY_DIGITS]
    )
}

/// Computes the 13th digit for a 12-digit payload.
pub fn isbn13_check_digit(payload: &[u8; 12]) -> u8 {
    let sum: u32 = payload
        .iter()
        .enumerate()
        .map(|(index, digit)| {
            let weight = if index % 2 == 0 { 1 } else { 3 };
            u32::from(*digit) * weight
        })
        .sum();
    ((10 - (sum % 10)) % 10) as u8
}

/// Validates an ISBN-10 or ISBN-13, ignoring hyphens and spaces.
pub fn validate_isbn(value: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::InvalidIsbn(value.to_string());
    if !ISBN_SHAPE_RE.is_match(value) {
        return Err(invalid());
    }

    let compact: Vec<char> = value.chars().filter(|c| *c != '-' && *c != ' ').collect();
    let valid = match compact.len() {
        13 => isbn13_is_valid(&compact),
        10 => isbn10_is_valid(&compact),
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(invalid())
    }
}

fn isbn13_is_valid(chars: &[char]) -> bool {
    let mut digits = [0_u8; 13];
    for (slot, c) in digits.iter_mut().zip(chars) {
        match c.to_digit(10) {
            Some(digit) => *slot = digit as u8,
            None => return false,
        }
    }
    let mut payload = [0_u8; 12];
    payload.copy_from_slice(&digits[..12]);
    isbn13_check_digit(&payload) == digits[12]
}

fn isbn10_is_valid(chars: &[char]) -> bool {
    let mut sum = 0_u32;
    for (index, c) in chars.iter().enumerate() {
        let value = match (index, c) {
            (9, 'X') => 10,
            _ => match c.to_digit(10) {
                Some(digit) => digit,
                None => return false,
            },
        };
        sum += value * (10 - index as u32);
    }
    sum % 11 == 0
}

#[cfg(test)]
mod tests {
    use super::{generate_isbn, generate_isbn_with, isbn13_check_digit, validate_isbn};
    use crate::model::validation::ValidationError;
    use once_cell::sync::Lazy;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use regex::Regex;

    static GENERATED_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^978-\d-\d{4}-\d{4}-\d$").unwrap());

    fn payload_of(isbn: &str) -> ([u8; 12], u8) {
        let digits: Vec<u8> = isbn
            .chars()
            .filter_map(|c| c.to_digit(10))
            .map(|d| d as u8)
            .collect();
        assert_eq!(digits.len(), 13, "unexpected digit count in {isbn}");
        let mut payload = [0_u8; 12];
        payload.copy_from_slice(&digits[..12]);
        (payload, digits[12])
    }

    #[test]
    fn check_digit_matches_known_isbn() {
        let (payload, check) = payload_of("978-3-16-148410-0");
        assert_eq!(isbn13_check_digit(&payload), check);
        let (payload, check) = payload_of("978-0-306-40615-7");
        assert_eq!(isbn13_check_digit(&payload), check);
    }

    #[test]
    fn generated_values_keep_grouped_format_and_checksum() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let isbn = generate_isbn_with(&mut rng);
            assert!(GENERATED_RE.is_match(&isbn), "bad format: {isbn}");

            let (payload, check) = payload_of(&isbn);
            assert_eq!(&payload[..3], &[9, 7, 8]);
            assert!(payload.iter().all(|digit| *digit <= 9));
            let weighted: u32 = payload
                .iter()
                .enumerate()
                .map(|(i, d)| u32::from(*d) * if i % 2 == 0 { 1 } else { 3 })
                .sum();
            assert_eq!(u32::from(check), (10 - weighted % 10) % 10);
        }
    }

    #[test]
    fn generated_values_pass_validation() {
        for _ in 0..100 {
            let isbn = generate_isbn();
            validate_isbn(&isbn).unwrap();
        }
    }

    #[test]
    fn same_seed_yields_same_sequence() {
        let mut first = StdRng::seed_from_u64(42);
        let mut second = StdRng::seed_from_u64(42);
        assert_eq!(
            generate_isbn_with(&mut first),
            generate_isbn_with(&mut second)
        );
    }

    #[test]
    fn validate_accepts_isbn10_with_x_check_digit() {
        validate_isbn("0-8044-2957-X").unwrap();
        validate_isbn("0306406152").unwrap();
    }

    #[test]
    fn validate_rejects_lowercase_x_check_digit() {
        assert_eq!(
            validate_isbn("0-8044-2957-x"),
            Err(ValidationError::InvalidIsbn("0-8044-2957-x".to_string()))
        );
    }

    #[test]
    fn validate_rejects_bad_checksum_and_shape() {
        for value in ["978-3-16-148410-1", "12345", "abc-def", "", "978316148410X"] {
            assert_eq!(
                validate_isbn(value),
                Err(ValidationError::InvalidIsbn(value.to_string())),
                "{value} should be rejected"
            );
        }
    }
}
