//! ISBN detection and ISBN-10 / ISBN-13 conversion.

use crate::models::BookRecord;

/// Strip spaces and dashes and uppercase a trailing `x`
pub fn clean_isbn(text: &str) -> String {
    text.trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Whether `text` looks like an ISBN-10 or ISBN-13 once separators are removed.
///
/// Shape only; checksums are not verified so a mistyped ISBN is still routed
/// to the ISBN lookup path.
pub fn is_isbn(text: &str) -> bool {
    let isbn = clean_isbn(text);
    match isbn.len() {
        10 => has_isbn10_shape(&isbn),
        13 => isbn.chars().all(|c| c.is_ascii_digit()),
        _ => false,
    }
}

/// Nine digits followed by a digit or `X`
fn has_isbn10_shape(isbn: &str) -> bool {
    isbn.len() == 10
        && isbn
            .chars()
            .enumerate()
            .all(|(i, c)| c.is_ascii_digit() || (i == 9 && c == 'X'))
}

/// Convert an ISBN-10 to ISBN-13 (`978` prefix, recomputed check digit).
///
/// Returns `None` when the input is not shaped like an ISBN-10.
pub fn to_isbn13(isbn10: &str) -> Option<String> {
    let isbn = clean_isbn(isbn10);
    if !has_isbn10_shape(&isbn) {
        return None;
    }

    let body = format!("978{}", &isbn[..9]);
    let check = ean13_check_digit(&body)?;
    Some(format!("{}{}", body, check))
}

/// Convert an ISBN-13 to ISBN-10.
///
/// Only `978`-prefixed numbers have an ISBN-10 form; `979` and anything that
/// is not 13 digits returns `None`.
pub fn to_isbn10(isbn13: &str) -> Option<String> {
    let isbn = clean_isbn(isbn13);
    if isbn.len() != 13 || !isbn.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let body = isbn.strip_prefix("978")?.get(..9)?;
    let check = isbn10_check_digit(body)?;
    Some(format!("{}{}", body, check))
}

/// Convert in whichever direction applies to the input's length
pub fn alternate_isbn(isbn: &str) -> Option<String> {
    let isbn = clean_isbn(isbn);
    match isbn.len() {
        10 => to_isbn13(&isbn),
        13 => to_isbn10(&isbn),
        _ => None,
    }
}

/// ISBN-13 of a record, deriving it from the ISBN-10 when needed
pub fn extract_isbn13(record: &BookRecord) -> Option<String> {
    record
        .isbn13
        .as_deref()
        .map(clean_isbn)
        .filter(|isbn| isbn.len() == 13)
        .or_else(|| record.isbn10.as_deref().and_then(to_isbn13))
}

/// Validate an ISBN-10 checksum
pub fn is_valid_isbn10(isbn: &str) -> bool {
    let isbn = clean_isbn(isbn);
    if !has_isbn10_shape(&isbn) {
        return false;
    }

    let sum: u32 = isbn
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let value = if c == 'X' { 10 } else { c.to_digit(10).unwrap_or(0) };
            value * (10 - i as u32)
        })
        .sum();

    sum % 11 == 0
}

/// Validate an ISBN-13 checksum
pub fn is_valid_isbn13(isbn: &str) -> bool {
    let isbn = clean_isbn(isbn);
    if isbn.len() != 13 || !isbn.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }

    match ean13_check_digit(&isbn[..12]) {
        Some(check) => isbn[12..].parse::<u32>().ok() == Some(check),
        None => false,
    }
}

/// EAN-13 check digit over twelve digits: weights alternate 1, 3
fn ean13_check_digit(body: &str) -> Option<u32> {
    if body.len() != 12 {
        return None;
    }

    let mut sum = 0;
    for (i, c) in body.chars().enumerate() {
        let digit = c.to_digit(10)?;
        sum += if i % 2 == 0 { digit } else { digit * 3 };
    }

    Some((10 - sum % 10) % 10)
}

/// ISBN-10 check character over nine digits: weights 10 down to 2
fn isbn10_check_digit(body: &str) -> Option<char> {
    if body.len() != 9 {
        return None;
    }

    let mut sum = 0;
    for (i, c) in body.chars().enumerate() {
        sum += c.to_digit(10)? * (10 - i as u32);
    }

    match 11 - sum % 11 {
        11 => Some('0'),
        10 => Some('X'),
        n => char::from_digit(n, 10),
    }
}
