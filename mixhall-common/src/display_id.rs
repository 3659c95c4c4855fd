//! Catalog identity (display id) generation and validation
//!
//! A display id is the public identity of a published song, pattern
//! `MX-AAAA-000` (four uppercase letters, three digits). The review
//! workflow reserves one per Create submission and re-checks uniqueness
//! at approval time.

use rand::Rng;

/// Generate a random display id, pattern `MX-AAAA-000`.
///
/// Uniqueness is NOT guaranteed here; callers must check against the
/// content store and pending submissions before reserving the id.
pub fn generate() -> String {
    let mut rng = rand::thread_rng();

    let letters: String = (0..4)
        .map(|_| rng.gen_range(b'A'..=b'Z') as char)
        .collect();

    let numbers: String = (0..3)
        .map(|_| rng.gen_range(b'0'..=b'9') as char)
        .collect();

    format!("MX-{}-{}", letters, numbers)
}

/// Split a display id into its (letters, digits) parts, or None if malformed.
pub fn parse(input: &str) -> Option<(&str, &str)> {
    let rest = input.strip_prefix("MX-")?;
    let (letters, numbers) = rest.split_once('-')?;
    if letters.len() != 4 || !letters.bytes().all(|b| b.is_ascii_uppercase()) {
        return None;
    }
    if numbers.len() != 3 || !numbers.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((letters, numbers))
}

/// Whether the string is a well-formed display id
pub fn is_valid(input: &str) -> bool {
    parse(input).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(parse("MX-ABCD-123"), Some(("ABCD", "123")));
        assert_eq!(parse("MX-ABC-123"), None);
        assert_eq!(parse("MX-ABCD-12"), None);
        assert_eq!(parse("MX-abcd-123"), None);
        assert_eq!(parse("MX-ABCD-12A"), None);
        assert_eq!(parse("ABCD-123"), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn test_generated_ids_are_valid() {
        for _ in 0..100 {
            let id = generate();
            assert!(is_valid(&id), "generated invalid id: {}", id);
        }
    }
}
