//! Entry reference generation.

use uuid::Uuid;

/// Length of an entry reference.
pub const REFERENCE_LEN: usize = 12;

/// Generates a customer-facing entry reference.
///
/// Twelve uppercase hex characters taken from a random v4 UUID. Uniqueness
/// is enforced by the store, which rejects a colliding reference.
#[must_use]
pub fn generate_reference() -> String {
    let mut reference = Uuid::new_v4().simple().to_string();
    reference.truncate(REFERENCE_LEN);
    reference.make_ascii_uppercase();
    reference
}

/// Returns true if `s` has the shape of a generated reference.
#[must_use]
pub fn is_reference(s: &str) -> bool {
    s.len() == REFERENCE_LEN
        && s
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
}
