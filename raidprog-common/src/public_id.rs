//! Public character identifiers
//!
//! Short random ids used in lookup URLs. They are unrelated to the identity
//! hashes used for cross-report matching and carry no meaning of their own.

use rand::Rng;

/// Length of a generated public id
pub const PUBLIC_ID_LENGTH: usize = 6;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz1234567890";

/// Generate a random public id of [`PUBLIC_ID_LENGTH`] characters from `[a-z0-9]`
///
/// Uniqueness is not guaranteed here; callers check against stored ids.
pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    (0..PUBLIC_ID_LENGTH)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Normalize user-supplied public id (trim, lowercase)
pub fn normalize(input: &str) -> String {
    input.trim().to_lowercase()
}

/// Check that a string has the shape of a public id
pub fn is_well_formed(id: &str) -> bool {
    id.len() == PUBLIC_ID_LENGTH && id.bytes().all(|b| ALPHABET.contains(&b))
}
