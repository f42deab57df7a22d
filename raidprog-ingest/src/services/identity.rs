//! Identity hashing
//!
//! Stable keys recognizing the same real-world character or encounter across
//! reports, independent of surrogate database ids and of the log provider's
//! per-report ids. Both are SHA-256 digests of a canonical string, encoded as
//! URL-safe base64 without padding (43 characters).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

fn digest(canonical: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(canonical.as_bytes()))
}

/// Identity hash of an encounter, derived from its zone id
pub fn encounter_hash(zone_id: i64) -> String {
    digest(&format!("encounter:{}", zone_id))
}

/// Identity hash of a character, derived from name and server
///
/// The name is length-prefixed so that distinct pairs can never produce the
/// same canonical string ("ab"+"c" vs "a"+"bc").
pub fn character_hash(name: &str, server: &str) -> String {
    digest(&format!("character:{}:{}|{}", name.len(), name, server))
}
