//! ID generation utilities with prefix support
//!
//! IDs are generated with at least 96 bits of entropy and are URL-safe.

use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use rand::{TryRngCore, rngs::OsRng};

/// Generate a prefixed ID with at least 96 bits of entropy
///
/// The ID format is: `{prefix}_{random_string}`
/// where the random string is base64 URL-safe encoded without padding.
pub fn generate_prefixed_id(prefix: &str) -> String {
    let mut bytes = [0u8; 12];
    OsRng.try_fill_bytes(&mut bytes).unwrap();

    let encoded = BASE64_URL_SAFE_NO_PAD.encode(bytes);

    format!("{prefix}_{encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_prefixed_id() {
        let id = generate_prefixed_id("usr");
        assert!(id.starts_with("usr_"));
        // 12 bytes encode to 16 base64 characters
        assert_eq!(id.len(), "usr_".len() + 16);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = generate_prefixed_id("usr");
        let b = generate_prefixed_id("usr");
        assert_ne!(a, b);
    }
}
