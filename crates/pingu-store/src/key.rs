//! Store id derivation.

use sha2::{Digest, Sha256};

/// Stable id for a URL's history: the explicit name if given, else the
/// hex SHA-256 of the URL.
pub fn store_id(url: &str, name: Option<&str>) -> String {
    match name.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => hex::encode(Sha256::digest(url.as_bytes())),
    }
}

/// File name holding the history for `store_id`.
pub fn file_name(store_id: &str) -> String {
    format!("pingu-{store_id}-log.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashed_id_is_stable() {
        let a = store_id("https://example.com/health", None);
        let b = store_id("https://example.com/health", None);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, store_id("https://example.com/other", None));
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            store_id("abc", None),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_name_override() {
        assert_eq!(store_id("https://example.com", Some("homepage")), "homepage");
        assert_eq!(store_id("abc", Some("  ")), store_id("abc", None));
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("homepage"), "pingu-homepage-log.json");
    }
}
