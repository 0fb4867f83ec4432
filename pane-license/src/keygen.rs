//! Random license-key and bearer-token material.
//!
//! License keys read aloud well: an uppercase prefix plus four groups of
//! four characters from A-Z0-9. Bearer tokens are 32 bytes from the OS RNG,
//! base64url-encoded without padding.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::rngs::OsRng;
use rand::{Rng, RngCore};

const KEY_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const KEY_GROUPS: usize = 4;
const KEY_GROUP_LEN: usize = 4;
const TOKEN_BYTES: usize = 32;

/// Generates a license key of the form `PREFIX-XXXX-XXXX-XXXX-XXXX`.
#[must_use]
pub fn license_key(prefix: &str) -> String {
    let mut rng = OsRng;
    let mut out = String::with_capacity(prefix.len() + KEY_GROUPS * (KEY_GROUP_LEN + 1));
    out.push_str(prefix);
    for _ in 0..KEY_GROUPS {
        out.push('-');
        for _ in 0..KEY_GROUP_LEN {
            let idx = rng.gen_range(0..KEY_ALPHABET.len());
            out.push(KEY_ALPHABET[idx] as char);
        }
    }
    out
}

/// Generates an opaque high-entropy bearer token.
#[must_use]
pub fn bearer_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn license_key_has_expected_shape() {
        let key = license_key("PRO");
        let parts: Vec<&str> = key.split('-').collect();
        assert_eq!(parts.len(), 5);
        assert_eq!(parts[0], "PRO");
        for group in &parts[1..] {
            assert_eq!(group.len(), 4);
            assert!(
                group
                    .bytes()
                    .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
            );
        }
    }

    #[test]
    fn license_keys_do_not_repeat() {
        let a = license_key("PRO");
        let b = license_key("PRO");
        assert_ne!(a, b);
    }

    #[test]
    fn bearer_tokens_are_url_safe_and_unique() {
        let a = bearer_token();
        let b = bearer_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43); // 32 bytes, base64url, no padding
        assert!(
            a.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }
}
