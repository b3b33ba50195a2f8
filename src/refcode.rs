//! Order reference codes.
//!
//! Assigned to an order only at the moment of successful payment and used
//! afterwards to look the order up for refunds. Uniqueness is enforced by the
//! store's unique constraint; callers retry with a fresh code on conflict.

use rand::Rng;

pub const REF_CODE_LEN: usize = 20;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    (0..REF_CODE_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

pub fn is_valid(code: &str) -> bool {
    code.len() == REF_CODE_LEN
        && code.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn codes_are_twenty_lowercase_alphanumerics() {
        for _ in 0..100 {
            let code = generate();
            assert!(is_valid(&code), "bad code: {code}");
        }
    }

    #[test]
    fn generated_codes_do_not_repeat() {
        let codes: HashSet<String> = (0..1000).map(|_| generate()).collect();
        assert_eq!(codes.len(), 1000);
    }

    #[test]
    fn validation_rejects_wrong_length_and_charset() {
        assert!(!is_valid(""));
        assert!(!is_valid("short"));
        assert!(!is_valid("ABCDEFGHIJKLMNOPQRST"));
        assert!(!is_valid("abcdefghij klmnopqrs"));
        assert!(is_valid("a1b2c3d4e5f6g7h8i9j0"));
    }
}
