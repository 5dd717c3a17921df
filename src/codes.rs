//! Voucher code generation and syntactic validation.

use rand::Rng;

/// Characters a voucher code may contain.
///
/// Unambiguous subset: no 0/O, 1/I/L, or Q, so codes survive being read
/// aloud or retyped from paper.
pub const ALPHABET: &[u8] = b"ABCDEFGHJKMNPRSTUVWXYZ23456789";

/// Length of every voucher code.
pub const CODE_LEN: usize = 8;

/// Generate a fresh voucher code.
///
/// Uniqueness is not guaranteed here; the store checks for collisions on
/// insert and retries a bounded number of times.
pub fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LEN)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Check that a candidate code is syntactically well-formed.
pub fn is_well_formed(code: &str) -> bool {
    code.len() == CODE_LEN && code.bytes().all(|b| ALPHABET.contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_codes_are_well_formed() {
        for _ in 0..100 {
            let code = generate_code();
            assert!(is_well_formed(&code), "bad code: {code}");
        }
    }

    #[test]
    fn test_alphabet_excludes_ambiguous_characters() {
        for c in [b'0', b'O', b'1', b'I', b'L', b'Q'] {
            assert!(!ALPHABET.contains(&c));
        }
    }

    #[test]
    fn test_well_formed_rejects_wrong_length() {
        assert!(!is_well_formed(""));
        assert!(!is_well_formed("ABC"));
        assert!(!is_well_formed("ABCDEFGHJ"));
    }

    #[test]
    fn test_well_formed_rejects_foreign_characters() {
        assert!(!is_well_formed("ABCDEFG!"));
        assert!(!is_well_formed("abcdefgh"));
        assert!(!is_well_formed("ABCD EFG"));
        assert!(!is_well_formed("ABCDEFG0"));
    }

    #[test]
    fn test_well_formed_accepts_valid_code() {
        assert!(is_well_formed("ZZZZZZZZ"));
        assert!(is_well_formed("A2B3C4D5"));
    }
}
