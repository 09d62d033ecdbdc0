//! Short code generation and validation utilities.
//!
//! Codes are drawn from a fixed alphabet that excludes visually ambiguous
//! characters, using the operating system CSPRNG so codes are neither
//! predictable nor enumerable.

use sha2::{Digest, Sha256};

/// Alphanumeric alphabet minus the look-alikes `i l 1 L o 0 O`.
const ALPHABET: &[u8] = b"abcdefghjkmnpqrstuvwxyzABCDEFGHIJKMNPQRSTUVWXYZ23456789";

/// Hard ceiling on accepted code length, matching the column width.
const MAX_CODE_LENGTH: usize = 50;

/// Generator for short codes of a configured length.
///
/// Holds no mutable state: uniqueness is enforced exclusively by the record
/// store's constraints, never by an in-process set, so any number of
/// concurrent allocation attempts may share one instance.
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    length: usize,
}

impl CodeGenerator {
    /// Creates a generator producing codes of `length` characters.
    pub fn new(length: usize) -> Self {
        Self { length }
    }

    /// The configured code length.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Generates a random code of the configured length.
    ///
    /// # Panics
    ///
    /// Panics if the system random number generator fails (extremely rare).
    pub fn generate_random(&self) -> String {
        self.generate_random_with_length(self.length)
    }

    /// Generates a random code of an explicit length.
    ///
    /// Used by the allocation loop when it escalates the code length after
    /// a full round of collisions.
    ///
    /// # Panics
    ///
    /// Panics if the system random number generator fails (extremely rare).
    pub fn generate_random_with_length(&self, length: usize) -> String {
        // Rejection sampling keeps the distribution over the alphabet
        // uniform: bytes at or above the largest multiple of the alphabet
        // size are discarded instead of wrapped.
        let bound = u8::MAX as usize + 1 - (u8::MAX as usize + 1) % ALPHABET.len();

        let mut code = String::with_capacity(length);
        let mut buffer = [0u8; 64];

        while code.len() < length {
            getrandom::fill(&mut buffer).expect("Failed to generate random bytes");

            for &byte in &buffer {
                if (byte as usize) < bound {
                    code.push(ALPHABET[byte as usize % ALPHABET.len()] as char);
                    if code.len() == length {
                        break;
                    }
                }
            }
        }

        code
    }

    /// Derives a code from the target URL content via SHA-256.
    ///
    /// This is an idempotent mapping only: equal inputs yield equal codes,
    /// but distinct inputs may collide. It carries no uniqueness guarantee
    /// and must never replace the random strategy for collision avoidance.
    pub fn derive_from_target(&self, target_url: &str) -> String {
        let digest = Sha256::digest(target_url.as_bytes());

        digest
            .iter()
            .take(self.length)
            .map(|b| ALPHABET[*b as usize % ALPHABET.len()] as char)
            .collect()
    }

    /// Validates a short code: non-empty, at most [`MAX_CODE_LENGTH`]
    /// characters, every character in the alphabet.
    pub fn is_valid_code(&self, code: &str) -> bool {
        if code.is_empty() || code.len() > MAX_CODE_LENGTH {
            return false;
        }

        code.bytes().all(|b| ALPHABET.contains(&b))
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new(6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_code_has_configured_length() {
        for length in [4, 6, 8, 12] {
            let generator = CodeGenerator::new(length);
            assert_eq!(generator.generate_random().len(), length);
        }
    }

    #[test]
    fn test_generate_code_uses_alphabet_only() {
        let generator = CodeGenerator::new(32);
        let code = generator.generate_random();
        assert!(code.bytes().all(|b| ALPHABET.contains(&b)));
    }

    #[test]
    fn test_generate_code_excludes_ambiguous_characters() {
        let generator = CodeGenerator::new(64);

        for _ in 0..100 {
            let code = generator.generate_random();
            assert!(!code.contains(['i', 'l', '1', 'L', 'o', '0', 'O']));
        }
    }

    #[test]
    fn test_generated_codes_are_valid() {
        let generator = CodeGenerator::new(6);

        for _ in 0..100 {
            assert!(generator.is_valid_code(&generator.generate_random()));
        }
    }

    #[test]
    fn test_generate_code_produces_unique_codes() {
        let generator = CodeGenerator::new(12);
        let mut codes = HashSet::new();

        for _ in 0..1000 {
            codes.insert(generator.generate_random());
        }

        assert_eq!(codes.len(), 1000);
    }

    #[test]
    fn test_explicit_length_overrides_configured() {
        let generator = CodeGenerator::new(6);
        assert_eq!(generator.generate_random_with_length(7).len(), 7);
        assert_eq!(generator.length(), 6);
    }

    #[test]
    fn test_derive_from_target_is_deterministic() {
        let generator = CodeGenerator::new(6);
        let a = generator.derive_from_target("https://example.com/page");
        let b = generator.derive_from_target("https://example.com/page");
        assert_eq!(a, b);
        assert_eq!(a.len(), 6);
        assert!(generator.is_valid_code(&a));
    }

    #[test]
    fn test_derive_from_target_differs_for_different_input() {
        let generator = CodeGenerator::new(8);
        let a = generator.derive_from_target("https://example.com/a");
        let b = generator.derive_from_target("https://example.com/b");
        assert_ne!(a, b);
    }

    #[test]
    fn test_is_valid_code_rejects_empty() {
        let generator = CodeGenerator::default();
        assert!(!generator.is_valid_code(""));
    }

    #[test]
    fn test_is_valid_code_rejects_over_ceiling() {
        let generator = CodeGenerator::default();
        let long = "a".repeat(MAX_CODE_LENGTH + 1);
        assert!(!generator.is_valid_code(&long));

        let at_ceiling = "a".repeat(MAX_CODE_LENGTH);
        assert!(generator.is_valid_code(&at_ceiling));
    }

    #[test]
    fn test_is_valid_code_rejects_foreign_characters() {
        let generator = CodeGenerator::default();
        assert!(!generator.is_valid_code("abc 23"));
        assert!(!generator.is_valid_code("abc-23"));
        assert!(!generator.is_valid_code("abc1de"));
        assert!(!generator.is_valid_code("abcO23"));
        assert!(!generator.is_valid_code("héllo"));
    }

    #[test]
    fn test_alphabet_size() {
        // 23 lowercase + 24 uppercase + 8 digits
        assert_eq!(ALPHABET.len(), 55);
    }
}
