//! ID, token and short-code generation.

use rand::Rng;
use ulid::Ulid;
use uuid::Uuid;

/// Alphabet for short poll codes. Uppercase alphanumerics minus the
/// characters that read ambiguously when sent over chat or read aloud
/// (0/O, 1/I/L).
const SHORT_CODE_ALPHABET: &[u8] = b"23456789ABCDEFGHJKMNPQRSTUVWXYZ";

/// Length of a short poll code.
pub const SHORT_CODE_LEN: usize = 8;

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based entity ID.
    ///
    /// ULIDs are lexicographically sortable and shorter than UUIDs
    /// when represented as strings.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate a cryptographically secure admin token.
    ///
    /// Issued exactly once, at poll creation. Possession of this
    /// token is the only credential for viewing results.
    #[must_use]
    pub fn generate_token(&self) -> String {
        // UUID v4: no time component leaks into the capability.
        Uuid::new_v4().simple().to_string()
    }

    /// Generate a short human-shareable poll code.
    #[must_use]
    pub fn generate_short_code(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..SHORT_CODE_LEN)
            .map(|_| {
                let idx = rng.gen_range(0..SHORT_CODE_ALPHABET.len());
                SHORT_CODE_ALPHABET[idx] as char
            })
            .collect()
    }
}
