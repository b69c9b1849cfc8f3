//! Unique token generation.

use uuid::Uuid;

/// Source of fresh opaque unique strings.
///
/// Used for run identifiers and stored file identifiers.
pub trait TokenGenerator: Send + Sync {
    /// Generate a new token. Every call returns a different value.
    fn generate(&self) -> String;
}

/// [`TokenGenerator`] producing random UUID v4 strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl TokenGenerator for UuidGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_tokens_are_unique() {
        let tokens = UuidGenerator;
        assert_ne!(tokens.generate(), tokens.generate());
    }

    #[test]
    fn test_uuid_token_format() {
        let token = UuidGenerator.generate();
        assert!(Uuid::parse_str(&token).is_ok());
        assert_eq!(token.len(), 36);
    }
}
