//! Session codes and the room key/channel namespace derived from them.
//!
//! A [`SessionCode`] is the short, human-typeable identifier of a live room.
//! All shared-store key names for a room are pure derivations of its code:
//!
//! - `room:<code>:tenants` — set of present tenant identities
//! - `room:<code>:message` — pub/sub channel for accepted payloads
//! - `room:<code>:tenantCount` — pub/sub channel for count deltas
//!
//! Codes are embedded verbatim, so distinct codes always derive distinct
//! keys, and the fixed purpose suffixes keep the three keys for one code
//! pairwise distinct.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::RoomConfig;

/// Errors from parsing a session code supplied by a client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodeError {
    #[error("session code is empty")]
    Empty,

    #[error("session code contains non-alphanumeric characters")]
    InvalidCharacter,
}

/// Short identifier of a live room.
///
/// Codes are treated as opaque once created; validation on parse only
/// ensures they stay within the key-safe alphanumeric space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionCode(String);

impl SessionCode {
    /// Parse a client-supplied code.
    pub fn parse(s: &str) -> Result<Self, CodeError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CodeError::Empty);
        }
        if !s.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CodeError::InvalidCharacter);
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key of the set holding the identities currently present in the room.
    pub fn tenant_set_key(&self) -> ChannelKey {
        ChannelKey(format!("room:{}:tenants", self.0))
    }

    /// Channel carrying accepted payload broadcasts for the room.
    pub fn message_channel(&self) -> ChannelKey {
        ChannelKey(format!("room:{}:message", self.0))
    }

    /// Channel carrying tenant-count updates for the room.
    pub fn tenant_count_channel(&self) -> ChannelKey {
        ChannelKey(format!("room:{}:tenantCount", self.0))
    }
}

impl fmt::Display for SessionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SessionCode {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SessionCode::parse(s)
    }
}

/// Derived shared-store key or pub/sub channel name.
///
/// Never constructed directly; always derived from a [`SessionCode`] so the
/// namespace invariants hold by construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelKey(String);

impl ChannelKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generates session codes from a configured alphabet.
///
/// Generation alone does not guarantee uniqueness; the room creation flow
/// re-rolls against the live-room registry on collision.
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    alphabet: Vec<char>,
    length: usize,
}

impl CodeGenerator {
    /// Build a generator from validated room configuration.
    pub fn new(config: &RoomConfig) -> Self {
        Self {
            alphabet: config.code_alphabet.chars().collect(),
            length: config.code_length,
        }
    }

    /// Generate a code using the process-wide RNG.
    pub fn generate(&self) -> SessionCode {
        self.generate_with(&mut rand::thread_rng())
    }

    /// Generate a code from a caller-supplied RNG.
    ///
    /// Used by tests that need deterministic output.
    pub fn generate_with<R: Rng + ?Sized>(&self, rng: &mut R) -> SessionCode {
        let code: String = (0..self.length)
            .map(|_| self.alphabet[rng.gen_range(0..self.alphabet.len())])
            .collect();
        SessionCode(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn generator(length: usize) -> CodeGenerator {
        CodeGenerator::new(&RoomConfig {
            code_length: length,
            ..Default::default()
        })
    }

    #[test]
    fn parse_accepts_alphanumeric_codes() {
        let code = SessionCode::parse("AB12").unwrap();
        assert_eq!(code.as_str(), "AB12");
    }

    #[test]
    fn parse_trims_whitespace() {
        let code = SessionCode::parse("  xY9z ").unwrap();
        assert_eq!(code.as_str(), "xY9z");
    }

    #[test]
    fn parse_rejects_empty_code() {
        assert_eq!(SessionCode::parse(""), Err(CodeError::Empty));
        assert_eq!(SessionCode::parse("   "), Err(CodeError::Empty));
    }

    #[test]
    fn parse_rejects_key_breaking_characters() {
        assert_eq!(
            SessionCode::parse("ab:cd"),
            Err(CodeError::InvalidCharacter)
        );
        assert_eq!(SessionCode::parse("ab cd"), Err(CodeError::InvalidCharacter));
    }

    #[test]
    fn derived_keys_follow_namespace_format() {
        let code = SessionCode::parse("AB12").unwrap();
        assert_eq!(code.tenant_set_key().as_str(), "room:AB12:tenants");
        assert_eq!(code.message_channel().as_str(), "room:AB12:message");
        assert_eq!(
            code.tenant_count_channel().as_str(),
            "room:AB12:tenantCount"
        );
    }

    #[test]
    fn purposes_never_collide_for_one_code() {
        let code = SessionCode::parse("AB12").unwrap();
        let keys = [
            code.tenant_set_key(),
            code.message_channel(),
            code.tenant_count_channel(),
        ];
        let distinct: HashSet<_> = keys.iter().map(|k| k.as_str().to_string()).collect();
        assert_eq!(distinct.len(), 3);
    }

    #[test]
    fn generated_codes_have_requested_length() {
        for length in [1, 4, 8, 32] {
            let code = generator(length).generate();
            assert_eq!(code.as_str().len(), length);
        }
    }

    #[test]
    fn generated_codes_stay_within_alphabet() {
        let config = RoomConfig::default();
        let gen = CodeGenerator::new(&config);
        for _ in 0..100 {
            let code = gen.generate();
            assert!(code
                .as_str()
                .chars()
                .all(|c| config.code_alphabet.contains(c)));
        }
    }

    #[test]
    fn no_alphabet_character_is_permanently_excluded() {
        // Over many trials each character of a small alphabet must appear.
        let gen = CodeGenerator::new(&RoomConfig {
            code_length: 8,
            code_alphabet: "abcd".to_string(),
            ..Default::default()
        });
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = HashSet::new();
        for _ in 0..200 {
            seen.extend(gen.generate_with(&mut rng).as_str().chars());
        }
        assert_eq!(seen, "abcd".chars().collect());
    }

    #[test]
    fn deterministic_rng_gives_deterministic_codes() {
        let gen = generator(6);
        let a = gen.generate_with(&mut StdRng::seed_from_u64(42));
        let b = gen.generate_with(&mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn distinct_codes_derive_distinct_keys(a in "[A-Za-z0-9]{1,12}", b in "[A-Za-z0-9]{1,12}") {
            let ca = SessionCode::parse(&a).unwrap();
            let cb = SessionCode::parse(&b).unwrap();
            if ca != cb {
                prop_assert_ne!(ca.tenant_set_key(), cb.tenant_set_key());
                prop_assert_ne!(ca.message_channel(), cb.message_channel());
                prop_assert_ne!(ca.tenant_count_channel(), cb.tenant_count_channel());
            } else {
                prop_assert_eq!(ca.tenant_set_key(), cb.tenant_set_key());
            }
        }

        #[test]
        fn generation_is_uniform_in_shape(length in 1usize..16) {
            let code = generator(length).generate();
            prop_assert_eq!(code.as_str().len(), length);
            prop_assert!(code.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }
}
