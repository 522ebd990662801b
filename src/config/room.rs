//! Room configuration: session code shape and creation behavior

use serde::Deserialize;

use super::error::ValidationError;

/// Room configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RoomConfig {
    /// Length of generated session codes
    #[serde(default = "default_code_length")]
    pub code_length: usize,

    /// Alphabet generated codes are drawn from (case-sensitive)
    #[serde(default = "default_code_alphabet")]
    pub code_alphabet: String,

    /// How many collision re-rolls room creation attempts before failing
    #[serde(default = "default_max_code_attempts")]
    pub max_code_attempts: u32,
}

impl RoomConfig {
    /// Validate room configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.code_length == 0 {
            return Err(ValidationError::InvalidCodeLength);
        }
        let chars: Vec<char> = self.code_alphabet.chars().collect();
        let mut unique = chars.clone();
        unique.sort_unstable();
        unique.dedup();
        if chars.is_empty()
            || unique.len() != chars.len()
            || !chars.iter().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(ValidationError::InvalidCodeAlphabet);
        }
        if self.max_code_attempts == 0 {
            return Err(ValidationError::InvalidCodeAttempts);
        }
        Ok(())
    }
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            code_length: default_code_length(),
            code_alphabet: default_code_alphabet(),
            max_code_attempts: default_max_code_attempts(),
        }
    }
}

fn default_code_length() -> usize {
    4
}

fn default_code_alphabet() -> String {
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789".to_string()
}

fn default_max_code_attempts() -> u32 {
    16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RoomConfig::default();
        assert_eq!(config.code_length, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_length() {
        let config = RoomConfig {
            code_length: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidCodeLength));
    }

    #[test]
    fn rejects_empty_alphabet() {
        let config = RoomConfig {
            code_alphabet: String::new(),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidCodeAlphabet));
    }

    #[test]
    fn rejects_duplicate_alphabet_characters() {
        let config = RoomConfig {
            code_alphabet: "aab".to_string(),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidCodeAlphabet));
    }

    #[test]
    fn rejects_non_alphanumeric_alphabet() {
        let config = RoomConfig {
            code_alphabet: "ab:".to_string(),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidCodeAlphabet));
    }

    #[test]
    fn rejects_zero_attempts() {
        let config = RoomConfig {
            max_code_attempts: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidCodeAttempts));
    }
}
