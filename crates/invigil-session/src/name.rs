//! Display-name validation: the whole of player identity.

use std::fmt;

use crate::SessionError;

/// A validated player display name.
///
/// Names are the key players are stored under inside a room, so they are
/// trimmed before use: `" Asha "` and `"Asha"` are the same player.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DisplayName(String);

impl DisplayName {
    /// Longest accepted name, in characters.
    pub const MAX_CHARS: usize = 24;

    /// Trims and validates a raw name.
    ///
    /// # Errors
    /// [`SessionError::InvalidName`] if the trimmed name is empty or
    /// longer than [`Self::MAX_CHARS`].
    pub fn parse(raw: &str) -> Result<Self, SessionError> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(SessionError::InvalidName("name is empty".into()));
        }
        let chars = name.chars().count();
        if chars > Self::MAX_CHARS {
            return Err(SessionError::InvalidName(format!(
                "name is {chars} characters, limit is {}",
                Self::MAX_CHARS
            )));
        }
        Ok(Self(name.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_whitespace() {
        let name = DisplayName::parse("  Asha ").unwrap();
        assert_eq!(name.as_str(), "Asha");
    }

    #[test]
    fn test_parse_rejects_blank() {
        assert!(matches!(
            DisplayName::parse("   "),
            Err(SessionError::InvalidName(_))
        ));
    }

    #[test]
    fn test_parse_counts_characters_not_bytes() {
        let devanagari = "प".repeat(DisplayName::MAX_CHARS);
        assert!(DisplayName::parse(&devanagari).is_ok());
        let too_long = "x".repeat(DisplayName::MAX_CHARS + 1);
        assert!(DisplayName::parse(&too_long).is_err());
    }
}
