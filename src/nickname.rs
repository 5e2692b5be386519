use std::fmt;
use std::str::FromStr;

use crate::error::NicknameError;

/// The name that system notices are attributed to. Nobody else may use it.
pub const RESERVED: &str = "Server";

/// Longest accepted nickname, in characters.
pub const MAX_LEN: usize = 16;

/// Separator between the sender and the body of every broadcast line.
pub const SEPARATOR: &str = " - ";

/// A validated display name.
///
/// Stored bare, rendered bracketed: `Nickname("Alice")` displays as
/// `[Alice]`. The only way to get one is through `FromStr`, so a
/// `Nickname` in hand always satisfies the naming rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Nickname(String);

impl Nickname {
    /// Placeholder shown for a connection that hasn't picked a name yet.
    pub fn anonymous() -> Self {
        Self("Anon".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Nickname {
    type Err = NicknameError;

    fn from_str(candidate: &str) -> Result<Self, Self::Err> {
        let name = candidate.trim();

        if name.is_empty() {
            return Err(NicknameError::Empty);
        }
        if name == RESERVED {
            return Err(NicknameError::Reserved);
        }
        if name.starts_with('!') {
            return Err(NicknameError::CommandSigil);
        }
        if name.chars().count() > MAX_LEN {
            return Err(NicknameError::TooLong { max: MAX_LEN });
        }
        if name.contains(SEPARATOR) {
            return Err(NicknameError::Separator);
        }

        Ok(Nickname(name.to_string()))
    }
}

impl fmt::Display for Nickname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0)
    }
}
