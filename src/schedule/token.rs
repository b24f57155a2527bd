use std::fmt;
use serde::{Serialize, Deserialize};

use super::types::StaffType;

/// Separator between a token's base id and its uniqueness stamp
pub const STAMP_SEPARATOR: &str = "::";

const SPECIAL_PREFIX: &str = "special:";
const NEW_PREFIX: &str = "new:";
const USED_PREFIX: &str = "used:";

/// What a token refers to, decoded from its prefix
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Staff { name: String, staff_type: StaffType },
    Special { label: String },
    /// Anything without a recognised prefix, kept verbatim
    Other(String),
}

/// An assignment unit placed in a container.
///
/// Persisted as `baseId[::stamp]`. The stamp only keeps list membership unique
/// when the same person is cloned into several slots; it never takes part in
/// display or duplicate comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Token {
    kind: TokenKind,
    stamp: Option<String>,
}

impl Token {
    pub fn staff(name: &str, staff_type: StaffType) -> Self {
        Token {
            kind: TokenKind::Staff { name: name.to_string(), staff_type },
            stamp: None,
        }
    }

    pub fn special(label: &str) -> Self {
        Token {
            kind: TokenKind::Special { label: label.to_string() },
            stamp: None,
        }
    }

    /// Decodes a raw token string. Never fails: unknown shapes become `TokenKind::Other`.
    pub fn parse(raw: &str) -> Self {
        let (base, stamp) = match raw.split_once(STAMP_SEPARATOR) {
            Some((base, stamp)) => (base, Some(stamp.to_string())),
            None => (raw, None),
        };

        let kind = if let Some(label) = base.strip_prefix(SPECIAL_PREFIX) {
            TokenKind::Special { label: label.to_string() }
        } else if let Some(name) = base.strip_prefix(NEW_PREFIX) {
            TokenKind::Staff { name: name.to_string(), staff_type: StaffType::New }
        } else if let Some(name) = base.strip_prefix(USED_PREFIX) {
            TokenKind::Staff { name: name.to_string(), staff_type: StaffType::Used }
        } else {
            TokenKind::Other(base.to_string())
        };

        Token { kind, stamp }
    }

    pub fn kind(&self) -> &TokenKind {
        &self.kind
    }

    pub fn stamp(&self) -> Option<&str> {
        self.stamp.as_deref()
    }

    /// Human name or label, with prefix and stamp removed
    pub fn display_name(&self) -> &str {
        match &self.kind {
            TokenKind::Staff { name, .. } => name,
            TokenKind::Special { label } => label,
            TokenKind::Other(raw) => raw,
        }
    }

    pub fn staff_type(&self) -> Option<StaffType> {
        match &self.kind {
            TokenKind::Staff { staff_type, .. } => Some(*staff_type),
            _ => None,
        }
    }

    /// The token without its stamp, e.g. `new:Gio`
    pub fn base_id(&self) -> String {
        match &self.kind {
            TokenKind::Staff { name, staff_type: StaffType::New } => format!("{}{}", NEW_PREFIX, name),
            TokenKind::Staff { name, staff_type: StaffType::Used } => format!("{}{}", USED_PREFIX, name),
            TokenKind::Special { label } => format!("{}{}", SPECIAL_PREFIX, label),
            TokenKind::Other(raw) => raw.clone(),
        }
    }

    /// Copy of this token carrying a fresh stamp from `clock`
    pub fn clone_stamped(&self, clock: &mut TokenClock) -> Token {
        Token {
            kind: self.kind.clone(),
            stamp: Some(clock.next_stamp().to_string()),
        }
    }

    pub fn without_stamp(&self) -> Token {
        Token { kind: self.kind.clone(), stamp: None }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.stamp {
            Some(stamp) => write!(f, "{}{}{}", self.base_id(), STAMP_SEPARATOR, stamp),
            None => write!(f, "{}", self.base_id()),
        }
    }
}

impl From<String> for Token {
    fn from(raw: String) -> Self {
        Token::parse(&raw)
    }
}

impl From<&str> for Token {
    fn from(raw: &str) -> Self {
        Token::parse(raw)
    }
}

impl From<Token> for String {
    fn from(token: Token) -> Self {
        token.to_string()
    }
}

/// Display name of a raw token string
pub fn parse_name(raw: &str) -> String {
    Token::parse(raw).display_name().to_string()
}

/// Staff type prefix of a raw token string, if any
pub fn type_of(raw: &str) -> Option<StaffType> {
    Token::parse(raw).staff_type()
}

/// Clones a raw token string with a fresh stamp
pub fn clone_token(raw: &str, clock: &mut TokenClock) -> String {
    Token::parse(raw).clone_stamped(clock).to_string()
}

/// Source of uniqueness stamps.
///
/// Stamps follow wall-clock milliseconds but are strictly increasing, so two
/// clones taken in the same millisecond still differ.
#[derive(Debug, Clone, Default)]
pub struct TokenClock {
    last: i64,
    frozen: bool,
}

impl TokenClock {
    pub fn new() -> Self {
        TokenClock::default()
    }

    /// Clock that ignores wall time and counts up from `start`
    pub fn starting_at(start: i64) -> Self {
        TokenClock { last: start - 1, frozen: true }
    }

    pub fn next_stamp(&mut self) -> i64 {
        let now = if self.frozen { i64::MIN } else { chrono::Utc::now().timestamp_millis() };
        self.last = now.max(self.last + 1);
        self.last
    }
}
