//! Media records shared by the intake side, the workers, and the stores.
//!
//! The pipeline only ever reads `id`, `token`, and `class` from a
//! [`MediaItem`] and writes its [`ProcessingStatus`]. Everything else about a
//! photo or an account lives with the metadata store.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Length of the random token embedded in photo paths.
pub const TOKEN_LEN: usize = 20;

const TOKEN_CHARS: &[u8] = b"1234567890abcdefghijklmnopqrstuvwxyz";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown media class: {0}")]
    UnknownClass(String),
    #[error("invalid token {0:?}: expected {TOKEN_LEN} characters from [0-9a-z]")]
    InvalidToken(String),
    #[error("unknown status code: {0}")]
    UnknownStatus(i8),
}

/// Opaque numeric identity assigned by the metadata store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaId(pub i64);

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which size table and path namespace an item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaClass {
    Photo,
    Avatar,
}

impl MediaClass {
    pub const ALL: [MediaClass; 2] = [MediaClass::Photo, MediaClass::Avatar];

    pub fn as_str(self) -> &'static str {
        match self {
            MediaClass::Photo => "photo",
            MediaClass::Avatar => "avatar",
        }
    }
}

impl fmt::Display for MediaClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaClass {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "photo" => Ok(MediaClass::Photo),
            "avatar" => Ok(MediaClass::Avatar),
            other => Err(TypeError::UnknownClass(other.to_string())),
        }
    }
}

/// Random secondary token that makes derivative URLs unguessable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Token(String);

impl Token {
    /// Draw a fresh token of [`TOKEN_LEN`] characters from `[0-9a-z]`.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let token = (0..TOKEN_LEN)
            .map(|_| TOKEN_CHARS[rng.random_range(0..TOKEN_CHARS.len())] as char)
            .collect();
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Token {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let valid = value.len() == TOKEN_LEN && value.bytes().all(|b| TOKEN_CHARS.contains(&b));
        if valid {
            Ok(Self(value))
        } else {
            Err(TypeError::InvalidToken(value))
        }
    }
}

impl From<Token> for String {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Processing flag gating whether derivatives may be served.
///
/// Stored numerically (`0` pending, `1` ready, `-1` failed) so the value maps
/// onto a single small integer column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum ProcessingStatus {
    Pending,
    Ready,
    Failed,
}

impl ProcessingStatus {
    pub fn code(self) -> i8 {
        match self {
            ProcessingStatus::Pending => 0,
            ProcessingStatus::Ready => 1,
            ProcessingStatus::Failed => -1,
        }
    }

    pub fn from_code(code: i8) -> Result<Self, TypeError> {
        match code {
            0 => Ok(ProcessingStatus::Pending),
            1 => Ok(ProcessingStatus::Ready),
            -1 => Ok(ProcessingStatus::Failed),
            other => Err(TypeError::UnknownStatus(other)),
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, ProcessingStatus::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "pending",
            ProcessingStatus::Ready => "ready",
            ProcessingStatus::Failed => "failed",
        }
    }
}

impl TryFrom<i8> for ProcessingStatus {
    type Error = TypeError;

    fn try_from(code: i8) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

impl From<ProcessingStatus> for i8 {
    fn from(status: ProcessingStatus) -> Self {
        status.code()
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A photo or avatar record as seen by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: MediaId,
    pub token: Token,
    pub class: MediaClass,
    pub status: ProcessingStatus,
}

impl MediaItem {
    /// A freshly uploaded item: new token, status `pending`.
    pub fn new_pending(id: MediaId, class: MediaClass) -> Self {
        Self {
            id,
            token: Token::generate(),
            class,
            status: ProcessingStatus::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_have_expected_shape() {
        let token = Token::generate();
        assert_eq!(token.as_str().len(), TOKEN_LEN);
        assert!(
            token
                .as_str()
                .bytes()
                .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
        );
    }

    #[test]
    fn generated_tokens_differ() {
        assert_ne!(Token::generate(), Token::generate());
    }

    #[test]
    fn token_rejects_wrong_length_and_charset() {
        assert!(Token::try_from("abc".to_string()).is_err());
        assert!(Token::try_from("ABCDEFGHIJKLMNOPQRST".to_string()).is_err());
        assert!(Token::try_from("abcdefghij0123456789".to_string()).is_ok());
    }

    #[test]
    fn status_codes_match_column_values() {
        assert_eq!(ProcessingStatus::Pending.code(), 0);
        assert_eq!(ProcessingStatus::Ready.code(), 1);
        assert_eq!(ProcessingStatus::Failed.code(), -1);
        assert_eq!(
            ProcessingStatus::from_code(2),
            Err(TypeError::UnknownStatus(2))
        );
    }

    #[test]
    fn only_pending_is_not_terminal() {
        assert!(!ProcessingStatus::Pending.is_terminal());
        assert!(ProcessingStatus::Ready.is_terminal());
        assert!(ProcessingStatus::Failed.is_terminal());
    }

    #[test]
    fn class_parses_from_cli_names() {
        assert_eq!("photo".parse::<MediaClass>(), Ok(MediaClass::Photo));
        assert_eq!("avatar".parse::<MediaClass>(), Ok(MediaClass::Avatar));
        assert!("video".parse::<MediaClass>().is_err());
    }

    #[test]
    fn item_serializes_status_as_code() {
        let item = MediaItem {
            id: MediaId(7),
            token: Token::try_from("abcdefghij0123456789".to_string()).unwrap(),
            class: MediaClass::Photo,
            status: ProcessingStatus::Failed,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["class"], "photo");
        assert_eq!(json["status"], -1);

        let back: MediaItem = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn new_pending_starts_pending() {
        let item = MediaItem::new_pending(MediaId(1), MediaClass::Avatar);
        assert_eq!(item.status, ProcessingStatus::Pending);
        assert_eq!(item.class, MediaClass::Avatar);
    }
}
