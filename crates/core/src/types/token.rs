//! Admin session token type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`AdminToken`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The token is empty.
    #[error("token cannot be empty")]
    Empty,
    /// The token is longer than any token the server issues.
    #[error("token must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The token contains whitespace, control or non-ASCII characters.
    #[error("token contains invalid characters")]
    InvalidCharacters,
}

/// An opaque admin session token.
///
/// Issued tokens are [`AdminToken::ENTROPY_BYTES`] random bytes, hex encoded.
/// Parsing is deliberately looser than that: any short visible-ASCII string is
/// accepted so a well-formed but unknown token reaches the session store and
/// is rejected there, rather than being mistaken for "no token".
///
/// `Debug` only shows [`AdminToken::prefix`] so tokens never end up in logs.
///
/// ```
/// use folio_core::AdminToken;
///
/// let token = AdminToken::from_entropy([7u8; AdminToken::ENTROPY_BYTES]);
/// assert_eq!(token.as_str().len(), 64);
/// assert!(AdminToken::parse("").is_err());
/// assert!(AdminToken::parse("has space").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AdminToken(String);

impl AdminToken {
    /// Number of random bytes in an issued token.
    pub const ENTROPY_BYTES: usize = 32;

    /// Longest token accepted from a request.
    pub const MAX_LENGTH: usize = 256;

    /// Characters of the token shown in logs.
    pub const PREFIX_LENGTH: usize = 8;

    /// Build a token from freshly generated random bytes.
    #[must_use]
    pub fn from_entropy(bytes: [u8; Self::ENTROPY_BYTES]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Parse a token presented by a client (header, cookie or URL).
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, longer than
    /// [`AdminToken::MAX_LENGTH`], or contains anything other than visible
    /// ASCII characters.
    pub fn parse(s: &str) -> Result<Self, TokenError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TokenError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(TokenError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if !s.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(TokenError::InvalidCharacters);
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading characters of the token, safe to log.
    #[must_use]
    pub fn prefix(&self) -> &str {
        self.0.get(..Self::PREFIX_LENGTH).unwrap_or(&self.0)
    }
}

impl fmt::Debug for AdminToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AdminToken({}…)", self.prefix())
    }
}

impl TryFrom<String> for AdminToken {
    type Error = TokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AdminToken> for String {
    fn from(token: AdminToken) -> Self {
        token.0
    }
}

impl std::str::FromStr for AdminToken {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for AdminToken {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for AdminToken {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for AdminToken {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_entropy_is_hex() {
        let token = AdminToken::from_entropy([0xab; AdminToken::ENTROPY_BYTES]);
        assert_eq!(token.as_str().len(), AdminToken::ENTROPY_BYTES * 2);
        assert!(token.as_str().bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(AdminToken::parse("  "), Err(TokenError::Empty));
        assert_eq!(
            AdminToken::parse("abc\u{7f}def"),
            Err(TokenError::InvalidCharacters)
        );
        assert_eq!(
            AdminToken::parse("tok en"),
            Err(TokenError::InvalidCharacters)
        );
        assert!(matches!(
            AdminToken::parse(&"a".repeat(300)),
            Err(TokenError::TooLong { .. })
        ));
    }

    #[test]
    fn test_parse_accepts_unknown_but_well_formed() {
        let token = AdminToken::parse(" forged-token-123 ").unwrap();
        assert_eq!(token.as_str(), "forged-token-123");
    }

    #[test]
    fn test_debug_shows_prefix_only() {
        let token = AdminToken::parse("0123456789abcdef").unwrap();
        let debug = format!("{token:?}");
        assert!(debug.contains("01234567"));
        assert!(!debug.contains("89abcdef"));
    }

    #[test]
    fn test_prefix_of_short_token() {
        let token = AdminToken::parse("abc").unwrap();
        assert_eq!(token.prefix(), "abc");
    }

    #[test]
    fn test_serde_round_trip_validates() {
        let json = serde_json::to_string(&AdminToken::parse("abc123").unwrap()).unwrap();
        assert_eq!(json, "\"abc123\"");
        assert!(serde_json::from_str::<AdminToken>("\"\"").is_err());
    }
}
