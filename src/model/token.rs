use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Tokens count as expired this long before their stated expiry.
const EXPIRY_SKEW_SECS: i64 = 10;

/// A cached OAuth2 credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// `None` means the token never expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl Token {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => now + Duration::seconds(EXPIRY_SKEW_SECS) >= expiry,
            None => false,
        }
    }

    /// Usable as-is: has an access token that has not expired.
    pub fn is_valid(&self) -> bool {
        !self.access_token.is_empty() && !self.is_expired_at(Utc::now())
    }

    /// The refresh token, if there is a non-empty one.
    pub fn usable_refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty())
    }

    /// Value for the `Authorization` header.
    pub fn authorization_header(&self) -> String {
        let kind = if self.token_type.is_empty() || self.token_type.eq_ignore_ascii_case("bearer") {
            "Bearer"
        } else {
            self.token_type.as_str()
        };
        format!("{} {}", kind, self.access_token)
    }
}

/// The OAuth client registration (`client_id`/`client_secret`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(expiry: Option<DateTime<Utc>>) -> Token {
        Token {
            access_token: "ya29.token".into(),
            token_type: "Bearer".into(),
            refresh_token: Some("1//refresh".into()),
            expiry,
        }
    }

    #[test]
    fn future_expiry_is_valid() {
        assert!(token(Some(Utc::now() + Duration::hours(1))).is_valid());
    }

    #[test]
    fn past_expiry_is_invalid() {
        assert!(!token(Some(Utc::now() - Duration::seconds(1))).is_valid());
    }

    #[test]
    fn expiry_inside_skew_counts_as_expired() {
        assert!(!token(Some(Utc::now() + Duration::seconds(5))).is_valid());
    }

    #[test]
    fn missing_expiry_never_expires() {
        assert!(token(None).is_valid());
    }

    #[test]
    fn empty_access_token_is_invalid() {
        let mut t = token(None);
        t.access_token.clear();
        assert!(!t.is_valid());
    }

    #[test]
    fn refresh_requires_non_empty_refresh_token() {
        let mut t = token(None);
        assert!(t.usable_refresh_token().is_some());
        t.refresh_token = Some(String::new());
        assert!(t.usable_refresh_token().is_none());
        t.refresh_token = None;
        assert!(t.usable_refresh_token().is_none());
    }

    #[test]
    fn parses_cached_token_file() {
        let json = r#"{"access_token":"abc","token_type":"Bearer","refresh_token":"r","expiry":"2030-01-01T00:00:00.123456789-05:00"}"#;
        let t: Token = serde_json::from_str(json).unwrap();
        assert_eq!(t.refresh_token.as_deref(), Some("r"));
        assert!(t.expiry.is_some());
        assert_eq!(t.authorization_header(), "Bearer abc");
    }
}
