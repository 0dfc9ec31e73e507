//! Access/refresh token pair and the persisted session.
//!
//! The session is stored as one JSON blob under [`crate::storage::AUTH_KEY`].
//! Expiry comes from the access token's `exp` claim when it can be read,
//! otherwise from what the auth endpoint reported.

use chrono::{DateTime, Duration, TimeZone, Utc};
use comanda_core::UserIdentity;
use jsonwebtoken::{DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Tokens this close to expiry are refreshed before use.
pub const REFRESH_MARGIN_SECS: i64 = 60;

/// Lifetime assumed when neither the JWT nor the response says.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenPair {
    /// Builds a pair, preferring the JWT `exp` over `reported_expiry`.
    pub fn new(
        access_token: String,
        refresh_token: String,
        reported_expiry: Option<DateTime<Utc>>,
    ) -> Self {
        let expires_at = jwt_expiry(&access_token)
            .or(reported_expiry)
            .unwrap_or_else(|| Utc::now() + Duration::seconds(DEFAULT_TOKEN_LIFETIME_SECS));
        TokenPair {
            access_token,
            refresh_token,
            expires_at,
        }
    }

    pub fn needs_refresh_at(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(REFRESH_MARGIN_SECS) >= self.expires_at
    }

    /// Expired or about to expire.
    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh_at(Utc::now())
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    pub fn remaining_secs(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds().max(0)
    }
}

/// What gets persisted: tokens plus the identity they belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub tokens: TokenPair,
    pub user: UserIdentity,
}

impl Session {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Deserialize)]
struct ExpiryClaim {
    #[serde(default)]
    exp: Option<i64>,
}

/// Reads the `exp` claim without verifying the signature.
///
/// The token is only ever sent back to the server that issued it, which does
/// the verifying. Returns `None` for anything that is not a readable JWT.
pub fn jwt_expiry(token: &str) -> Option<DateTime<Utc>> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data =
        jsonwebtoken::decode::<ExpiryClaim>(token, &DecodingKey::from_secret(&[]), &validation)
            .ok()?;
    data.claims
        .exp
        .and_then(|exp| Utc.timestamp_opt(exp, 0).single())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header};

    fn jwt_expiring_at(exp: i64) -> String {
        #[derive(Serialize)]
        struct Claims {
            sub: String,
            exp: i64,
        }
        jsonwebtoken::encode(
            &Header::default(),
            &Claims {
                sub: "user-1".into(),
                exp,
            },
            &EncodingKey::from_secret(b"server-secret"),
        )
        .unwrap()
    }

    #[test]
    fn test_jwt_expiry_read_without_key() {
        let exp = Utc::now().timestamp() + 600;
        let token = jwt_expiring_at(exp);
        assert_eq!(jwt_expiry(&token).unwrap().timestamp(), exp);
        assert!(jwt_expiry("not-a-jwt").is_none());
    }

    #[test]
    fn test_jwt_exp_wins_over_reported() {
        let exp = Utc::now().timestamp() + 600;
        let reported = Utc::now() + Duration::seconds(10_000);
        let pair = TokenPair::new(jwt_expiring_at(exp), "r".into(), Some(reported));
        assert_eq!(pair.expires_at.timestamp(), exp);
        assert!(!pair.needs_refresh());
    }

    #[test]
    fn test_refresh_margin() {
        let pair = TokenPair::new(
            "opaque".into(),
            "r".into(),
            Some(Utc::now() + Duration::seconds(30)),
        );
        assert!(pair.needs_refresh());
        assert!(!pair.is_expired());

        let expired = TokenPair::new(
            "opaque".into(),
            "r".into(),
            Some(Utc::now() - Duration::seconds(1)),
        );
        assert!(expired.is_expired());
        assert_eq!(expired.remaining_secs(), 0);
    }

    #[test]
    fn test_session_json() {
        let session = Session {
            tokens: TokenPair::new("a".into(), "r".into(), Some(Utc::now())),
            user: UserIdentity {
                id: "u-1".into(),
                email: Some("ana@example.com".into()),
                role: None,
            },
        };
        let json = session.to_json().unwrap();
        assert_eq!(Session::from_json(&json).unwrap(), session);
    }
}
