//! Bearer token extraction and HS256 verification.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::CreditError;

/// Claims read from a user access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// Expiry (seconds since epoch)
    pub exp: u64,
}

/// Pull the token out of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, CreditError> {
    header
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(CreditError::MissingToken)
}

/// Verifies user access tokens against a shared secret.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str, audience: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[audience]);
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Check signature, audience and expiry; return the subject.
    pub fn verify(&self, token: &str) -> Result<String, CreditError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| CreditError::InvalidToken(e.to_string()))?;
        if data.claims.sub.is_empty() {
            return Err(CreditError::InvalidToken("empty subject".to_string()));
        }
        Ok(data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    const SECRET: &str = "test-secret";

    fn token(sub: &str, aud: &str, exp_offset: i64, secret: &str) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64;
        let claims = serde_json::json!({
            "sub": sub,
            "aud": aud,
            "exp": now + exp_offset,
            "role": "authenticated",
        });
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(Some("Bearer abc.def")).unwrap(), "abc.def");
        assert_eq!(bearer_token(None), Err(CreditError::MissingToken));
        assert_eq!(bearer_token(Some("Basic abc")), Err(CreditError::MissingToken));
        assert_eq!(bearer_token(Some("Bearer ")), Err(CreditError::MissingToken));
    }

    #[test]
    fn test_verify_accepts_valid_token() {
        let verifier = TokenVerifier::new(SECRET, "authenticated");
        let sub = verifier
            .verify(&token("user-1", "authenticated", 3600, SECRET))
            .unwrap();
        assert_eq!(sub, "user-1");
    }

    #[test]
    fn test_verify_rejects_wrong_secret_audience_and_expiry() {
        let verifier = TokenVerifier::new(SECRET, "authenticated");
        for bad in [
            token("user-1", "authenticated", 3600, "other-secret"),
            token("user-1", "anon", 3600, SECRET),
            token("user-1", "authenticated", -3600, SECRET),
            "not-a-jwt".to_string(),
        ] {
            assert!(matches!(
                verifier.verify(&bad),
                Err(CreditError::InvalidToken(_))
            ));
        }
    }
}
