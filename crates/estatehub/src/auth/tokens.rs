use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

const ISSUER: &str = "estatehub";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Builder,
}

/// JWT claims carried by admin and builder sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token could not be issued: {0}")]
    Encode(jsonwebtoken::errors::Error),
    #[error("token rejected: {0}")]
    Invalid(jsonwebtoken::errors::Error),
}

/// Issues and verifies HS256 session tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours.max(1)),
        }
    }

    pub fn issue(&self, subject: &str, email: &str, role: Role) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            email: email.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            iss: ISSUER.to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(TokenError::Encode)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[ISSUER]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl_hours", &self.ttl.num_hours())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_verify_with_role() {
        let tokens = TokenService::new("test-secret", 168);
        let token = tokens
            .issue("builder-1", "sales@acme.in", Role::Builder)
            .expect("token issues");
        let claims = tokens.verify(&token).expect("token verifies");
        assert_eq!(claims.sub, "builder-1");
        assert_eq!(claims.role, Role::Builder);
        assert_eq!(claims.iss, ISSUER);

        let lifetime = claims.exp - claims.iat;
        assert_eq!(lifetime, 168 * 3600);
    }

    #[test]
    fn rejects_tokens_signed_with_other_secret() {
        let issuer = TokenService::new("secret-one", 1);
        let verifier = TokenService::new("secret-two", 1);
        let token = issuer
            .issue("admin", "admin@estatehub.com", Role::Admin)
            .expect("token issues");
        assert!(verifier.verify(&token).is_err());
        assert!(verifier.verify("not-a-token").is_err());
    }
}
