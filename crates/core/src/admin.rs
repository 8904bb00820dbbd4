//! Single shared admin credential and the bearer tokens issued for it.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("token expired")]
    TokenExpired,
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

/// Hash `password` into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// The admin login. The password is only ever held as an argon2 hash.
#[derive(Debug, Clone)]
pub struct AdminCredential {
    email: String,
    password_hash: String,
}

impl AdminCredential {
    pub fn new(email: &str, password_hash: &str) -> Result<Self, AuthError> {
        PasswordHash::new(password_hash).map_err(|e| AuthError::Hashing(e.to_string()))?;
        Ok(Self {
            email: email.trim().to_string(),
            password_hash: password_hash.to_string(),
        })
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Emails compare case-insensitively.
    pub fn verify(&self, email: &str, password: &str) -> Result<(), AuthError> {
        if !self.email.eq_ignore_ascii_case(email.trim()) {
            return Err(AuthError::InvalidCredentials);
        }
        let parsed =
            PasswordHash::new(&self.password_hash).map_err(|e| AuthError::Hashing(e.to_string()))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| AuthError::InvalidCredentials)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and checks HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: TimeDelta,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: TimeDelta::seconds(ttl_secs),
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl.num_seconds()
    }

    pub fn issue(&self, subject: &str) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        Ok(IssuedToken { token, expires_at })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        let admin = AdminCredential::new("Admin@vbcai.org", &hash).unwrap();

        assert!(admin.verify("admin@VBCAI.org", "correct horse").is_ok());
        assert!(matches!(
            admin.verify("admin@vbcai.org", "wrong"),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            admin.verify("someone@vbcai.org", "correct horse"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn credential_rejects_non_phc_hash() {
        assert!(matches!(
            AdminCredential::new("admin@vbcai.org", "plaintext"),
            Err(AuthError::Hashing(_))
        ));
    }

    #[test]
    fn tokens_verify_with_the_same_secret_only() {
        let issuer = TokenIssuer::new("test-secret", 3600);
        let issued = issuer.issue("admin@vbcai.org").unwrap();
        let claims = issuer.verify(&issued.token).unwrap();
        assert_eq!(claims.sub, "admin@vbcai.org");
        assert_eq!(claims.exp - claims.iat, 3600);

        let other = TokenIssuer::new("other-secret", 3600);
        assert!(matches!(
            other.verify(&issued.token),
            Err(AuthError::InvalidToken(_))
        ));
        assert!(matches!(
            issuer.verify("not-a-token"),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn expired_tokens_are_reported() {
        let issuer = TokenIssuer::new("test-secret", -3600);
        let issued = issuer.issue("admin@vbcai.org").unwrap();
        assert!(matches!(
            issuer.verify(&issued.token),
            Err(AuthError::TokenExpired)
        ));
    }
}
