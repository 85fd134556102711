//! Signed, expiring bearer tokens with revocation.
//!
//! Tokens are HMAC-signed JWTs. The signature covers every claim, so editing
//! the subject or the expiry invalidates the token. Revocation is tracked by
//! token id until the token would have expired anyway.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use dashmap::DashMap;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::SecurityConfig;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
    jti: String,
}

/// Why a presented token was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenRejection {
    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token is malformed")]
    Malformed,

    #[error("token has expired")]
    Expired,

    #[error("token has been revoked")]
    Revoked,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub subject: String,
    pub token_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub subject: String,
    pub token_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

pub struct TokenService {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    /// token id -> expiry (unix seconds)
    revoked: DashMap<String, i64>,
}

impl TokenService {
    #[must_use]
    pub fn new(secret: &[u8], algorithm: Algorithm) -> Self {
        let mut validation = Validation::new(algorithm);
        // Expiry is checked by hand so `now == exp` already counts as expired
        // and the rejection reason stays distinguishable.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            revoked: DashMap::new(),
        }
    }

    pub fn from_config(config: &SecurityConfig) -> Result<Self> {
        let algorithm = Algorithm::from_str(&config.token_algorithm)
            .with_context(|| format!("Unknown token algorithm: {}", config.token_algorithm))?;

        let secret = if let Some(secret) = &config.token_secret {
            secret.clone()
        } else {
            warn!("No token secret configured, tokens will not survive a restart");
            random_hex(32)
        };

        Ok(Self::new(secret.as_bytes(), algorithm))
    }

    pub fn issue(&self, subject: &str, ttl: Duration) -> Result<IssuedToken> {
        let issued_at = Utc::now();
        let expires_at = issued_at + ttl;

        let claims = Claims {
            sub: subject.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        let token = jsonwebtoken::encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .context("Failed to sign token")?;

        Ok(IssuedToken {
            token,
            subject: claims.sub,
            token_id: claims.jti,
            issued_at: timestamp(claims.iat),
            expires_at: timestamp(claims.exp),
        })
    }

    pub fn verify(&self, token: &str) -> Result<VerifiedToken, TokenRejection> {
        self.verify_at(token, Utc::now())
    }

    /// Verify as if the current time were `now`.
    pub fn verify_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<VerifiedToken, TokenRejection> {
        let claims = self.decode(token)?;

        if now.timestamp() >= claims.exp {
            return Err(TokenRejection::Expired);
        }

        if self.revoked.contains_key(&claims.jti) {
            return Err(TokenRejection::Revoked);
        }

        Ok(VerifiedToken {
            subject: claims.sub,
            token_id: claims.jti,
            issued_at: timestamp(claims.iat),
            expires_at: timestamp(claims.exp),
        })
    }

    /// Revoke a token. Tokens that are forged, malformed, already expired or
    /// already revoked are ignored.
    pub fn revoke(&self, token: &str) {
        let Ok(claims) = self.decode(token) else {
            debug!("Ignoring revocation of an unverifiable token");
            return;
        };

        let now = Utc::now().timestamp();
        self.revoked.retain(|_, exp| *exp > now);

        if claims.exp > now {
            self.revoked.insert(claims.jti, claims.exp);
        }
    }

    /// Number of revocations currently tracked.
    #[must_use]
    pub fn revoked_count(&self) -> usize {
        self.revoked.len()
    }

    fn decode(&self, token: &str) -> Result<Claims, TokenRejection> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenRejection::InvalidSignature
                }
                _ => TokenRejection::Malformed,
            })
    }
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
}

/// Random lowercase hex string from `bytes` random bytes.
#[must_use]
pub fn random_hex(bytes: usize) -> String {
    use rand::RngCore;
    use std::fmt::Write;

    let mut buf = vec![0u8; bytes];
    rand::rng().fill_bytes(&mut buf);

    buf.iter().fold(String::with_capacity(bytes * 2), |mut acc, b| {
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(b"test-secret-test-secret-test-secret", Algorithm::HS256)
    }

    #[test]
    fn issue_then_verify_returns_subject() {
        let tokens = service();
        let issued = tokens.issue("alice", Duration::minutes(30)).unwrap();

        let verified = tokens.verify(&issued.token).unwrap();
        assert_eq!(verified.subject, "alice");
        assert_eq!(verified.token_id, issued.token_id);
        assert_eq!(verified.expires_at, issued.expires_at);
    }

    #[test]
    fn token_expires_after_ttl() {
        let tokens = service();
        let issued = tokens.issue("alice", Duration::seconds(60)).unwrap();

        assert!(tokens.verify_at(&issued.token, Utc::now()).is_ok());
        assert_eq!(
            tokens.verify_at(&issued.token, issued.expires_at),
            Err(TokenRejection::Expired)
        );
        assert_eq!(
            tokens.verify_at(&issued.token, Utc::now() + Duration::seconds(61)),
            Err(TokenRejection::Expired)
        );
    }

    #[test]
    fn token_expires_in_real_time() {
        let tokens = service();
        let issued = tokens.issue("alice", Duration::seconds(1)).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(1100));

        assert_eq!(tokens.verify(&issued.token), Err(TokenRejection::Expired));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let tokens = service();
        let issued = tokens.issue("alice", Duration::minutes(5)).unwrap();

        let mut parts: Vec<String> = issued.token.split('.').map(str::to_string).collect();
        let forged = service_with_secret(b"another-secret-another-secret-xx")
            .issue("mallory", Duration::days(365))
            .unwrap();
        parts[1] = forged.token.split('.').nth(1).unwrap().to_string();
        let tampered = parts.join(".");

        assert_eq!(
            tokens.verify(&tampered),
            Err(TokenRejection::InvalidSignature)
        );
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let tokens = service();
        let forged = service_with_secret(b"another-secret-another-secret-xx")
            .issue("alice", Duration::minutes(5))
            .unwrap();

        assert_eq!(
            tokens.verify(&forged.token),
            Err(TokenRejection::InvalidSignature)
        );
    }

    #[test]
    fn garbage_is_malformed() {
        let tokens = service();
        assert_eq!(tokens.verify("not-a-token"), Err(TokenRejection::Malformed));
        assert_eq!(tokens.verify(""), Err(TokenRejection::Malformed));
    }

    #[test]
    fn revoke_is_idempotent_and_tolerates_garbage() {
        let tokens = service();
        let issued = tokens.issue("alice", Duration::minutes(5)).unwrap();

        tokens.revoke(&issued.token);
        tokens.revoke(&issued.token);
        tokens.revoke("not-a-token");

        assert_eq!(tokens.verify(&issued.token), Err(TokenRejection::Revoked));
        assert_eq!(tokens.revoked_count(), 1);
    }

    #[test]
    fn revoking_one_token_leaves_others_valid() {
        let tokens = service();
        let first = tokens.issue("alice", Duration::minutes(5)).unwrap();
        let second = tokens.issue("alice", Duration::minutes(5)).unwrap();

        tokens.revoke(&first.token);

        assert_eq!(tokens.verify(&first.token), Err(TokenRejection::Revoked));
        assert!(tokens.verify(&second.token).is_ok());
    }

    #[test]
    fn expired_tokens_are_not_tracked() {
        let tokens = service();
        let issued = tokens.issue("alice", Duration::seconds(-10)).unwrap();

        tokens.revoke(&issued.token);
        assert_eq!(tokens.revoked_count(), 0);
    }

    #[test]
    fn from_config_without_secret_generates_one() {
        let config = SecurityConfig::default();
        let tokens = TokenService::from_config(&config).unwrap();
        let issued = tokens.issue("admin", Duration::minutes(1)).unwrap();
        assert!(tokens.verify(&issued.token).is_ok());
    }

    fn service_with_secret(secret: &[u8]) -> TokenService {
        TokenService::new(secret, Algorithm::HS256)
    }
}
